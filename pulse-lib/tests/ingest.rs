use std::net::IpAddr;
use std::sync::Arc;

use pulse_lib::config::IngestConfig;
use pulse_lib::ingest::events::{ReadTimeEvent, ViewEvent};
use pulse_lib::store::keys::{today, Metric, Scope};
use pulse_lib::store::CounterStore;
use pulse_lib::{rankings, visitors, Gateway, KeyScheme, MemoryCounterStore};

fn ingest_config() -> IngestConfig {
    IngestConfig {
        salt: "test-salt".to_string(),
        default_locale: "fi".to_string(),
        locales: vec!["fi".to_string(), "sv".to_string(), "en".to_string()],
        trending_ttl_hours: 24,
        unique_visitors: true,
    }
}

fn gateway(store: Arc<MemoryCounterStore>) -> Gateway<MemoryCounterStore> {
    Gateway::new(store, ingest_config(), KeyScheme::new(40, 24), None)
}

fn addr(s: &str) -> Option<IpAddr> {
    Some(s.parse().expect("test address"))
}

fn view(entity: &str, locale: Option<&str>, caller: Option<IpAddr>) -> ViewEvent {
    ViewEvent {
        entity_id: entity.to_string(),
        locale: locale.map(str::to_string),
        category: None,
        country: None,
        caller_addr: caller,
        sid: None,
    }
}

#[tokio::test]
async fn n_views_count_n_but_one_unique_visitor() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));
    let keys = KeyScheme::new(40, 24);
    let day = today();

    for _ in 0..5 {
        gateway
            .record_view(view("abc", Some("fi"), addr("198.51.100.7")))
            .await
            .expect("valid view");
    }

    let daily = keys.daily(&Scope::Post("abc"), Metric::Views, &day);
    assert_eq!(store.counter(&daily).await.unwrap(), 5);
    assert_eq!(store.counter(&keys.cumulative_views("abc")).await.unwrap(), 5);
    assert_eq!(
        store
            .counter(&keys.daily(&Scope::Site, Metric::Views, &day))
            .await
            .unwrap(),
        5
    );

    // Same fingerprint five times: the estimate must not grow with it.
    let uv = visitors::estimate(store.as_ref(), &keys, &Scope::Post("abc"), &day)
        .await
        .unwrap();
    assert_eq!(uv, 1);
}

#[tokio::test]
async fn distinct_fingerprints_raise_the_estimate() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));
    let keys = KeyScheme::new(40, 24);
    let day = today();

    gateway
        .record_view(view("abc", Some("fi"), addr("198.51.100.7")))
        .await
        .unwrap();
    gateway
        .record_view(view("abc", Some("fi"), addr("203.0.113.9")))
        .await
        .unwrap();

    let uv = visitors::estimate(store.as_ref(), &keys, &Scope::Post("abc"), &day)
        .await
        .unwrap();
    assert_eq!(uv, 2);
    let site_uv = visitors::estimate(store.as_ref(), &keys, &Scope::Site, &day)
        .await
        .unwrap();
    assert_eq!(site_uv, 2);
}

#[tokio::test]
async fn views_feed_the_trending_set() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));
    let keys = KeyScheme::new(40, 24);

    for _ in 0..3 {
        gateway
            .record_view(view("abc", Some("fi"), addr("198.51.100.7")))
            .await
            .unwrap();
    }
    gateway
        .record_view(view("other", Some("fi"), addr("198.51.100.7")))
        .await
        .unwrap();

    let top = rankings::top_posts(store.as_ref(), &keys, "fi", 10)
        .await
        .unwrap();
    assert_eq!(top[0], ("post:abc".to_string(), 3));
    assert_eq!(top[1], ("post:other".to_string(), 1));
}

#[tokio::test]
async fn unknown_locale_falls_back_to_default() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));
    let keys = KeyScheme::new(40, 24);

    gateway
        .record_view(view("abc", Some("xx-unknown"), addr("198.51.100.7")))
        .await
        .unwrap();

    let top = rankings::top_posts(store.as_ref(), &keys, "fi", 1).await.unwrap();
    assert_eq!(top.len(), 1, "view must land in the default locale's trending set");
}

#[tokio::test]
async fn category_and_country_views_are_scoped() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));
    let keys = KeyScheme::new(40, 24);
    let day = today();

    let event = ViewEvent {
        entity_id: "abc".to_string(),
        locale: Some("fi".to_string()),
        category: Some("Talous".to_string()),
        country: Some("fi".to_string()),
        caller_addr: addr("198.51.100.7"),
        sid: None,
    };
    gateway.record_view(event).await.unwrap();

    // Category slugs are folded to lowercase, country codes to uppercase.
    let category_key =
        keys.daily(&Scope::Category { locale: "fi", slug: "talous" }, Metric::Views, &day);
    assert_eq!(store.counter(&category_key).await.unwrap(), 1);

    let country_key = keys.daily(&Scope::Country { locale: "fi" }, Metric::Views, &day);
    let ranks = store.top(&country_key, 10).await.unwrap();
    assert_eq!(ranks, vec![("FI".to_string(), 1)]);
}

#[tokio::test]
async fn empty_entity_id_is_the_only_rejection() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));

    assert!(gateway.record_view(view("", Some("fi"), None)).await.is_err());
    assert!(gateway.record_view(view("   ", Some("fi"), None)).await.is_err());
    assert_eq!(store.write_count(), 0);

    // No caller identity at all still records the view.
    assert!(gateway.record_view(view("abc", None, None)).await.is_ok());
}

#[tokio::test]
async fn view_reports_success_when_the_store_is_down() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));

    store.set_failing(true);
    gateway
        .record_view(view("abc", Some("fi"), addr("198.51.100.7")))
        .await
        .expect("fail-open: caller must still see success");
}

#[tokio::test]
async fn zero_and_negative_read_time_issue_no_writes() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));

    for ms in [0, -1, -10_000] {
        gateway
            .record_read_time(ReadTimeEvent {
                entity_id: "abc".to_string(),
                locale: Some("fi".to_string()),
                category: None,
                elapsed_ms: ms,
            })
            .await
            .unwrap();
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn oversized_read_time_is_clamped_to_five_minutes() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));
    let keys = KeyScheme::new(40, 24);
    let day = today();

    gateway
        .record_read_time(ReadTimeEvent {
            entity_id: "abc".to_string(),
            locale: Some("fi".to_string()),
            category: None,
            elapsed_ms: 10_000_000,
        })
        .await
        .unwrap();

    let key = keys.daily(&Scope::Post("abc"), Metric::ReadMs, &day);
    assert_eq!(store.counter(&key).await.unwrap(), 300_000);
}

#[tokio::test]
async fn read_time_accumulates_without_a_daily_cap() {
    let store = Arc::new(MemoryCounterStore::new());
    let gateway = gateway(Arc::clone(&store));
    let keys = KeyScheme::new(40, 24);
    let day = today();

    for _ in 0..3 {
        gateway
            .record_read_time(ReadTimeEvent {
                entity_id: "abc".to_string(),
                locale: Some("fi".to_string()),
                category: Some("talous".to_string()),
                elapsed_ms: 300_000,
            })
            .await
            .unwrap();
    }

    let key = keys.daily(&Scope::Post("abc"), Metric::ReadMs, &day);
    assert_eq!(store.counter(&key).await.unwrap(), 900_000);
    let category_key =
        keys.daily(&Scope::Category { locale: "fi", slug: "talous" }, Metric::ReadMs, &day);
    assert_eq!(store.counter(&category_key).await.unwrap(), 900_000);
}
