use std::collections::HashSet;

use pulse_lib::store::keys::{day_bucket, KeyScheme, Metric, Scope};

fn scheme() -> KeyScheme {
    KeyScheme::new(40, 24)
}

#[test]
fn day_bucket_is_utc_yyyymmdd() {
    let at = chrono_date(2026, 8, 5);
    assert_eq!(day_bucket(at), "20260805");
}

fn chrono_date(y: i32, m: u32, d: u32) -> chrono::DateTime<chrono::Utc> {
    use chrono::TimeZone;
    chrono::Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

#[test]
fn key_shapes_are_stable() {
    let keys = scheme();
    // The rendering and dashboard layers read these by name; changing
    // their shape is a breaking change.
    assert_eq!(keys.daily(&Scope::Site, Metric::Views, "20260805"), "site:views:20260805");
    assert_eq!(
        keys.daily(&Scope::Post("abc"), Metric::Views, "20260805"),
        "post:abc:views:20260805"
    );
    assert_eq!(
        keys.daily(&Scope::Post("abc"), Metric::ReadMs, "20260805"),
        "post:abc:readms:20260805"
    );
    assert_eq!(
        keys.daily(&Scope::Post("abc"), Metric::UniqueVisitors, "20260805"),
        "post:abc:uv:20260805"
    );
    assert_eq!(
        keys.daily(
            &Scope::Category { locale: "fi", slug: "talous" },
            Metric::Views,
            "20260805"
        ),
        "category:fi:talous:views:20260805"
    );
    assert_eq!(
        keys.daily(&Scope::Country { locale: "fi" }, Metric::Views, "20260805"),
        "country:fi:views:20260805"
    );
    assert_eq!(keys.cumulative_views("abc"), "post:abc:views:total");
    assert_eq!(keys.trending("fi"), "trend:fi");
    assert_eq!(KeyScheme::trending_member("abc"), "post:abc");
    assert_eq!(KeyScheme::rate_bucket("comment", "deadbeef"), "rl:comment:deadbeef");
}

#[test]
fn distinct_triples_never_collide() {
    let keys = scheme();
    let scopes = [
        Scope::Site,
        Scope::Post("a"),
        Scope::Post("b"),
        Scope::Category { locale: "fi", slug: "a" },
        Scope::Category { locale: "sv", slug: "a" },
        Scope::Country { locale: "fi" },
        Scope::Country { locale: "sv" },
    ];
    let metrics = [Metric::Views, Metric::ReadMs, Metric::UniqueVisitors];
    let days = ["20260804", "20260805"];

    let mut seen = HashSet::new();
    for scope in &scopes {
        for metric in metrics {
            for day in days {
                assert!(
                    seen.insert(keys.daily(scope, metric, day)),
                    "key collision for {scope:?}/{metric:?}/{day}"
                );
            }
        }
    }
    assert!(seen.insert(keys.cumulative_views("a")));
    assert!(seen.insert(keys.trending("fi")));
}

#[test]
fn ttl_policy() {
    let keys = KeyScheme::new(40, 24);
    assert_eq!(keys.retention().as_secs(), 40 * 24 * 60 * 60);
    assert_eq!(keys.trending_ttl().as_secs(), 24 * 60 * 60);
}
