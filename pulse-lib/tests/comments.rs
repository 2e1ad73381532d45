use std::net::IpAddr;
use std::sync::Arc;

use pulse_lib::abuse::{BlockList, BlockRule, BlockRuleKind, FixedWindowLimiter};
use pulse_lib::comments::record::ModerationStatus;
use pulse_lib::comments::store::{MemoryCommentStore, StaticPostDirectory};
use pulse_lib::comments::{CommentPipeline, CommentRequest, SubmitError, SubmitOutcome};
use pulse_lib::config::{CommentsConfig, RateLimitConfig};
use pulse_lib::MemoryCounterStore;

const SALT: &str = "test-salt";

struct Fixture {
    store: Arc<MemoryCounterStore>,
    comments: Arc<MemoryCommentStore>,
    posts: Arc<StaticPostDirectory>,
    blocks: Arc<BlockList>,
    pipeline: CommentPipeline<MemoryCounterStore, MemoryCommentStore, StaticPostDirectory>,
}

fn fixture(config: CommentsConfig) -> Fixture {
    let store = Arc::new(MemoryCounterStore::new());
    let comments = Arc::new(MemoryCommentStore::new());
    let posts = Arc::new(StaticPostDirectory::with_published(["abc"]));
    let blocks = Arc::new(BlockList::new());
    let limiter = FixedWindowLimiter::new(Arc::clone(&store), "comment", &config.rate_limit, None);
    let pipeline = CommentPipeline::new(
        limiter,
        Arc::clone(&blocks),
        Arc::clone(&comments),
        Arc::clone(&posts),
        &config,
        SALT.to_string(),
        None,
    );
    Fixture { store, comments, posts, blocks, pipeline }
}

fn default_fixture() -> Fixture {
    fixture(CommentsConfig::default())
}

fn request(post_id: &str, display_name: &str, content: &str) -> CommentRequest {
    CommentRequest {
        post_id: post_id.to_string(),
        display_name: display_name.to_string(),
        content: content.to_string(),
        email: None,
        sid: None,
        honeypot: None,
    }
}

fn caller(s: &str) -> Option<IpAddr> {
    Some(s.parse().expect("test address"))
}

#[tokio::test]
async fn accepted_comment_returns_public_fields_only() {
    let f = default_fixture();

    let outcome = f
        .pipeline
        .submit(request("abc", "Reader", "Great piece."), caller("198.51.100.7"))
        .await
        .expect("valid comment");

    let public = match outcome {
        SubmitOutcome::Accepted(public) => public,
        other => panic!("expected acceptance, got {other:?}"),
    };
    assert_eq!(public.display_name, "Reader");
    assert_eq!(public.content, "Great piece.");
    assert!(public.created_at > 0);

    let stored = f.comments.for_post("abc");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, ModerationStatus::Published);
    assert!(stored[0].genuine);
    assert!(stored[0].ip_hash.is_some(), "abuse hash stays server-side");
    let json = serde_json::to_value(&public).unwrap();
    assert!(json.get("ipHash").is_none());
    assert!(json.get("genuine").is_none());
    assert!(json.get("status").is_none());
}

#[tokio::test]
async fn auto_publish_off_queues_for_moderation() {
    let f = fixture(CommentsConfig { auto_publish: false, ..CommentsConfig::default() });

    f.pipeline
        .submit(request("abc", "Reader", "Great piece."), caller("198.51.100.7"))
        .await
        .expect("valid comment");

    assert_eq!(f.comments.for_post("abc")[0].status, ModerationStatus::Pending);
}

#[tokio::test]
async fn honeypot_succeeds_without_persisting() {
    let f = default_fixture();

    let mut req = request("abc", "Bot", "buy things");
    req.honeypot = Some("filled-by-bot".to_string());

    let outcome = f.pipeline.submit(req, caller("198.51.100.7")).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Ignored));
    assert!(f.comments.is_empty(), "honeypot submissions must not persist");
    assert_eq!(f.store.write_count(), 0, "honeypot returns before the rate limiter");
}

#[tokio::test]
async fn display_name_boundaries_are_inclusive() {
    let f = default_fixture();

    let name_40 = "x".repeat(40);
    let name_41 = "x".repeat(41);
    let cases: [(&str, bool); 4] =
        [("a", false), ("ab", true), (&name_40, true), (&name_41, false)];
    for (name, ok) in cases {
        let result = f
            .pipeline
            .submit(request("abc", name, "Great piece."), caller("198.51.100.7"))
            .await;
        assert_eq!(result.is_ok(), ok, "displayName of {} chars", name.chars().count());
    }
}

#[tokio::test]
async fn content_boundaries_are_inclusive() {
    let f = default_fixture();

    let content_2000 = "x".repeat(2000);
    let content_2001 = "x".repeat(2001);
    let cases: [(&str, bool); 4] =
        [("a", false), ("ab", true), (&content_2000, true), (&content_2001, false)];
    for (content, ok) in cases {
        let result = f
            .pipeline
            .submit(request("abc", "Reader", content), caller("198.51.100.7"))
            .await;
        assert_eq!(result.is_ok(), ok, "content of {} chars", content.chars().count());
    }
}

#[tokio::test]
async fn unknown_or_unpublished_post_is_rejected_vaguely() {
    let f = default_fixture();

    let err = f
        .pipeline
        .submit(request("nope", "Reader", "Great piece."), caller("198.51.100.7"))
        .await
        .expect_err("unknown post must reject");
    assert!(matches!(err, SubmitError::UnknownPost));

    // Publishing makes the same id acceptable.
    f.posts.publish("nope");
    assert!(f
        .pipeline
        .submit(request("nope", "Reader", "Great piece."), caller("198.51.100.7"))
        .await
        .is_ok());
}

#[tokio::test]
async fn blocked_nickname_is_rejected_case_insensitively() {
    let f = default_fixture();
    f.blocks.push(BlockRule {
        kind: BlockRuleKind::Nick,
        value: "Troll".to_string(),
        active: true,
        expires_at: None,
    });

    let err = f
        .pipeline
        .submit(request("abc", "troll", "first!"), caller("198.51.100.7"))
        .await
        .expect_err("blocked nick must reject");
    assert!(matches!(err, SubmitError::Blocked));
    assert!(f.comments.is_empty());
}

#[tokio::test]
async fn blocked_caller_does_not_consume_rate_limit_budget() {
    let f = fixture(CommentsConfig {
        rate_limit: RateLimitConfig { ceiling: 1, window_seconds: 600 },
        ..CommentsConfig::default()
    });
    f.blocks.push(BlockRule {
        kind: BlockRuleKind::Nick,
        value: "troll".to_string(),
        active: true,
        expires_at: None,
    });

    for _ in 0..3 {
        let err = f
            .pipeline
            .submit(request("abc", "Troll", "first!"), caller("198.51.100.7"))
            .await
            .expect_err("blocked");
        assert!(matches!(err, SubmitError::Blocked));
    }

    // The same caller still has their single rate-limit slot.
    assert!(f
        .pipeline
        .submit(request("abc", "Reader", "Great piece."), caller("198.51.100.7"))
        .await
        .is_ok());
}

#[tokio::test]
async fn rate_limit_rejects_after_ceiling() {
    let f = fixture(CommentsConfig {
        rate_limit: RateLimitConfig { ceiling: 2, window_seconds: 600 },
        ..CommentsConfig::default()
    });

    for _ in 0..2 {
        assert!(f
            .pipeline
            .submit(request("abc", "Reader", "Great piece."), caller("198.51.100.7"))
            .await
            .is_ok());
    }
    let err = f
        .pipeline
        .submit(request("abc", "Reader", "Great piece."), caller("198.51.100.7"))
        .await
        .expect_err("over ceiling");
    assert!(matches!(err, SubmitError::RateLimited));

    // A different caller is unaffected.
    assert!(f
        .pipeline
        .submit(request("abc", "Reader", "Great piece."), caller("203.0.113.9"))
        .await
        .is_ok());
}

#[tokio::test]
async fn sid_token_keys_the_limiter_when_no_address_resolves() {
    let f = fixture(CommentsConfig {
        rate_limit: RateLimitConfig { ceiling: 1, window_seconds: 600 },
        ..CommentsConfig::default()
    });

    let mut req = request("abc", "Reader", "Great piece.");
    req.sid = Some("session-1".to_string());
    assert!(f.pipeline.submit(req.clone(), None).await.is_ok());
    let err = f.pipeline.submit(req, None).await.expect_err("same sid over ceiling");
    assert!(matches!(err, SubmitError::RateLimited));

    let mut other = request("abc", "Reader", "Great piece.");
    other.sid = Some("session-2".to_string());
    assert!(f.pipeline.submit(other, None).await.is_ok());
}

#[tokio::test]
async fn script_tags_are_neutralized_before_persistence() {
    let f = default_fixture();

    f.pipeline
        .submit(
            request("abc", "Reader", "look <script>alert(1)</script>"),
            caller("198.51.100.7"),
        )
        .await
        .expect("valid comment");

    let stored = f.comments.for_post("abc");
    assert_eq!(stored[0].content, "look &lt;script>alert(1)&lt;/script>");
}

#[tokio::test]
async fn persistence_failure_is_surfaced() {
    let f = default_fixture();
    f.comments.set_failing(true);

    let err = f
        .pipeline
        .submit(request("abc", "Reader", "Great piece."), caller("198.51.100.7"))
        .await
        .expect_err("storage failure must not be swallowed");
    assert!(matches!(err, SubmitError::Storage(_)));
}
