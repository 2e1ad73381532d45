//! Comment intake pipeline.
//!
//! Every submission walks the same gates in order: shape validation,
//! honeypot, referential check, block rules, rate limit, sanitization,
//! persistence. The honeypot path reports success without persisting so
//! automated abuse cannot tell it was caught. Persistence is the only
//! step whose backend failure reaches the caller; everything upstream of
//! it either rejects with an explicit status or proceeds.

pub mod record;
pub mod sanitize;
pub mod store;

use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::abuse::{BlockList, FixedWindowLimiter};
use crate::config::CommentsConfig;
use crate::error::CollectorError;
use crate::ingest::fingerprint::fingerprint;
use crate::store::CounterStore;
use crate::telemetry::Metrics;

use record::{CommentRecord, ModerationStatus, PublicComment};
use sanitize::neutralize_scripts;
use store::{CommentStore, PostDirectory};

/// Accepted display-name length, in characters, bounds inclusive.
pub const DISPLAY_NAME_LEN: RangeInclusive<usize> = 2..=40;
/// Accepted content length, in characters, bounds inclusive.
pub const CONTENT_LEN: RangeInclusive<usize> = 2..=2000;

/// One submission as it arrives off the wire.
#[derive(Debug, Clone, Default)]
pub struct CommentRequest {
    pub post_id: String,
    pub display_name: String,
    pub content: String,
    pub email: Option<String>,
    pub sid: Option<String>,
    /// Hidden anti-bot field; humans leave it empty.
    pub honeypot: Option<String>,
}

/// Terminal success states of a submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted(PublicComment),
    /// Honeypot tripped: reported as success, nothing stored.
    Ignored,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(&'static str),
    /// Deliberately vague so the existence of unpublished content does
    /// not leak.
    #[error("unknown or unavailable post")]
    UnknownPost,
    #[error("caller is blocked")]
    Blocked,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("comment could not be stored: {0}")]
    Storage(CollectorError),
}

pub struct CommentPipeline<S, C, P> {
    limiter: FixedWindowLimiter<S>,
    blocks: Arc<BlockList>,
    comments: Arc<C>,
    posts: Arc<P>,
    salt: String,
    auto_publish: bool,
    metrics: Option<Arc<Metrics>>,
}

impl<S, C, P> CommentPipeline<S, C, P>
where
    S: CounterStore,
    C: CommentStore,
    P: PostDirectory,
{
    pub fn new(
        limiter: FixedWindowLimiter<S>,
        blocks: Arc<BlockList>,
        comments: Arc<C>,
        posts: Arc<P>,
        config: &CommentsConfig,
        salt: String,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            limiter,
            blocks,
            comments,
            posts,
            salt,
            auto_publish: config.auto_publish,
            metrics,
        }
    }

    pub async fn submit(
        &self,
        request: CommentRequest,
        caller_addr: Option<IpAddr>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let post_id = request.post_id.trim();
        if post_id.is_empty() {
            return Err(self.rejected(SubmitError::Invalid("postId must not be empty")));
        }
        let display_name = request.display_name.trim();
        if !DISPLAY_NAME_LEN.contains(&display_name.chars().count()) {
            return Err(self.rejected(SubmitError::Invalid("displayName must be 2-40 characters")));
        }
        let content = request.content.trim();
        if !CONTENT_LEN.contains(&content.chars().count()) {
            return Err(self.rejected(SubmitError::Invalid("content must be 2-2000 characters")));
        }

        if request.honeypot.as_deref().is_some_and(|h| !h.trim().is_empty()) {
            if let Some(m) = &self.metrics {
                m.record_comment_ignored();
            }
            return Ok(SubmitOutcome::Ignored);
        }

        match self.posts.is_published(post_id).await {
            Ok(true) => {}
            Ok(false) => return Err(self.rejected(SubmitError::UnknownPost)),
            Err(error) => {
                // Availability over enforcement when the directory is down,
                // matching the ingestion side's handling of store outages.
                warn!(%error, "post directory unavailable, accepting without referential check");
            }
        }

        let ip_hash = caller_addr.map(|addr| fingerprint(&self.salt, &addr.to_string()));
        let email_hash = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| fingerprint(&self.salt, &e.to_lowercase()));

        if self
            .blocks
            .is_blocked(ip_hash.as_deref(), email_hash.as_deref(), display_name)
        {
            return Err(self.rejected(SubmitError::Blocked));
        }

        let limit_key = ip_hash.clone().or_else(|| {
            request
                .sid
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| fingerprint(&self.salt, s))
        });
        // Callers with neither an address nor a session token share one
        // bucket rather than bypassing the limiter.
        let limit_key = limit_key.unwrap_or_else(|| "anonymous".to_string());
        if !self.limiter.allow(&limit_key).await {
            return Err(self.rejected(SubmitError::RateLimited));
        }

        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id: post_id.to_string(),
            display_name: display_name.to_string(),
            content: neutralize_scripts(content),
            created_at: Utc::now(),
            status: if self.auto_publish {
                ModerationStatus::Published
            } else {
                ModerationStatus::Pending
            },
            genuine: true,
            ip_hash,
            email_hash,
        };
        let public = PublicComment::from(&record);

        self.comments
            .create(record)
            .await
            .map_err(|e| self.rejected(SubmitError::Storage(e)))?;

        if let Some(m) = &self.metrics {
            m.record_comment_accepted();
        }
        Ok(SubmitOutcome::Accepted(public))
    }

    fn rejected(&self, error: SubmitError) -> SubmitError {
        if let Some(m) = &self.metrics {
            let reason = match &error {
                SubmitError::Invalid(_) => "invalid",
                SubmitError::UnknownPost => "unknown_post",
                SubmitError::Blocked => "blocked",
                SubmitError::RateLimited => "rate_limited",
                SubmitError::Storage(_) => "storage",
            };
            m.record_comment_rejected(reason);
        }
        error
    }
}
