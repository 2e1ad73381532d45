//! Comment records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Moderation state of a stored comment. Transitions after creation belong
/// to the admin tooling, not this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationStatus {
    Published,
    Pending,
    Hidden,
}

/// A stored comment. Immutable once created except for moderation
/// transitions. The moderation and abuse-hash fields never leave the
/// server.
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: String,
    pub display_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub status: ModerationStatus,
    /// Cleared by moderators for submissions judged automated. Not
    /// exposed publicly in any form.
    pub genuine: bool,
    pub ip_hash: Option<String>,
    pub email_hash: Option<String>,
}

/// Public-safe projection returned to the submitting client.
#[derive(Debug, Clone, Serialize)]
pub struct PublicComment {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub content: String,
    /// Unix milliseconds.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl From<&CommentRecord> for PublicComment {
    fn from(record: &CommentRecord) -> Self {
        Self {
            id: record.id.to_string(),
            display_name: record.display_name.clone(),
            content: record.content.clone(),
            created_at: record.created_at.timestamp_millis(),
        }
    }
}
