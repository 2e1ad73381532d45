//! Persistence seams for the comment pipeline.
//!
//! The CMS owns comments and content; the pipeline only needs a way to
//! append a record and a way to check that a post is publicly visible.
//! The in-memory implementations back the test suite and the standalone
//! binary; production wires these traits to the CMS database.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use ahash::AHashSet;

use super::record::CommentRecord;
use crate::error::{CollectorError, Result};

pub trait CommentStore: Send + Sync + 'static {
    /// Append a comment. This is the one step of the pipeline whose
    /// backend failure is surfaced to the caller.
    fn create(&self, record: CommentRecord) -> impl Future<Output = Result<()>> + Send;
}

pub trait PostDirectory: Send + Sync + 'static {
    /// Whether `post_id` refers to an existing, publicly visible entity.
    fn is_published(&self, post_id: &str) -> impl Future<Output = Result<bool>> + Send;
}

#[derive(Default)]
pub struct MemoryCommentStore {
    comments: Mutex<Vec<CommentRecord>>,
    failing: AtomicBool,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, `create` fails until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.comments.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn for_post(&self, post_id: &str) -> Vec<CommentRecord> {
        self.comments
            .lock()
            .map(|c| c.iter().filter(|r| r.post_id == post_id).cloned().collect())
            .unwrap_or_default()
    }
}

impl CommentStore for MemoryCommentStore {
    fn create(&self, record: CommentRecord) -> impl Future<Output = Result<()>> + Send {
        let result = if self.failing.load(Ordering::Relaxed) {
            Err(CollectorError::Store("injected comment store failure".to_string()))
        } else {
            self.comments
                .lock()
                .map(|mut comments| comments.push(record))
                .map_err(|_| CollectorError::Store("comment store lock poisoned".to_string()))
        };
        async move { result }
    }
}

/// Post directory backed by a set of published ids, or allowing everything
/// when the collector runs without a CMS connection.
pub struct StaticPostDirectory {
    published: RwLock<AHashSet<String>>,
    allow_all: bool,
}

impl StaticPostDirectory {
    pub fn with_published<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            published: RwLock::new(ids.into_iter().map(Into::into).collect()),
            allow_all: false,
        }
    }

    /// Treat every non-empty id as published.
    pub fn allow_all() -> Self {
        Self { published: RwLock::new(AHashSet::new()), allow_all: true }
    }

    pub fn publish(&self, post_id: impl Into<String>) {
        if let Ok(mut published) = self.published.write() {
            published.insert(post_id.into());
        }
    }
}

impl PostDirectory for StaticPostDirectory {
    fn is_published(&self, post_id: &str) -> impl Future<Output = Result<bool>> + Send {
        let result = if self.allow_all {
            Ok(true)
        } else {
            self.published
                .read()
                .map(|published| published.contains(post_id))
                .map_err(|_| CollectorError::Store("post directory lock poisoned".to_string()))
        };
        async move { result }
    }
}
