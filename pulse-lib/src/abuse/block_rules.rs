//! Block rules for comment intake.
//!
//! Rules match a caller's salted IP hash, salted email hash, or
//! case-folded nickname. Raw addresses and emails are never stored; the
//! admin layer derives matching hashes with the same salt. The rule set is
//! small and changes rarely, so it lives in process and is replaced
//! wholesale when the admin layer pushes an update.

use chrono::{DateTime, Utc};
use std::sync::RwLock;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRuleKind {
    Ip,
    Email,
    Nick,
}

#[derive(Debug, Clone)]
pub struct BlockRule {
    pub kind: BlockRuleKind,
    /// Salted hash for ip/email rules, case-folded value for nick rules.
    pub value: String,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BlockRule {
    /// A rule has effect only while its flag is set and it has not expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.map_or(true, |deadline| deadline > now)
    }

    fn matches(&self, ip_hash: Option<&str>, email_hash: Option<&str>, nick: &str) -> bool {
        match self.kind {
            BlockRuleKind::Ip => ip_hash == Some(self.value.as_str()),
            BlockRuleKind::Email => email_hash == Some(self.value.as_str()),
            // Case-fold the stored value too, so rules entered in any case
            // match.
            BlockRuleKind::Nick => normalize_nickname(&self.value) == nick,
        }
    }
}

/// Case-fold a nickname the way nick rules store them.
pub fn normalize_nickname(nick: &str) -> String {
    nick.trim().to_lowercase()
}

/// The active rule set.
#[derive(Default)]
pub struct BlockList {
    rules: RwLock<Vec<BlockRule>>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly loaded rule set.
    pub fn replace(&self, rules: Vec<BlockRule>) {
        match self.rules.write() {
            Ok(mut guard) => *guard = rules,
            Err(_) => warn!("block list lock poisoned, rules not replaced"),
        }
    }

    pub fn push(&self, rule: BlockRule) {
        match self.rules.write() {
            Ok(mut guard) => guard.push(rule),
            Err(_) => warn!("block list lock poisoned, rule not added"),
        }
    }

    /// Whether any active rule matches the caller. An empty rule set
    /// blocks no one.
    pub fn is_blocked(
        &self,
        ip_hash: Option<&str>,
        email_hash: Option<&str>,
        nickname: &str,
    ) -> bool {
        let nick = normalize_nickname(nickname);
        let now = Utc::now();
        let rules = match self.rules.read() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("block list lock poisoned");
                return false;
            }
        };
        rules
            .iter()
            .any(|rule| rule.is_active(now) && rule.matches(ip_hash, email_hash, &nick))
    }
}
