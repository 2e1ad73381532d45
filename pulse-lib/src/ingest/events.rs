//! Transient ingestion events.
//!
//! These are consumed into counter writes within the request that carried
//! them and are never persisted as records.

use std::net::IpAddr;

/// Upper clamp on a single read-time ping, in milliseconds (5 minutes).
/// Bounds the damage of a malicious or buggy client sending one huge value.
pub const READ_TIME_CLAMP_MS: i64 = 300_000;

/// One pageview as reported by a client.
#[derive(Debug, Clone)]
pub struct ViewEvent {
    pub entity_id: String,
    /// Raw locale from the wire; normalized by the gateway.
    pub locale: Option<String>,
    pub category: Option<String>,
    /// Two-letter country code resolved at the edge, if any.
    pub country: Option<String>,
    /// Caller network address; hashed into a fingerprint and dropped
    /// within the same call.
    pub caller_addr: Option<IpAddr>,
    /// Client-supplied session token, fingerprint input of last resort.
    pub sid: Option<String>,
}

/// Accumulated read time reported by a client heartbeat.
#[derive(Debug, Clone)]
pub struct ReadTimeEvent {
    pub entity_id: String,
    pub locale: Option<String>,
    pub category: Option<String>,
    pub elapsed_ms: i64,
}

/// Clamp a reported read time to `[0, READ_TIME_CLAMP_MS]`.
pub fn clamp_read_time(ms: i64) -> i64 {
    ms.clamp(0, READ_TIME_CLAMP_MS)
}
