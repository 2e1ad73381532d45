//! Endpoint handlers.
//!
//! Bodies are parsed permissively: malformed JSON is treated as an empty
//! object so the only hard validation failures are the documented ones
//! (missing ids, bad lengths). Caller addresses come from the first
//! X-Forwarded-For hop when present, otherwise the socket peer; the edge
//! resolves geolocation into the `x-country-code` header.

use std::net::{IpAddr, SocketAddr};

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::comments::store::{CommentStore, PostDirectory};
use crate::comments::{CommentRequest, SubmitError, SubmitOutcome};
use crate::ingest::events::{ReadTimeEvent, ViewEvent};
use crate::store::CounterStore;

use super::response::{error_response, json_response, ok_response, RespBody};
use super::server::AppState;

const COUNTRY_HEADER: &str = "x-country-code";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PageviewBody {
    post_id: String,
    locale: Option<String>,
    category: Option<String>,
    sid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReadTimeBody {
    post_id: String,
    locale: Option<String>,
    category: Option<String>,
    ms: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CommentBody {
    post_id: String,
    display_name: String,
    content: String,
    email: Option<String>,
    sid: Option<String>,
    honeypot: Option<String>,
}

/// First X-Forwarded-For hop if parseable, else the socket peer.
fn client_addr(headers: &http::HeaderMap, peer: SocketAddr) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff) = xff.to_str() {
            if let Some(first) = xff.split(',').next() {
                if let Ok(addr) = first.trim().parse::<IpAddr>() {
                    return Some(addr);
                }
            }
        }
    }
    Some(peer.ip())
}

fn country(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get(COUNTRY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Malformed JSON is not a caller-visible failure; it parses as an empty
/// object and falls through to field validation.
async fn read_body<T: Default + for<'de> Deserialize<'de>>(req: Request<Incoming>) -> (T, http::HeaderMap) {
    let (parts, body) = req.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => {
            debug!(%error, "failed to read request body");
            return (T::default(), parts.headers);
        }
    };
    let parsed = serde_json::from_slice(&bytes).unwrap_or_default();
    (parsed, parts.headers)
}

pub(crate) async fn pageview<S, C, P>(
    state: &AppState<S, C, P>,
    req: Request<Incoming>,
    peer: SocketAddr,
) -> Response<RespBody>
where
    S: CounterStore,
    C: CommentStore,
    P: PostDirectory,
{
    let (body, headers) = read_body::<PageviewBody>(req).await;

    let event = ViewEvent {
        entity_id: body.post_id,
        locale: body.locale,
        category: body.category,
        country: country(&headers),
        caller_addr: client_addr(&headers, peer),
        sid: body.sid,
    };

    match state.gateway.record_view(event).await {
        Ok(()) => ok_response(),
        Err(error) => error_response(StatusCode::BAD_REQUEST, &error.to_string()),
    }
}

pub(crate) async fn read_time<S, C, P>(
    state: &AppState<S, C, P>,
    req: Request<Incoming>,
    _peer: SocketAddr,
) -> Response<RespBody>
where
    S: CounterStore,
    C: CommentStore,
    P: PostDirectory,
{
    let (body, _headers) = read_body::<ReadTimeBody>(req).await;

    let event = ReadTimeEvent {
        entity_id: body.post_id,
        locale: body.locale,
        category: body.category,
        elapsed_ms: body.ms,
    };

    match state.gateway.record_read_time(event).await {
        Ok(()) => ok_response(),
        Err(error) => error_response(StatusCode::BAD_REQUEST, &error.to_string()),
    }
}

pub(crate) async fn comment<S, C, P>(
    state: &AppState<S, C, P>,
    req: Request<Incoming>,
    peer: SocketAddr,
) -> Response<RespBody>
where
    S: CounterStore,
    C: CommentStore,
    P: PostDirectory,
{
    let (body, headers) = read_body::<CommentBody>(req).await;
    let caller = client_addr(&headers, peer);

    let request = CommentRequest {
        post_id: body.post_id,
        display_name: body.display_name,
        content: body.content,
        email: body.email,
        sid: body.sid,
        honeypot: body.honeypot,
    };

    match state.comments.submit(request, caller).await {
        Ok(SubmitOutcome::Accepted(comment)) => {
            json_response(StatusCode::OK, &json!({"ok": true, "item": comment}))
        }
        Ok(SubmitOutcome::Ignored) => {
            json_response(StatusCode::OK, &json!({"ok": true, "ignored": true}))
        }
        Err(error) => {
            let status = match &error {
                SubmitError::Invalid(_) | SubmitError::UnknownPost => StatusCode::BAD_REQUEST,
                SubmitError::Blocked => StatusCode::FORBIDDEN,
                SubmitError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                SubmitError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, &error.to_string())
        }
    }
}

pub(crate) fn health() -> Response<RespBody> {
    json_response(StatusCode::OK, &json!({"status": "healthy"}))
}
