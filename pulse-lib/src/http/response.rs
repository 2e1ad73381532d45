//! Response construction for the collector endpoints.

use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde_json::json;

pub(crate) type RespBody = BoxBody<Bytes, hyper::Error>;

/// Shared caches must never reuse a mutation response; the browser's
/// back/forward cache may. Deliberately not `no-store`.
const CACHE_DIRECTIVE: &str = "private, max-age=0, must-revalidate";

fn full(bytes: Vec<u8>) -> RespBody {
    Full::new(Bytes::from(bytes))
        .map_err(|never| match never {})
        .boxed()
}

/// Build a JSON response carrying the mutation cache directive. Falls back
/// to a bare 500 if serialization fails, which serde_json only does for
/// non-string map keys.
pub(crate) fn json_response(status: StatusCode, value: &serde_json::Value) -> Response<RespBody> {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(_) => {
            let mut resp = Response::new(full(Vec::new()));
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return resp;
        }
    };
    let mut resp = Response::new(full(bytes));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_DIRECTIVE));
    resp
}

pub(crate) fn ok_response() -> Response<RespBody> {
    json_response(StatusCode::OK, &json!({"ok": true}))
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response<RespBody> {
    json_response(status, &json!({"ok": false, "error": message}))
}

pub(crate) fn not_found() -> Response<RespBody> {
    error_response(StatusCode::NOT_FOUND, "not found")
}
