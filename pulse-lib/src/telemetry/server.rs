use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Start the observability server that handles metrics and health checks.
/// Runs on a dedicated port and serves:
/// - `/metrics` - Prometheus metrics
/// - `/health` - Health check endpoint
/// - `/live` - Liveness check endpoint
///
/// Lifetime is owned by the caller: the returned future runs until the
/// task driving it is dropped.
pub async fn start_observability_server(
    port: u16,
    registry: Registry,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = Arc::new(registry);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(?addr, "Observability server started (metrics + health checks)");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Observability server: accept error");
                continue;
            }
        };

        let registry = registry.clone();
        tokio::spawn(async move {
            let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                let registry = registry.clone();
                async move {
                    let response = match req.uri().path() {
                        "/health" => json_ok(&json!({"status": "healthy"})),
                        "/live" => json_ok(&json!({"status": "alive"})),
                        "/metrics" => metrics_response(&registry),
                        _ => not_found(),
                    };
                    Ok::<_, hyper::Error>(response)
                }
            });

            let builder = ConnBuilder::new(TokioExecutor::new());
            if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                warn!(?peer, error = %e, "Observability server: serve_connection error");
            }
        });
    }
}

fn body_from(bytes: Vec<u8>) -> RespBody {
    Full::new(Bytes::from(bytes))
        .map_err(|never| match never {})
        .boxed()
}

fn json_ok(value: &serde_json::Value) -> Response<RespBody> {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let mut resp = Response::new(body_from(bytes));
    resp.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    resp
}

fn not_found() -> Response<RespBody> {
    let mut resp = Response::new(body_from(b"Not Found".to_vec()));
    *resp.status_mut() = StatusCode::NOT_FOUND;
    resp
}

fn metrics_response(registry: &Registry) -> Response<RespBody> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        let mut resp = Response::new(body_from(b"Internal Server Error".to_vec()));
        *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return resp;
    }

    let mut resp = Response::new(body_from(buffer));
    if let Ok(content_type) = hyper::header::HeaderValue::from_str(encoder.format_type()) {
        resp.headers_mut()
            .insert(hyper::header::CONTENT_TYPE, content_type);
    }
    resp
}
