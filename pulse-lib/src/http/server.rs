//! HTTP server for the collector endpoints.
//!
//! One listener, three POST endpoints, plus `/health`. Connections are
//! served with hyper's auto builder (h1/h2); handlers hold no in-process
//! state between calls, so any number of instances can run side by side
//! behind the edge.

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::comments::store::{CommentStore, PostDirectory};
use crate::comments::CommentPipeline;
use crate::config::Config;
use crate::error::Result;
use crate::ingest::Gateway;
use crate::store::CounterStore;
use crate::telemetry::Metrics;

use super::handlers;
use super::response::{not_found, RespBody};

/// Shared handles for the endpoint handlers. Cloning is cheap.
pub struct AppState<S, C, P> {
    pub gateway: Arc<Gateway<S>>,
    pub comments: Arc<CommentPipeline<S, C, P>>,
    pub metrics: Option<Arc<Metrics>>,
}

impl<S, C, P> Clone for AppState<S, C, P> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            comments: Arc::clone(&self.comments),
            metrics: self.metrics.clone(),
        }
    }
}

/// Bind the configured address and serve until SIGTERM or SIGINT.
pub async fn run<S, C, P>(config: &Config, state: AppState<S, C, P>) -> Result<()>
where
    S: CounterStore,
    C: CommentStore,
    P: PostDirectory,
{
    let listener = TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, "engagement collector listening");

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(crate::error::CollectorError::Io)?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .map_err(crate::error::CollectorError::Io)?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
            Ok(())
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
            Ok(())
        }
        result = serve(listener, state) => result,
    }
}

/// Accept loop. Separated from [`run`] so tests can drive an ephemeral
/// listener without signal handling.
pub async fn serve<S, C, P>(listener: TcpListener, state: AppState<S, C, P>) -> Result<()>
where
    S: CounterStore,
    C: CommentStore,
    P: PostDirectory,
{
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept error");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                let state = state.clone();
                async move { Ok::<_, hyper::Error>(route(req, peer, &state).await) }
            });

            let builder = ConnBuilder::new(TokioExecutor::new());
            if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                debug!(?peer, error = %e, "serve_connection error");
            }
        });
    }
}

async fn route<S, C, P>(
    req: Request<Incoming>,
    peer: SocketAddr,
    state: &AppState<S, C, P>,
) -> Response<RespBody>
where
    S: CounterStore,
    C: CommentStore,
    P: PostDirectory,
{
    let start = Instant::now();
    let (endpoint, response) = match (req.method(), req.uri().path()) {
        (&Method::POST, "/collect/view") => {
            ("pageview", handlers::pageview(state, req, peer).await)
        }
        (&Method::POST, "/collect/read") => {
            ("read_time", handlers::read_time(state, req, peer).await)
        }
        (&Method::POST, "/comments") => ("comment", handlers::comment(state, req, peer).await),
        (&Method::GET, "/health") => ("health", handlers::health()),
        _ => ("unmatched", not_found()),
    };

    if let Some(m) = &state.metrics {
        m.record_request(
            endpoint,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }
    response
}
