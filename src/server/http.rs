//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::blobs::BlobStoreManager;
use crate::cache::{self, HashCache};
use crate::collector::FeeScheduler;
use crate::config::Args;
use crate::db::MongoClient;
use crate::keys::SponsorIdentity;
use crate::routes;
use crate::types::TollgateError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub started_at: Instant,
    /// Present outside dev mode; dev mode runs on in-memory stores
    pub mongo: Option<MongoClient>,
    pub sponsor: Arc<SponsorIdentity>,
    pub scheduler: Arc<FeeScheduler>,
    pub blobs: Arc<BlobStoreManager>,
    pub cache: Arc<HashCache>,
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), TollgateError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Tollgate listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - using in-memory stores");
    }

    // Start hash cache cleanup task
    cache::spawn_cleanup_task(Arc::clone(&state.cache));
    info!(
        "Hash cache enabled (ttl {}s)",
        state.cache.config().ttl.as_secs()
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route a request to its handler
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|q| q.to_string());

    debug!(%method, %path, %addr, "Incoming request");

    let response = match (method, path.as_str()) {
        // ====================================================================
        // Health and observability
        // ====================================================================
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(state).await
        }
        (Method::GET, "/version") => routes::version_info(),
        (Method::GET, "/status") => routes::status_check(state).await,

        // ====================================================================
        // Agent database blobs
        // ====================================================================
        (Method::POST, "/upload") => routes::handle_upload(req, state).await,
        (Method::GET, "/retrieve") => routes::handle_retrieve(query.as_deref(), state).await,

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        _ => routes::error_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}
