//! Status endpoint: scheduler counters and hash cache statistics.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::cache::CacheStatsSnapshot;
use crate::collector::SchedulerStatus;
use crate::routes::json_response;
use crate::server::AppState;

#[derive(Serialize)]
struct StatusResponse {
    node_id: String,
    mode: &'static str,
    scheduler: SchedulerStatus,
    cache: CacheSection,
    /// Sponsor public key (base64), for cross-checking against the ledger
    sponsor_public_key: String,
    storage_url: String,
    ledger_url: String,
}

#[derive(Serialize)]
struct CacheSection {
    entries: usize,
    ttl_secs: u64,
    stats: CacheStatsSnapshot,
}

/// Handle GET /status
pub async fn status_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = StatusResponse {
        node_id: state.args.node_id.to_string(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        scheduler: state.scheduler.status(),
        cache: CacheSection {
            entries: state.cache.len(),
            ttl_secs: state.cache.config().ttl.as_secs(),
            stats: state.cache.stats(),
        },
        sponsor_public_key: state.sponsor.public_key_base64(),
        storage_url: state.args.storage_url.clone(),
        ledger_url: state.args.ledger_url.clone(),
    };

    json_response(StatusCode::OK, &response)
}
