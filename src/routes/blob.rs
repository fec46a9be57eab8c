//! Agent database blob endpoints.
//!
//! - `POST /upload` - raw blob body plus an `X-Agent-Id` header; stores the
//!   blob content-addressed and repoints the agent at the new hash
//! - `GET /retrieve?agent_id=...` - resolves the agent's current content hash

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::routes::{error_response, json_response};
use crate::server::AppState;

/// Agent ids are opaque but bounded: non-empty, printable, no whitespace
const MAX_AGENT_ID_LEN: usize = 128;

fn validate_agent_id(agent_id: &str) -> Result<(), &'static str> {
    if agent_id.is_empty() {
        return Err("Agent id must not be empty");
    }
    if agent_id.len() > MAX_AGENT_ID_LEN {
        return Err("Agent id too long");
    }
    if !agent_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
    {
        return Err("Agent id contains invalid characters");
    }
    Ok(())
}

/// Handle POST /upload
pub async fn handle_upload(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let agent_id = match req.headers().get("X-Agent-Id") {
        Some(h) => match h.to_str() {
            Ok(s) => s.to_string(),
            Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid X-Agent-Id header"),
        },
        None => return error_response(StatusCode::BAD_REQUEST, "Missing X-Agent-Id header"),
    };

    if let Err(msg) = validate_agent_id(&agent_id) {
        return error_response(StatusCode::BAD_REQUEST, msg);
    }

    // Reject oversized uploads before buffering when the client declares a length
    let max_bytes = state.args.max_blob_bytes;
    if let Some(declared) = req
        .headers()
        .get("Content-Length")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
    {
        if declared > max_bytes {
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Blob exceeds maximum size");
        }
    }

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(agent = %agent_id, error = %e, "Failed to read blob body");
            return error_response(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };

    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Blob body must not be empty");
    }
    if body.len() > max_bytes {
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Blob exceeds maximum size");
    }

    debug!(agent = %agent_id, size = body.len(), "Processing blob upload");

    match state.blobs.upload(&agent_id, &body).await {
        Ok(receipt) => json_response(StatusCode::OK, &receipt),
        Err(e) => {
            warn!(agent = %agent_id, error = %e, "Blob upload failed");
            error_response(StatusCode::BAD_GATEWAY, "Failed to store blob")
        }
    }
}

/// Handle GET /retrieve?agent_id=...
pub async fn handle_retrieve(query: Option<&str>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let agent_id = match query.and_then(|q| {
        q.split('&')
            .find_map(|pair| pair.strip_prefix("agent_id="))
            .filter(|v| !v.is_empty())
    }) {
        Some(id) => id.to_string(),
        None => {
            return error_response(StatusCode::BAD_REQUEST, "Missing agent_id query parameter")
        }
    };

    if let Err(msg) = validate_agent_id(&agent_id) {
        return error_response(StatusCode::BAD_REQUEST, msg);
    }

    match state.blobs.retrieve(&agent_id).await {
        Ok(Some(hash)) => json_response(
            StatusCode::OK,
            &serde_json::json!({
                "agent_id": agent_id,
                "hash": hash,
            }),
        ),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No blob stored for this agent"),
        Err(e) => {
            warn!(agent = %agent_id, error = %e, "Blob retrieval failed");
            error_response(StatusCode::BAD_GATEWAY, "Failed to resolve blob pointer")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_validation() {
        assert!(validate_agent_id("agent-1").is_ok());
        assert!(validate_agent_id("did:agent:0xabc.1").is_ok());

        assert!(validate_agent_id("").is_err());
        assert!(validate_agent_id("has space").is_err());
        assert!(validate_agent_id("semi;colon").is_err());
        assert!(validate_agent_id(&"x".repeat(200)).is_err());
    }
}
