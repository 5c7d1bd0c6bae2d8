use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::Request;
use serde::de::DeserializeOwned;

use super::errors::ConciergeError;

/// Extract request ID from incoming request headers, or generate a new UUID v4.
pub fn extract_request_id<T>(request: &Request<T>) -> String {
    request
        .headers()
        .get(common::consts::REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub async fn read_body(request: Request<Incoming>) -> Result<Bytes, ConciergeError> {
    request
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| ConciergeError::InvalidRequest(format!("failed to read request body: {e}")))
}

pub fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ConciergeError> {
    Ok(serde_json::from_slice(body)?)
}
