use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{Error as HyperError, Response, StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::processors::RegenerationRequest;

#[derive(Debug, Error)]
pub enum ConciergeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// `max_retries` is the configured draft budget the caller should bound
    /// its regeneration loop with.
    #[error("Draft needs regeneration: {}", request.reason)]
    NeedsRegeneration {
        request: RegenerationRequest,
        max_retries: u32,
    },

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl ConciergeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ConciergeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ConciergeError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ConciergeError::NeedsRegeneration { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ConciergeError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ConciergeError::InvalidRequest(_) => "InvalidRequest",
            ConciergeError::SessionNotFound(_) => "SessionNotFound",
            ConciergeError::NeedsRegeneration { .. } => "NeedsRegeneration",
            ConciergeError::InternalServerError(_) => "InternalServerError",
        }
    }

    pub fn body_json(&self) -> serde_json::Value {
        let details = match self {
            ConciergeError::InvalidRequest(reason) | ConciergeError::InternalServerError(reason) => {
                json!({ "reason": reason })
            }
            ConciergeError::SessionNotFound(session_id) => json!({ "session_id": session_id }),
            ConciergeError::NeedsRegeneration {
                request,
                max_retries,
            } => json!({
                "stage": request.stage,
                "reason": request.reason,
                "max_retries": max_retries,
            }),
        };

        json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "details": details
            }
        })
    }

    pub fn into_response(self) -> Response<BoxBody<Bytes, HyperError>> {
        let body = Full::new(Bytes::from(self.body_json().to_string()))
            .map_err(|never| match never {})
            .boxed();

        Response::builder()
            .status(self.status())
            .header("content-type", "application/json")
            .body(body)
            .unwrap_or_else(|_| {
                Response::new(
                    Full::new(Bytes::from("Internal Error"))
                        .map_err(|never| match never {})
                        .boxed(),
                )
            })
    }
}

impl From<serde_json::Error> for ConciergeError {
    fn from(err: serde_json::Error) -> Self {
        ConciergeError::InvalidRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ConciergeError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ConciergeError::SessionNotFound("s".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ConciergeError::NeedsRegeneration {
                request: RegenerationRequest::new("markdown", "fix it"),
                max_retries: 3,
            }
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ConciergeError::InternalServerError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_regeneration_body() {
        let body = ConciergeError::NeedsRegeneration {
            request: RegenerationRequest::new("url_validation", "Found 1 invalid URLs"),
            max_retries: 2,
        }
        .body_json();
        assert_eq!(body["error"]["code"], "NeedsRegeneration");
        assert_eq!(
            body["error"]["message"],
            "Draft needs regeneration: Found 1 invalid URLs"
        );
        assert_eq!(body["error"]["details"]["stage"], "url_validation");
        assert_eq!(body["error"]["details"]["reason"], "Found 1 invalid URLs");
        assert_eq!(body["error"]["details"]["max_retries"], 2);
    }

    #[test]
    fn test_response_headers() {
        let response = ConciergeError::InvalidRequest("bad json".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
