use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::header::HeaderValue;
use hyper::{Response, StatusCode};
use serde::Serialize;

use errors::ConciergeError;

pub mod errors;
pub mod escalation;
pub mod processing;
pub mod request;
pub mod sentiment;
pub mod sessions;

pub type HandlerResponse = Response<BoxBody<Bytes, hyper::Error>>;

/// An empty HTTP body (used for 204 / 404 responses).
pub fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn status_response(status: StatusCode) -> HandlerResponse {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HandlerResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(full(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert("content-type", HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => ConciergeError::InternalServerError(format!("failed to serialize response: {e}"))
            .into_response(),
    }
}

/// 200 with the JSON body, or the error's own status and body.
pub fn respond<T: Serialize>(result: Result<T, ConciergeError>) -> HandlerResponse {
    match result {
        Ok(body) => json_response(StatusCode::OK, &body),
        Err(err) => err.into_response(),
    }
}
