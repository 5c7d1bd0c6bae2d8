use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::ConciergeError;
use super::request::parse_json;
use crate::signals::{self, Sentiment};

#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SentimentResponse {
    pub sentiment: Sentiment,
}

pub fn handle_sentiment(body: &Bytes) -> Result<SentimentResponse, ConciergeError> {
    let request: SentimentRequest = parse_json(body)?;
    let sentiment = signals::analyze(&request.message);
    debug!(sentiment = %sentiment, "sentiment analyzed");
    Ok(SentimentResponse { sentiment })
}
