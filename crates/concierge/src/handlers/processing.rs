use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ConciergeError;
use super::request::parse_json;
use crate::app_state::AppState;
use crate::processors::Postprocessed;

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub tool_results: Vec<Value>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CheckResponse {
    pub final_response: Option<String>,
}

/// A rejected draft comes back as `NeedsRegeneration` carrying the stage and
/// the instruction for the next draft.
pub fn handle_postprocess(body: &Bytes, state: &AppState) -> Result<TextResponse, ConciergeError> {
    let request: TextRequest = parse_json(body)?;
    match state.output_pipeline.postprocess(&request.text) {
        Postprocessed::Ready(text) => Ok(TextResponse { text }),
        Postprocessed::NeedsRegeneration(request) => Err(ConciergeError::NeedsRegeneration {
            request,
            max_retries: state.config.agent.max_retries,
        }),
    }
}

pub fn handle_preprocess(body: &Bytes, state: &AppState) -> Result<TextResponse, ConciergeError> {
    let request: TextRequest = parse_json(body)?;
    Ok(TextResponse {
        text: state.input_pipeline.preprocess(&request.text),
    })
}

pub fn handle_check(body: &Bytes, state: &AppState) -> Result<CheckResponse, ConciergeError> {
    let request: CheckRequest = parse_json(body)?;
    Ok(CheckResponse {
        final_response: state.checker.run(&request.tool_results),
    })
}
