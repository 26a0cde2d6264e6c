//! Agent outputs, wire responses and pipeline bookkeeping

use crate::error::{AgentError, AgentResult, FAILURE_MESSAGE};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// What an agent produced, before it is turned into a response
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    Text(String),
    Json(Value),
    /// Negative fit classification; a success with nothing to say
    Rejected,
}

impl AgentOutput {
    /// Serialize a structured result into a JSON output
    pub fn json<T: Serialize>(value: &T) -> AgentResult<Self> {
        serde_json::to_value(value)
            .map(AgentOutput::Json)
            .map_err(|e| AgentError::internal_error(format!("Failed to serialize output: {e}")))
    }
}

/// Response body handed back to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    Text(String),
    Json(Value),
}

impl AgentResponse {
    /// The fixed failure response
    pub fn failure() -> Self {
        AgentResponse::Text(FAILURE_MESSAGE.to_string())
    }

    /// Empty success body
    pub fn empty() -> Self {
        AgentResponse::Text(String::new())
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AgentResponse::Text(_) => "text/plain; charset=utf-8",
            AgentResponse::Json(_) => "application/json",
        }
    }

    pub fn body(&self) -> String {
        match self {
            AgentResponse::Text(text) => text.clone(),
            AgentResponse::Json(value) => value.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AgentResponse::Text(text) if text == FAILURE_MESSAGE)
    }
}

impl From<AgentOutput> for AgentResponse {
    fn from(output: AgentOutput) -> Self {
        match output {
            AgentOutput::Text(text) => AgentResponse::Text(text),
            AgentOutput::Json(value) => AgentResponse::Json(value),
            AgentOutput::Rejected => AgentResponse::empty(),
        }
    }
}

/// States a request passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Validated,
    Stage1Invoked,
    Rejected,
    Stage2Invoked,
    Shaped,
    Returned,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Validated => "validated",
            PipelineStage::Stage1Invoked => "stage1_invoked",
            PipelineStage::Rejected => "rejected",
            PipelineStage::Stage2Invoked => "stage2_invoked",
            PipelineStage::Shaped => "shaped",
            PipelineStage::Returned => "returned",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    Completed,
    Rejected,
    Failed,
}

/// Full record of one request, for callers that need more than the body
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub request_id: Uuid,
    pub response: AgentResponse,
    pub outcome: PipelineOutcome,
    pub stages: Vec<PipelineStage>,
}

impl PipelineRun {
    /// Number of generation calls the request made
    pub fn generation_calls(&self) -> usize {
        self.stages
            .iter()
            .filter(|stage| {
                matches!(
                    stage,
                    PipelineStage::Stage1Invoked | PipelineStage::Stage2Invoked
                )
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejected_output_is_empty_success() {
        let response = AgentResponse::from(AgentOutput::Rejected);
        assert_eq!(response, AgentResponse::empty());
        assert_eq!(response.body(), "");
        assert!(!response.is_failure());
    }

    #[test]
    fn test_failure_response() {
        let response = AgentResponse::failure();
        assert!(response.is_failure());
        assert_eq!(
            response.body(),
            "Sorry, there was an error processing your request."
        );
        assert_eq!(response.content_type(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_json_response() {
        let response = AgentResponse::from(AgentOutput::Json(json!({"subject": "hi"})));
        assert_eq!(response.content_type(), "application/json");
        assert_eq!(response.body(), r#"{"subject":"hi"}"#);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::Stage1Invoked.to_string(), "stage1_invoked");
        assert_eq!(
            serde_json::to_value(PipelineStage::Stage2Invoked).unwrap(),
            "stage2_invoked"
        );
    }

    #[test]
    fn test_generation_call_count() {
        let run = PipelineRun {
            request_id: Uuid::new_v4(),
            response: AgentResponse::empty(),
            outcome: PipelineOutcome::Rejected,
            stages: vec![
                PipelineStage::Received,
                PipelineStage::Validated,
                PipelineStage::Stage1Invoked,
                PipelineStage::Rejected,
                PipelineStage::Shaped,
                PipelineStage::Returned,
            ],
        };
        assert_eq!(run.generation_calls(), 1);
    }
}
