//! Welcome descriptors: static onboarding metadata per agent

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Greeting plus example requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Welcome {
    pub welcome: String,
    pub prompts: Vec<ExamplePrompt>,
}

/// One sample request body and its content type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamplePrompt {
    pub data: Value,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

impl ExamplePrompt {
    pub fn json(data: Value) -> Self {
        Self {
            data,
            content_type: "application/json".to_string(),
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self {
            data: Value::String(data.into()),
            content_type: "text/plain".to_string(),
        }
    }

    /// The example as a raw request body
    pub fn body(&self) -> Vec<u8> {
        match &self.data {
            Value::String(text) if self.content_type.starts_with("text/") => {
                text.clone().into_bytes()
            }
            other => other.to_string().into_bytes(),
        }
    }
}
