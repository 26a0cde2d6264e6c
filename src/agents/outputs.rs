//! Structured outputs the agents ask models for

use crate::llm::generate::StructuredOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Longest subject line an email draft may carry
pub const MAX_SUBJECT_LEN: usize = 30;

/// Messaging strategy for a qualified prospect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MessagingAnalysis {
    /// The main hook tailored to the prospect
    pub primary_messaging: String,
    #[schemars(length(min = 3, max = 3))]
    pub key_focus_points: Vec<String>,
    #[schemars(length(min = 3, max = 3))]
    pub pain_points: Vec<String>,
}

impl StructuredOutput for MessagingAnalysis {
    const SCHEMA_NAME: &'static str = "messaging_analysis";

    fn validate(&self) -> Result<(), String> {
        if self.key_focus_points.len() != 3 || self.pain_points.len() != 3 {
            return Err("key_focus_points and pain_points must have exactly 3 entries".to_string());
        }
        Ok(())
    }
}

/// First-touch outreach email, split into its parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmailDraft {
    /// Always lowercase
    #[schemars(length(max = 30))]
    pub subject: String,
    pub opening: String,
    pub value_prop: String,
    pub cta: String,
    pub ps: String,
}

impl StructuredOutput for EmailDraft {
    const SCHEMA_NAME: &'static str = "email_draft";

    fn normalize(&mut self) {
        self.subject = self.subject.to_lowercase();
    }

    fn validate(&self) -> Result<(), String> {
        let len = self.subject.chars().count();
        if len > MAX_SUBJECT_LEN {
            return Err(format!(
                "subject is {len} characters, at most {MAX_SUBJECT_LEN} allowed"
            ));
        }
        Ok(())
    }
}

/// Fit paragraph merged with the messaging strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitAnalysis {
    pub fit: String,
    #[serde(flatten)]
    pub analysis: MessagingAnalysis,
}
