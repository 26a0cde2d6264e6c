//! The SDR agents: prompts, input shapes, output shapes and welcome data
//!
//! Each agent is an [`SdrAgent`](crate::agent::pipeline::SdrAgent) run by the
//! shared [`AgentPipeline`](crate::agent::pipeline::AgentPipeline).

pub mod analysis;
pub mod catalog;
pub mod email;
pub mod outputs;
pub mod raw;
mod samples;
pub mod summary_email;
pub mod template;

pub use analysis::FitAnalysisAgent;
pub use catalog::{AgentCatalog, AgentInfo};
pub use email::AnalysisEmailAgent;
pub use outputs::{EmailDraft, FitAnalysis, MessagingAnalysis, MAX_SUBJECT_LEN};
pub use raw::RawTemplateAgent;
pub use summary_email::SummaryEmailAgent;
pub use template::TemplateEmailAgent;

use crate::llm::registry::ModelSpec;

/// Every agent id the service knows, in catalog order
pub const AGENT_IDS: &[&str] = &[
    analysis::AGENT_ID,
    email::AGENT_ID,
    summary_email::AGENT_ID,
    template::AGENT_ID,
    raw::AGENT_ID,
];

/// Model used for fit classification with web search
pub fn default_classify_model() -> ModelSpec {
    ModelSpec::new("openai", "gpt-4o-mini")
}

/// Model used for every other generation call
pub fn default_model() -> ModelSpec {
    ModelSpec::new("groq", "llama-3.3-70b-versatile")
}
