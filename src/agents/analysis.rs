//! Fit analysis: qualify a company, then plan the messaging for it

use crate::agent::pipeline::{is_rejection, GenerationContext, SdrAgent};
use crate::agent::prompt::{render_template, to_prompt_json};
use crate::agent::response::AgentOutput;
use crate::agent::welcome::{ExamplePrompt, Welcome};
use crate::agents::outputs::{FitAnalysis, MessagingAnalysis};
use crate::agents::{default_classify_model, default_model, samples};
use crate::config::AgentOverride;
use crate::error::AgentResult;
use crate::llm::generate::GenerationRequest;
use crate::llm::provider::{ProviderTool, SearchContextSize};
use crate::llm::registry::ModelSpec;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

pub const AGENT_ID: &str = "agent-sdr-analysis";

const FIT_PROMPT: &str = include_str!("prompts/fit.md");
const MESSAGING_PROMPT: &str = include_str!("prompts/messaging.md");

const WELCOME: &str = "Hi, I'm your AI SDR that specializes in qualifying companies for Agentuity. You can send me a JSON object containing information about a company and I'll determine if they're a good prospect and tell you why.";

/// Qualifies a company with a web-search-backed classification and, for
/// qualified prospects, produces a messaging strategy
#[derive(Debug, Clone)]
pub struct FitAnalysisAgent {
    classify_model: ModelSpec,
    model: ModelSpec,
}

impl FitAnalysisAgent {
    pub fn new(classify_model: ModelSpec, model: ModelSpec) -> Self {
        Self {
            classify_model,
            model,
        }
    }

    pub fn from_override(overrides: &AgentOverride) -> Self {
        Self::new(
            overrides
                .classify_model
                .clone()
                .unwrap_or_else(default_classify_model),
            overrides.model.clone().unwrap_or_else(default_model),
        )
    }

    pub fn classify_model(&self) -> &ModelSpec {
        &self.classify_model
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }
}

impl Default for FitAnalysisAgent {
    fn default() -> Self {
        Self::new(default_classify_model(), default_model())
    }
}

#[async_trait]
impl SdrAgent for FitAnalysisAgent {
    type Input = Map<String, Value>;

    fn id(&self) -> &'static str {
        AGENT_ID
    }

    fn description(&self) -> &'static str {
        "Qualifies a company as an Agentuity prospect and plans the outreach messaging"
    }

    fn welcome(&self) -> Welcome {
        Welcome {
            welcome: WELCOME.to_string(),
            prompts: vec![
                ExamplePrompt::json(samples::cyan_company()),
                ExamplePrompt::json(samples::bakery_company()),
            ],
        }
    }

    async fn run(
        &self,
        company: Map<String, Value>,
        ctx: &mut GenerationContext,
    ) -> AgentResult<AgentOutput> {
        let company = to_prompt_json(&company);

        let fit_request = GenerationRequest::new(
            self.classify_model.clone(),
            render_template(FIT_PROMPT, &[("company", &company)]),
        )
        .with_required_tool(ProviderTool::WebSearchPreview {
            search_context_size: SearchContextSize::Low,
        });
        let fit = ctx.text(fit_request).await?;

        if is_rejection(&fit) {
            return Ok(AgentOutput::Rejected);
        }
        debug!("Company qualified, planning messaging");

        let analysis: MessagingAnalysis = ctx
            .object(GenerationRequest::new(
                self.model.clone(),
                render_template(MESSAGING_PROMPT, &[("company", &company)]),
            ))
            .await?;

        AgentOutput::json(&FitAnalysis { fit, analysis })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_interpolate_company() {
        let company = to_prompt_json(&samples::bakery_company());
        let rendered = render_template(FIT_PROMPT, &[("company", &company)]);

        assert!(rendered.ends_with(&company));
        assert!(!rendered.contains("{company}"));
        assert!(MESSAGING_PROMPT.ends_with("{company}"));
    }

    #[test]
    fn test_overrides_replace_default_models() {
        let overrides = AgentOverride {
            classify_model: Some(ModelSpec::new("openai", "gpt-4o")),
            ..AgentOverride::default()
        };

        let agent = FitAnalysisAgent::from_override(&overrides);
        assert_eq!(agent.classify_model().to_string(), "openai:gpt-4o");
        assert_eq!(agent.model(), &default_model());
    }

    #[test]
    fn test_welcome_samples() {
        let welcome = FitAnalysisAgent::default().welcome();
        assert_eq!(welcome.prompts.len(), 2);
        assert_eq!(welcome.prompts[0].data["name"], "Cyan");
        assert_eq!(welcome.prompts[1].data["name"], "Mom & Pop Bakery");
        assert!(welcome
            .prompts
            .iter()
            .all(|p| p.content_type == "application/json"));
    }
}
