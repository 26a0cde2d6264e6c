//! Single-call text and structured-object generation
//!
//! `generate_text` returns the model's free text. `generate_object` asks for
//! JSON matching `T`'s schema and refuses to hand anything back that does not
//! validate, so callers only ever see well-formed, normalised values.

use crate::llm::provider::{
    CompletionRequest, JsonSchemaDefinition, LlmError, ProviderTool, ResponseFormat, ToolChoice,
};
use crate::llm::registry::{ModelSpec, ProviderRegistry};
use crate::schema::{schema_for, strict_schema, validate_instance};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Everything needed for one generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: ModelSpec,
    pub prompt: String,
    pub tools: Vec<ProviderTool>,
    pub tool_choice: Option<ToolChoice>,
}

impl GenerationRequest {
    pub fn new(model: ModelSpec, prompt: impl Into<String>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    /// Force the model to use `tool` before answering
    pub fn with_required_tool(mut self, tool: ProviderTool) -> Self {
        self.tool_choice = Some(ToolChoice::Required(tool.name().to_string()));
        self.tools = vec![tool];
        self
    }

    fn to_completion_request(&self) -> CompletionRequest {
        let mut request = CompletionRequest::from_prompt(&self.model.model, &self.prompt);
        request.tools = self.tools.clone();
        request.tool_choice = self.tool_choice.clone();
        request
    }
}

/// A value the model must produce as schema-conforming JSON
pub trait StructuredOutput: DeserializeOwned + JsonSchema + Send {
    /// Name sent alongside the schema to providers that accept one
    const SCHEMA_NAME: &'static str;

    /// Canonicalise fields after deserialisation
    fn normalize(&mut self) {}

    /// Checks the JSON schema cannot express
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Schema the model output is validated against
    fn output_schema() -> Result<Value, LlmError> {
        schema_for::<Self>().map_err(LlmError::InvalidRequest)
    }
}

/// Run one free-text generation call
pub async fn generate_text(
    registry: &ProviderRegistry,
    request: &GenerationRequest,
) -> Result<String, LlmError> {
    let provider = registry.get(&request.model.provider)?;
    let response = provider.complete(request.to_completion_request()).await?;

    debug!(
        "{} returned {} completion tokens",
        request.model, response.usage.completion_tokens
    );

    response
        .content
        .ok_or_else(|| LlmError::InvalidResponse(format!("{} returned no text", request.model)))
}

/// Run one schema-constrained generation call
pub async fn generate_object<T: StructuredOutput>(
    registry: &ProviderRegistry,
    request: &GenerationRequest,
) -> Result<T, LlmError> {
    let provider = registry.get(&request.model.provider)?;
    let schema = T::output_schema()?;

    // Strict mode needs closed objects; local validation keeps the derived schema
    let strict = provider.supports_strict_schema();
    let wire_schema = if strict {
        strict_schema(&schema)
    } else {
        schema.clone()
    };

    let mut completion = request.to_completion_request();
    completion.response_format = Some(ResponseFormat::JsonSchema {
        json_schema: JsonSchemaDefinition {
            name: T::SCHEMA_NAME.to_string(),
            strict: strict.then_some(true),
            schema: wire_schema,
        },
    });

    let response = provider.complete(completion).await?;
    let text = response
        .content
        .ok_or_else(|| LlmError::InvalidResponse(format!("{} returned no text", request.model)))?;

    parse_structured::<T>(&text, &schema)
}

/// Extract, validate, deserialise and normalise a structured value from model text
pub fn parse_structured<T: StructuredOutput>(text: &str, schema: &Value) -> Result<T, LlmError> {
    let value = extract_json_value(text).ok_or_else(|| {
        LlmError::SchemaViolation(format!("No JSON object found in {} output", T::SCHEMA_NAME))
    })?;

    validate_instance(schema, &value)
        .map_err(|e| LlmError::SchemaViolation(format!("{}: {e}", T::SCHEMA_NAME)))?;

    let mut output: T = serde_json::from_value(value)
        .map_err(|e| LlmError::SchemaViolation(format!("{}: {e}", T::SCHEMA_NAME)))?;

    output.normalize();
    output
        .validate()
        .map_err(|e| LlmError::SchemaViolation(format!("{}: {e}", T::SCHEMA_NAME)))?;

    Ok(output)
}

/// Locate a JSON object in model output: bare, fenced, or embedded in prose
pub fn extract_json_value(text: &str) -> Option<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }

    if let Some(json_str) = extract_json_from_markdown(text) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&json_str) {
            return Some(value);
        }
    }

    find_json_object(text)
}

/// Extract JSON from markdown code blocks
fn extract_json_from_markdown(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let content = &text[start + 7..];
        if let Some(end) = content.find("```") {
            return Some(content[..end].trim().to_string());
        }
    }

    if let Some(start) = text.find("```") {
        let content = &text[start + 3..];
        if let Some(end) = content.find("```") {
            let candidate = content[..end].trim();
            if candidate.starts_with('{') && candidate.ends_with('}') {
                return Some(candidate.to_string());
            }
        }
    }

    None
}

/// Find the first JSON object embedded in prose.
///
/// Each `{` is tried as the start of a JSON value, so braces inside string
/// literals do not end the object early.
fn find_json_object(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, ch)| *ch == '{')
        .find_map(|(start, _)| {
            let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
            match values.next() {
                Some(Ok(value @ Value::Object(_))) => Some(value),
                _ => None,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::SearchContextSize;
    use crate::testing::mocks::MockLlmProvider;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Headline {
        #[schemars(length(max = 10))]
        title: String,
    }

    impl StructuredOutput for Headline {
        const SCHEMA_NAME: &'static str = "headline";

        fn normalize(&mut self) {
            self.title = self.title.to_uppercase();
        }

        fn validate(&self) -> Result<(), String> {
            if self.title.contains('!') {
                return Err("no exclamations".to_string());
            }
            Ok(())
        }
    }

    fn registry_with(provider: Arc<MockLlmProvider>) -> ProviderRegistry {
        ProviderRegistry::new().with_provider("mock", provider)
    }

    #[test]
    fn test_required_tool_sets_choice() {
        let request = GenerationRequest::new(ModelSpec::new("openai", "gpt-4o-mini"), "hi")
            .with_required_tool(ProviderTool::WebSearchPreview {
                search_context_size: SearchContextSize::Low,
            });

        assert_eq!(request.tools.len(), 1);
        assert_eq!(
            request.tool_choice,
            Some(ToolChoice::Required("web_search_preview".to_string()))
        );

        let completion = request.to_completion_request();
        assert_eq!(completion.model, "gpt-4o-mini");
        assert!(completion.requires_hosted_tools());
    }

    #[test]
    fn test_extract_json_variants() {
        assert!(extract_json_value(r#"{"title": "a"}"#).is_some());
        assert!(extract_json_value("```json\n{\"title\": \"a\"}\n```").is_some());
        assert!(extract_json_value("Sure! {\"title\": \"a\"} hope that helps").is_some());
        assert!(extract_json_value("no json here").is_none());
        assert!(extract_json_value("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_extract_json_with_braces_inside_strings() {
        let text = r#"Here is the email: {"subject": "quick q }", "ps": "{see below}"} thanks"#;

        let value = extract_json_value(text).unwrap();
        assert_eq!(value["subject"], "quick q }");
        assert_eq!(value["ps"], "{see below}");
    }

    #[test]
    fn test_extract_json_skips_stray_braces_before_object() {
        let text = r#"Use {name} style placeholders. {"title": "ok"}"#;
        assert_eq!(extract_json_value(text).unwrap()["title"], "ok");
    }

    #[test]
    fn test_parse_structured_normalizes() {
        let schema = Headline::output_schema().unwrap();
        let headline: Headline = parse_structured(r#"{"title": "hello"}"#, &schema).unwrap();
        assert_eq!(headline.title, "HELLO");
    }

    #[test]
    fn test_parse_structured_schema_violation() {
        let schema = Headline::output_schema().unwrap();

        let too_long = parse_structured::<Headline>(r#"{"title": "much too long here"}"#, &schema);
        assert!(matches!(too_long, Err(LlmError::SchemaViolation(_))));

        let missing = parse_structured::<Headline>(r#"{"other": 1}"#, &schema);
        assert!(matches!(missing, Err(LlmError::SchemaViolation(_))));

        let invalid = parse_structured::<Headline>(r#"{"title": "hey!"}"#, &schema);
        assert!(matches!(invalid, Err(LlmError::SchemaViolation(_))));
    }

    #[tokio::test]
    async fn test_generate_object_sends_schema() {
        let provider = Arc::new(MockLlmProvider::with_responses(vec![
            r#"{"title": "ok"}"#.to_string(),
        ]));
        let registry = registry_with(provider.clone());
        let request = GenerationRequest::new(ModelSpec::new("mock", "m"), "write a headline");

        let headline: Headline = generate_object(&registry, &request).await.unwrap();
        assert_eq!(headline.title, "OK");

        let sent = provider.requests();
        assert_eq!(sent.len(), 1);
        match &sent[0].response_format {
            Some(ResponseFormat::JsonSchema { json_schema }) => {
                assert_eq!(json_schema.name, "headline");
                assert_eq!(json_schema.strict, None);
                assert!(json_schema.schema.get("$schema").is_some());
            }
            other => panic!("expected json schema format, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_object_sends_strict_schema_when_supported() {
        let provider = Arc::new(
            MockLlmProvider::with_responses(vec![r#"{"title": "ok"}"#.to_string()])
                .with_strict_schema(),
        );
        let registry = registry_with(provider.clone());
        let request = GenerationRequest::new(ModelSpec::new("mock", "m"), "write a headline");

        let headline: Headline = generate_object(&registry, &request).await.unwrap();
        assert_eq!(headline.title, "OK");

        match &provider.requests()[0].response_format {
            Some(ResponseFormat::JsonSchema { json_schema }) => {
                assert_eq!(json_schema.strict, Some(true));
                assert_eq!(json_schema.schema["additionalProperties"], false);
                assert_eq!(json_schema.schema["required"], serde_json::json!(["title"]));
                assert!(json_schema.schema.get("$schema").is_none());
            }
            other => panic!("expected json schema format, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_text_unknown_provider() {
        let registry = ProviderRegistry::new();
        let request = GenerationRequest::new(ModelSpec::new("groq", "m"), "hi");

        let result = generate_text(&registry, &request).await;
        assert!(matches!(result, Err(LlmError::NotConfigured(_))));
    }
}
