//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error handling.
//! We test observable outcomes, not implementation details of TOML parsing.

use sdr_agents::agents::{AgentCatalog, AGENT_IDS};
use sdr_agents::config::{AppConfig, ConfigError};
use sdr_agents::llm::registry::ProviderRegistry;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{content}").unwrap();
    temp_file
}

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let temp_file = write_config(
        r#"
[server]
host = "127.0.0.1"
port = 8088

[providers.openai]
api_key_env = "MY_OPENAI_KEY"
base_url = "http://localhost:9000/v1"
timeout_secs = 30
max_retries = 0

[providers.groq]
api_key_env = "MY_GROQ_KEY"

[agents.agent-sdr-analysis]
classify_model = "openai:gpt-4o"
model = "groq:llama-3.1-8b-instant"

[agents.agent-sdr-raw]
enabled = false
"#,
    );

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.providers.openai.api_key_env, "MY_OPENAI_KEY");
    assert_eq!(
        config.providers.openai.base_url.as_deref(),
        Some("http://localhost:9000/v1")
    );
    assert_eq!(config.providers.openai.timeout_secs, Some(30));
    assert_eq!(config.providers.openai.max_retries, Some(0));
    assert_eq!(config.providers.groq.api_key_env, "MY_GROQ_KEY");

    let analysis = config.agent("agent-sdr-analysis");
    assert!(analysis.enabled);
    assert_eq!(
        analysis.classify_model.map(|m| m.to_string()).as_deref(),
        Some("openai:gpt-4o")
    );
    assert!(!config.agent("agent-sdr-raw").enabled);
    assert!(config.agent("agent-sdr").enabled);
}

#[test]
fn test_config_sections_are_optional() {
    let temp_file = write_config("[server]\nport = 9000\n");

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.providers.openai.api_key_env, "OPENAI_API_KEY");
    assert!(config.agents.is_empty());
}

#[test]
fn test_config_returns_error_for_invalid_toml_syntax() {
    let temp_file = write_config("[server\nport = ");

    let result = AppConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_returns_error_when_file_not_found() {
    let result = AppConfig::load_from_file(std::path::Path::new("/nonexistent/sdr-agents.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_config_rejects_unknown_fields() {
    let temp_file = write_config("[server]\nport = 3500\nworkers = 4\n");

    let result = AppConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_rejects_zero_port() {
    let result = AppConfig::from_toml("[server]\nport = 0\n");
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_config_rejects_unknown_agent_id() {
    let result = AppConfig::from_toml("[agents.agent-sdr-linkedin]\nenabled = true\n");
    assert!(matches!(result, Err(ConfigError::UnknownAgent(id)) if id == "agent-sdr-linkedin"));
}

#[test]
fn test_config_rejects_model_without_provider_prefix() {
    let result = AppConfig::from_toml("[agents.agent-sdr]\nmodel = \"llama-3.3-70b-versatile\"\n");
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_rejects_unknown_model_provider() {
    let result = AppConfig::from_toml("[agents.agent-sdr]\nmodel = \"mistral:large\"\n");
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_config_rejects_classify_model_outside_fit_analysis() {
    let result =
        AppConfig::from_toml("[agents.agent-sdr-email]\nclassify_model = \"openai:gpt-4o\"\n");
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_config_rejects_non_http_base_url() {
    for base_url in ["ftp://example.com", "not a url", "localhost:9000"] {
        let content = format!(
            "[providers.groq]\napi_key_env = \"GROQ_API_KEY\"\nbase_url = \"{base_url}\"\n"
        );
        assert!(
            matches!(
                AppConfig::from_toml(&content),
                Err(ConfigError::InvalidConfig(_))
            ),
            "{base_url} should be rejected"
        );
    }
}

#[test]
fn test_config_round_trips_through_show_output() {
    let original = AppConfig::from_toml(
        r#"
[agents.agent-sdr-analysis]
classify_model = "openai:gpt-4o"
"#,
    )
    .unwrap();

    let rendered = original.to_toml_string().unwrap();
    assert!(rendered.contains("openai:gpt-4o"));
    assert_eq!(AppConfig::from_toml(&rendered).unwrap(), original);
}

#[test]
fn test_discover_prefers_explicit_path() {
    let temp_file = write_config("[server]\nport = 4100\n");

    let (config, path) = AppConfig::discover(Some(temp_file.path())).unwrap();

    assert_eq!(config.server.port, 4100);
    assert_eq!(path.as_deref(), Some(temp_file.path()));
}

#[test]
fn test_discover_fails_when_explicit_path_missing() {
    let result = AppConfig::discover(Some(std::path::Path::new("/nonexistent/sdr.toml")));
    assert!(result.is_err());
}

#[test]
fn test_registry_skips_providers_without_keys() {
    std::env::set_var("SDR_TEST_GROQ_KEY_PRESENT", "gsk-test");
    std::env::remove_var("SDR_TEST_OPENAI_KEY_ABSENT");

    let config = AppConfig::from_toml(
        r#"
[providers.openai]
api_key_env = "SDR_TEST_OPENAI_KEY_ABSENT"

[providers.groq]
api_key_env = "SDR_TEST_GROQ_KEY_PRESENT"
"#,
    )
    .unwrap();

    let registry = ProviderRegistry::from_config(&config.providers);
    assert_eq!(registry.names(), vec!["groq".to_string()]);
}

#[test]
fn test_catalog_respects_enabled_flags() {
    let config = AppConfig::from_toml(
        r#"
[agents.agent-sdr-template]
enabled = false

[agents.agent-sdr-raw]
enabled = false
"#,
    )
    .unwrap();

    let catalog = AgentCatalog::from_config(&config, Arc::new(ProviderRegistry::new()));

    assert_eq!(catalog.len(), AGENT_IDS.len() - 2);
    assert!(catalog.get("agent-sdr-template").is_none());
    assert!(catalog.get("agent-sdr-raw").is_none());
    assert!(catalog.get("agent-sdr-analysis").is_some());
}
