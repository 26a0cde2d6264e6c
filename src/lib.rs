//! SDR Agents
//!
//! Sales development agents backed by hosted LLMs. Each agent accepts one
//! payload (a company or a person), renders a prompt, calls one or two
//! models and returns structured JSON or free text.
//!
//! Every agent runs through the same [`AgentPipeline`]: validate the input,
//! call the model, optionally short-circuit on a negative fit classification,
//! shape the output. Any failure along the way collapses to
//! [`FAILURE_MESSAGE`](error::FAILURE_MESSAGE).
//!
//! # Quick Start
//!
//! ```rust
//! use sdr_agents::agents::AgentCatalog;
//! use sdr_agents::llm::registry::ProviderRegistry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ProviderRegistry::new());
//! let catalog = AgentCatalog::with_registry(registry);
//!
//! let agent = catalog.get("agent-sdr-analysis").unwrap();
//! let welcome = agent.welcome();
//! assert_eq!(welcome.prompts.len(), 2);
//! ```

pub mod agent;
pub mod agents;
pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod schema;
pub mod server;
pub mod testing;

pub use agent::pipeline::{AgentHandler, AgentPipeline, SdrAgent};
pub use agent::response::{AgentOutput, AgentResponse, PipelineOutcome, PipelineRun, PipelineStage};
pub use agents::{AgentCatalog, AGENT_IDS};
pub use config::{AppConfig, ConfigError};
pub use error::{AgentError, AgentResult, FAILURE_MESSAGE};
pub use server::AgentServer;
