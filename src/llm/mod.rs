//! LLM provider abstraction layer
//!
//! Provider-agnostic request types, the concrete OpenAI and Groq clients,
//! the registry that resolves `provider:model` specs, and the single-call
//! text/object generation helpers the agents are built on.

pub mod generate;
pub mod provider;
pub mod providers;
pub mod registry;

pub use generate::*;
pub use provider::*;
pub use providers::*;
pub use registry::*;
