//! The agent request pipeline
//!
//! One generic request cycle shared by every agent: parse and validate the
//! body, let the agent render prompts and call models through a
//! [`GenerationContext`], then shape the result. Any error along the way ends
//! in the fixed failure response.

pub mod context;
pub mod orchestrator;

pub use context::GenerationContext;
pub use orchestrator::{is_rejection, AgentHandler, AgentPipeline, SdrAgent};
