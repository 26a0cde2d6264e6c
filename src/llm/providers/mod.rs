//! LLM provider implementations
//!
//! This module contains concrete implementations of the LlmProvider trait
//! for the hosted services the agents call.

mod chat;
pub mod groq;
pub mod openai;

pub use groq::*;
pub use openai::*;
