//! Testing utilities and mock implementations
//!
//! Lets agents and the HTTP host be exercised without reaching a hosted
//! LLM provider.

pub mod mocks;

pub use mocks::*;
