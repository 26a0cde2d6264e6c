//! Agent request pipeline
//!
//! The pieces every agent shares: payload parsing, prompt rendering, the
//! generic request cycle, responses and welcome descriptors.

pub mod payload;
pub mod pipeline;
pub mod prompt;
pub mod response;
pub mod welcome;

pub use payload::*;
pub use pipeline::*;
pub use prompt::*;
pub use response::*;
pub use welcome::*;
