// Strategy generation: prompt construction, the Gemini client, and parsing of
// the generated JSON.

pub mod client;
pub mod extract;
pub mod prompt;

pub use client::{GenerateError, GeminiClient, StrategyGenerator};
pub use prompt::{build_request, PromptError, PromptRequest};
