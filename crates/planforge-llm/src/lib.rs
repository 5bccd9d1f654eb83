//! Planforge LLM - Text-generation collaborator with retry and caching

pub mod cache;
pub mod fallback;
pub mod http;
pub mod provider;

pub use cache::ResponseCache;
pub use fallback::StaticGenerator;
pub use http::{GeneratorConfig, HttpGenerator};
pub use provider::{GenerationOptions, GeneratorError, GeneratorResult, TextGenerator};
