//! Planforge Core - Types, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    CacheConfig, ClassifierConfig, DedupConfig, DomainPolicy, EngineConfig, Environment,
    PolicyConfig, RetryConfig,
};
pub use error::{Error, ErrorReport, Recovery, Result};
pub use types::*;
