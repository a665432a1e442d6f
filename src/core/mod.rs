//! Core types shared across lifebranch.
//!
//! Configuration, the retry policy, the AI failure classifier and the
//! error taxonomy.

mod classifier;
mod config;
mod error;
mod retry;

pub use classifier::{ErrorAssessment, ErrorClassifier};
pub use config::{AiConfig, Config, GeneralConfig, OllamaConfig, RetrySettings};
pub use error::ErrorKind;
pub use retry::RetryConfig;
