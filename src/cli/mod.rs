//! CLI support for sqlmold
//!
//! Provides programmatic access to the `sqlmold` commands so other tools
//! can embed them.

mod docs;
mod eval;
mod render;

pub use docs::{DocTopic, get_doc_topic, get_docs_overview};
pub use eval::{EvalOptions, EvalResult, execute_eval};
pub use render::{RenderOptions, RenderOutput, execute_render};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] crate::SyntaxError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Render error: {0}")]
    Render(#[from] crate::RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::ConfigError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// `--when` argument without a `=>` separator
    #[error("Invalid clause '{0}': expected 'TEST => SQL'")]
    InvalidClause(String),

    #[error("Unknown topic: '{0}'\nRun 'sqlmold docs' to see available topics.")]
    UnknownTopic(String),
}

/// Parse optional JSON parameters; absent parameters are null.
pub(crate) fn parse_params(params: Option<&str>) -> Result<crate::Value, CliError> {
    match params {
        Some(text) if !text.trim().is_empty() => {
            let json: serde_json::Value = serde_json::from_str(text)?;
            Ok(crate::json::from_json(json))
        }
        _ => Ok(crate::Value::Null),
    }
}
