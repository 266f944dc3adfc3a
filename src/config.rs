//! Render configuration.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `SQLMOLD_PARAM_KEY` | `param` | name under which a scalar parameter is exposed |
//! | `SQLMOLD_DIALECT` | `mysql` | placeholder style: `mysql`, `sqlite`, `postgres`, `oracle` |

use std::{env, sync::Arc};

use thiserror::Error;

use crate::{
    context::DEFAULT_PARAM_KEY,
    functions::FunctionRegistry,
    translator::{Dialect, UnknownDialect},
};

pub const PARAM_KEY_ENV: &str = "SQLMOLD_PARAM_KEY";
pub const DIALECT_ENV: &str = "SQLMOLD_DIALECT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid SQLMOLD_DIALECT: {0}")]
    Dialect(#[from] UnknownDialect),

    #[error("SQLMOLD_PARAM_KEY must not be empty")]
    EmptyParamKey,
}

/// Settings shared by every statement render.
#[derive(Debug, Clone)]
pub struct Config {
    param_key: String,
    dialect: Dialect,
    functions: Arc<FunctionRegistry>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            param_key: DEFAULT_PARAM_KEY.to_string(),
            dialect: Dialect::default(),
            functions: FunctionRegistry::shared_builtins(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(key) = lookup(PARAM_KEY_ENV) {
            if key.trim().is_empty() {
                return Err(ConfigError::EmptyParamKey);
            }
            config.param_key = key.trim().to_string();
        }
        if let Some(dialect) = lookup(DIALECT_ENV) {
            config.dialect = dialect.parse()?;
        }

        Ok(config)
    }

    pub fn with_param_key(mut self, key: impl Into<String>) -> Self {
        self.param_key = key.into();
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Registry that condition expressions call into when statements are
    /// built with this config.
    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }

    pub fn param_key(&self) -> &str {
        &self.param_key
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }
}
