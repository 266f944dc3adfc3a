//! Evaluate condition expressions against JSON parameters

use super::{CliError, parse_params};
use crate::{Config, Context, Expression, json};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON parameters
    pub params: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of an eval operation
#[derive(Debug)]
pub enum EvalResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated successfully
    Success(serde_json::Value),
}

pub fn execute_eval(options: &EvalOptions, config: &Config) -> Result<EvalResult, CliError> {
    let expression = Expression::parse(&options.expression)?;
    if options.syntax_only {
        return Ok(EvalResult::SyntaxValid);
    }

    let params = parse_params(options.params.as_deref())?;
    let ctx = Context::generic(&params, config.param_key());
    let result = expression.evaluate(&ctx, config.functions())?;

    Ok(EvalResult::Success(json::to_json(&result)))
}
