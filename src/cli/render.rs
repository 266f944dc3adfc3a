//! Render a one-off template against JSON parameters

use serde::Serialize;

use super::{CliError, parse_params};
use crate::{Config, ConditionNode, Context, Node, RenderEnv, WhereNode, json};

/// Options for the render command
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Template text with `#{}` / `${}` markers
    pub template: String,
    /// Conditional WHERE clauses, each `TEST => SQL`
    pub clauses: Vec<String>,
    /// JSON parameters
    pub params: Option<String>,
}

/// Rendered SQL and its bound arguments
#[derive(Debug, Serialize)]
pub struct RenderOutput {
    pub sql: String,
    pub args: Vec<serde_json::Value>,
}

fn parse_clause(clause: &str) -> Result<ConditionNode, CliError> {
    let (test, sql) = clause
        .split_once("=>")
        .ok_or_else(|| CliError::InvalidClause(clause.to_string()))?;
    Ok(ConditionNode::new(test.trim(), vec![Node::text(sql.trim())])?)
}

pub fn execute_render(options: &RenderOptions, config: &Config) -> Result<RenderOutput, CliError> {
    let mut children = vec![Node::text(options.template.as_str())];
    if !options.clauses.is_empty() {
        let conditions = options
            .clauses
            .iter()
            .map(|clause| parse_clause(clause).map(Node::Condition))
            .collect::<Result<Vec<_>, _>>()?;
        children.push(Node::Where(WhereNode::new(conditions)));
    }
    let root = Node::group(children);

    let params = parse_params(options.params.as_deref())?;
    let ctx = Context::generic(&params, config.param_key());
    let translator = config.dialect().translator();
    let env = RenderEnv::new(translator.as_ref(), config.functions());
    let (sql, args) = root.accept(&env, &ctx)?;

    Ok(RenderOutput {
        sql,
        args: args.iter().map(json::to_json).collect(),
    })
}
