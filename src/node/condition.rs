use crate::{
    context::Context,
    evaluator::Expression,
    functions::FunctionRegistry,
    node::{Node, NodeGroup, RenderEnv, RenderError},
    parser::SyntaxError,
    value::Value,
};

/// Renders its children only when the test expression is truthy.
///
/// Truthiness: booleans as-is, numbers when nonzero, strings when
/// non-empty. Any other result kind is a render error.
#[derive(Debug)]
pub struct ConditionNode {
    expression: Expression,
    body: NodeGroup,
}

impl ConditionNode {
    pub fn new(test: &str, children: Vec<Node>) -> Result<Self, SyntaxError> {
        Ok(ConditionNode {
            expression: Expression::parse(test)?,
            body: NodeGroup::new(children),
        })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Evaluate the test against `ctx`, calling into `functions`.
    pub fn matches(
        &self,
        functions: &FunctionRegistry,
        ctx: &Context<'_>,
    ) -> Result<bool, RenderError> {
        let value = self
            .expression
            .evaluate(ctx, functions)
            .map_err(|source| RenderError::Condition {
                expression: self.expression.source().to_string(),
                source,
            })?;

        value.is_truthy().ok_or_else(|| RenderError::NotTruthy {
            expression: self.expression.source().to_string(),
            kind: value.kind_name(),
        })
    }

    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        if self.matches(env.functions, ctx)? {
            self.body.accept(env, ctx)
        } else {
            Ok((String::new(), Vec::new()))
        }
    }
}
