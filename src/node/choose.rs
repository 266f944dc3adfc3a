use crate::{
    context::Context,
    node::{ConditionNode, NodeGroup, RenderEnv, RenderError},
    value::Value,
};

/// First-match branch selection: `when` branches in declared order, then the
/// optional `otherwise`.
#[derive(Debug, Default)]
pub struct ChooseNode {
    whens: Vec<ConditionNode>,
    otherwise: Option<NodeGroup>,
}

impl ChooseNode {
    pub fn new(whens: Vec<ConditionNode>, otherwise: Option<NodeGroup>) -> Self {
        ChooseNode { whens, otherwise }
    }

    pub fn when(mut self, branch: ConditionNode) -> Self {
        self.whens.push(branch);
        self
    }

    pub fn otherwise(mut self, branch: NodeGroup) -> Self {
        self.otherwise = Some(branch);
        self
    }

    /// The first branch producing non-empty SQL wins.
    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        for when in &self.whens {
            let (sql, args) = when.accept(env, ctx)?;
            if !sql.is_empty() {
                return Ok((sql, args));
            }
        }

        match &self.otherwise {
            Some(otherwise) => otherwise.accept(env, ctx),
            None => Ok((String::new(), Vec::new())),
        }
    }
}
