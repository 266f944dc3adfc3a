use crate::{
    context::Context,
    node::{Node, RenderEnv, RenderError},
    pool::BufferPool,
    value::Value,
};

/// Ordered composition of nodes.
#[derive(Debug, Default)]
pub struct NodeGroup {
    children: Vec<Node>,
}

impl NodeGroup {
    pub fn new(children: Vec<Node>) -> Self {
        NodeGroup { children }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Render children in order and join their fragments.
    ///
    /// Blank fragments are skipped. A single space is inserted where neither
    /// side of a join already has whitespace, and the joined text is trimmed.
    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        // Single child: no joining to do
        if let [only] = self.children.as_slice() {
            let (sql, args) = only.accept(env, ctx)?;
            return Ok((sql.trim().to_string(), args));
        }

        let mut buf = BufferPool::global().checkout();
        let mut args = Vec::new();
        for child in &self.children {
            let (fragment, child_args) = child.accept(env, ctx)?;
            args.extend(child_args);
            join_fragment(&mut buf, &fragment);
        }
        Ok((buf.trim().to_string(), args))
    }
}

pub(crate) fn join_fragment(buf: &mut String, fragment: &str) {
    if fragment.trim().is_empty() {
        return;
    }
    let needs_space = !buf.is_empty()
        && !buf.ends_with(char::is_whitespace)
        && !fragment.starts_with(char::is_whitespace);
    if needs_space {
        buf.push(' ');
    }
    buf.push_str(fragment);
}
