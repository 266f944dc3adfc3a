use std::collections::BTreeMap;

use log::debug;

use crate::{
    context::Context,
    node::{Node, NodeGroup, RenderEnv, RenderError},
    value::Value,
};

/// Iteration over a list or map parameter.
///
/// Each pass renders the body with `item` (and optionally `index`) bound in
/// a layer over the outer context. For lists the index is the 0-based
/// position, for maps it is the key. The layer exists only for the duration
/// of one pass, so nothing leaks into the caller's context.
///
/// ```
/// use sqlmold::{
///     Context, ForeachNode, FunctionRegistry, Node, QuestionTranslator, RenderEnv, Value,
/// };
///
/// let node = ForeachNode::new("ids", "id", vec![Node::text("#{id}")])
///     .open("(")
///     .close(")")
///     .separator(",");
///
/// let params: Value = [("ids", Value::from(vec![1, 2, 3]))].into_iter().collect();
/// let functions = FunctionRegistry::builtin();
/// let (sql, args) = node
///     .accept(
///         &RenderEnv::new(&QuestionTranslator, &functions),
///         &Context::generic(&params, "param"),
///     )
///     .unwrap();
///
/// assert_eq!(sql, "(?,?,?)");
/// assert_eq!(args, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
/// ```
#[derive(Debug)]
pub struct ForeachNode {
    collection: String,
    item: String,
    index: Option<String>,
    open: String,
    close: String,
    separator: String,
    body: NodeGroup,
}

impl ForeachNode {
    pub fn new(
        collection: impl Into<String>,
        item: impl Into<String>,
        children: Vec<Node>,
    ) -> Self {
        ForeachNode {
            collection: collection.into(),
            item: item.into(),
            index: None,
            open: String::new(),
            close: String::new(),
            separator: String::new(),
            body: NodeGroup::new(children),
        }
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    pub fn open(mut self, open: impl Into<String>) -> Self {
        self.open = open.into();
        self
    }

    pub fn close(mut self, close: impl Into<String>) -> Self {
        self.close = close.into();
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        let collection = ctx.require(&self.collection)?;

        for name in std::iter::once(&self.item).chain(self.index.as_ref()) {
            if ctx.contains(name) {
                return Err(RenderError::NameCollision(name.clone()));
            }
        }

        let entries: Vec<(Value, &Value)> = match &collection {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (Value::Int(i as i64), item))
                .collect(),
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| (Value::String(key.clone()), item))
                .collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(RenderError::NotIterable {
                    collection: self.collection.clone(),
                    kind: other.kind_name(),
                });
            }
        };
        debug!("foreach {} over {} entries", self.collection, entries.len());

        let mut parts = Vec::with_capacity(entries.len());
        let mut args = Vec::new();
        for (key, item) in entries {
            let mut scope = BTreeMap::new();
            scope.insert(self.item.clone(), item.clone());
            if let Some(index) = &self.index {
                scope.insert(index.clone(), key);
            }

            let local = Context::Map(&scope);
            let layered = Context::Group(vec![&local, ctx]);
            let (sql, item_args) = self.body.accept(env, &layered)?;
            if sql.is_empty() {
                continue;
            }
            parts.push(sql);
            args.extend(item_args);
        }

        if parts.is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        Ok((
            format!("{}{}{}", self.open, parts.join(&self.separator), self.close),
            args,
        ))
    }
}
