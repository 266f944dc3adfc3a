use std::{
    collections::HashMap,
    sync::{Arc, OnceLock, PoisonError, RwLock, Weak},
};

use log::debug;

use crate::{
    context::Context,
    node::{Node, RenderEnv, RenderError},
    value::Value,
};

/// Reusable SQL fragments keyed by `namespace.id`.
#[derive(Debug, Default)]
pub struct FragmentTable {
    fragments: RwLock<HashMap<String, Arc<Node>>>,
}

impl FragmentTable {
    pub fn new() -> Arc<Self> {
        Arc::new(FragmentTable::default())
    }

    pub fn insert(&self, namespace: &str, id: &str, node: Node) {
        self.fragments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(qualify(namespace, id), Arc::new(node));
    }

    /// Look up a fully-qualified `namespace.id`.
    pub fn get(&self, qualified: &str) -> Option<Arc<Node>> {
        self.fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(qualified)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn qualify(namespace: &str, id: &str) -> String {
    if namespace.is_empty() {
        id.to_string()
    } else {
        format!("{}.{}", namespace, id)
    }
}

/// Reference to a named fragment, resolved on first render.
///
/// `refid` is looked up in the owning namespace first, then as a
/// fully-qualified `other_namespace.id`. The resolved node is cached for
/// later renders. Fragments may be registered after the include is built.
#[derive(Debug)]
pub struct IncludeNode {
    namespace: String,
    refid: String,
    table: Weak<FragmentTable>,
    resolved: OnceLock<Arc<Node>>,
}

impl IncludeNode {
    pub fn new(
        namespace: impl Into<String>,
        refid: impl Into<String>,
        table: &Arc<FragmentTable>,
    ) -> Self {
        IncludeNode {
            namespace: namespace.into(),
            refid: refid.into(),
            table: Arc::downgrade(table),
            resolved: OnceLock::new(),
        }
    }

    pub fn refid(&self) -> &str {
        &self.refid
    }

    fn resolve(&self) -> Result<&Arc<Node>, RenderError> {
        if let Some(node) = self.resolved.get() {
            return Ok(node);
        }

        let table = self
            .table
            .upgrade()
            .ok_or_else(|| RenderError::FragmentTableDropped(self.refid.clone()))?;

        let local = qualify(&self.namespace, &self.refid);
        let node = table
            .get(&local)
            .or_else(|| table.get(&self.refid))
            .ok_or_else(|| RenderError::FragmentNotFound(self.refid.clone()))?;
        debug!("include {} resolved in namespace {:?}", self.refid, self.namespace);

        // A concurrent first render may have won; either node is the same fragment
        Ok(self.resolved.get_or_init(|| node))
    }

    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        self.resolve()?.accept(env, ctx)
    }
}
