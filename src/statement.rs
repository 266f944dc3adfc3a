//! Statements, namespaces and the catalog that owns them.
//!
//! A [`Catalog`] groups statements by namespace and owns the fragment table
//! that include nodes resolve against. Statement ids are addressed as
//! `namespace.id`.
//!
//! ```
//! use sqlmold::{Action, Catalog, Config, Node, Statement, Value};
//!
//! let mut catalog = Catalog::new();
//! catalog.add_fragment("user", "columns", Node::text("id, name"));
//!
//! let root = Node::group(vec![
//!     Node::text("SELECT"),
//!     catalog.include("user", "columns"),
//!     Node::text("FROM users WHERE id = #{param}"),
//! ]);
//! catalog
//!     .add_statement("user", Statement::new("by_id", Action::Select, root))
//!     .unwrap();
//!
//! let (sql, args) = catalog
//!     .build("user.by_id", &Config::new(), &Value::Int(3))
//!     .unwrap();
//! assert_eq!(sql, "SELECT id, name FROM users WHERE id = ?");
//! assert_eq!(args, vec![Value::Int(3)]);
//! ```

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use log::debug;
use thiserror::Error;

use crate::{
    binder::{self, BindError, Rows},
    config::Config,
    context::Context,
    node::{FragmentTable, IncludeNode, Node, RenderEnv, RenderError, include::qualify},
    record::Kind,
    result_map::ResultMap,
    value::Value,
};

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("statement not found: {0}")]
    NotFound(String),

    #[error("duplicate statement: {0}")]
    Duplicate(String),

    #[error("unknown statement action: {0}")]
    UnknownAction(String),

    #[error("statement {id}: {source}")]
    Render {
        id: String,
        #[source]
        source: RenderError,
    },

    #[error(transparent)]
    Bind(#[from] BindError),
}

/// Kind of SQL a statement issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Select,
    Insert,
    Update,
    Delete,
}

impl Action {
    /// Whether the statement produces rows to bind.
    pub fn returns_rows(self) -> bool {
        self == Action::Select
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Select => "select",
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Delete => "delete",
        })
    }
}

impl FromStr for Action {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Ok(Action::Select),
            "insert" => Ok(Action::Insert),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(StatementError::UnknownAction(s.to_string())),
        }
    }
}

/// A named SQL template with optional result binding metadata.
#[derive(Debug)]
pub struct Statement {
    id: String,
    action: Action,
    root: Node,
    result_map: Option<Arc<ResultMap>>,
}

impl Statement {
    pub fn new(id: impl Into<String>, action: Action, root: Node) -> Self {
        Statement {
            id: id.into(),
            action,
            root,
            result_map: None,
        }
    }

    pub fn with_result_map(mut self, result_map: Arc<ResultMap>) -> Self {
        self.result_map = Some(result_map);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn result_map(&self) -> Option<&ResultMap> {
        self.result_map.as_deref()
    }

    /// Render to `(sql, args)` with a fresh context and translator.
    /// Conditions call into the function registry of `config`.
    pub fn build(
        &self,
        config: &Config,
        param: &Value,
    ) -> Result<(String, Vec<Value>), RenderError> {
        let ctx = Context::generic(param, config.param_key());
        let translator = config.dialect().translator();
        let env = RenderEnv::new(translator.as_ref(), config.functions());
        let (sql, args) = self.root.accept(&env, &ctx)?;
        debug!("built {} {}: {} ({} args)", self.action, self.id, sql, args.len());
        Ok((sql, args))
    }

    /// Bind the rows this statement returned into `dest`.
    pub fn bind<R: Rows + ?Sized>(
        &self,
        rows: &mut R,
        target: &Kind,
        dest: &mut Value,
    ) -> Result<(), BindError> {
        binder::bind(rows, target, self.result_map(), dest)
    }
}

/// Statements sharing a namespace.
#[derive(Debug, Default)]
pub struct StatementGroup {
    namespace: String,
    statements: HashMap<String, Arc<Statement>>,
}

impl StatementGroup {
    pub fn new(namespace: impl Into<String>) -> Self {
        StatementGroup {
            namespace: namespace.into(),
            statements: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Statement>> {
        self.statements.get(id)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    fn insert(&mut self, statement: Statement) -> Result<(), StatementError> {
        if self.statements.contains_key(statement.id()) {
            return Err(StatementError::Duplicate(qualify(
                &self.namespace,
                statement.id(),
            )));
        }
        self.statements
            .insert(statement.id().to_string(), Arc::new(statement));
        Ok(())
    }
}

/// Every statement group plus the shared fragment table.
#[derive(Debug)]
pub struct Catalog {
    groups: HashMap<String, StatementGroup>,
    fragments: Arc<FragmentTable>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            groups: HashMap::new(),
            fragments: FragmentTable::new(),
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    pub fn fragments(&self) -> &Arc<FragmentTable> {
        &self.fragments
    }

    /// Register a reusable fragment under `namespace.id`.
    pub fn add_fragment(&self, namespace: &str, id: &str, node: Node) {
        debug!("fragment {} registered", qualify(namespace, id));
        self.fragments.insert(namespace, id, node);
    }

    /// Include node resolving `refid` from `namespace` against this catalog.
    pub fn include(&self, namespace: &str, refid: &str) -> Node {
        Node::Include(IncludeNode::new(namespace, refid, &self.fragments))
    }

    pub fn add_statement(
        &mut self,
        namespace: &str,
        statement: Statement,
    ) -> Result<(), StatementError> {
        self.groups
            .entry(namespace.to_string())
            .or_insert_with(|| StatementGroup::new(namespace))
            .insert(statement)
    }

    pub fn group(&self, namespace: &str) -> Option<&StatementGroup> {
        self.groups.get(namespace)
    }

    /// Look up `namespace.id`; the namespace is everything before the last dot.
    pub fn statement(&self, qualified: &str) -> Result<Arc<Statement>, StatementError> {
        let (namespace, id) = qualified.rsplit_once('.').unwrap_or(("", qualified));
        self.groups
            .get(namespace)
            .and_then(|group| group.get(id))
            .cloned()
            .ok_or_else(|| StatementError::NotFound(qualified.to_string()))
    }

    /// Look up and render a statement.
    pub fn build(
        &self,
        qualified: &str,
        config: &Config,
        param: &Value,
    ) -> Result<(String, Vec<Value>), StatementError> {
        let statement = self.statement(qualified)?;
        statement
            .build(config, param)
            .map_err(|source| StatementError::Render {
                id: qualified.to_string(),
                source,
            })
    }
}
