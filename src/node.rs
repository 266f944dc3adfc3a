//! SQL template node tree.
//!
//! A statement body is a tree of [`Node`]s. Rendering walks the tree with a
//! [`RenderEnv`] (the dialect [`Translator`] and the [`FunctionRegistry`]
//! conditions call into) and a [`Context`], and returns the SQL text
//! together with the bound arguments, in placeholder order:
//!
//! ```text
//! NodeGroup
//! ├── Text      "SELECT * FROM users"
//! └── Where
//!     ├── Condition  name != nil
//!     │   └── Text   "AND name = #{name}"
//!     └── Foreach    ids (item = id, open "AND id IN (", close ")", sep ",")
//!         └── Text   "#{id}"
//! ```
//!
//! Trees never change after construction. All per-render state (the
//! context, the translator's counter, the function registry, scratch
//! buffers) is passed in, so one tree renders concurrently for any number
//! of callers.
//!
//! # Examples
//!
//! ```
//! use sqlmold::{Context, FunctionRegistry, Node, QuestionTranslator, RenderEnv, Value};
//!
//! let node = Node::where_clause(vec![Node::text("AND id = #{id}")]);
//! let params: Value = [("id", 5)].into_iter().collect();
//!
//! let functions = FunctionRegistry::builtin();
//! let env = RenderEnv::new(&QuestionTranslator, &functions);
//! let (sql, args) = node
//!     .accept(&env, &Context::generic(&params, "param"))
//!     .unwrap();
//! assert_eq!(sql, "WHERE id = ?");
//! assert_eq!(args, vec![Value::Int(5)]);
//! ```

pub mod choose;
pub mod condition;
pub mod foreach;
pub mod group;
pub mod include;
pub mod text;
pub mod trim;

use thiserror::Error;

use crate::{
    context::{Context, ResolveError},
    evaluator::EvalError,
    functions::FunctionRegistry,
    parser::SyntaxError,
    translator::Translator,
    value::Value,
};

pub use choose::ChooseNode;
pub use condition::ConditionNode;
pub use foreach::ForeachNode;
pub use group::NodeGroup;
pub use include::{FragmentTable, IncludeNode};
pub use text::TextNode;
pub use trim::{SetNode, TrimNode, WhereNode};

/// Errors raised while rendering a node tree.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("condition `{expression}` failed: {source}")]
    Condition {
        expression: String,
        #[source]
        source: EvalError,
    },

    /// Condition result has no truth value
    #[error("condition `{expression}` evaluated to {kind}, expected bool, number or string")]
    NotTruthy {
        expression: String,
        kind: &'static str,
    },

    #[error("foreach collection {collection} is {kind}, expected list or map")]
    NotIterable {
        collection: String,
        kind: &'static str,
    },

    /// Foreach binding would shadow an existing parameter
    #[error("foreach variable {0} already exists in context")]
    NameCollision(String),

    #[error("included fragment not found: {0}")]
    FragmentNotFound(String),

    #[error("fragment table no longer available while resolving include {0}")]
    FragmentTableDropped(String),
}

/// Collaborators of one render: the placeholder translator and the function
/// registry condition expressions call into.
#[derive(Clone, Copy)]
pub struct RenderEnv<'r> {
    pub translator: &'r dyn Translator,
    pub functions: &'r FunctionRegistry,
}

impl<'r> RenderEnv<'r> {
    pub fn new(translator: &'r dyn Translator, functions: &'r FunctionRegistry) -> Self {
        RenderEnv {
            translator,
            functions,
        }
    }
}

/// One renderable unit of a statement template.
#[derive(Debug)]
pub enum Node {
    Text(TextNode),
    Condition(ConditionNode),
    Where(WhereNode),
    Set(SetNode),
    Trim(TrimNode),
    Foreach(ForeachNode),
    Choose(ChooseNode),
    Include(IncludeNode),
    Group(NodeGroup),
}

impl Node {
    /// Render this node to `(sql, args)`.
    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        match self {
            Node::Text(node) => node.accept(env, ctx),
            Node::Condition(node) => node.accept(env, ctx),
            Node::Where(node) => node.accept(env, ctx),
            Node::Set(node) => node.accept(env, ctx),
            Node::Trim(node) => node.accept(env, ctx),
            Node::Foreach(node) => node.accept(env, ctx),
            Node::Choose(node) => node.accept(env, ctx),
            Node::Include(node) => node.accept(env, ctx),
            Node::Group(node) => node.accept(env, ctx),
        }
    }

    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(TextNode::new(text))
    }

    /// Conditional block; fails if `test` does not parse.
    pub fn condition(test: &str, children: Vec<Node>) -> Result<Node, SyntaxError> {
        ConditionNode::new(test, children).map(Node::Condition)
    }

    pub fn where_clause(children: Vec<Node>) -> Node {
        Node::Where(WhereNode::new(children))
    }

    pub fn set_clause(children: Vec<Node>) -> Node {
        Node::Set(SetNode::new(children))
    }

    pub fn group(children: Vec<Node>) -> Node {
        Node::Group(NodeGroup::new(children))
    }
}

macro_rules! impl_from_node {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Node {
                fn from(node: $ty) -> Self {
                    Node::$variant(node)
                }
            }
        )*
    };
}

impl_from_node!(
    Text(TextNode),
    Condition(ConditionNode),
    Where(WhereNode),
    Set(SetNode),
    Trim(TrimNode),
    Foreach(ForeachNode),
    Choose(ChooseNode),
    Include(IncludeNode),
    Group(NodeGroup),
);
