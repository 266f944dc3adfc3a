//! Dynamic SQL templates with a small expression language and declarative
//! result binding.
//!
//! - [`Expression`]: parsed condition expressions, evaluated by [`Evaluator`]
//! - [`Context`]: uniform name lookup over records, maps and lists
//! - [`Node`]: the SQL template tree, rendered to `(sql, args)`
//! - [`ResultMap`] and [`binder`]: rows back into records and record graphs
//! - [`Catalog`] and [`Statement`]: named statements and shared fragments

pub mod ast;
pub mod binder;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod context;
pub mod evaluator;
pub mod functions;
pub mod json;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod pool;
pub mod record;
pub mod result_map;
pub mod statement;
pub mod translator;
pub mod value;

pub use ast::{BinOp, Expr, Literal, Token, UnaryOp};
pub use binder::{BindError, MemoryRows, Rows, bind, bind_list, bind_one};
pub use config::{Config, ConfigError};
pub use context::{Context, GenericContext, ResolveError};
pub use evaluator::{EvalError, Evaluator, Expression};
pub use functions::{Arity, ArgumentError, Function, FunctionRegistry};
pub use lexer::{LexError, Lexer, Position};
pub use node::{
    ChooseNode, ConditionNode, ForeachNode, FragmentTable, IncludeNode, Node, NodeGroup,
    RenderEnv, RenderError, SetNode, TextNode, TrimNode, WhereNode,
};
pub use parser::{ParseError, Parser, SyntaxError, parse_expression};
pub use pool::BufferPool;
pub use record::{Field, Kind, Method, Record, RecordType};
pub use result_map::ResultMap;
pub use statement::{Action, Catalog, Statement, StatementError, StatementGroup};
pub use translator::{Dialect, NamedTranslator, NumberedTranslator, QuestionTranslator, Translator};
pub use value::{BoxError, Value};
