//! # Condition Expressions - Abstract Syntax Tree
//!
//! This module defines the tree produced by the [`parser`](crate::parser)
//! for the small expression language used in `<if test="...">`-style
//! conditions of SQL templates.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, identifiers, access, calls, operations)
//! - **[operators]** - Binary and prefix operators
//!
//! ## Grammar
//!
//! Lowest to highest precedence:
//!
//! ```text
//! or       := and ( "||" and )*
//! and      := cmp ( "&&" cmp )*
//! cmp      := add ( ( "==" | "!=" | "<" | "<=" | ">" | ">=" ) add )*
//! add      := mul ( ( "+" | "-" | "|" ) mul )*
//! mul      := unary ( ( "*" | "/" | "%" | "&" ) unary )*
//! unary    := ( "-" | "+" | "!" | "^" | "&" | "*" ) unary | postfix
//! postfix  := primary ( "." IDENT | "[" index "]" | "(" args ")" )*
//! index    := expr | expr? ":" expr? ( ":" expr )?
//! primary  := INT | FLOAT | STRING | "true" | "false" | "nil" | IDENT | "(" expr ")"
//! ```
//!
//! The words `and` and `or` are rewritten to `&&` and `||` by the lexer.
//!
//! ## Examples
//!
//! ```text
//! ids != nil && len(ids) > 0
//! len(ids) > 0 and status == "active"
//! (a > 1) | (b > 1)
//! user.Roles[0] == "admin"
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, Literal};
pub use operators::{BinOp, UnaryOp};
pub use tokens::Token;
