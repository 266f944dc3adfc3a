use crate::ast::{BinOp, UnaryOp};

/// Literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    /// Integer literal too large for `i64`
    Uint(u64),
    Float(f64),
    String(String),
}

/// Abstract Syntax Tree node representing a parsed expression.
///
/// The tree is built once per condition and never mutated by evaluation,
/// so one tree can be evaluated concurrently against many contexts.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Binary operation (comparison, arithmetic, logical)
    ///
    /// # Examples
    /// ```text
    /// age >= 18
    /// a && b
    /// (x > 1) | (y > 1)
    /// ```
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Prefix operation
    ///
    /// # Examples
    /// ```text
    /// -price
    /// !active
    /// ```
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Literal value
    Literal(Literal),

    /// Parameter or function reference
    ///
    /// # Example
    /// ```text
    /// name
    /// ```
    Identifier(String),

    /// Member access
    ///
    /// # Examples
    /// ```text
    /// user.Name
    /// user.address.city
    /// ```
    Selector { base: Box<Expr>, member: String },

    /// Index access into a list, string or map
    ///
    /// # Examples
    /// ```text
    /// ids[0]
    /// attrs["color"]
    /// ```
    Index { base: Box<Expr>, index: Box<Expr> },

    /// Slice of a list, string or byte string
    ///
    /// # Examples
    /// ```text
    /// ids[1:3]
    /// ids[:2]
    /// ids[0:2:4]
    /// ```
    Slice {
        base: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },

    /// Function or method call
    ///
    /// # Examples
    /// ```text
    /// len(ids)
    /// user.FullName()
    /// ```
    Call { function: Box<Expr>, args: Vec<Expr> },
}

impl Expr {
    pub fn is_nil_literal(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Nil))
    }
}
