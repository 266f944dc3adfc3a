use std::cmp::Ordering;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Literal, UnaryOp},
    context::Context,
    functions::{Arity, FunctionRegistry},
    parser::{SyntaxError, parse_expression},
    record::Member,
    value::{BoxError, Value},
};

/// Errors that can occur during expression evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Identifier is neither a parameter nor a registered function
    #[error("undefined identifier: {0}")]
    Undefined(String),

    /// Unsupported operand kinds for an operator
    #[error("type error: {0}")]
    TypeError(String),

    /// Invalid member, index or slice bounds
    #[error("access error: {0}")]
    AccessError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    Overflow(String),

    /// Member access, indexing or `*` applied to nil
    #[error("nil dereference: {0}")]
    NilDereference(String),

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("{function}() expects {expected} arguments, got {got}")]
    ArgumentCount {
        function: String,
        expected: Arity,
        got: usize,
    },

    /// Argument that the function cannot convert
    #[error("{function}(): {message}")]
    Argument { function: String, message: String },

    /// Error returned by the function body
    #[error("{function}() failed: {source}")]
    Call {
        function: String,
        #[source]
        source: BoxError,
    },
}

/// A parsed condition expression.
///
/// Immutable once parsed; evaluate it any number of times, from any
/// number of threads.
///
/// # Examples
///
/// ```
/// use sqlmold::{Context, Expression, FunctionRegistry, Value};
///
/// let expr = Expression::parse(r#"len(ids) > 0 and status == "open""#).unwrap();
/// let params: Value = [("ids", Value::from(vec![1, 2])), ("status", Value::from("open"))]
///     .into_iter()
///     .collect();
///
/// let ctx = Context::generic(&params, "param");
/// let result = expr.evaluate(&ctx, &FunctionRegistry::builtin()).unwrap();
/// assert_eq!(result, Value::Bool(true));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    expr: Expr,
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        Ok(Expression {
            source: text.to_string(),
            expr: parse_expression(text)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate(
        &self,
        ctx: &Context<'_>,
        functions: &FunctionRegistry,
    ) -> Result<Value, EvalError> {
        Evaluator::new(functions).eval_expression(&self.expr, ctx)
    }
}

/// Executes expression trees against a parameter context.
///
/// Holds nothing but a reference to the function registry, so one evaluator
/// can serve any number of contexts.
pub struct Evaluator<'f> {
    functions: &'f FunctionRegistry,
}

impl<'f> Evaluator<'f> {
    pub fn new(functions: &'f FunctionRegistry) -> Self {
        Evaluator { functions }
    }

    /// Evaluates a single expression tree against a context.
    pub fn eval_expression(&self, expr: &Expr, ctx: &Context<'_>) -> Result<Value, EvalError> {
        self.eval_expr(expr, ctx)
    }

    fn eval_expr(&self, expr: &Expr, ctx: &Context<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Identifier(name) => self.eval_identifier(name, ctx),
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, ctx)?;
                self.apply_unary(*op, value)
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, ctx),
            Expr::Selector { base, member } => {
                let base_value = self.eval_expr(base, ctx)?;
                self.apply_selector(&base_value, member)
            }
            Expr::Index { base, index } => {
                let base_value = self.eval_expr(base, ctx)?;
                let index_value = self.eval_expr(index, ctx)?;
                self.apply_index(&base_value, &index_value)
            }
            Expr::Slice {
                base,
                low,
                high,
                max,
            } => {
                let base_value = self.eval_expr(base, ctx)?;
                let low = self.eval_bound(low.as_deref(), ctx)?;
                let high = self.eval_bound(high.as_deref(), ctx)?;
                let max = self.eval_bound(max.as_deref(), ctx)?;
                self.apply_slice(&base_value, low, high, max)
            }
            Expr::Call { function, args } => self.eval_call(function, args, ctx),
        }
    }

    fn eval_identifier(&self, name: &str, ctx: &Context<'_>) -> Result<Value, EvalError> {
        if let Some(value) = ctx.get(name) {
            return Ok(value);
        }
        match self.functions.get(name) {
            Some(function) => Ok(Value::Func(function.clone())),
            None => Err(EvalError::Undefined(name.to_string())),
        }
    }

    fn eval_bound(
        &self,
        bound: Option<&Expr>,
        ctx: &Context<'_>,
    ) -> Result<Option<usize>, EvalError> {
        match bound {
            Some(expr) => {
                let value = self.eval_expr(expr, ctx)?;
                to_index(&value).map(Some)
            }
            None => Ok(None),
        }
    }

    fn eval_call(
        &self,
        callee: &Expr,
        args: &[Expr],
        ctx: &Context<'_>,
    ) -> Result<Value, EvalError> {
        // Registered functions take precedence over parameters of the same name
        let function = match callee {
            Expr::Identifier(name) if self.functions.contains(name) => {
                self.functions.get(name).cloned()
            }
            _ => None,
        };

        let function = match function {
            Some(function) => function,
            None => match self.eval_expr(callee, ctx)? {
                Value::Func(function) => function,
                other => return Err(EvalError::NotCallable(other.kind_name().to_string())),
            },
        };

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, ctx)?);
        }

        function.call(&values)
    }

    fn eval_binary(
        &self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        ctx: &Context<'_>,
    ) -> Result<Value, EvalError> {
        match op {
            BinOp::And | BinOp::Or => {
                let left_val = self.eval_expr(left, ctx)?;
                let left_bool = expect_bool(op, &left_val)?;
                // Short-circuit
                if (op == BinOp::And && !left_bool) || (op == BinOp::Or && left_bool) {
                    return Ok(Value::Bool(left_bool));
                }
                let right_val = self.eval_expr(right, ctx)?;
                Ok(Value::Bool(expect_bool(op, &right_val)?))
            }
            BinOp::Equal | BinOp::NotEqual if left.is_nil_literal() || right.is_nil_literal() => {
                let other = if left.is_nil_literal() { right } else { left };
                let (value, nilable) = self.eval_nil_operand(other, ctx)?;
                compare_nil(op, &value, nilable).map(Value::Bool)
            }
            _ => {
                let left_val = self.eval_expr(left, ctx)?;
                let right_val = self.eval_expr(right, ctx)?;
                self.apply_binop(op, &left_val, &right_val)
            }
        }
    }

    /// Evaluate the operand of a nil comparison and report whether its slot
    /// may hold nil. Parameters, map entries, list elements and call results
    /// are dynamic references; record members follow their declared kind.
    fn eval_nil_operand(
        &self,
        expr: &Expr,
        ctx: &Context<'_>,
    ) -> Result<(Value, bool), EvalError> {
        match expr {
            Expr::Identifier(name) => match ctx.get(name) {
                Some(value) => Ok((value, ctx.nilable(name))),
                None => self.eval_identifier(name, ctx).map(|value| (value, true)),
            },
            Expr::Selector { base, member } => {
                let base_value = self.eval_expr(base, ctx)?;
                let value = self.apply_selector(&base_value, member)?;
                let nilable = match &base_value {
                    Value::Record(record) => record.nilable_member(member),
                    _ => true,
                };
                Ok((value, nilable))
            }
            Expr::Index { base, index } => {
                let base_value = self.eval_expr(base, ctx)?;
                let index_value = self.eval_expr(index, ctx)?;
                let value = self.apply_index(&base_value, &index_value)?;
                let nilable = matches!(base_value, Value::Map(_) | Value::List(_) | Value::Null);
                Ok((value, nilable))
            }
            Expr::Call { .. } => self.eval_expr(expr, ctx).map(|value| (value, true)),
            _ => {
                let value = self.eval_expr(expr, ctx)?;
                let nilable = value.is_nilable();
                Ok((value, nilable))
            }
        }
    }

    fn apply_binop(&self, op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match op {
            _ if op.is_comparison() => compare(op, left, right).map(Value::Bool),
            BinOp::EagerAnd | BinOp::EagerOr => eager_logic(op, left, right),
            _ => arithmetic(op, left, right),
        }
    }

    fn apply_unary(&self, op: UnaryOp, value: Value) -> Result<Value, EvalError> {
        match (op, value) {
            (UnaryOp::Negate, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| EvalError::Overflow(format!("-{}", n))),
            (UnaryOp::Negate, Value::Float(n)) => Ok(Value::Float(-n)),
            (UnaryOp::Negate, Value::Decimal(d)) => Ok(Value::Decimal(-d)),
            (
                UnaryOp::Plus,
                v @ (Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::Decimal(_)),
            ) => Ok(v),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Complement, Value::Int(n)) => Ok(Value::Int(!n)),
            (UnaryOp::Complement, Value::Uint(n)) => Ok(Value::Uint(!n)),
            (UnaryOp::Reference, v) => Ok(v),
            (UnaryOp::Deref, Value::Null) => {
                Err(EvalError::NilDereference("cannot dereference nil".to_string()))
            }
            (UnaryOp::Deref, v) => Ok(v),
            (op, v) => Err(EvalError::TypeError(format!(
                "operator {} not defined on {}",
                op,
                v.kind_name()
            ))),
        }
    }

    fn apply_selector(&self, base: &Value, member: &str) -> Result<Value, EvalError> {
        match base {
            Value::Record(record) => match record.record_type().member(member) {
                Some(Member::Field(index)) => {
                    Ok(record.value(index).cloned().unwrap_or(Value::Null))
                }
                Some(Member::Method(method)) => Ok(Value::Func(method.bind(member, record))),
                None => Err(EvalError::AccessError(format!(
                    "{} has no member {}",
                    record.record_type().name(),
                    member
                ))),
            },
            // Missing keys read as the zero value
            Value::Map(map) => Ok(map.get(member).cloned().unwrap_or(Value::Null)),
            Value::Null => Err(EvalError::NilDereference(format!(
                "cannot access member {} of nil",
                member
            ))),
            other => Err(EvalError::TypeError(format!(
                "cannot access member {} of {}",
                member,
                other.kind_name()
            ))),
        }
    }

    fn apply_index(&self, base: &Value, index: &Value) -> Result<Value, EvalError> {
        match (base, index) {
            (Value::Map(map), Value::String(key)) => {
                Ok(map.get(key).cloned().unwrap_or(Value::Null))
            }
            (Value::Map(_), key) => Err(EvalError::TypeError(format!(
                "map key must be string, got {}",
                key.kind_name()
            ))),
            (Value::Null, Value::String(_)) => Ok(Value::Null),
            (Value::List(items), index) => {
                let i = to_index(index)?;
                items.get(i).cloned().ok_or_else(|| out_of_range(i, items.len()))
            }
            (Value::String(s), index) => {
                let i = to_index(index)?;
                s.chars()
                    .nth(i)
                    .map(|c| Value::String(c.to_string()))
                    .ok_or_else(|| out_of_range(i, s.chars().count()))
            }
            (Value::Bytes(bytes), index) => {
                let i = to_index(index)?;
                bytes
                    .get(i)
                    .map(|b| Value::Uint(*b as u64))
                    .ok_or_else(|| out_of_range(i, bytes.len()))
            }
            (Value::Null, index) => Err(out_of_range(to_index(index)?, 0)),
            (base, index) => Err(EvalError::TypeError(format!(
                "cannot index {} with {}",
                base.kind_name(),
                index.kind_name()
            ))),
        }
    }

    fn apply_slice(
        &self,
        base: &Value,
        low: Option<usize>,
        high: Option<usize>,
        max: Option<usize>,
    ) -> Result<Value, EvalError> {
        let len = match base {
            Value::List(items) => items.len(),
            Value::Bytes(bytes) => bytes.len(),
            Value::String(s) => {
                if max.is_some() {
                    return Err(EvalError::TypeError(
                        "3-index slice of string".to_string(),
                    ));
                }
                s.chars().count()
            }
            Value::Null => 0,
            other => {
                return Err(EvalError::TypeError(format!(
                    "cannot slice {}",
                    other.kind_name()
                )));
            }
        };

        let cap = max.unwrap_or(len);
        let low = low.unwrap_or(0);
        let high = high.unwrap_or(len);
        if cap > len || high > cap || low > high {
            return Err(EvalError::AccessError(format!(
                "slice bounds out of range [{}:{}:{}] with length {}",
                low, high, cap, len
            )));
        }

        Ok(match base {
            Value::List(items) => Value::List(items[low..high].to_vec()),
            Value::Bytes(bytes) => Value::Bytes(bytes[low..high].to_vec()),
            Value::String(s) => Value::String(s.chars().skip(low).take(high - low).collect()),
            _ => Value::Null,
        })
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Nil => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Uint(n) => Value::Uint(*n),
        Literal::Float(n) => Value::Float(*n),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn expect_bool(op: BinOp, value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(EvalError::TypeError(format!(
            "operator {} requires bool operands, got {}",
            op,
            other.kind_name()
        ))),
    }
}

fn to_index(value: &Value) -> Result<usize, EvalError> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::Int(n) => Err(EvalError::AccessError(format!("negative index {}", n))),
        Value::Uint(n) => usize::try_from(*n)
            .map_err(|_| EvalError::AccessError(format!("index {} too large", n))),
        other => Err(EvalError::TypeError(format!(
            "index must be an integer, got {}",
            other.kind_name()
        ))),
    }
}

fn out_of_range(index: usize, len: usize) -> EvalError {
    EvalError::AccessError(format!("index {} out of range (length {})", index, len))
}

/// `x == nil` / `x != nil`: only nil-able slots compare against nil.
fn compare_nil(op: BinOp, other: &Value, nilable: bool) -> Result<bool, EvalError> {
    if !nilable && !other.is_null() {
        return Err(EvalError::TypeError(format!(
            "cannot compare {} {} nil",
            other.kind_name(),
            op
        )));
    }
    let is_nil = other.is_null();
    Ok(if op == BinOp::Equal { is_nil } else { !is_nil })
}

fn ordered(op: BinOp, ordering: Ordering) -> bool {
    match op {
        BinOp::Equal => ordering == Ordering::Equal,
        BinOp::NotEqual => ordering != Ordering::Equal,
        BinOp::LessThan => ordering == Ordering::Less,
        BinOp::LessEqual => ordering != Ordering::Greater,
        BinOp::GreaterThan => ordering == Ordering::Greater,
        BinOp::GreaterEqual => ordering != Ordering::Less,
        _ => false,
    }
}

/// Same-kind comparison. Signed and unsigned integers widen; every other
/// mixed pairing, including int against float, is an error.
fn compare(op: BinOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let is_equality = matches!(op, BinOp::Equal | BinOp::NotEqual);
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(ordered(op, a.cmp(b))),
        (Value::Uint(a), Value::Uint(b)) => Ok(ordered(op, a.cmp(b))),
        (Value::Int(a), Value::Uint(b)) => Ok(ordered(op, (*a as i128).cmp(&(*b as i128)))),
        (Value::Uint(a), Value::Int(b)) => Ok(ordered(op, (*a as i128).cmp(&(*b as i128)))),
        (Value::Float(a), Value::Float(b)) => Ok(match op {
            BinOp::Equal => a == b,
            BinOp::NotEqual => a != b,
            BinOp::LessThan => a < b,
            BinOp::LessEqual => a <= b,
            BinOp::GreaterThan => a > b,
            _ => a >= b,
        }),
        (Value::Decimal(a), Value::Decimal(b)) => Ok(ordered(op, a.cmp(b))),
        (Value::String(a), Value::String(b)) => Ok(ordered(op, a.cmp(b))),
        (Value::Bytes(a), Value::Bytes(b)) => Ok(ordered(op, a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) if is_equality => Ok(ordered(op, a.cmp(b))),
        (Value::Null, Value::Null) if is_equality => Ok(op == BinOp::Equal),
        (a, b) => Err(EvalError::TypeError(format!(
            "cannot compare {} {} {}",
            a.kind_name(),
            op,
            b.kind_name()
        ))),
    }
}

fn eager_logic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let and = op == BinOp::EagerAnd;
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if and { *a & *b } else { *a | *b })),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(if and { a & b } else { a | b })),
        (Value::Uint(a), Value::Uint(b)) => Ok(Value::Uint(if and { a & b } else { a | b })),
        (a, b) => Err(EvalError::TypeError(format!(
            "operator {} not defined on {} and {}",
            op,
            a.kind_name(),
            b.kind_name()
        ))),
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let overflow = || EvalError::Overflow(format!("{} {} {}", left, op, right));
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            if matches!(op, BinOp::Divide | BinOp::Modulo) && *b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let result = match op {
                BinOp::Add => a.checked_add(*b),
                BinOp::Subtract => a.checked_sub(*b),
                BinOp::Multiply => a.checked_mul(*b),
                BinOp::Divide => a.checked_div(*b),
                _ => a.checked_rem(*b),
            };
            result.map(Value::Int).ok_or_else(overflow)
        }
        (Value::Uint(a), Value::Uint(b)) => {
            if matches!(op, BinOp::Divide | BinOp::Modulo) && *b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let result = match op {
                BinOp::Add => a.checked_add(*b),
                BinOp::Subtract => a.checked_sub(*b),
                BinOp::Multiply => a.checked_mul(*b),
                BinOp::Divide => a.checked_div(*b),
                _ => a.checked_rem(*b),
            };
            result.map(Value::Uint).ok_or_else(overflow)
        }
        (Value::Float(a), Value::Float(b)) => match op {
            BinOp::Add => Ok(Value::Float(a + b)),
            BinOp::Subtract => Ok(Value::Float(a - b)),
            BinOp::Multiply => Ok(Value::Float(a * b)),
            BinOp::Divide => Ok(Value::Float(a / b)),
            _ => Err(EvalError::TypeError("operator % not defined on float".to_string())),
        },
        (Value::Decimal(a), Value::Decimal(b)) => {
            if matches!(op, BinOp::Divide | BinOp::Modulo) && b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            let result: Option<Decimal> = match op {
                BinOp::Add => a.checked_add(*b),
                BinOp::Subtract => a.checked_sub(*b),
                BinOp::Multiply => a.checked_mul(*b),
                BinOp::Divide => a.checked_div(*b),
                _ => a.checked_rem(*b),
            };
            result.map(Value::Decimal).ok_or_else(overflow)
        }
        (Value::String(a), Value::String(b)) if op == BinOp::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "cannot apply {} to {} and {}",
            op,
            a.kind_name(),
            b.kind_name()
        ))),
    }
}
