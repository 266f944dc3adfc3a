//! Callable values and the function registry consulted by the evaluator.
//!
//! Every callable (builtin, user registration, bound record method) has the
//! same shape: it takes a slice of argument values and returns
//! `Result<Value, BoxError>`. The declared [`Arity`] is checked before the
//! body runs; an [`ArgumentError`] returned by a body is reported as a
//! non-convertible argument, any other error as a failed call.
//!
//! # Builtins
//!
//! | Name | Arguments | Result |
//! |---|---|---|
//! | `len` | string, bytes, list or map | element count (chars for strings) |
//! | `substr` | string, start, count | substring by chars |
//! | `join` | list of strings, separator | string |
//! | `contains` | string and substring, list and element, or map and key | bool |
//! | `slice` | list, start, count | sub-list |
//! | `lower`, `upper`, `title` | string | string |
//! | `trim` | string, optional cutset | string |
//! | `trim_prefix`, `trim_suffix` | string, affix | string |
//! | `has_prefix`, `has_suffix` | string, affix | bool |
//! | `replace` | string, old, new | string |
//! | `split` | string, separator | list of strings |
//! | `matches` | string, regex | bool |

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock},
};

use regex::Regex;
use thiserror::Error;

use crate::{
    evaluator::EvalError,
    value::{BoxError, Value},
};

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive range
    Range(usize, usize),
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(lo, hi) => (lo..=hi).contains(&count),
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(lo, hi) => write!(f, "{} to {}", lo, hi),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

/// A function body received an argument it cannot convert.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ArgumentError(pub String);

type NativeFn = dyn Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync;

/// Callable value.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    arity: Arity,
    body: Arc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: &str, arity: Arity, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Function {
            name: Arc::from(name),
            arity,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Check the argument count, run the body and classify its failure.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        if !self.arity.accepts(args.len()) {
            return Err(EvalError::ArgumentCount {
                function: self.name.to_string(),
                expected: self.arity,
                got: args.len(),
            });
        }

        (self.body)(args).map_err(|source| match source.downcast::<ArgumentError>() {
            Ok(arg) => EvalError::Argument {
                function: self.name.to_string(),
                message: arg.0,
            },
            Err(source) => EvalError::Call {
                function: self.name.to_string(),
                source,
            },
        })
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({}/{})", self.name, self.arity)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

/// Name to callable table.
///
/// Built once at configuration time and shared by reference; there is no
/// process-global mutable registry. [`FunctionRegistry::builtin`] gives a
/// pre-seeded table that callers extend or override with
/// [`register`](Self::register).
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

static BUILTINS: LazyLock<Arc<FunctionRegistry>> =
    LazyLock::new(|| Arc::new(FunctionRegistry::builtin()));

impl FunctionRegistry {
    /// Registry with no functions at all.
    pub fn empty() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// Registry pre-seeded with the builtin functions.
    pub fn builtin() -> Self {
        let mut registry = FunctionRegistry::empty();
        registry.register("len", Arity::Exact(1), builtin_len);
        registry.register("substr", Arity::Exact(3), builtin_substr);
        registry.register("join", Arity::Exact(2), builtin_join);
        registry.register("contains", Arity::Exact(2), builtin_contains);
        registry.register("slice", Arity::Exact(3), builtin_slice);
        registry.register("lower", Arity::Exact(1), |args| {
            Ok(Value::String(arg_str("lower", args, 0)?.to_lowercase()))
        });
        registry.register("upper", Arity::Exact(1), |args| {
            Ok(Value::String(arg_str("upper", args, 0)?.to_uppercase()))
        });
        registry.register("title", Arity::Exact(1), builtin_title);
        registry.register("trim", Arity::Range(1, 2), builtin_trim);
        registry.register("trim_prefix", Arity::Exact(2), |args| {
            let s = arg_str("trim_prefix", args, 0)?;
            let prefix = arg_str("trim_prefix", args, 1)?;
            Ok(Value::String(s.strip_prefix(prefix).unwrap_or(s).to_string()))
        });
        registry.register("trim_suffix", Arity::Exact(2), |args| {
            let s = arg_str("trim_suffix", args, 0)?;
            let suffix = arg_str("trim_suffix", args, 1)?;
            Ok(Value::String(s.strip_suffix(suffix).unwrap_or(s).to_string()))
        });
        registry.register("has_prefix", Arity::Exact(2), |args| {
            let s = arg_str("has_prefix", args, 0)?;
            Ok(Value::Bool(s.starts_with(arg_str("has_prefix", args, 1)?)))
        });
        registry.register("has_suffix", Arity::Exact(2), |args| {
            let s = arg_str("has_suffix", args, 0)?;
            Ok(Value::Bool(s.ends_with(arg_str("has_suffix", args, 1)?)))
        });
        registry.register("replace", Arity::Exact(3), |args| {
            let s = arg_str("replace", args, 0)?;
            let from = arg_str("replace", args, 1)?;
            let to = arg_str("replace", args, 2)?;
            Ok(Value::String(s.replace(from, to)))
        });
        registry.register("split", Arity::Exact(2), builtin_split);
        registry.register("matches", Arity::Exact(2), builtin_matches);
        registry
    }

    /// Shared immutable builtin registry.
    pub fn shared_builtins() -> Arc<FunctionRegistry> {
        Arc::clone(&BUILTINS)
    }

    /// Add or replace a function.
    pub fn register<F>(&mut self, name: &str, arity: Arity, body: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.functions
            .insert(name.to_string(), Function::new(name, arity, body));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        FunctionRegistry::builtin()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

fn argument_error(message: String) -> BoxError {
    Box::new(ArgumentError(message))
}

fn arg_str<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a str, BoxError> {
    match &args[index] {
        Value::String(s) => Ok(s),
        other => Err(argument_error(format!(
            "{}() argument {} must be string, got {}",
            function,
            index + 1,
            other.kind_name()
        ))),
    }
}

fn arg_count(function: &str, args: &[Value], index: usize) -> Result<usize, BoxError> {
    match &args[index] {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::Uint(n) => usize::try_from(*n).map_err(|_| {
            argument_error(format!(
                "{}() argument {} is too large",
                function,
                index + 1
            ))
        }),
        other => Err(argument_error(format!(
            "{}() argument {} must be a non-negative integer, got {}",
            function,
            index + 1,
            other
        ))),
    }
}

fn builtin_len(args: &[Value]) -> Result<Value, BoxError> {
    match args[0].len() {
        Some(n) => Ok(Value::Int(n as i64)),
        None => Err(argument_error(format!(
            "len() requires string, bytes, list or map, got {}",
            args[0].kind_name()
        ))),
    }
}

/// substr(s, start, count): `count` chars starting at char `start`, clipped at the end.
fn builtin_substr(args: &[Value]) -> Result<Value, BoxError> {
    let s = arg_str("substr", args, 0)?;
    let start = arg_count("substr", args, 1)?;
    let count = arg_count("substr", args, 2)?;

    let len = s.chars().count();
    if start > len {
        return Err(argument_error(format!(
            "substr() start {} out of range for string of length {}",
            start, len
        )));
    }
    Ok(Value::String(s.chars().skip(start).take(count).collect()))
}

fn builtin_join(args: &[Value]) -> Result<Value, BoxError> {
    let separator = arg_str("join", args, 1)?;
    let items = match &args[0] {
        Value::List(items) => items,
        Value::Null => return Ok(Value::String(String::new())),
        other => {
            return Err(argument_error(format!(
                "join() requires list of strings, got {}",
                other.kind_name()
            )));
        }
    };

    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => parts.push(s.as_str()),
            other => {
                return Err(argument_error(format!(
                    "join() list elements must be strings, got {}",
                    other.kind_name()
                )));
            }
        }
    }
    Ok(Value::String(parts.join(separator)))
}

fn builtin_contains(args: &[Value]) -> Result<Value, BoxError> {
    match (&args[0], &args[1]) {
        (Value::String(s), Value::String(needle)) => Ok(Value::Bool(s.contains(needle.as_str()))),
        (Value::List(items), needle) => Ok(Value::Bool(items.contains(needle))),
        (Value::Map(map), Value::String(key)) => Ok(Value::Bool(map.contains_key(key))),
        (Value::Null, _) => Ok(Value::Bool(false)),
        (haystack, needle) => Err(argument_error(format!(
            "contains() cannot search {} for {}",
            haystack.kind_name(),
            needle.kind_name()
        ))),
    }
}

/// slice(list, start, count)
fn builtin_slice(args: &[Value]) -> Result<Value, BoxError> {
    let items = match &args[0] {
        Value::List(items) => items,
        other => {
            return Err(argument_error(format!(
                "slice() requires list, got {}",
                other.kind_name()
            )));
        }
    };
    let start = arg_count("slice", args, 1)?;
    let count = arg_count("slice", args, 2)?;

    if start > items.len() {
        return Err(argument_error(format!(
            "slice() start {} out of range for list of length {}",
            start,
            items.len()
        )));
    }
    let end = start.saturating_add(count).min(items.len());
    Ok(Value::List(items[start..end].to_vec()))
}

fn builtin_title(args: &[Value]) -> Result<Value, BoxError> {
    let s = arg_str("title", args, 0)?;
    let mut result = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if at_word_start && ch.is_alphabetic() {
            result.extend(ch.to_uppercase());
        } else {
            result.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }
    Ok(Value::String(result))
}

/// trim(s) strips whitespace; trim(s, cutset) strips any char of `cutset`.
fn builtin_trim(args: &[Value]) -> Result<Value, BoxError> {
    let s = arg_str("trim", args, 0)?;
    let trimmed = match args.get(1) {
        None => s.trim(),
        Some(_) => {
            let cutset = arg_str("trim", args, 1)?;
            s.trim_matches(|c| cutset.contains(c))
        }
    };
    Ok(Value::String(trimmed.to_string()))
}

fn builtin_split(args: &[Value]) -> Result<Value, BoxError> {
    let s = arg_str("split", args, 0)?;
    let separator = arg_str("split", args, 1)?;
    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        s.split(separator).map(|p| Value::String(p.to_string())).collect()
    };
    Ok(Value::List(parts))
}

fn builtin_matches(args: &[Value]) -> Result<Value, BoxError> {
    let s = arg_str("matches", args, 0)?;
    let pattern = arg_str("matches", args, 1)?;
    let re = Regex::new(pattern)
        .map_err(|e| argument_error(format!("matches() invalid regex: {e}")))?;
    Ok(Value::Bool(re.is_match(s)))
}
