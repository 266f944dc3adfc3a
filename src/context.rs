//! Parameter contexts: uniform "get value by name" over records, maps,
//! sequences and layered groups.
//!
//! Names are dotted paths. The first segment is resolved by the context
//! variant itself; every following segment is resolved against the shape of
//! the value reached so far:
//!
//! - **map**: the segment is the key
//! - **record**: parameter-name rules
//!   (see [`RecordType::param_index`](crate::record::RecordType::param_index))
//! - **list**: the segment must parse as a non-negative index
//! - anything else: not found
//!
//! Not finding a name is not an error here; callers decide whether a
//! missing parameter is fatal.
//!
//! ```
//! use sqlmold::{Context, Value};
//!
//! let address: Value = [("city", "Oslo")].into_iter().collect();
//! let user: Value = [("address", address)].into_iter().collect();
//! let params: Value = [("user", user)].into_iter().collect();
//!
//! let ctx = Context::generic(&params, "param");
//! assert_eq!(ctx.get("user.address.city"), Some(Value::from("Oslo")));
//! assert_eq!(ctx.get("user.phone"), None);
//! ```

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
};

use thiserror::Error;

use crate::{record::Record, value::Value};

/// A name that a caller required did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("parameter not found: {0}")]
    NotFound(String),
}

/// Default synthetic key under which a bare scalar parameter is exposed.
pub const DEFAULT_PARAM_KEY: &str = "param";

/// Lookup abstraction over heterogeneous parameter shapes.
#[derive(Debug)]
pub enum Context<'a> {
    Record(&'a Record),
    Map(&'a BTreeMap<String, Value>),
    Sequence(&'a [Value]),
    /// Ordered layers; the first layer that resolves a name wins.
    Group(Vec<&'a Context<'a>>),
    Generic(GenericContext<'a>),
}

impl<'a> Context<'a> {
    /// Context that dispatches on the runtime shape of `value`, exposing a
    /// scalar under `param_key`.
    pub fn generic(value: &'a Value, param_key: &str) -> Self {
        Context::Generic(GenericContext::new(value, param_key))
    }

    /// Resolve a (possibly dotted) name. `None` means not found.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Context::Group(layers) => layers.iter().find_map(|layer| layer.get(name)),
            Context::Generic(generic) => generic.get(name),
            Context::Record(record) => {
                let (head, rest) = split_head(name);
                resolve_path(record.lookup(head)?, rest).cloned()
            }
            Context::Map(map) => {
                let (head, rest) = split_head(name);
                resolve_path(map.get(head)?, rest).cloned()
            }
            Context::Sequence(items) => {
                let (head, rest) = split_head(name);
                resolve_path(sequence_get(items, head)?, rest).cloned()
            }
        }
    }

    /// Like [`get`](Self::get), but a miss is an error.
    pub fn require(&self, name: &str) -> Result<Value, ResolveError> {
        self.get(name)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }

    /// Whether the value `name` resolves to may be compared with nil.
    ///
    /// Values reached through maps, lists or `Any` members are dynamic and
    /// always nil-able; only record members declared with a concrete scalar
    /// kind are not.
    pub fn nilable(&self, name: &str) -> bool {
        match self {
            Context::Group(layers) => layers
                .iter()
                .find(|layer| layer.contains(name))
                .is_none_or(|layer| layer.nilable(name)),
            _ => match name.rsplit_once('.') {
                Some((parent, last)) => match self.get(parent) {
                    Some(Value::Record(record)) => record.nilable_member(last),
                    _ => true,
                },
                None => match self {
                    Context::Record(record) => record.nilable_member(name),
                    Context::Generic(generic) => generic.nilable_root_member(name),
                    _ => true,
                },
            },
        }
    }

    /// Whether `name` resolves in this context.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Context over an arbitrary root value.
///
/// Memoizes resolved paths for its own lifetime only; a fresh instance is
/// created for every statement invocation so nothing is shared between
/// calls.
#[derive(Debug)]
pub struct GenericContext<'a> {
    root: &'a Value,
    param_key: String,
    cache: RefCell<HashMap<String, Option<Value>>>,
}

impl<'a> GenericContext<'a> {
    pub fn new(root: &'a Value, param_key: &str) -> Self {
        GenericContext {
            root,
            param_key: param_key.to_string(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(hit) = self.cache.borrow().get(name) {
            return hit.clone();
        }

        let resolved = self.resolve(name).cloned();
        self.cache
            .borrow_mut()
            .insert(name.to_string(), resolved.clone());
        resolved
    }

    fn nilable_root_member(&self, name: &str) -> bool {
        match self.root {
            Value::Record(record) => record.nilable_member(name),
            _ => true,
        }
    }

    fn resolve(&self, name: &str) -> Option<&'a Value> {
        match self.root {
            Value::Record(_) | Value::Map(_) | Value::List(_) => {
                resolve_path(self.root, Some(name))
            }
            // Bare scalars behave like a single-key map {param_key: value}
            scalar => {
                let (head, rest) = split_head(name);
                if head == self.param_key {
                    resolve_path(scalar, rest)
                } else {
                    None
                }
            }
        }
    }
}

fn split_head(name: &str) -> (&str, Option<&str>) {
    match name.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (name, None),
    }
}

fn sequence_get<'v>(items: &'v [Value], segment: &str) -> Option<&'v Value> {
    segment.parse::<usize>().ok().and_then(|i| items.get(i))
}

/// Resolve one segment against the shape of `value`.
pub fn resolve_member<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Map(map) => map.get(segment),
        Value::Record(record) => record.lookup(segment),
        Value::List(items) => sequence_get(items, segment),
        _ => None,
    }
}

/// Walk the remaining dotted segments of a path starting at `value`.
pub fn resolve_path<'v>(value: &'v Value, path: Option<&str>) -> Option<&'v Value> {
    let Some(path) = path else {
        return Some(value);
    };
    path.split('.')
        .try_fold(value, |current, segment| resolve_member(current, segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_memoizes_per_instance() {
        let params: Value = [("a", 1)].into_iter().collect();
        let ctx = GenericContext::new(&params, DEFAULT_PARAM_KEY);
        assert_eq!(ctx.get("a"), Some(Value::Int(1)));
        assert_eq!(ctx.get("b"), None);
        assert_eq!(ctx.cache.borrow().len(), 2);

        let other = GenericContext::new(&params, DEFAULT_PARAM_KEY);
        assert!(other.cache.borrow().is_empty());
    }

    #[test]
    fn test_split_head() {
        assert_eq!(split_head("a.b.c"), ("a", Some("b.c")));
        assert_eq!(split_head("a"), ("a", None));
    }
}
