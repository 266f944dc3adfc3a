//! Record types and their field-metadata tables.
//!
//! A [`RecordType`] is registered once and describes every member of a
//! record shape: its member name, the parameter-name tag used when the
//! record is a statement parameter, the column-name tag used when rows are
//! bound into it, and its declared [`Kind`]. Lookup tables for all three
//! names are computed when the type is built, so resolving a name at render
//! or bind time is a single hash lookup.
//!
//! ## Name resolution
//!
//! Member names starting with an uppercase letter are *public*: a public
//! name matches the member name first and the parameter tag second. Any
//! other name is *private* and only ever matches a parameter tag.
//!
//! ```
//! use sqlmold::record::{Field, Kind, Record, RecordType};
//!
//! let user = RecordType::builder("User")
//!     .field(Field::new("ID", Kind::Int).param("id").column("id"))
//!     .field(Field::new("Name", Kind::String).param("name").column("user_name"))
//!     .build();
//!
//! let alice = Record::new(&user).with("ID", 7).with("Name", "alice");
//!
//! assert_eq!(alice.lookup("ID"), Some(&7.into()));
//! assert_eq!(alice.lookup("name"), Some(&"alice".into()));
//! assert_eq!(alice.lookup("user_name"), None);
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    functions::{Arity, Function},
    value::{BoxError, Value},
};

/// Declared kind of a record member or bind target.
#[derive(Debug, Clone)]
pub enum Kind {
    /// Accepts any value unchanged
    Any,
    Bool,
    Int,
    Uint,
    Float,
    Decimal,
    String,
    Bytes,
    /// Unbuffered driver-owned bytes. Never accepted as a scan destination.
    RawBytes,
    /// Sequence with the given element kind
    List(Box<Kind>),
    /// String-keyed mapping
    Map,
    /// Nested record
    Record(Arc<RecordType>),
}

impl Kind {
    /// Zero value for a freshly created member of this kind.
    pub fn zero(&self) -> Value {
        match self {
            Kind::Bool => Value::Bool(false),
            Kind::Int => Value::Int(0),
            Kind::Uint => Value::Uint(0),
            Kind::Float => Value::Float(0.0),
            Kind::Decimal => Value::Decimal(rust_decimal::Decimal::ZERO),
            Kind::String => Value::String(String::new()),
            Kind::Bytes | Kind::RawBytes => Value::Bytes(Vec::new()),
            Kind::Any | Kind::List(_) | Kind::Map | Kind::Record(_) => Value::Null,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Kind::Any => "any".to_string(),
            Kind::Bool => "bool".to_string(),
            Kind::Int => "int".to_string(),
            Kind::Uint => "uint".to_string(),
            Kind::Float => "float".to_string(),
            Kind::Decimal => "decimal".to_string(),
            Kind::String => "string".to_string(),
            Kind::Bytes => "bytes".to_string(),
            Kind::RawBytes => "raw bytes".to_string(),
            Kind::List(elem) => format!("list<{}>", elem.name()),
            Kind::Map => "map".to_string(),
            Kind::Record(ty) => ty.name().to_string(),
        }
    }

    /// Whether a member of this kind may hold nil. Concrete scalars never do.
    pub fn is_nilable(&self) -> bool {
        matches!(self, Kind::Any | Kind::List(_) | Kind::Map | Kind::Record(_))
    }

    /// Whether a raw byte destination appears anywhere in this kind.
    pub fn contains_raw_bytes(&self) -> bool {
        match self {
            Kind::RawBytes => true,
            Kind::List(elem) => elem.contains_raw_bytes(),
            Kind::Record(ty) => ty.fields.iter().any(|f| f.kind.contains_raw_bytes()),
            _ => false,
        }
    }
}

/// One declared member of a record type.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    param: Option<String>,
    column: Option<String>,
    kind: Kind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Field {
            name: name.into(),
            param: None,
            column: None,
            kind,
        }
    }

    /// Parameter-name tag (resolution key for statement parameters).
    pub fn param(mut self, tag: impl Into<String>) -> Self {
        self.param = Some(tag.into());
        self
    }

    /// Column-name tag (resolution key for result binding).
    pub fn column(mut self, tag: impl Into<String>) -> Self {
        self.column = Some(tag.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_tag(&self) -> Option<&str> {
        self.param.as_deref()
    }

    pub fn column_tag(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }
}

type NullaryMethod = dyn Fn(&Record) -> Result<Value, BoxError> + Send + Sync;
type UnaryMethod = dyn Fn(&Record, &Value) -> Result<Value, BoxError> + Send + Sync;

/// Method-like member callable from expressions (`user.FullName()`).
///
/// Methods take zero or one argument and return `Result`, so failures
/// surface as evaluation errors.
#[derive(Clone)]
pub enum Method {
    Nullary(Arc<NullaryMethod>),
    Unary(Arc<UnaryMethod>),
}

impl Method {
    pub fn nullary<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Method::Nullary(Arc::new(f))
    }

    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(&Record, &Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Method::Unary(Arc::new(f))
    }

    /// Bind the method to a receiver, producing a callable value.
    pub fn bind(&self, name: &str, receiver: &Record) -> Function {
        let receiver = receiver.clone();
        match self {
            Method::Nullary(f) => {
                let f = Arc::clone(f);
                Function::new(name, Arity::Exact(0), move |_| f(&receiver))
            }
            Method::Unary(f) => {
                let f = Arc::clone(f);
                Function::new(name, Arity::Exact(1), move |args| f(&receiver, &args[0]))
            }
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Nullary(_) => write!(f, "Method::Nullary"),
            Method::Unary(_) => write!(f, "Method::Unary"),
        }
    }
}

/// Field-metadata table of a record shape.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    fields: Vec<Field>,
    methods: HashMap<String, Method>,
    by_name: HashMap<String, usize>,
    by_param: HashMap<String, usize>,
    by_column: HashMap<String, usize>,
}

/// Resolved member of a record.
#[derive(Debug)]
pub enum Member<'a> {
    Field(usize),
    Method(&'a Method),
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            fields: Vec::new(),
            methods: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Index of the member with exactly this member name.
    pub fn field_index(&self, member: &str) -> Option<usize> {
        self.by_name.get(member).copied()
    }

    /// Index of the member whose column tag equals `column`.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.by_column.get(column).copied()
    }

    /// Resolve a parameter-style name to a field index.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        if is_public(name) {
            self.by_name
                .get(name)
                .or_else(|| self.by_param.get(name))
                .copied()
        } else {
            self.by_param.get(name).copied()
        }
    }

    /// Resolve a member access: fields by the parameter rules, then public
    /// methods by name.
    pub fn member(&self, name: &str) -> Option<Member<'_>> {
        if let Some(index) = self.param_index(name) {
            return Some(Member::Field(index));
        }
        if is_public(name) {
            return self.methods.get(name).map(Member::Method);
        }
        None
    }
}

/// Builder for [`RecordType`]; lookup tables are computed by [`build`](Self::build).
pub struct RecordTypeBuilder {
    name: String,
    fields: Vec<Field>,
    methods: HashMap<String, Method>,
}

impl RecordTypeBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, name: impl Into<String>, method: Method) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    pub fn build(self) -> Arc<RecordType> {
        let mut by_name = HashMap::new();
        let mut by_param = HashMap::new();
        let mut by_column = HashMap::new();

        for (index, field) in self.fields.iter().enumerate() {
            by_name.entry(field.name.clone()).or_insert(index);
            if let Some(tag) = &field.param {
                by_param.entry(tag.clone()).or_insert(index);
            }
            if let Some(tag) = &field.column {
                by_column.entry(tag.clone()).or_insert(index);
            }
        }

        Arc::new(RecordType {
            name: self.name,
            fields: self.fields,
            methods: self.methods,
            by_name,
            by_param,
            by_column,
        })
    }
}

/// Public names start with an uppercase letter.
pub fn is_public(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Instance of a [`RecordType`].
#[derive(Debug, Clone)]
pub struct Record {
    ty: Arc<RecordType>,
    values: Vec<Value>,
}

impl Record {
    /// Create a record with every member set to its kind's zero value.
    pub fn new(ty: &Arc<RecordType>) -> Self {
        Record {
            ty: Arc::clone(ty),
            values: ty.fields.iter().map(|f| f.kind.zero()).collect(),
        }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Set a member by member name, builder style.
    ///
    /// # Panics
    ///
    /// Panics if the record type declares no member with this name.
    pub fn with(mut self, member: &str, value: impl Into<Value>) -> Self {
        if !self.set(member, value) {
            panic!("record type {} has no member {}", self.ty.name, member);
        }
        self
    }

    /// Set a member by member name. Returns `false` if no such member exists.
    pub fn set(&mut self, member: &str, value: impl Into<Value>) -> bool {
        match self.ty.field_index(member) {
            Some(index) => {
                self.values[index] = value.into();
                true
            }
            None => false,
        }
    }

    /// Value of a member by member name.
    pub fn get(&self, member: &str) -> Option<&Value> {
        self.ty.field_index(member).map(|i| &self.values[i])
    }

    /// Value of a member resolved by the parameter-name rules.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.ty.param_index(name).map(|i| &self.values[i])
    }

    /// Whether the member `name` resolves to may be compared with nil.
    /// Names that are not fields (methods, unknown names) count as nil-able.
    pub fn nilable_member(&self, name: &str) -> bool {
        self.ty
            .param_index(name)
            .and_then(|i| self.ty.field(i))
            .is_none_or(|field| field.kind().is_nilable())
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn value_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.values.get_mut(index)
    }

    /// Members paired with their metadata, in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.ty.fields.iter().zip(self.values.iter())
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.ty, &other.ty) || self.ty.name == other.ty.name)
            && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.ty.name)?;
        for (i, (field, value)) in self.entries().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Arc<RecordType> {
        RecordType::builder("Account")
            .field(Field::new("ID", Kind::Int).param("id").column("account_id"))
            .field(Field::new("secret", Kind::String))
            .field(Field::new("Owner", Kind::String).param("owner_name"))
            .method(
                "Label",
                Method::nullary(|r| {
                    let id = r.get("ID").cloned().unwrap_or(Value::Null);
                    Ok(Value::String(format!("#{}", id)))
                }),
            )
            .build()
    }

    #[test]
    fn test_public_name_prefers_member_then_tag() {
        let ty = account();
        assert_eq!(ty.param_index("ID"), Some(0));
        assert_eq!(ty.param_index("id"), Some(0));
        assert_eq!(ty.param_index("Owner"), Some(2));
        assert_eq!(ty.param_index("owner_name"), Some(2));
    }

    #[test]
    fn test_private_member_without_tag_is_unreachable() {
        let ty = account();
        assert_eq!(ty.param_index("secret"), None);
        assert!(ty.member("secret").is_none());
    }

    #[test]
    fn test_methods_resolve_by_public_name() {
        let ty = account();
        assert!(matches!(ty.member("Label"), Some(Member::Method(_))));
        assert!(ty.member("label").is_none());
    }

    #[test]
    fn test_zero_values() {
        let record = Record::new(&account());
        assert_eq!(record.get("ID"), Some(&Value::Int(0)));
        assert_eq!(record.get("Owner"), Some(&Value::String(String::new())));
    }
}
