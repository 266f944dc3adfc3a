//! Documentation content for sqlmold CLI

use super::CliError;

/// Available documentation topics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocTopic {
    Markers,
    Expressions,
    Functions,
    Nodes,
    Binding,
    Config,
}

impl DocTopic {
    /// Parse topic name from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "markers" | "marker" | "placeholders" => Some(Self::Markers),
            "expressions" | "expression" | "operators" | "ops" => Some(Self::Expressions),
            "functions" | "function" | "builtins" => Some(Self::Functions),
            "nodes" | "node" | "templates" => Some(Self::Nodes),
            "binding" | "bind" | "result_map" | "results" => Some(Self::Binding),
            "config" | "configuration" | "env" => Some(Self::Config),
            _ => None,
        }
    }
}

/// Get the docs overview (topic listing)
pub fn get_docs_overview() -> &'static str {
    r#"SQLMOLD DOCUMENTATION

sqlmold renders dynamic SQL templates into SQL text plus an ordered argument
list, and binds result rows back into records.

DOCUMENTATION TOPICS

  markers           #{} bound placeholders and ${} raw substitution
  expressions       Condition expression syntax and evaluation rules
  functions         Builtin functions available in expressions
  nodes             Template nodes: where, set, trim, foreach, choose, include
  binding           Result maps, associations, collections and row merging
  config            Environment variables and dialects

QUICK REFERENCE

  #{user.id}        Bound placeholder, contributes an argument
  ${table}          Raw text, NOT escaped
  a != nil && b     Condition expression

Run 'sqlmold docs <topic>' for detailed documentation.
"#
}

/// Get documentation for a specific topic
pub fn get_doc_topic(name: &str) -> Result<&'static str, CliError> {
    match DocTopic::parse(name) {
        Some(DocTopic::Markers) => Ok(MARKERS_DOC),
        Some(DocTopic::Expressions) => Ok(EXPRESSIONS_DOC),
        Some(DocTopic::Functions) => Ok(FUNCTIONS_DOC),
        Some(DocTopic::Nodes) => Ok(NODES_DOC),
        Some(DocTopic::Binding) => Ok(BINDING_DOC),
        Some(DocTopic::Config) => Ok(CONFIG_DOC),
        None => Err(CliError::UnknownTopic(name.to_string())),
    }
}

const MARKERS_DOC: &str = r#"MARKERS - Placeholders in SQL Text

BOUND PLACEHOLDER
  #{path}
    Replaced by the dialect's placeholder token. The resolved value is
    appended to the argument list in the order markers appear.

    Example:
      Params:   {"id": 5}
      Template: SELECT * FROM users WHERE id = #{id}
      Output:   SELECT * FROM users WHERE id = ?      args [5]

RAW SUBSTITUTION
  ${path}
    Replaced by the value's text. Contributes no argument.

    Example:
      Params:   {"table": "users"}
      Template: SELECT * FROM ${table}
      Output:   SELECT * FROM users                   args []

    WARNING: raw substitution is not escaped. Never feed it user input.

PATHS
  user.address.city     Map keys and record members
  items.0               List index
  param                 A bare scalar parameter (see 'config')

  A marker whose path does not resolve aborts the render with
  "parameter not found".
"#;

const EXPRESSIONS_DOC: &str = r#"EXPRESSIONS - Condition Syntax

LITERALS
  42  3.14  "text"  'text'  `raw`  true  false  nil

ACCESS
  user.name       Member or map key
  ids[0]          Index (missing map keys yield nil)
  ids[1:3]        Slice
  ids[0:2:4]      Slice with capacity bound
  len(ids)        Function call

OPERATORS (lowest to highest precedence)
  ||  or          Short-circuit OR (bool operands)
  &&  and         Short-circuit AND (bool operands)
  == != < <= > >= Comparison
  + - |           Add, subtract, eager OR
  * / % &         Multiply, divide, modulo, eager AND
  - + ! not ^ & * Unary

COMPARISON RULES
  - Operands must be the same kind: int with int, float with float,
    string with string. Signed and unsigned integers may be mixed.
  - 1 == 1.0 is an error, not false.
  - x == nil is true when x holds no value. Parameters, map entries,
    list elements and call results may always be compared with nil, so
    name != nil guards an optional parameter. Record members declared
    with a scalar kind (and scalar literals) may not.

TRUTHINESS (conditions)
  bool as-is, numbers when nonzero, strings when non-empty.
  Any other result is an error.
"#;

const FUNCTIONS_DOC: &str = r#"FUNCTIONS - Builtins

  len(x)                    Length of string, bytes, list or map
  substr(s, start, count)   Substring by characters
  join(list, sep)           Join strings
  contains(x, v)            Substring, list element or map key test
  slice(list, start, count) Sub-list
  lower(s) upper(s) title(s)
  trim(s) trim(s, cutset)
  trim_prefix(s, p) trim_suffix(s, p)
  has_prefix(s, p) has_suffix(s, p)
  replace(s, old, new)
  split(s, sep)
  matches(s, regex)

  Wrong argument counts and non-convertible arguments are errors.
"#;

const NODES_DOC: &str = r#"NODES - Template Building Blocks

  text        Literal SQL with markers
  if          Children rendered when the test is truthy
  where       Drops a leading AND/OR, prefixes WHERE, empty when no children
  set         Prefixes SET, drops a trailing comma
  trim        Custom prefix/suffix and override tokens
  foreach     Renders children per element of a list or map
                item, index   names bound for each pass
                open, close   wrap non-empty output
                separator     between passes
  choose      First 'when' with output, else 'otherwise'
  include     Reuses a named fragment, same or other namespace

Example (foreach):
  collection ids, item id, open "(", close ")", separator ","
  Params:  {"ids": [1, 2, 3]}
  Output:  (?,?,?)   args [1, 2, 3]
"#;

const BINDING_DOC: &str = r#"BINDING - Rows into Records

FLAT
  Columns match record members by column tag, then by member name.
  Unmatched columns are ignored. A scalar target needs exactly one column.

RESULT MAPS
  id          Primary key column and member
  result      Column to member
  association Nested one-to-one record
  collection  Nested one-to-many list of records

  Rows sharing a primary key merge into one parent; collection elements
  are appended in row order. Collection elements whose columns are all
  NULL (outer joins) are skipped.

ERRORS
  No rows for a single target, a second row without a collection, and
  raw byte destinations are errors. The destination is untouched on error.
"#;

const CONFIG_DOC: &str = r#"CONFIG - Environment

  SQLMOLD_PARAM_KEY   Name of a bare scalar parameter (default: param)
  SQLMOLD_DIALECT     Placeholder style (default: mysql)

DIALECTS
  mysql, sqlite       ?
  postgres            $1, $2, ...
  oracle              :name

LOGGING
  RUST_LOG=debug sqlmold render ...
"#;
