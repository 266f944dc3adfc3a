//! Clause nodes that tidy up the edges of their rendered children.

use crate::{
    context::Context,
    node::{Node, NodeGroup, RenderEnv, RenderError},
    value::Value,
};

/// Strip `token` from the start of `s`, ignoring ASCII case.
fn strip_prefix_ci<'a>(s: &'a str, token: &str) -> Option<&'a str> {
    let head = s.get(..token.len())?;
    head.eq_ignore_ascii_case(token).then(|| &s[token.len()..])
}

fn strip_suffix_ci<'a>(s: &'a str, token: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(token.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(token).then(|| &s[..split])
}

/// `keyword` followed by whitespace at the start of `s`.
fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    strip_prefix_ci(s, keyword).filter(|rest| rest.starts_with(char::is_whitespace))
}

/// WHERE clause. Drops one leading `AND`/`OR` and adds the `WHERE` keyword,
/// or renders nothing when every child is empty.
#[derive(Debug, Default)]
pub struct WhereNode {
    body: NodeGroup,
}

impl WhereNode {
    pub fn new(children: Vec<Node>) -> Self {
        WhereNode {
            body: NodeGroup::new(children),
        }
    }

    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        let (sql, args) = self.body.accept(env, ctx)?;
        if sql.is_empty() {
            return Ok((sql, args));
        }

        let body = ["AND", "OR"]
            .iter()
            .find_map(|keyword| strip_keyword(&sql, keyword))
            .map(str::trim_start)
            .unwrap_or(sql.as_str());

        if body.is_empty() {
            return Ok((String::new(), args));
        }
        if strip_keyword(body, "WHERE").is_some() {
            return Ok((body.to_string(), args));
        }
        Ok((format!("WHERE {}", body), args))
    }
}

/// SET clause of an UPDATE. Drops one trailing comma.
#[derive(Debug, Default)]
pub struct SetNode {
    body: NodeGroup,
}

impl SetNode {
    pub fn new(children: Vec<Node>) -> Self {
        SetNode {
            body: NodeGroup::new(children),
        }
    }

    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        let (sql, args) = self.body.accept(env, ctx)?;
        if sql.is_empty() {
            return Ok((sql, args));
        }
        let body = sql.strip_suffix(',').unwrap_or(sql.as_str()).trim_end();
        Ok((format!("SET {}", body), args))
    }
}

/// General form: override tokens stripped from both ends, then the result
/// wrapped in a fixed prefix and suffix.
///
/// ```
/// use sqlmold::{Context, FunctionRegistry, Node, QuestionTranslator, RenderEnv, TrimNode, Value};
///
/// let node = TrimNode::new(vec![Node::text("a = 1, b = 2,")])
///     .prefix("(")
///     .suffix(")")
///     .suffix_overrides([","]);
///
/// let params = Value::Null;
/// let functions = FunctionRegistry::builtin();
/// let env = RenderEnv::new(&QuestionTranslator, &functions);
/// let (sql, _) = node.accept(&env, &Context::generic(&params, "param")).unwrap();
/// assert_eq!(sql, "(a = 1, b = 2)");
/// ```
#[derive(Debug, Default)]
pub struct TrimNode {
    prefix: String,
    suffix: String,
    prefix_overrides: Vec<String>,
    suffix_overrides: Vec<String>,
    body: NodeGroup,
}

impl TrimNode {
    pub fn new(children: Vec<Node>) -> Self {
        TrimNode {
            body: NodeGroup::new(children),
            ..TrimNode::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn prefix_overrides<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_overrides = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn suffix_overrides<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suffix_overrides = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        let (sql, args) = self.body.accept(env, ctx)?;
        if sql.is_empty() {
            return Ok((sql, args));
        }

        let mut body = sql.as_str();
        if let Some(rest) = self
            .prefix_overrides
            .iter()
            .find_map(|token| strip_prefix_ci(body, token))
        {
            body = rest;
        }
        if let Some(rest) = self
            .suffix_overrides
            .iter()
            .find_map(|token| strip_suffix_ci(body, token))
        {
            body = rest;
        }

        Ok((
            format!("{}{}{}", self.prefix, body.trim(), self.suffix),
            args,
        ))
    }
}
