//! Literal and templated SQL text.
//!
//! Two marker forms are recognised inside text:
//!
//! - `#{path}` is a bound placeholder. The translator's token replaces the
//!   marker and the resolved value is appended to the arguments.
//! - `${path}` is a raw substitution. The value's canonical string form is
//!   pasted into the SQL as-is.
//!
//! Raw substitution performs **no escaping**. Any `${}` fed from user input
//! is an SQL injection vector; reserve it for trusted identifiers such as
//! table or column names.

use std::sync::LazyLock;

use log::{trace, warn};
use regex::Regex;

use crate::{
    context::Context,
    node::{RenderEnv, RenderError},
    pool::BufferPool,
    value::Value,
};

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([#$])\{\s*([A-Za-z_]\w*(?:\.\w+)*)\s*\}").expect("marker pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Bound(String),
    Raw(String),
}

/// Text node, split into literal and marker segments once at construction.
#[derive(Debug, Clone)]
pub struct TextNode {
    source: String,
    segments: Vec<Segment>,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        let source = text.into();
        let segments = split_segments(&source);
        if segments.iter().any(|s| matches!(s, Segment::Raw(_))) {
            warn!("raw ${{}} substitution in SQL text is not escaped: {}", source);
        }
        TextNode { source, segments }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the text contains any marker.
    pub fn is_dynamic(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)))
    }

    pub fn accept(
        &self,
        env: &RenderEnv<'_>,
        ctx: &Context<'_>,
    ) -> Result<(String, Vec<Value>), RenderError> {
        if !self.is_dynamic() {
            return Ok((self.source.clone(), Vec::new()));
        }

        let mut buf = BufferPool::global().checkout();
        let mut args = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => buf.push_str(text),
                Segment::Bound(path) => {
                    let value = ctx.require(path)?;
                    buf.push_str(&env.translator.translate(path));
                    args.push(value);
                }
                Segment::Raw(path) => {
                    let value = ctx.require(path)?;
                    trace!("inlining ${{{}}} as {}", path, value);
                    buf.push_str(&value.to_string());
                }
            }
        }
        Ok((buf.to_owned_string(), args))
    }
}

fn split_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for captures in MARKER.captures_iter(text) {
        let (Some(whole), Some(sigil), Some(path)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Literal(text[last..whole.start()].to_string()));
        }
        let path = path.as_str().to_string();
        segments.push(if sigil.as_str() == "#" {
            Segment::Bound(path)
        } else {
            Segment::Raw(path)
        });
        last = whole.end();
    }
    if last < text.len() {
        segments.push(Segment::Literal(text[last..].to_string()));
    }
    segments
}
