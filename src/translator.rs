//! Dialect translators: turn a bound parameter name into a placeholder token.
//!
//! A translator is created per render. Stateful dialects (numbered
//! placeholders) count from one within that render only.

use std::{cell::Cell, fmt, str::FromStr};

use thiserror::Error;

/// Converts a resolved parameter name into the driver's placeholder token.
///
/// Called exactly once per bound placeholder, in encounter order.
pub trait Translator {
    fn translate(&self, name: &str) -> String;
}

/// `?` placeholders (MySQL, SQLite).
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionTranslator;

impl Translator for QuestionTranslator {
    fn translate(&self, _name: &str) -> String {
        "?".to_string()
    }
}

/// `$1`, `$2`, ... placeholders (PostgreSQL).
#[derive(Debug, Default)]
pub struct NumberedTranslator {
    issued: Cell<usize>,
}

impl NumberedTranslator {
    pub fn new() -> Self {
        NumberedTranslator::default()
    }
}

impl Translator for NumberedTranslator {
    fn translate(&self, _name: &str) -> String {
        let n = self.issued.get() + 1;
        self.issued.set(n);
        format!("${}", n)
    }
}

/// `:name` placeholders (Oracle). Dots in paths become underscores.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedTranslator;

impl Translator for NamedTranslator {
    fn translate(&self, name: &str) -> String {
        format!(":{}", name.replace('.', "_"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dialect: {0} (expected mysql, sqlite, postgres or oracle)")]
pub struct UnknownDialect(pub String);

/// Placeholder style of a database driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Mysql,
    Sqlite,
    Postgres,
    Oracle,
}

impl Dialect {
    /// Fresh translator for one render.
    pub fn translator(self) -> Box<dyn Translator> {
        match self {
            Dialect::Mysql | Dialect::Sqlite => Box::new(QuestionTranslator),
            Dialect::Postgres => Box::new(NumberedTranslator::new()),
            Dialect::Oracle => Box::new(NamedTranslator),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::Oracle => "oracle",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::Mysql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pgx" => Ok(Dialect::Postgres),
            "oracle" => Ok(Dialect::Oracle),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}
