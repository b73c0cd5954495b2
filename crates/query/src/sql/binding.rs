//! Positional parameter bindings produced by the compiler

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder kind inferred from a bound literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderKind {
    Integer,
    Float,
    String,
}

impl PlaceholderKind {
    /// Integers and booleans are numeric, floats are floats, everything else
    /// is bound as a string.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => PlaceholderKind::Integer,
            Value::Number(n) if n.is_i64() || n.is_u64() => PlaceholderKind::Integer,
            Value::Number(_) => PlaceholderKind::Float,
            _ => PlaceholderKind::String,
        }
    }

    /// printf-style token used by [`PlaceholderStyle::Typed`]
    pub fn format_token(self) -> &'static str {
        match self {
            PlaceholderKind::Integer => "%d",
            PlaceholderKind::Float => "%f",
            PlaceholderKind::String => "%s",
        }
    }
}

/// Token emitted in the SQL text for each binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?`
    #[default]
    Positional,
    /// `%d`, `%f` or `%s` depending on the binding kind
    Typed,
    /// `$1`, `$2`, ... numbered over the whole statement
    Numbered,
}

impl PlaceholderStyle {
    /// Render the placeholder for the binding at `position` (1-based)
    pub fn render(self, kind: PlaceholderKind, position: usize) -> String {
        match self {
            PlaceholderStyle::Positional => "?".to_string(),
            PlaceholderStyle::Typed => kind.format_token().to_string(),
            PlaceholderStyle::Numbered => format!("${}", position),
        }
    }
}

/// One positional parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub value: Value,
    pub kind: PlaceholderKind,
}

impl Binding {
    pub fn new(value: Value) -> Self {
        let kind = PlaceholderKind::infer(&value);
        Self { value, kind }
    }
}

/// SQL text together with its ordered bindings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl CompiledQuery {
    /// Raw binding values in placeholder order
    pub fn values(&self) -> Vec<Value> {
        self.bindings.iter().map(|b| b.value.clone()).collect()
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}
