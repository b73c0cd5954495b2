//! Query Builder Types - Clause model shared by the builder and the compiler

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::OrmError;
use super::builder::QueryBuilder;

/// Every operator accepted by `where`/`having`/`on` comparisons
pub const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "<=>",
    "like", "like binary", "not like", "ilike",
    "&", "|", "^", "<<", ">>", "&~",
    "rlike", "not rlike", "regexp", "not regexp",
    "~", "~*", "!~", "!~*", "similar to",
    "not similar to", "not ilike", "~~*", "!~~*",
];

/// Operators that may be paired with a null value
pub const NULL_SAFE_OPERATORS: &[&str] = &["=", "<>", "!="];

/// Check an operator against the allow-list (case-insensitive)
pub fn is_known_operator(operator: &str) -> bool {
    let lowered = operator.to_lowercase();
    OPERATORS.contains(&lowered.as_str())
}

/// Connector placed in front of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boolean::And => write!(f, "and"),
            Boolean::Or => write!(f, "or"),
        }
    }
}

/// One where/having/on condition
#[derive(Debug, Clone)]
pub struct Predicate {
    pub boolean: Boolean,
    pub kind: PredicateKind,
}

impl Predicate {
    pub fn new(boolean: Boolean, kind: PredicateKind) -> Self {
        Self { boolean, kind }
    }

    /// Column the predicate constrains, if any
    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            PredicateKind::Basic { column, .. }
            | PredicateKind::In { column, .. }
            | PredicateKind::Between { column, .. } => Some(column),
            PredicateKind::Column { first, .. } => Some(first),
            PredicateKind::Exists { .. }
            | PredicateKind::Group { .. }
            | PredicateKind::Raw { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PredicateKind {
    /// `column <op> value`
    Basic {
        column: String,
        operator: String,
        value: Value,
    },
    /// `first <op> second`, both columns
    Column {
        first: String,
        operator: String,
        second: String,
    },
    /// `column [not] in (values...)`
    In {
        column: String,
        values: Vec<Value>,
        not: bool,
    },
    /// `column [not] between low and high`
    Between {
        column: String,
        values: [Value; 2],
        not: bool,
    },
    /// `[not] exists (subquery)`
    Exists {
        query: Box<QueryBuilder>,
        not: bool,
    },
    /// Parenthesized list of predicates
    Group {
        predicates: Vec<Predicate>,
    },
    /// Raw SQL fragment with its own bindings, one per `?` marker
    Raw {
        sql: String,
        bindings: Vec<Value>,
    },
}

/// Byte offsets of the `?` binding markers in a raw fragment.
///
/// Markers inside quoted literals or quoted identifiers are not counted.
/// Doubled quotes (`'it''s'`) close and reopen the literal, which leaves the
/// scan in the right state.
pub fn raw_markers(sql: &str) -> Vec<usize> {
    let mut markers = Vec::new();
    let mut quote: Option<char> = None;
    for (index, ch) in sql.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '?' => markers.push(index),
                _ => {}
            },
        }
    }
    markers
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "inner"),
            JoinType::Left => write!(f, "left"),
            JoinType::Right => write!(f, "right"),
        }
    }
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "asc"),
            OrderDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for OrderDirection {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            _ => Err(OrmError::invalid_input(
                "Order direction must be \"asc\" or \"desc\".",
            )),
        }
    }
}

/// One ordering term; raw expressions carry no direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub expression: String,
    pub direction: Option<OrderDirection>,
}

/// Scalar aggregate replacing the column projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    pub function: String,
    pub columns: Vec<String>,
    pub distinct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_allow_list_is_case_insensitive() {
        assert!(is_known_operator("LIKE"));
        assert!(is_known_operator("not similar to"));
        assert!(is_known_operator("&~"));
        assert!(!is_known_operator("published"));
        assert!(!is_known_operator("=="));
    }

    #[test]
    fn test_raw_markers_skip_quoted_text() {
        assert_eq!(raw_markers("a = ? and b = ?"), vec![4, 14]);
        assert_eq!(raw_markers("title <> 'why?' and id = ?"), vec![25]);
        assert_eq!(raw_markers("note = 'it''s ?' or \"q?\" = ?"), vec![27]);
        assert!(raw_markers("count(*) > 3").is_empty());
    }

    #[test]
    fn test_order_direction_parsing() {
        assert_eq!("ASC".parse::<OrderDirection>().unwrap(), OrderDirection::Asc);
        assert_eq!("desc".parse::<OrderDirection>().unwrap(), OrderDirection::Desc);
        let err = "sideways".parse::<OrderDirection>().unwrap_err();
        assert!(matches!(err, OrmError::InvalidInput(_)));
    }
}
