//! Query Builder WHERE clause operations
//!
//! The condition vocabulary is shared by [`QueryBuilder`] (rendered under
//! `where`) and [`JoinClause`](super::JoinClause) (rendered under `on`).

use serde_json::Value;

use crate::error::{OrmError, OrmResult};
use super::builder::QueryBuilder;
use super::types::*;

/// Resolve the operator and value of a three-argument comparison.
///
/// A null value is only legal with `=`, `<>` or `!=`. An operator missing
/// from the allow-list is taken as the value itself, compared with `=`, and
/// the supplied value is dropped.
pub(crate) fn prepare_value_and_operator(operator: &str, value: Value) -> OrmResult<(String, Value)> {
    let known = is_known_operator(operator);
    let lowered = operator.to_lowercase();

    if value.is_null() && known && !NULL_SAFE_OPERATORS.contains(&lowered.as_str()) {
        return Err(OrmError::invalid_input("Illegal operator and value combination."));
    }

    if !known {
        return Ok(("=".to_string(), Value::String(operator.to_string())));
    }

    Ok((operator.to_string(), value))
}

pub(crate) fn basic_predicate(
    column: &str,
    operator: &str,
    value: Value,
    boolean: Boolean,
) -> OrmResult<Predicate> {
    debug_assert!(!column.trim().is_empty(), "column name cannot be empty");
    let (operator, value) = prepare_value_and_operator(operator, value)?;
    Ok(Predicate::new(
        boolean,
        PredicateKind::Basic {
            column: column.to_string(),
            operator,
            value,
        },
    ))
}

pub(crate) fn equals_predicate(column: &str, value: Value, boolean: Boolean) -> Predicate {
    debug_assert!(!column.trim().is_empty(), "column name cannot be empty");
    Predicate::new(
        boolean,
        PredicateKind::Basic {
            column: column.to_string(),
            operator: "=".to_string(),
            value,
        },
    )
}

fn column_predicate(first: &str, operator: &str, second: &str, boolean: Boolean) -> Predicate {
    let (operator, second) = if is_known_operator(operator) {
        (operator.to_string(), second.to_string())
    } else {
        ("=".to_string(), operator.to_string())
    };

    Predicate::new(
        boolean,
        PredicateKind::Column {
            first: first.to_string(),
            operator,
            second,
        },
    )
}

/// Fluent where/on conditions over an owned predicate list
pub trait ConditionBuilder: Sized {
    /// Predicate list the conditions are appended to
    fn predicates_mut(&mut self) -> &mut Vec<Predicate>;

    fn push_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates_mut().push(predicate);
        self
    }

    /// Add a basic `column = value` condition
    fn where_eq<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.push_predicate(equals_predicate(column, value.into(), Boolean::And))
    }

    /// Add an `or column = value` condition
    fn or_where_eq<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.push_predicate(equals_predicate(column, value.into(), Boolean::Or))
    }

    /// Add a condition with an explicit operator
    fn where_condition<V: Into<Value>>(self, column: &str, operator: &str, value: V) -> OrmResult<Self> {
        let predicate = basic_predicate(column, operator, value.into(), Boolean::And)?;
        Ok(self.push_predicate(predicate))
    }

    fn or_where_condition<V: Into<Value>>(self, column: &str, operator: &str, value: V) -> OrmResult<Self> {
        let predicate = basic_predicate(column, operator, value.into(), Boolean::Or)?;
        Ok(self.push_predicate(predicate))
    }

    /// Compare two columns
    fn where_column(self, first: &str, operator: &str, second: &str) -> Self {
        self.push_predicate(column_predicate(first, operator, second, Boolean::And))
    }

    fn or_where_column(self, first: &str, operator: &str, second: &str) -> Self {
        self.push_predicate(column_predicate(first, operator, second, Boolean::Or))
    }

    /// Add a `column in (...)` condition
    fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_predicate(in_predicate(column, values, Boolean::And, false))
    }

    fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_predicate(in_predicate(column, values, Boolean::And, true))
    }

    fn or_where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_predicate(in_predicate(column, values, Boolean::Or, false))
    }

    fn or_where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_predicate(in_predicate(column, values, Boolean::Or, true))
    }

    /// Add a `column between low and high` condition
    fn where_between<V: Into<Value>>(self, column: &str, values: [V; 2]) -> Self {
        self.push_predicate(between_predicate(column, values, Boolean::And, false))
    }

    fn where_not_between<V: Into<Value>>(self, column: &str, values: [V; 2]) -> Self {
        self.push_predicate(between_predicate(column, values, Boolean::And, true))
    }

    fn or_where_between<V: Into<Value>>(self, column: &str, values: [V; 2]) -> Self {
        self.push_predicate(between_predicate(column, values, Boolean::Or, false))
    }

    fn or_where_not_between<V: Into<Value>>(self, column: &str, values: [V; 2]) -> Self {
        self.push_predicate(between_predicate(column, values, Boolean::Or, true))
    }

    /// Add an `exists (subquery)` condition
    fn where_exists(self, query: QueryBuilder) -> Self {
        self.push_predicate(exists_predicate(query, Boolean::And, false))
    }

    fn where_not_exists(self, query: QueryBuilder) -> Self {
        self.push_predicate(exists_predicate(query, Boolean::And, true))
    }

    fn or_where_exists(self, query: QueryBuilder) -> Self {
        self.push_predicate(exists_predicate(query, Boolean::Or, false))
    }

    fn or_where_not_exists(self, query: QueryBuilder) -> Self {
        self.push_predicate(exists_predicate(query, Boolean::Or, true))
    }

    /// Add an exists condition built by a callback over a fresh builder
    fn where_exists_with<F>(self, callback: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.where_exists(callback(QueryBuilder::new()))
    }

    fn where_not_exists_with<F>(self, callback: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.where_not_exists(callback(QueryBuilder::new()))
    }

    /// Add a parenthesized group of conditions built by `callback`
    fn where_group<F>(self, callback: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.push_predicate(group_predicate(callback(QueryBuilder::new()).wheres, Boolean::And))
    }

    fn or_where_group<F>(self, callback: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.push_predicate(group_predicate(callback(QueryBuilder::new()).wheres, Boolean::Or))
    }

    /// Add raw WHERE condition for complex cases.
    ///
    /// Each `?` outside a quoted literal takes one binding; a count mismatch
    /// is rejected.
    fn where_raw<I, V>(self, sql: &str, bindings: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let predicate = raw_predicate(sql, bindings, Boolean::And)?;
        Ok(self.push_predicate(predicate))
    }

    fn or_where_raw<I, V>(self, sql: &str, bindings: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let predicate = raw_predicate(sql, bindings, Boolean::Or)?;
        Ok(self.push_predicate(predicate))
    }
}

fn in_predicate<I, V>(column: &str, values: I, boolean: Boolean, not: bool) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Predicate::new(
        boolean,
        PredicateKind::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            not,
        },
    )
}

fn between_predicate<V: Into<Value>>(column: &str, values: [V; 2], boolean: Boolean, not: bool) -> Predicate {
    let [low, high] = values;
    Predicate::new(
        boolean,
        PredicateKind::Between {
            column: column.to_string(),
            values: [low.into(), high.into()],
            not,
        },
    )
}

fn exists_predicate(query: QueryBuilder, boolean: Boolean, not: bool) -> Predicate {
    Predicate::new(
        boolean,
        PredicateKind::Exists {
            query: Box::new(query),
            not,
        },
    )
}

pub(crate) fn group_predicate(predicates: Vec<Predicate>, boolean: Boolean) -> Predicate {
    Predicate::new(boolean, PredicateKind::Group { predicates })
}

pub(crate) fn raw_predicate<I, V>(sql: &str, bindings: I, boolean: Boolean) -> OrmResult<Predicate>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let bindings: Vec<Value> = bindings.into_iter().map(Into::into).collect();
    let markers = raw_markers(sql).len();
    if markers != bindings.len() {
        return Err(OrmError::invalid_input(format!(
            "Raw fragment has {} placeholder(s) but {} binding(s).",
            markers,
            bindings.len()
        )));
    }

    Ok(Predicate::new(
        boolean,
        PredicateKind::Raw {
            sql: sql.to_string(),
            bindings,
        },
    ))
}

impl ConditionBuilder for QueryBuilder {
    fn predicates_mut(&mut self) -> &mut Vec<Predicate> {
        &mut self.wheres
    }
}
