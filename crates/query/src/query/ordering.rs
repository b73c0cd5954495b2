//! Query Builder ORDER BY, GROUP BY, HAVING operations

use serde_json::Value;

use crate::error::OrmResult;
use super::builder::QueryBuilder;
use super::types::*;
use super::where_clause::{basic_predicate, equals_predicate, raw_predicate};

impl QueryBuilder {
    /// Add ORDER BY clause with a textual direction (`asc` / `desc`)
    pub fn order_by(mut self, column: &str, direction: &str) -> OrmResult<Self> {
        let direction: OrderDirection = direction.parse()?;
        self.orders.push(OrderSpec {
            expression: column.to_string(),
            direction: Some(direction),
        });
        Ok(self)
    }

    /// Add ORDER BY clause (ascending)
    pub fn order_by_asc(mut self, column: &str) -> Self {
        self.orders.push(OrderSpec {
            expression: column.to_string(),
            direction: Some(OrderDirection::Asc),
        });
        self
    }

    /// Add ORDER BY clause (descending)
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.orders.push(OrderSpec {
            expression: column.to_string(),
            direction: Some(OrderDirection::Desc),
        });
        self
    }

    /// Add a raw ORDER BY expression
    pub fn order_by_raw(mut self, sql: &str) -> Self {
        self.orders.push(OrderSpec {
            expression: sql.to_string(),
            direction: None,
        });
        self
    }

    /// Add GROUP BY columns
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add HAVING `column = value`
    pub fn having_eq<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        self.havings
            .push(equals_predicate(column, value.into(), Boolean::And));
        self
    }

    pub fn or_having_eq<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        self.havings
            .push(equals_predicate(column, value.into(), Boolean::Or));
        self
    }

    /// Add HAVING with an explicit operator
    pub fn having_condition<V: Into<Value>>(
        mut self,
        column: &str,
        operator: &str,
        value: V,
    ) -> OrmResult<Self> {
        let predicate = basic_predicate(column, operator, value.into(), Boolean::And)?;
        self.havings.push(predicate);
        Ok(self)
    }

    pub fn or_having_condition<V: Into<Value>>(
        mut self,
        column: &str,
        operator: &str,
        value: V,
    ) -> OrmResult<Self> {
        let predicate = basic_predicate(column, operator, value.into(), Boolean::Or)?;
        self.havings.push(predicate);
        Ok(self)
    }

    pub fn having_raw<I, V>(mut self, sql: &str, bindings: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.havings.push(raw_predicate(sql, bindings, Boolean::And)?);
        Ok(self)
    }
}
