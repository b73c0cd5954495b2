//! Query Builder JOIN operations

use serde_json::Value;

use crate::error::OrmResult;
use super::builder::QueryBuilder;
use super::types::*;
use super::where_clause::ConditionBuilder;

/// One join target with its `on` conditions and nested joins
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub alias: Option<String>,
    pub conditions: Vec<Predicate>,
    pub joins: Vec<JoinClause>,
}

/// Split `"users as u"` into `("users", Some("u"))`
fn split_alias(table: &str) -> (String, Option<String>) {
    let trimmed = table.trim();
    let lowered = trimmed.to_lowercase();
    match lowered.find(" as ") {
        Some(index) => {
            let name = trimmed[..index].trim().to_string();
            let alias = trimmed[index + 4..].trim().to_string();
            (name, Some(alias))
        }
        None => (trimmed.to_string(), None),
    }
}

impl JoinClause {
    pub fn new(join_type: JoinType, table: &str) -> Self {
        debug_assert!(!table.trim().is_empty(), "join table cannot be empty");
        let (table, alias) = split_alias(table);
        Self {
            join_type,
            table,
            alias,
            conditions: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Alias the joined table
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Add an `on first <op> second` column comparison
    pub fn on(self, first: &str, operator: &str, second: &str) -> Self {
        self.where_column(first, operator, second)
    }

    pub fn or_on(self, first: &str, operator: &str, second: &str) -> Self {
        self.or_where_column(first, operator, second)
    }

    /// Raw `on` fragment; `?` markers must match the bindings
    pub fn on_raw<I, V>(self, sql: &str, bindings: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_raw(sql, bindings)
    }

    pub fn or_on_raw<I, V>(self, sql: &str, bindings: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.or_where_raw(sql, bindings)
    }

    pub fn on_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_in(column, values)
    }

    pub fn on_between<V: Into<Value>>(self, column: &str, values: [V; 2]) -> Self {
        self.where_between(column, values)
    }

    /// Nested INNER JOIN, rendered inside this join's parentheses
    pub fn join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_join(JoinType::Inner, table, first, second)
    }

    pub fn left_join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_join(JoinType::Left, table, first, second)
    }

    pub fn right_join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_join(JoinType::Right, table, first, second)
    }

    /// Nested INNER JOIN configured by a callback
    pub fn join_with<F>(mut self, table: &str, callback: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.joins.push(callback(JoinClause::new(JoinType::Inner, table)));
        self
    }

    fn push_join(mut self, join_type: JoinType, table: &str, first: &str, second: &str) -> Self {
        self.joins
            .push(JoinClause::new(join_type, table).on(first, "=", second));
        self
    }
}

impl ConditionBuilder for JoinClause {
    fn predicates_mut(&mut self) -> &mut Vec<Predicate> {
        &mut self.conditions
    }
}

impl QueryBuilder {
    /// Add INNER JOIN to the query
    pub fn join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_join(JoinType::Inner, table, first, second)
    }

    /// Add LEFT JOIN to the query
    pub fn left_join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_join(JoinType::Left, table, first, second)
    }

    /// Add RIGHT JOIN to the query
    pub fn right_join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_join(JoinType::Right, table, first, second)
    }

    /// Add INNER JOIN whose conditions are built by `callback`
    pub fn join_with<F>(self, table: &str, callback: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.push_join_with(JoinType::Inner, table, callback)
    }

    pub fn left_join_with<F>(self, table: &str, callback: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.push_join_with(JoinType::Left, table, callback)
    }

    pub fn right_join_with<F>(self, table: &str, callback: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.push_join_with(JoinType::Right, table, callback)
    }

    fn push_join(mut self, join_type: JoinType, table: &str, first: &str, second: &str) -> Self {
        self.joins
            .push(JoinClause::new(join_type, table).on(first, "=", second));
        self
    }

    fn push_join_with<F>(mut self, join_type: JoinType, table: &str, callback: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.joins.push(callback(JoinClause::new(join_type, table)));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alias_is_split() {
        let join = JoinClause::new(JoinType::Left, "users AS u");
        assert_eq!(join.table, "users");
        assert_eq!(join.alias.as_deref(), Some("u"));

        let join = JoinClause::new(JoinType::Inner, "users");
        assert_eq!(join.alias, None);
    }

    #[test]
    fn test_join_shorthand_adds_one_condition() {
        let query = QueryBuilder::table("posts").join("users", "users.id", "posts.user_id");
        assert_eq!(query.joins().len(), 1);
        assert_eq!(query.joins()[0].conditions.len(), 1);
        assert_eq!(query.joins()[0].join_type, JoinType::Inner);
    }

    #[test]
    fn test_nested_join_renders_in_parentheses() {
        let query = QueryBuilder::table("posts").left_join_with("users", |j| {
            j.on("users.id", "=", "posts.user_id")
                .join("profiles", "profiles.user_id", "users.id")
        });
        assert_eq!(
            query.to_sql(),
            "select * from posts left join (users inner join profiles on profiles.user_id = users.id) \
             on users.id = posts.user_id"
        );
    }

    #[test]
    fn test_join_conditions_bind_values() {
        let compiled = QueryBuilder::table("posts")
            .join_with("comments as c", |j| {
                j.on("c.post_id", "=", "posts.id")
                    .where_eq("c.approved", true)
                    .or_on_raw("c.pinned = ?", [1])
                    .unwrap()
            })
            .where_eq("posts.id", 3)
            .to_sql_with_bindings();

        assert_eq!(
            compiled.sql,
            "select * from posts inner join comments as c on c.post_id = posts.id \
             and c.approved = ? or c.pinned = ? where posts.id = ?"
        );
        assert_eq!(compiled.values(), vec![Value::Bool(true), Value::from(1), Value::from(3)]);
    }

    #[test]
    fn test_raw_on_rejects_missing_binding() {
        let none: [i64; 0] = [];
        let err = JoinClause::new(JoinType::Inner, "tags")
            .on_raw("tags.id = ?", none)
            .unwrap_err();
        assert!(matches!(err, crate::error::OrmError::InvalidInput(_)));
    }
}
