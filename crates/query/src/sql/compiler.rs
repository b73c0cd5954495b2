//! SQL compiler turning builder state into parameterized statements

use serde_json::{Map, Value};

use crate::error::{OrmError, OrmResult};
use crate::query::{raw_markers, Boolean, JoinClause, Predicate, PredicateKind, QueryBuilder};
use super::binding::{Binding, CompiledQuery, PlaceholderStyle};

/// Stateless SQL compiler; every literal becomes a placeholder plus a binding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compiler {
    style: PlaceholderStyle,
}

impl Compiler {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Compile a select statement
    pub fn compile_select(&self, query: &QueryBuilder) -> CompiledQuery {
        let mut bindings = Vec::new();
        let sql = self.select_sql(query, &mut bindings);
        CompiledQuery { sql, bindings }
    }

    /// Compile an insert of one object or an array of objects.
    ///
    /// An object keeps its key order; the array form sorts the first row's
    /// keys, even for a single row.
    pub fn compile_insert(&self, table: &str, values: &Value) -> OrmResult<CompiledQuery> {
        let rows = insert_rows(values)?;
        let mut columns: Vec<String> = rows[0].keys().cloned().collect();
        if values.is_array() {
            columns.sort();
        }

        if columns.is_empty() {
            return Err(OrmError::invalid_input("Insert values cannot be empty."));
        }

        let mut bindings = Vec::new();
        let mut tuples = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut placeholders = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = row.get(column).ok_or_else(|| {
                    OrmError::invalid_input(format!(
                        "Insert row is missing a value for column '{}'.",
                        column
                    ))
                })?;
                placeholders.push(self.placeholder(value.clone(), &mut bindings));
            }
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let sql = format!(
            "insert into {} ({}) values {}",
            table,
            columns.join(", "),
            tuples.join(", ")
        );
        Ok(CompiledQuery { sql, bindings })
    }

    /// Compile an update restricted by the query's where clause
    pub fn compile_update(&self, query: &QueryBuilder, values: &Value) -> OrmResult<CompiledQuery> {
        let values = match values {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                return Err(OrmError::invalid_input(
                    "Update values must be a non-empty object.",
                ))
            }
        };

        let mut bindings = Vec::new();
        let assignments: Vec<String> = values
            .iter()
            .map(|(column, value)| {
                format!("{} = {}", column, self.placeholder(value.clone(), &mut bindings))
            })
            .collect();

        let mut parts = vec![
            format!("update {}", self.table_reference(query)),
            format!("set {}", assignments.join(", ")),
        ];
        parts.push(self.where_sql(query, &mut bindings));

        Ok(CompiledQuery {
            sql: join_parts(parts),
            bindings,
        })
    }

    /// Compile a delete restricted by the query's where clause
    pub fn compile_delete(&self, query: &QueryBuilder) -> CompiledQuery {
        let mut bindings = Vec::new();
        let parts = vec![
            format!("delete from {}", self.table_reference(query)),
            self.where_sql(query, &mut bindings),
        ];
        CompiledQuery {
            sql: join_parts(parts),
            bindings,
        }
    }

    fn select_sql(&self, query: &QueryBuilder, bindings: &mut Vec<Binding>) -> String {
        let parts = vec![
            self.columns_sql(query),
            self.from_sql(query),
            self.joins_sql(&query.joins, bindings),
            self.where_sql(query, bindings),
            self.group_sql(query),
            self.having_sql(query, bindings),
            self.order_sql(query),
            self.limit_sql(query, bindings),
            self.offset_sql(query, bindings),
        ];
        join_parts(parts)
    }

    fn columns_sql(&self, query: &QueryBuilder) -> String {
        if let Some(aggregate) = &query.aggregate {
            let columns = aggregate.columns.join(", ");
            let distinct = if (query.distinct || aggregate.distinct) && columns != "*" {
                "distinct "
            } else {
                ""
            };
            return format!(
                "select {}({}{}) as aggregate",
                aggregate.function, distinct, columns
            );
        }

        let select = if query.distinct { "select distinct" } else { "select" };
        format!("{} {}", select, query.columns.join(", "))
    }

    fn from_sql(&self, query: &QueryBuilder) -> String {
        match &query.from {
            Some(_) => format!("from {}", self.table_reference(query)),
            None => String::new(),
        }
    }

    fn table_reference(&self, query: &QueryBuilder) -> String {
        let table = query.from.as_deref().unwrap_or_default();
        match &query.alias {
            Some(alias) => format!("{} as {}", table, alias),
            None => table.to_string(),
        }
    }

    fn joins_sql(&self, joins: &[JoinClause], bindings: &mut Vec<Binding>) -> String {
        joins
            .iter()
            .map(|join| self.join_sql(join, bindings))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn join_sql(&self, join: &JoinClause, bindings: &mut Vec<Binding>) -> String {
        let mut target = match &join.alias {
            Some(alias) => format!("{} as {}", join.table, alias),
            None => join.table.clone(),
        };

        if !join.joins.is_empty() {
            target = format!("({} {})", target, self.joins_sql(&join.joins, bindings));
        }

        let mut sql = format!("{} join {}", join.join_type, target);
        let conditions = self.predicates_sql(&join.conditions, bindings);
        if !conditions.is_empty() {
            sql.push_str(" on ");
            sql.push_str(&conditions);
        }
        sql
    }

    fn where_sql(&self, query: &QueryBuilder, bindings: &mut Vec<Binding>) -> String {
        let predicates = self.predicates_sql(&query.wheres, bindings);
        if predicates.is_empty() {
            String::new()
        } else {
            format!("where {}", predicates)
        }
    }

    fn group_sql(&self, query: &QueryBuilder) -> String {
        if query.groups.is_empty() {
            String::new()
        } else {
            format!("group by {}", query.groups.join(", "))
        }
    }

    fn having_sql(&self, query: &QueryBuilder, bindings: &mut Vec<Binding>) -> String {
        let predicates = self.predicates_sql(&query.havings, bindings);
        if predicates.is_empty() {
            String::new()
        } else {
            format!("having {}", predicates)
        }
    }

    fn order_sql(&self, query: &QueryBuilder) -> String {
        if query.orders.is_empty() {
            return String::new();
        }

        let terms: Vec<String> = query
            .orders
            .iter()
            .map(|order| match order.direction {
                Some(direction) => format!("{} {}", order.expression, direction),
                None => order.expression.clone(),
            })
            .collect();
        format!("order by {}", terms.join(", "))
    }

    fn limit_sql(&self, query: &QueryBuilder, bindings: &mut Vec<Binding>) -> String {
        match query.limit {
            Some(limit) => format!("limit {}", self.placeholder(Value::from(limit), bindings)),
            None => String::new(),
        }
    }

    fn offset_sql(&self, query: &QueryBuilder, bindings: &mut Vec<Binding>) -> String {
        match query.offset {
            Some(offset) => format!("offset {}", self.placeholder(Value::from(offset), bindings)),
            None => String::new(),
        }
    }

    /// Render a predicate list with connectors, dropping the leading one
    fn predicates_sql(&self, predicates: &[Predicate], bindings: &mut Vec<Binding>) -> String {
        if predicates.is_empty() {
            return String::new();
        }

        let rendered: Vec<String> = predicates
            .iter()
            .filter(|predicate| {
                !matches!(&predicate.kind, PredicateKind::Group { predicates } if predicates.is_empty())
            })
            .map(|predicate| {
                format!(
                    "{} {}",
                    predicate.boolean,
                    self.predicate_sql(&predicate.kind, bindings)
                )
            })
            .collect();

        strip_leading_boolean(&rendered.join(" "))
    }

    fn predicate_sql(&self, kind: &PredicateKind, bindings: &mut Vec<Binding>) -> String {
        match kind {
            PredicateKind::Basic { column, operator, value } => {
                if value.is_null() {
                    match operator.as_str() {
                        "=" => return format!("{} is null", column),
                        "<>" | "!=" => return format!("{} is not null", column),
                        _ => {}
                    }
                }
                format!(
                    "{} {} {}",
                    column,
                    operator,
                    self.placeholder(value.clone(), bindings)
                )
            }
            PredicateKind::Column { first, operator, second } => {
                format!("{} {} {}", first, operator, second)
            }
            PredicateKind::In { column, values, not } => {
                if values.is_empty() {
                    return if *not { "1 = 1".to_string() } else { "0 = 1".to_string() };
                }
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|value| self.placeholder(value.clone(), bindings))
                    .collect();
                format!(
                    "{} {}in ({})",
                    column,
                    if *not { "not " } else { "" },
                    placeholders.join(", ")
                )
            }
            PredicateKind::Between { column, values, not } => {
                let low = self.placeholder(values[0].clone(), bindings);
                let high = self.placeholder(values[1].clone(), bindings);
                format!(
                    "{} {}between {} and {}",
                    column,
                    if *not { "not " } else { "" },
                    low,
                    high
                )
            }
            PredicateKind::Exists { query, not } => {
                let nested = self.select_sql(query, bindings);
                format!("{}exists ({})", if *not { "not " } else { "" }, nested)
            }
            PredicateKind::Group { predicates } => {
                format!("({})", self.predicates_sql(predicates, bindings))
            }
            PredicateKind::Raw { sql, bindings: values } => self.raw_sql(sql, values, bindings),
        }
    }

    /// Re-render the `?` markers of a raw fragment in the configured style.
    ///
    /// Raw predicates are checked at build time to carry one binding per
    /// marker, so markers and bindings are consumed in lockstep.
    fn raw_sql(&self, sql: &str, values: &[Value], bindings: &mut Vec<Binding>) -> String {
        let mut rendered = String::with_capacity(sql.len());
        let mut cursor = 0;
        for (marker, value) in raw_markers(sql).into_iter().zip(values) {
            rendered.push_str(&sql[cursor..marker]);
            rendered.push_str(&self.placeholder(value.clone(), bindings));
            cursor = marker + 1;
        }
        rendered.push_str(&sql[cursor..]);
        rendered
    }

    fn placeholder(&self, value: Value, bindings: &mut Vec<Binding>) -> String {
        let binding = Binding::new(value);
        let token = self.style.render(binding.kind, bindings.len() + 1);
        bindings.push(binding);
        token
    }
}

fn insert_rows(values: &Value) -> OrmResult<Vec<&Map<String, Value>>> {
    let rows: Vec<&Map<String, Value>> = match values {
        Value::Object(map) => vec![map],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    OrmError::invalid_input("Bulk insert rows must be objects.")
                })
            })
            .collect::<OrmResult<_>>()?,
        _ => {
            return Err(OrmError::invalid_input(
                "Insert values must be an object or an array of objects.",
            ))
        }
    };

    if rows.is_empty() {
        return Err(OrmError::invalid_input("Insert values cannot be empty."));
    }
    Ok(rows)
}

fn join_parts(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_leading_boolean(sql: &str) -> String {
    for boolean in [Boolean::And, Boolean::Or] {
        let prefix = format!("{} ", boolean);
        match sql.get(..prefix.len()) {
            Some(head) if head.eq_ignore_ascii_case(&prefix) => {
                return sql[prefix.len()..].to_string();
            }
            _ => {}
        }
    }
    sql.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ConditionBuilder;
    use serde_json::json;

    #[test]
    fn test_leading_boolean_is_stripped_once() {
        assert_eq!(strip_leading_boolean("and a = ? and b = ?"), "a = ? and b = ?");
        assert_eq!(strip_leading_boolean("OR a = ?"), "a = ?");
        assert_eq!(strip_leading_boolean("a = ?"), "a = ?");
    }

    #[test]
    fn test_numbered_placeholders_span_subqueries() {
        let query = QueryBuilder::table("users")
            .where_eq("active", true)
            .where_exists_with(|q| {
                q.from("posts")
                    .where_column("posts.user_id", "=", "users.id")
                    .where_eq("posts.status", "live")
            })
            .limit(10);

        let compiled = Compiler::new(PlaceholderStyle::Numbered).compile_select(&query);
        assert_eq!(
            compiled.sql,
            "select * from users where active = $1 and exists (select * from posts \
             where posts.user_id = users.id and posts.status = $2) limit $3"
        );
        assert_eq!(compiled.values(), vec![json!(true), json!("live"), json!(10)]);
    }

    #[test]
    fn test_typed_placeholders_follow_binding_kind() {
        let query = QueryBuilder::table("products")
            .where_eq("stock", 3)
            .where_eq("price", 9.5)
            .where_eq("sku", "A-1");
        let compiled = Compiler::new(PlaceholderStyle::Typed).compile_select(&query);
        assert_eq!(
            compiled.sql,
            "select * from products where stock = %d and price = %f and sku = %s"
        );
    }

    #[test]
    fn test_raw_markers_follow_style() {
        let query = QueryBuilder::table("users")
            .where_raw("age > ? and age < ?", [18, 65])
            .unwrap();
        let compiled = Compiler::new(PlaceholderStyle::Numbered).compile_select(&query);
        assert_eq!(compiled.sql, "select * from users where age > $1 and age < $2");
        assert_eq!(compiled.bindings.len(), 2);
    }

    #[test]
    fn test_raw_markers_inside_literals_are_left_alone() {
        let query = QueryBuilder::table("posts")
            .where_raw("title <> 'why?' and id = ?", [5])
            .unwrap()
            .where_eq("live", true);
        let compiled = Compiler::new(PlaceholderStyle::Numbered).compile_select(&query);
        assert_eq!(
            compiled.sql,
            "select * from posts where title <> 'why?' and id = $1 and live = $2"
        );
        assert_eq!(compiled.values(), vec![json!(5), json!(true)]);
    }

    #[test]
    fn test_placeholders_and_bindings_stay_aligned_after_raw() {
        let query = QueryBuilder::table("users")
            .where_raw("a = ? and b = ?", [1, 2])
            .unwrap()
            .where_eq("c", 3);
        let compiled = Compiler::new(PlaceholderStyle::Numbered).compile_select(&query);
        assert_eq!(compiled.sql, "select * from users where a = $1 and b = $2 and c = $3");
        assert_eq!(compiled.values(), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_empty_group_is_skipped() {
        let query = QueryBuilder::table("t").where_eq("a", 1).where_group(|q| q);
        assert_eq!(query.to_sql(), "select * from t where a = ?");
    }

    #[test]
    fn test_bulk_insert_sorts_columns() {
        let compiled = Compiler::default()
            .compile_insert(
                "users",
                &json!([{"name": "a", "age": 1}, {"age": 2, "name": "b"}]),
            )
            .unwrap();
        assert_eq!(compiled.sql, "insert into users (age, name) values (?, ?), (?, ?)");
        assert_eq!(compiled.values(), vec![json!(1), json!("a"), json!(2), json!("b")]);
    }

    #[test]
    fn test_single_insert_keeps_key_order() {
        let compiled = Compiler::default()
            .compile_insert("users", &json!({"name": "a", "age": 1}))
            .unwrap();
        assert_eq!(compiled.sql, "insert into users (name, age) values (?, ?)");
    }

    #[test]
    fn test_single_row_array_insert_sorts_columns() {
        let compiled = Compiler::default()
            .compile_insert("users", &json!([{"name": "a", "age": 1}]))
            .unwrap();
        assert_eq!(compiled.sql, "insert into users (age, name) values (?, ?)");
        assert_eq!(compiled.values(), vec![json!(1), json!("a")]);
    }

    #[test]
    fn test_insert_rejects_ragged_rows() {
        let err = Compiler::default()
            .compile_insert("users", &json!([{"name": "a", "age": 1}, {"name": "b"}]))
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidInput(_)));

        let err = Compiler::default().compile_insert("users", &json!([])).unwrap_err();
        assert!(matches!(err, OrmError::InvalidInput(_)));
    }

    #[test]
    fn test_update_and_delete() {
        let query = QueryBuilder::table("users").where_eq("id", 4);
        let compiled = Compiler::default()
            .compile_update(&query, &json!({"name": "x", "age": 30}))
            .unwrap();
        assert_eq!(compiled.sql, "update users set name = ?, age = ? where id = ?");
        assert_eq!(compiled.values(), vec![json!("x"), json!(30), json!(4)]);

        let compiled = Compiler::default().compile_delete(&query);
        assert_eq!(compiled.sql, "delete from users where id = ?");
        assert_eq!(compiled.values(), vec![json!(4)]);
    }
}
