//! Query Builder execution against the bound database

use serde_json::Value;

use crate::backends::Row;
use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::relationships::{EagerLoader, Record};
use crate::sql::CompiledQuery;
use super::builder::QueryBuilder;

impl QueryBuilder {
    fn bound_database(&self) -> OrmResult<&Database> {
        self.database.as_ref().ok_or_else(|| {
            OrmError::Configuration("Query builder is not bound to a database".to_string())
        })
    }

    fn target_table(&self) -> OrmResult<&str> {
        self.from
            .as_deref()
            .ok_or_else(|| OrmError::invalid_input("Query has no target table."))
    }

    fn log_statement(database: &Database, compiled: &CompiledQuery) {
        if database.config().log_queries {
            tracing::debug!(
                "Executing query: {} ({} bindings)",
                compiled.sql,
                compiled.bindings.len()
            );
        }
    }

    /// Run the select without resolving relations
    pub(crate) async fn fetch_rows(&self) -> OrmResult<Vec<Row>> {
        let database = self.bound_database()?;
        let compiled = database.compiler().compile_select(self);
        Self::log_statement(database, &compiled);
        database
            .executor()
            .execute_select(&compiled.sql, &compiled.bindings)
            .await
    }

    async fn run_mutation(&self, compiled: CompiledQuery) -> OrmResult<u64> {
        let database = self.bound_database()?;
        Self::log_statement(database, &compiled);
        database
            .executor()
            .execute_mutation(&compiled.sql, &compiled.bindings)
            .await
    }

    /// Execute the query and load every declared relation onto the results
    pub async fn get(self) -> OrmResult<Vec<Record>> {
        let records: Vec<Record> = self
            .fetch_rows()
            .await?
            .into_iter()
            .map(Record::from)
            .collect();

        if self.eager_loads.is_empty() {
            return Ok(records);
        }

        let model = self.model.ok_or_else(|| {
            OrmError::relationship("Eager loading requires a query created for a model")
        })?;
        let loader = EagerLoader::new(self.bound_database()?);
        loader.load(records, &self.eager_loads, model).await
    }

    /// Execute the query and return the first result
    pub async fn first(self) -> OrmResult<Option<Record>> {
        Ok(self.limit(1).get().await?.into_iter().next())
    }

    /// Execute an aggregate function and return its scalar result
    pub async fn aggregate(self, function: &str, columns: &[&str]) -> OrmResult<Value> {
        let query = self.set_aggregate(function, columns);
        let rows = query.fetch_rows().await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove("aggregate"))
            .unwrap_or(Value::Null))
    }

    /// Retrieve the "count" result of the query
    pub async fn count(self, column: &str) -> OrmResult<i64> {
        let value = self.aggregate("count", &[column]).await?;
        Ok(match &value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    pub async fn min(self, column: &str) -> OrmResult<Value> {
        self.aggregate("min", &[column]).await
    }

    pub async fn max(self, column: &str) -> OrmResult<Value> {
        self.aggregate("max", &[column]).await
    }

    pub async fn avg(self, column: &str) -> OrmResult<Value> {
        self.aggregate("avg", &[column]).await
    }

    /// Retrieve the sum of the values of a given column, `0` when nothing matched
    pub async fn sum(self, column: &str) -> OrmResult<Value> {
        let value = self.aggregate("sum", &[column]).await?;
        Ok(match value {
            Value::Null => Value::from(0),
            Value::String(s) if s.is_empty() => Value::from(0),
            other => other,
        })
    }

    /// Insert one object or an array of objects
    pub async fn insert(self, values: Value) -> OrmResult<u64> {
        let compiled = self.compiler().compile_insert(self.target_table()?, &values)?;
        self.run_mutation(compiled).await
    }

    /// Insert a row and return the id the executor reports for it
    pub async fn insert_get_id(self, values: Value) -> OrmResult<Value> {
        let compiled = self.compiler().compile_insert(self.target_table()?, &values)?;
        self.run_mutation(compiled).await?;
        self.bound_database()?.executor().last_inserted_id().await
    }

    /// Update the rows matched by the where clause
    pub async fn update(self, values: Value) -> OrmResult<u64> {
        self.target_table()?;
        let compiled = self.compiler().compile_update(&self, &values)?;
        self.run_mutation(compiled).await
    }

    /// Delete the rows matched by the where clause
    pub async fn delete(self) -> OrmResult<u64> {
        self.target_table()?;
        let compiled = self.compiler().compile_delete(&self);
        self.run_mutation(compiled).await
    }
}
