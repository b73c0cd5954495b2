//! Testing utilities - an in-memory statement executor
//!
//! [`MockExecutor`] records every statement it receives and answers selects
//! from canned rows keyed by SQL fragments.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::backends::{Row, StatementExecutor};
use crate::error::{OrmError, OrmResult};
use crate::sql::Binding;

/// A statement received by the executor
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub bindings: Vec<Value>,
    pub is_select: bool,
}

#[derive(Debug, Clone)]
enum Matcher {
    Contains(String),
    Table(String),
}

impl Matcher {
    fn matches(&self, sql: &str) -> bool {
        match self {
            Matcher::Contains(needle) => sql.contains(needle.as_str()),
            Matcher::Table(table) => {
                let clause = format!("from {}", table);
                sql.contains(&format!("{} ", clause)) || sql.ends_with(&clause)
            }
        }
    }
}

/// Executor returning fixture rows; the first matching fixture wins
#[derive(Debug, Default)]
pub struct MockExecutor {
    fixtures: Vec<(Matcher, Vec<Row>)>,
    affected_rows: u64,
    last_insert_id: Value,
    failure: Option<OrmError>,
    statements: Mutex<Vec<ExecutedStatement>>,
}

fn into_rows(rows: Vec<Value>) -> Vec<Row> {
    rows.into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rows` to selects whose SQL contains `needle`
    pub fn with_rows(mut self, needle: &str, rows: Vec<Value>) -> Self {
        self.fixtures
            .push((Matcher::Contains(needle.to_string()), into_rows(rows)));
        self
    }

    /// Serve `rows` to selects reading `from <table>`
    pub fn with_table_rows(mut self, table: &str, rows: Vec<Value>) -> Self {
        self.fixtures
            .push((Matcher::Table(table.to_string()), into_rows(rows)));
        self
    }

    pub fn with_affected_rows(mut self, count: u64) -> Self {
        self.affected_rows = count;
        self
    }

    pub fn with_last_insert_id<V: Into<Value>>(mut self, id: V) -> Self {
        self.last_insert_id = id.into();
        self
    }

    /// Fail every statement with `error`
    pub fn failing(mut self, error: OrmError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Every statement received so far, in order
    pub async fn statements(&self) -> Vec<ExecutedStatement> {
        self.statements.lock().await.clone()
    }

    pub async fn select_count(&self) -> usize {
        self.statements
            .lock()
            .await
            .iter()
            .filter(|statement| statement.is_select)
            .count()
    }

    async fn record(&self, sql: &str, bindings: &[Binding], is_select: bool) -> OrmResult<()> {
        self.statements.lock().await.push(ExecutedStatement {
            sql: sql.to_string(),
            bindings: bindings.iter().map(|b| b.value.clone()).collect(),
            is_select,
        });

        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StatementExecutor for MockExecutor {
    async fn execute_select(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        self.record(sql, bindings, true).await?;
        let rows = self
            .fixtures
            .iter()
            .find(|(matcher, _)| matcher.matches(sql))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        Ok(rows)
    }

    async fn execute_mutation(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        self.record(sql, bindings, false).await?;
        Ok(self.affected_rows)
    }

    async fn last_inserted_id(&self) -> OrmResult<Value> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.last_insert_id.clone()),
        }
    }
}
