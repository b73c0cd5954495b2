//! Query Builder - Core builder state

use crate::database::Database;
use crate::model::{Model, ModelRef};
use crate::sql::{CompiledQuery, Compiler};

use super::joins::JoinClause;
use super::types::*;
use super::with::EagerLoadNode;

/// Query builder accumulating the clauses of one logical query
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) database: Option<Database>,
    pub(crate) model: Option<ModelRef>,
    pub(crate) from: Option<String>,
    pub(crate) alias: Option<String>,
    pub(crate) columns: Vec<String>,
    pub(crate) distinct: bool,
    pub(crate) aggregate: Option<AggregateSpec>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) wheres: Vec<Predicate>,
    pub(crate) groups: Vec<String>,
    pub(crate) havings: Vec<Predicate>,
    pub(crate) orders: Vec<OrderSpec>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) eager_loads: Vec<EagerLoadNode>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Create an unbound query builder
    pub fn new() -> Self {
        Self {
            database: None,
            model: None,
            from: None,
            alias: None,
            columns: vec!["*".to_string()],
            distinct: false,
            aggregate: None,
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            eager_loads: Vec::new(),
        }
    }

    /// Unbound builder targeting `table`
    pub fn table(table: &str) -> Self {
        Self::new().from(table)
    }

    /// Unbound builder for a model, using its logical table name
    pub fn for_model<M: Model>() -> Self {
        let mut query = Self::table(M::table_name());
        query.model = Some(ModelRef::of::<M>());
        query
    }

    pub(crate) fn bind(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub(crate) fn with_model(mut self, model: ModelRef) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the table which the query is targeting
    pub fn from(mut self, table: &str) -> Self {
        debug_assert!(!table.trim().is_empty(), "table name cannot be empty");
        self.from = Some(table.to_string());
        self.alias = None;
        self
    }

    /// Set the target table together with an alias
    pub fn from_as(mut self, table: &str, alias: &str) -> Self {
        self = self.from(table);
        self.alias = Some(alias.to_string());
        self
    }

    /// Replace the projected columns
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        if self.columns.is_empty() {
            self.columns.push("*".to_string());
        }
        self
    }

    /// Force the query to only return distinct results
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Set the "limit" value, floored to 1
    pub fn limit(mut self, count: i64) -> Self {
        self.limit = Some(count.max(1));
        self
    }

    /// Set the "offset" value, floored to 0
    pub fn offset(mut self, count: i64) -> Self {
        self.offset = Some(count.max(0));
        self
    }

    /// Swap an aggregate in for the column projection without running it.
    ///
    /// Orderings are dropped unless the query is grouped.
    pub fn set_aggregate(mut self, function: &str, columns: &[&str]) -> Self {
        let columns = if columns.is_empty() {
            vec!["*".to_string()]
        } else {
            columns.iter().map(|c| c.to_string()).collect()
        };

        self.aggregate = Some(AggregateSpec {
            function: function.to_string(),
            columns,
            distinct: self.distinct,
        });

        if self.groups.is_empty() {
            self.orders.clear();
        }
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn wheres(&self) -> &[Predicate] {
        &self.wheres
    }

    pub fn havings(&self) -> &[Predicate] {
        &self.havings
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn orders(&self) -> &[OrderSpec] {
        &self.orders
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn model(&self) -> Option<ModelRef> {
        self.model
    }

    pub fn is_bound(&self) -> bool {
        self.database.is_some()
    }

    /// Compiler configured for the bound database, or the default one
    pub fn compiler(&self) -> Compiler {
        match &self.database {
            Some(database) => database.compiler(),
            None => Compiler::default(),
        }
    }

    /// Get the SQL representation of the query
    pub fn to_sql(&self) -> String {
        self.to_sql_with_bindings().sql
    }

    /// Compile the select statement together with its bindings
    pub fn to_sql_with_bindings(&self) -> CompiledQuery {
        self.compiler().compile_select(self)
    }
}
