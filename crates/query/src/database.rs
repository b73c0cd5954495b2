//! Database handle - injected executor, table resolver and configuration
//!
//! Builders obtained from a [`Database`] are bound to it and can run their
//! terminal operations; builders created with [`QueryBuilder::new`] only
//! compile.

use std::fmt;
use std::sync::Arc;

use crate::backends::{IdentityTableResolver, PrefixTableResolver, StatementExecutor, TableNameResolver};
use crate::config::QueryConfig;
use crate::model::{Model, ModelRef};
use crate::query::QueryBuilder;
use crate::sql::Compiler;

/// Cheaply cloneable handle shared by every bound builder
#[derive(Clone)]
pub struct Database {
    executor: Arc<dyn StatementExecutor>,
    resolver: Arc<dyn TableNameResolver>,
    config: QueryConfig,
}

impl Database {
    /// Database with default configuration and unprefixed table names
    pub fn new(executor: Arc<dyn StatementExecutor>) -> Self {
        Self {
            executor,
            resolver: Arc::new(IdentityTableResolver),
            config: QueryConfig::default(),
        }
    }

    /// Database whose table names are prefixed according to `config.tables`
    pub fn from_config(executor: Arc<dyn StatementExecutor>, config: QueryConfig) -> Self {
        let resolver = PrefixTableResolver::from_config(&config.tables);
        Self {
            executor,
            resolver: Arc::new(resolver),
            config,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TableNameResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn executor(&self) -> &Arc<dyn StatementExecutor> {
        &self.executor
    }

    pub fn resolver(&self) -> &Arc<dyn TableNameResolver> {
        &self.resolver
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn compiler(&self) -> Compiler {
        Compiler::new(self.config.placeholder_style)
    }

    /// Physical name of a logical table
    pub fn resolve_table(&self, table: &str) -> String {
        self.resolver.resolve(table)
    }

    /// Bound builder over a logical table name
    pub fn table(&self, table: &str) -> QueryBuilder {
        QueryBuilder::table(&self.resolve_table(table)).bind(self.clone())
    }

    /// Bound builder for a model
    pub fn query<M: Model>(&self) -> QueryBuilder {
        self.table(M::table_name()).with_model(ModelRef::of::<M>())
    }

    /// Bound builder for a model with the table aliased
    pub fn query_as<M: Model>(&self, alias: &str) -> QueryBuilder {
        QueryBuilder::new()
            .from_as(&self.resolve_table(M::table_name()), alias)
            .with_model(ModelRef::of::<M>())
            .bind(self.clone())
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
