//! Core Backend Traits
//!
//! Statement transport and table-name resolution are owned by the host
//! application; the query layer only talks to them through these traits.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::TablePrefixConfig;
use crate::error::OrmResult;
use crate::sql::Binding;

/// One result row: column name to value, in select order
pub type Row = serde_json::Map<String, Value>;

/// Executes compiled statements against a live connection
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run a select statement and return its rows
    async fn execute_select(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>>;

    /// Run an insert/update/delete and return the affected row count
    async fn execute_mutation(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64>;

    /// Identifier generated by the most recent insert
    async fn last_inserted_id(&self) -> OrmResult<Value>;
}

/// Maps a logical table name to the physical one
pub trait TableNameResolver: Send + Sync {
    fn resolve(&self, table: &str) -> String;

    fn resolve_all(&self, tables: &[&str]) -> Vec<String> {
        tables.iter().map(|table| self.resolve(table)).collect()
    }
}

/// Resolver that leaves table names untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTableResolver;

impl TableNameResolver for IdentityTableResolver {
    fn resolve(&self, table: &str) -> String {
        table.to_string()
    }
}

/// Prefixing resolver: scoped tables get `prefix`, every other table gets
/// `base_prefix`
#[derive(Debug, Clone, Default)]
pub struct PrefixTableResolver {
    prefix: String,
    base_prefix: String,
    scoped_tables: HashSet<String>,
}

impl PrefixTableResolver {
    pub fn new(prefix: &str, base_prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            base_prefix: base_prefix.to_string(),
            scoped_tables: HashSet::new(),
        }
    }

    pub fn from_config(config: &TablePrefixConfig) -> Self {
        Self::new(&config.prefix, &config.base_prefix).with_scoped_tables(&config.scoped_tables)
    }

    /// Add tables that take the scoped prefix
    pub fn with_scoped_tables<S: AsRef<str>>(mut self, tables: &[S]) -> Self {
        self.scoped_tables
            .extend(tables.iter().map(|table| table.as_ref().to_string()));
        self
    }

    pub fn is_scoped(&self, table: &str) -> bool {
        self.scoped_tables.contains(table)
    }
}

impl TableNameResolver for PrefixTableResolver {
    fn resolve(&self, table: &str) -> String {
        if self.is_scoped(table) {
            format!("{}{}", self.prefix, table)
        } else {
            format!("{}{}", self.base_prefix, table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_resolver_splits_scoped_tables() {
        let resolver = PrefixTableResolver::new("wp_2_", "wp_").with_scoped_tables(&["posts", "comments"]);

        assert_eq!(resolver.resolve("posts"), "wp_2_posts");
        assert_eq!(resolver.resolve("users"), "wp_users");
        assert_eq!(
            resolver.resolve_all(&["comments", "usermeta"]),
            vec!["wp_2_comments".to_string(), "wp_usermeta".to_string()]
        );
    }

    #[test]
    fn test_prefix_resolver_from_config() {
        let config = TablePrefixConfig {
            prefix: "site_".to_string(),
            base_prefix: "net_".to_string(),
            scoped_tables: vec!["orders".to_string()],
        };
        let resolver = PrefixTableResolver::from_config(&config);
        assert_eq!(resolver.resolve("orders"), "site_orders");
        assert_eq!(resolver.resolve("customers"), "net_customers");
    }

    #[test]
    fn test_identity_resolver() {
        assert_eq!(IdentityTableResolver.resolve("posts"), "posts");
    }
}
