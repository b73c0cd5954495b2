//! # elif-query: Query Builder and Eager Loading for elif.rs
//!
//! Fluent query construction, deterministic SQL compilation with positional
//! bindings, and a relationship resolver that loads declared relations with
//! one batched query per relation level.
//!
//! Statement execution and table-name resolution are supplied by the host
//! application through [`StatementExecutor`] and [`TableNameResolver`].

pub mod backends;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod query;
pub mod relationships;
pub mod sql;
pub mod testing;


// Re-export core traits and types
pub use backends::{IdentityTableResolver, PrefixTableResolver, Row, StatementExecutor, TableNameResolver};
pub use config::{QueryConfig, TablePrefixConfig};
pub use database::Database;
pub use error::{OrmError, OrmResult};
pub use model::{Model, ModelRef};
pub use query::{
    AggregateSpec, Boolean, ConditionBuilder, EagerLoadNode, JoinClause, JoinType, OrderDirection,
    OrderSpec, Predicate, PredicateKind, QueryBuilder,
};
pub use relationships::{EagerLoader, Loaded, PivotTable, Record, Relation, RelationKind};
pub use sql::{Binding, CompiledQuery, Compiler, PlaceholderKind, PlaceholderStyle};

/// Convenient imports for building queries
pub mod prelude {
    pub use crate::database::Database;
    pub use crate::error::{OrmError, OrmResult};
    pub use crate::model::{Model, ModelRef};
    pub use crate::query::{ConditionBuilder, JoinClause, QueryBuilder};
    pub use crate::relationships::{Loaded, Record, Relation};
    pub use serde_json::{json, Value};
}
