//! Query Builder Module - Fluent clause accumulation, compilation and execution

pub mod builder;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod types;
pub mod where_clause;
pub mod with;

pub use builder::QueryBuilder;
pub use joins::JoinClause;
pub use types::{
    raw_markers, AggregateSpec, Boolean, JoinType, OrderDirection, OrderSpec, Predicate, PredicateKind,
};
pub use where_clause::ConditionBuilder;
pub use with::EagerLoadNode;
