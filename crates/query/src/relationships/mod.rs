//! Relationships Module - Relation descriptors, records and eager loading

pub mod eager_loading;
pub mod hydration;
pub mod metadata;


pub use eager_loading::EagerLoader;
pub use hydration::{loose_eq, Loaded, Record};
pub use metadata::{PivotTable, Relation, RelationKind};
