//! Model definitions - entity identity and relation declarations
//!
//! A model names its logical table and declares its relations by name. Table
//! names are logical; they are resolved through the database's
//! [`TableNameResolver`](crate::backends::TableNameResolver) before use.

use std::fmt;

use crate::relationships::Relation;

/// Database entity with a table and named relations
pub trait Model: Send + Sync + 'static {
    /// Logical table name for this model
    fn table_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Relation declared under `name`, if any
    fn relation(_name: &str) -> Option<Relation> {
        None
    }
}

/// Runtime handle to a [`Model`] type, used where the type is only known
/// from a relation declaration
#[derive(Clone, Copy)]
pub struct ModelRef {
    type_name: &'static str,
    table_name: fn() -> &'static str,
    primary_key_name: fn() -> &'static str,
    relation: fn(&str) -> Option<Relation>,
}

impl ModelRef {
    pub fn of<M: Model>() -> Self {
        Self {
            type_name: std::any::type_name::<M>(),
            table_name: M::table_name,
            primary_key_name: M::primary_key_name,
            relation: M::relation,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table_name(&self) -> &'static str {
        (self.table_name)()
    }

    pub fn primary_key_name(&self) -> &'static str {
        (self.primary_key_name)()
    }

    pub fn relation(&self, name: &str) -> Option<Relation> {
        (self.relation)(name)
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for ModelRef {}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name())
            .finish()
    }
}
