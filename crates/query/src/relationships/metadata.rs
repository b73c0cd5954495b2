//! Relationship Metadata - Relation descriptors declared by models

use std::fmt;

use crate::error::{OrmError, OrmResult};
use crate::model::{Model, ModelRef};

/// Pivot table joining the two sides of a many-to-many relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTable {
    /// Model whose table is the pivot
    pub table: ModelRef,
    /// Pivot column holding the parent's local key
    pub local_pivot_key: String,
    /// Pivot column holding the related model's key
    pub foreign_pivot_key: String,
}

/// Defines the type of relationship between models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// One-to-one relationship (hasOne)
    HasOne,
    /// One-to-many relationship (hasMany)
    HasMany,
    /// Inverse one-to-one relationship (belongsToOne)
    BelongsToOne,
    /// Many-to-many relationship through a pivot table
    BelongsToMany(PivotTable),
}

impl RelationKind {
    /// Returns true if this relationship attaches a single record
    pub fn is_single(&self) -> bool {
        matches!(self, Self::HasOne | Self::BelongsToOne)
    }

    pub fn pivot(&self) -> Option<&PivotTable> {
        match self {
            Self::BelongsToMany(pivot) => Some(pivot),
            _ => None,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
            Self::BelongsToOne => "belongs_to_one",
            Self::BelongsToMany(_) => "belongs_to_many",
        };
        write!(f, "{}", name)
    }
}

/// A declared relation: related rows carry `foreign_key` matching the
/// parent's `local_key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub related: ModelRef,
    pub foreign_key: String,
    pub local_key: String,
}

impl Relation {
    pub fn new(kind: RelationKind, related: ModelRef, foreign_key: &str, local_key: &str) -> Self {
        Self {
            kind,
            related,
            foreign_key: foreign_key.to_string(),
            local_key: local_key.to_string(),
        }
    }

    pub fn has_one<M: Model>(foreign_key: &str, local_key: &str) -> Self {
        Self::new(RelationKind::HasOne, ModelRef::of::<M>(), foreign_key, local_key)
    }

    pub fn has_many<M: Model>(foreign_key: &str, local_key: &str) -> Self {
        Self::new(RelationKind::HasMany, ModelRef::of::<M>(), foreign_key, local_key)
    }

    pub fn belongs_to_one<M: Model>(foreign_key: &str, local_key: &str) -> Self {
        Self::new(RelationKind::BelongsToOne, ModelRef::of::<M>(), foreign_key, local_key)
    }

    /// Many-to-many through pivot model `P`.
    ///
    /// Pivot rows link `P.foreign_pivot_key = M.foreign_key` and carry the
    /// parent's `local_key` value in `P.local_pivot_key`.
    pub fn belongs_to_many<M: Model, P: Model>(
        foreign_key: &str,
        local_key: &str,
        foreign_pivot_key: &str,
        local_pivot_key: &str,
    ) -> Self {
        let pivot = PivotTable {
            table: ModelRef::of::<P>(),
            local_pivot_key: local_pivot_key.to_string(),
            foreign_pivot_key: foreign_pivot_key.to_string(),
        };
        Self::new(
            RelationKind::BelongsToMany(pivot),
            ModelRef::of::<M>(),
            foreign_key,
            local_key,
        )
    }

    /// Column of a fetched related row compared against the parent's local key
    pub fn match_key(&self) -> String {
        match &self.kind {
            RelationKind::BelongsToMany(pivot) => format!("pivot_{}", pivot.local_pivot_key),
            _ => self.foreign_key.clone(),
        }
    }

    /// Validate the relation keys
    pub fn validate(&self) -> OrmResult<()> {
        if self.foreign_key.trim().is_empty() {
            return Err(OrmError::relationship(format!(
                "{} relation to '{}' has an empty foreign key",
                self.kind,
                self.related.table_name()
            )));
        }

        if self.local_key.trim().is_empty() {
            return Err(OrmError::relationship(format!(
                "{} relation to '{}' has an empty local key",
                self.kind,
                self.related.table_name()
            )));
        }

        if let Some(pivot) = self.kind.pivot() {
            if pivot.local_pivot_key.trim().is_empty() || pivot.foreign_pivot_key.trim().is_empty() {
                return Err(OrmError::relationship(format!(
                    "Pivot table '{}' requires both pivot keys",
                    pivot.table.table_name()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag;
    impl Model for Tag {
        fn table_name() -> &'static str {
            "tags"
        }
    }

    struct PostTag;
    impl Model for PostTag {
        fn table_name() -> &'static str {
            "post_tag"
        }
    }

    #[test]
    fn test_match_key_uses_pivot_alias_for_many_to_many() {
        let relation = Relation::belongs_to_many::<Tag, PostTag>("id", "id", "tag_id", "post_id");
        assert_eq!(relation.match_key(), "pivot_post_id");
        assert!(!relation.kind.is_single());

        let relation = Relation::has_one::<Tag>("post_id", "id");
        assert_eq!(relation.match_key(), "post_id");
        assert!(relation.kind.is_single());
    }

    #[test]
    fn test_validate_rejects_empty_keys() {
        assert!(Relation::has_many::<Tag>("post_id", "id").validate().is_ok());

        let err = Relation::has_many::<Tag>("", "id").validate().unwrap_err();
        assert!(matches!(err, OrmError::Relationship(_)));

        let err = Relation::belongs_to_many::<Tag, PostTag>("id", "id", "tag_id", " ")
            .validate()
            .unwrap_err();
        assert!(matches!(err, OrmError::Relationship(_)));
    }
}
