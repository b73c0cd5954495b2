//! Eager Loading System - Resolves declared relations with one batched query
//! per relation node instead of one query per parent row.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::model::ModelRef;
use crate::query::where_clause::group_predicate;
use crate::query::{Boolean, ConditionBuilder, EagerLoadNode, QueryBuilder};
use super::hydration::{loose_eq, Loaded, Record};
use super::metadata::{Relation, RelationKind};

type LoadFuture<'a> = Pin<Box<dyn Future<Output = OrmResult<Vec<Record>>> + Send + 'a>>;

/// Loads an eager-load tree onto already fetched records.
///
/// Relations are resolved depth first and strictly in sequence: each node
/// issues one query for all of its parents, its children are loaded onto the
/// fetched rows, and only then are the rows matched back to their parents.
#[derive(Debug, Clone)]
pub struct EagerLoader {
    database: Database,
}

impl EagerLoader {
    pub fn new(database: &Database) -> Self {
        Self {
            database: database.clone(),
        }
    }

    /// Load every node in `nodes` onto `records`, which belong to `model`
    pub fn load<'a>(
        &'a self,
        records: Vec<Record>,
        nodes: &'a [EagerLoadNode],
        model: ModelRef,
    ) -> LoadFuture<'a> {
        Box::pin(async move {
            let mut records = records;
            for node in nodes {
                records = self.load_relation(records, node, model).await?;
            }
            Ok(records)
        })
    }

    async fn load_relation(
        &self,
        mut records: Vec<Record>,
        node: &EagerLoadNode,
        model: ModelRef,
    ) -> OrmResult<Vec<Record>> {
        let relation = model.relation(&node.name).ok_or_else(|| {
            OrmError::relationship(format!(
                "Relation '{}' is not defined on {}",
                node.name,
                model.type_name()
            ))
        })?;
        relation.validate()?;

        let keys = parent_keys(&records, &relation.local_key);
        if keys.is_empty() {
            tracing::warn!(
                "Skipping relation '{}': no parent has a value for '{}'",
                node.name,
                relation.local_key
            );
            attach(&mut records, &node.name, &relation, &[]);
            return Ok(records);
        }

        let key_count = keys.len();
        let query = self.relation_query(node.query.clone(), &relation, keys);
        let related: Vec<Record> = query
            .fetch_rows()
            .await?
            .into_iter()
            .map(Record::from)
            .collect();

        let related = self.load(related, node.children(), relation.related).await?;

        tracing::debug!(
            "Eager loaded '{}' ({}): {} parent keys, {} rows",
            node.name,
            relation.kind,
            key_count,
            related.len()
        );

        attach(&mut records, &node.name, &relation, &related);
        Ok(records)
    }

    /// Point the node's query at the related table and restrict it to the
    /// parents' keys
    fn relation_query(&self, query: QueryBuilder, relation: &Relation, keys: Vec<Value>) -> QueryBuilder {
        let table = self.database.resolve_table(relation.related.table_name());
        let mut query = query.bind(self.database.clone()).with_model(relation.related);
        query.from = Some(table.clone());
        let qualifier = query.alias.clone().unwrap_or(table);

        // Keep an `or` in the constraint from escaping the parent-key restriction
        if query.wheres.iter().skip(1).any(|predicate| predicate.boolean == Boolean::Or) {
            let constraints = std::mem::take(&mut query.wheres);
            query.wheres.push(group_predicate(constraints, Boolean::And));
        }

        match &relation.kind {
            RelationKind::BelongsToMany(pivot) => {
                let pivot_table = self.database.resolve_table(pivot.table.table_name());
                let pivot_column = format!(
                    "{}.{} as pivot_{}",
                    pivot_table, pivot.local_pivot_key, pivot.local_pivot_key
                );

                if query.columns == ["*"] {
                    query.columns = vec![format!("{}.*", qualifier), pivot_column];
                } else {
                    query.columns.push(pivot_column);
                }

                query
                    .join(
                        &pivot_table,
                        &format!("{}.{}", pivot_table, pivot.foreign_pivot_key),
                        &format!("{}.{}", qualifier, relation.foreign_key),
                    )
                    .where_in(&format!("{}.{}", pivot_table, pivot.local_pivot_key), keys)
            }
            _ => query.where_in(&format!("{}.{}", qualifier, relation.foreign_key), keys),
        }
    }
}

/// Distinct non-null local key values, in first-seen order
pub(crate) fn parent_keys(records: &[Record], local_key: &str) -> Vec<Value> {
    let mut keys: Vec<Value> = Vec::new();
    for value in records.iter().filter_map(|record| record.get(local_key)) {
        if value.is_null() || keys.iter().any(|key| loose_eq(key, value)) {
            continue;
        }
        keys.push(value.clone());
    }
    keys
}

/// Attach the related rows matching each parent under `name`
fn attach(records: &mut [Record], name: &str, relation: &Relation, related: &[Record]) {
    let match_key = relation.match_key();
    let strip_pivot = relation.kind.pivot().is_some();

    for record in records.iter_mut() {
        let matches: Vec<Record> = match record.get(&relation.local_key) {
            Some(local) => related
                .iter()
                .filter(|item| {
                    item.get(&match_key)
                        .map(|value| loose_eq(value, local))
                        .unwrap_or(false)
                })
                .cloned()
                .map(|mut item| {
                    if strip_pivot {
                        item.attributes.remove(&match_key);
                    }
                    item
                })
                .collect(),
            None => Vec::new(),
        };

        let loaded = if relation.kind.is_single() {
            Loaded::One(matches.into_iter().next().map(Box::new))
        } else {
            Loaded::Many(matches)
        };
        record.set_relation(name, loaded);
    }
}
