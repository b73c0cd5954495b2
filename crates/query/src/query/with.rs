//! Query Builder WITH Methods - Eager loading declarations

use crate::error::OrmResult;
use super::builder::QueryBuilder;

/// One relation to eager load.
///
/// The node's sub-builder carries caller constraints for the relation query,
/// and its own eager loads are the node's children.
#[derive(Debug, Clone)]
pub struct EagerLoadNode {
    pub name: String,
    pub query: QueryBuilder,
}

impl EagerLoadNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            query: QueryBuilder::new(),
        }
    }

    /// Nested relations declared under this one
    pub fn children(&self) -> &[EagerLoadNode] {
        &self.query.eager_loads
    }
}

/// Walk `path` (dot separated), creating missing nodes, and return the last one
fn resolve_path<'a>(nodes: &'a mut Vec<EagerLoadNode>, path: &str) -> &'a mut EagerLoadNode {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    debug_assert!(!head.trim().is_empty(), "relation name cannot be empty");

    let index = match nodes.iter().position(|node| node.name == head) {
        Some(index) => index,
        None => {
            nodes.push(EagerLoadNode::new(head));
            nodes.len() - 1
        }
    };

    let node = &mut nodes[index];
    match rest {
        Some(rest) => resolve_path(&mut node.query.eager_loads, rest),
        None => node,
    }
}

impl QueryBuilder {
    /// Eager load a relation; `"posts.comments"` loads comments of each post
    pub fn with(mut self, path: &str) -> Self {
        resolve_path(&mut self.eager_loads, path);
        self
    }

    /// Eager load several relation paths
    pub fn with_all<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            resolve_path(&mut self.eager_loads, path.as_ref());
        }
        self
    }

    /// Eager load a relation and constrain the query of its deepest node
    pub fn with_constraint<F>(mut self, path: &str, constraint: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let node = resolve_path(&mut self.eager_loads, path);
        let query = std::mem::take(&mut node.query);
        node.query = constraint(query);
        self
    }

    /// Like [`with_constraint`](Self::with_constraint) for constraints that can fail
    pub fn try_with_constraint<F>(mut self, path: &str, constraint: F) -> OrmResult<Self>
    where
        F: FnOnce(QueryBuilder) -> OrmResult<QueryBuilder>,
    {
        let node = resolve_path(&mut self.eager_loads, path);
        let query = std::mem::take(&mut node.query);
        node.query = constraint(query)?;
        Ok(self)
    }

    pub fn eager_loads(&self) -> &[EagerLoadNode] {
        &self.eager_loads
    }
}
