//! Record Hydration - Rows with attached relations, and key matching

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backends::Row;
use crate::error::OrmResult;

/// A fetched row together with the relations loaded onto it.
///
/// Attributes and relations are stored apart and only merged when
/// serialized.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record {
    #[serde(flatten)]
    pub attributes: Row,
    #[serde(flatten)]
    pub relations: BTreeMap<String, Loaded>,
}

/// Result attached under a relation name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Loaded {
    /// HasOne / BelongsToOne: first match or nothing
    One(Option<Box<Record>>),
    /// HasMany / BelongsToMany: every match, in result order
    Many(Vec<Record>),
}

impl Loaded {
    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Loaded::One(record) => record.as_deref(),
            Loaded::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[Record]> {
        match self {
            Loaded::Many(records) => Some(records),
            Loaded::One(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Loaded::One(record) => record.is_none(),
            Loaded::Many(records) => records.is_empty(),
        }
    }
}

impl From<Row> for Record {
    fn from(attributes: Row) -> Self {
        Self {
            attributes,
            relations: BTreeMap::new(),
        }
    }
}

impl Record {
    pub fn new(attributes: Row) -> Self {
        Self::from(attributes)
    }

    /// Attribute value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    pub fn relation(&self, name: &str) -> Option<&Loaded> {
        self.relations.get(name)
    }

    pub fn set_relation(&mut self, name: &str, loaded: Loaded) {
        self.relations.insert(name.to_string(), loaded);
    }

    /// Attributes and relations merged into one JSON object
    pub fn to_json(&self) -> OrmResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Hydrate a typed value from the merged JSON representation
    pub fn hydrate<T: DeserializeOwned>(&self) -> OrmResult<T> {
        Ok(serde_json::from_value(self.to_json()?)?)
    }
}

fn numeric_string(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn string_truthiness(s: &str) -> bool {
    !(s.is_empty() || s == "0")
}

/// Loose key equality used to match related rows to their parents.
///
/// Numbers compare by value across integer and float, numeric strings equal
/// numbers and numeric strings of the same value, booleans compare to other
/// scalars by truthiness. `null` matches nothing.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (numeric_string(s), n.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        (Value::String(a), Value::String(b)) => match (numeric_string(a), numeric_string(b)) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Bool(b), Value::Number(n)) | (Value::Number(n), Value::Bool(b)) => {
            *b == (n.as_f64() != Some(0.0))
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            *b == string_truthiness(s)
        }
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(loose_eq(&json!("1"), &json!(1)));
        assert!(loose_eq(&json!(7), &json!("7")));
        assert!(loose_eq(&json!("10"), &json!("1e1")));
        assert!(loose_eq(&json!("abc"), &json!("abc")));
        assert!(loose_eq(&json!(true), &json!(1)));
        assert!(loose_eq(&json!(false), &json!(0)));

        assert!(!loose_eq(&json!("abc"), &json!("abd")));
        assert!(!loose_eq(&json!("1a"), &json!(1)));
        assert!(!loose_eq(&Value::Null, &Value::Null));
        assert!(!loose_eq(&json!(1), &Value::Null));
    }

    #[test]
    fn test_record_serializes_relations_alongside_attributes() {
        let mut post = Record::new(row(json!({"id": 1, "title": "Hello"})));
        let author = Record::new(row(json!({"id": 9, "name": "Ann"})));
        post.set_relation("author", Loaded::One(Some(Box::new(author))));
        post.set_relation("comments", Loaded::Many(Vec::new()));
        post.set_relation("editor", Loaded::One(None));

        assert_eq!(
            post.to_json().unwrap(),
            json!({
                "id": 1,
                "title": "Hello",
                "author": {"id": 9, "name": "Ann"},
                "comments": [],
                "editor": null
            })
        );
        assert!(post.relation("editor").map(Loaded::is_empty).unwrap_or(false));
    }

    #[test]
    fn test_record_hydrates_typed_value() {
        #[derive(Deserialize)]
        struct Post {
            id: i64,
            comments: Vec<Comment>,
        }

        #[derive(Deserialize)]
        struct Comment {
            body: String,
        }

        let mut post = Record::new(row(json!({"id": 3})));
        post.set_relation(
            "comments",
            Loaded::Many(vec![Record::new(row(json!({"body": "first"})))]),
        );

        let typed: Post = post.hydrate().unwrap();
        assert_eq!(typed.id, 3);
        assert_eq!(typed.comments[0].body, "first");
    }
}
