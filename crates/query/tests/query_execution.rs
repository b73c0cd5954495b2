use std::sync::Arc;

use elif_query::prelude::*;
use elif_query::testing::MockExecutor;
use elif_query::{PlaceholderStyle, QueryConfig};

fn database(executor: &Arc<MockExecutor>) -> Database {
    Database::new(executor.clone())
}

#[tokio::test]
async fn test_get_returns_records_in_order() {
    let executor = Arc::new(MockExecutor::new().with_table_rows(
        "users",
        vec![json!({"id": 2, "name": "b"}), json!({"id": 1, "name": "a"})],
    ));

    let users = database(&executor)
        .table("users")
        .where_eq("active", true)
        .get()
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].get("name"), Some(&json!("b")));
    assert!(users[0].relations.is_empty());

    let statements = executor.statements().await;
    assert_eq!(statements[0].sql, "select * from users where active = ?");
    assert_eq!(statements[0].bindings, vec![json!(true)]);
}

#[tokio::test]
async fn test_first_limits_to_one_row() {
    let executor = Arc::new(MockExecutor::new());
    let user = database(&executor).table("users").first().await.unwrap();

    assert!(user.is_none());
    let statements = executor.statements().await;
    assert_eq!(statements[0].sql, "select * from users limit ?");
    assert_eq!(statements[0].bindings, vec![json!(1)]);
}

#[tokio::test]
async fn test_count_reads_aggregate_column() {
    let executor = Arc::new(MockExecutor::new().with_rows("count(", vec![json!({"aggregate": "42"})]));

    let count = database(&executor)
        .table("users")
        .order_by_asc("name")
        .count("*")
        .await
        .unwrap();

    assert_eq!(count, 42);
    let statements = executor.statements().await;
    assert_eq!(statements[0].sql, "select count(*) as aggregate from users");
}

#[tokio::test]
async fn test_sum_over_nothing_is_zero() {
    let executor = Arc::new(MockExecutor::new().with_rows("sum(", vec![json!({"aggregate": null})]));
    let db = database(&executor);

    assert_eq!(db.table("orders").sum("total").await.unwrap(), json!(0));

    let empty = Arc::new(MockExecutor::new());
    assert_eq!(database(&empty).table("orders").sum("total").await.unwrap(), json!(0));
}

#[tokio::test]
async fn test_min_max_avg_pass_values_through() {
    let executor = Arc::new(
        MockExecutor::new()
            .with_rows("min(", vec![json!({"aggregate": 3})])
            .with_rows("max(", vec![json!({"aggregate": 9})])
            .with_rows("avg(", vec![json!({"aggregate": "6.5000"})]),
    );
    let db = database(&executor);

    assert_eq!(db.table("t").min("x").await.unwrap(), json!(3));
    assert_eq!(db.table("t").max("x").await.unwrap(), json!(9));
    assert_eq!(db.table("t").avg("x").await.unwrap(), json!("6.5000"));
    assert_eq!(database(&Arc::new(MockExecutor::new())).table("t").min("x").await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_insert_and_insert_get_id() {
    let executor = Arc::new(MockExecutor::new().with_affected_rows(2).with_last_insert_id(77));
    let db = database(&executor);

    let affected = db
        .table("users")
        .insert(json!([{"name": "a", "email": "a@x"}, {"email": "b@x", "name": "b"}]))
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let id = db
        .table("users")
        .insert_get_id(json!({"name": "c", "email": "c@x"}))
        .await
        .unwrap();
    assert_eq!(id, json!(77));

    let statements = executor.statements().await;
    assert_eq!(statements[0].sql, "insert into users (email, name) values (?, ?), (?, ?)");
    assert_eq!(statements[0].bindings, vec![json!("a@x"), json!("a"), json!("b@x"), json!("b")]);
    assert_eq!(statements[1].sql, "insert into users (name, email) values (?, ?)");
}

#[tokio::test]
async fn test_insert_rejects_invalid_values() {
    let executor = Arc::new(MockExecutor::new());
    let db = database(&executor);

    let err = db.table("users").insert(json!("nope")).await.unwrap_err();
    assert!(matches!(err, OrmError::InvalidInput(_)));

    let err = db.table("users").insert(json!({})).await.unwrap_err();
    assert!(matches!(err, OrmError::InvalidInput(_)));
    assert!(executor.statements().await.is_empty());
}

#[tokio::test]
async fn test_update_and_delete() {
    let executor = Arc::new(MockExecutor::new().with_affected_rows(3));
    let db = database(&executor);

    let updated = db
        .table("posts")
        .where_eq("author_id", 5)
        .update(json!({"status": "draft"}))
        .await
        .unwrap();
    assert_eq!(updated, 3);

    let deleted = db
        .table("posts")
        .where_condition("views", "<", 10)
        .unwrap()
        .delete()
        .await
        .unwrap();
    assert_eq!(deleted, 3);

    let statements = executor.statements().await;
    assert_eq!(statements[0].sql, "update posts set status = ? where author_id = ?");
    assert_eq!(statements[0].bindings, vec![json!("draft"), json!(5)]);
    assert_eq!(statements[1].sql, "delete from posts where views < ?");
}

#[tokio::test]
async fn test_configured_placeholder_style_reaches_executor() {
    let config = QueryConfig::from_yaml_str("placeholder_style: numbered\nlog_queries: false\n").unwrap();
    let executor = Arc::new(MockExecutor::new());
    let db = Database::new(executor.clone()).with_config(config);
    assert_eq!(db.config().placeholder_style, PlaceholderStyle::Numbered);

    db.table("users")
        .where_eq("a", 1)
        .or_where_in("b", [2, 3])
        .limit(10)
        .get()
        .await
        .unwrap();

    let statements = executor.statements().await;
    assert_eq!(statements[0].sql, "select * from users where a = $1 or b in ($2, $3) limit $4");
}

#[tokio::test]
async fn test_executor_errors_are_returned_unchanged() {
    let executor = Arc::new(MockExecutor::new().failing(OrmError::Database("deadlock".to_string())));
    let db = database(&executor);

    let err = db.table("users").get().await.unwrap_err();
    assert_eq!(err, OrmError::Database("deadlock".to_string()));

    let err = db.table("users").insert_get_id(json!({"name": "x"})).await.unwrap_err();
    assert_eq!(err, OrmError::Database("deadlock".to_string()));
}
