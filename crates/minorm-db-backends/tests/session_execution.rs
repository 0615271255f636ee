//! End-to-end tests running schemas, queries and sessions against an
//! in-memory SQLite database.

use std::sync::Arc;

use minorm_core::OrmError;
use minorm_db::{DbExecutor, FieldDef, Query, Record, Registry, Session, TableSchema, Value};
use minorm_db_backends::SqliteBackend;

fn user_schema() -> Arc<TableSchema> {
    Arc::new(
        TableSchema::new(
            "user",
            vec![
                FieldDef::integer("id").primary_key().auto_increment(),
                FieldDef::varchar("username", 32).unique(),
                FieldDef::integer("age").range(0, 150),
            ],
        )
        .unwrap(),
    )
}

fn pref_schema() -> Arc<TableSchema> {
    // No primary key: updates match on the fields left unassigned.
    Arc::new(
        TableSchema::new(
            "pref",
            vec![
                FieldDef::varchar("key", 64),
                FieldDef::varchar("val", 64),
            ],
        )
        .unwrap(),
    )
}

async fn setup(schema: &Arc<TableSchema>) -> Arc<dyn DbExecutor> {
    let db: Arc<dyn DbExecutor> = Arc::new(SqliteBackend::memory().unwrap());
    let mut registry = Registry::new();
    registry.register(Arc::clone(schema));
    registry.create_all(db.as_ref()).await.unwrap();
    db
}

fn user(schema: &Arc<TableSchema>, username: &str, age: i64) -> Record {
    let mut record = Record::new(Arc::clone(schema));
    record.set("username", username).unwrap();
    record.set("age", age).unwrap();
    record
}

#[tokio::test]
async fn test_insert_writes_back_primary_key() {
    let schema = user_schema();
    let db = setup(&schema).await;

    let mut session = Session::new(Arc::clone(&db));
    session.add(user(&schema, "lrh", 30));
    session.add(user(&schema, "guest", 20));

    let persisted = session.commit().await.unwrap();
    assert!(session.is_empty());
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[0].get("id").unwrap(), &Value::Int(1));
    assert_eq!(persisted[1].get("id").unwrap(), &Value::Int(2));
    assert!(persisted[0].read_from_db());
}

#[tokio::test]
async fn test_filter_by_username() {
    let schema = user_schema();
    let db = setup(&schema).await;

    let mut session = Session::new(Arc::clone(&db));
    session.add_all([
        user(&schema, "lrh", 30),
        user(&schema, "guest", 20),
        user(&schema, "admin", 40),
    ]);
    session.commit().await.unwrap();

    let query = Query::new(Arc::clone(&schema), db.as_ref());
    let rows = query
        .filter_by(&[("username", Value::from("lrh"))])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("age").unwrap(), &Value::Int(30));
    assert!(rows[0].read_from_db());

    let all = query.all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(query.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_filter_rejects_unknown_field_and_empty_conditions() {
    let schema = user_schema();
    let db = setup(&schema).await;
    let query = Query::new(Arc::clone(&schema), db.as_ref());

    let result = query.filter_by(&[("email", Value::from("x@y.z"))]).await;
    assert!(matches!(result, Err(OrmError::ImproperlyConfigured(_))));

    let result = query.filter_by(&[]).await;
    assert!(matches!(result, Err(OrmError::ImproperlyConfigured(_))));
}

#[tokio::test]
async fn test_get_by_single_row_errors() {
    let schema = user_schema();
    let db = setup(&schema).await;

    let mut session = Session::new(Arc::clone(&db));
    session.add_all([user(&schema, "lrh", 30), user(&schema, "guest", 30)]);
    session.commit().await.unwrap();

    let query = Query::new(Arc::clone(&schema), db.as_ref());
    let row = query
        .get_by(&[("username", Value::from("lrh"))])
        .await
        .unwrap();
    assert_eq!(row.get("age").unwrap(), &Value::Int(30));

    let result = query.get_by(&[("username", Value::from("nobody"))]).await;
    assert!(matches!(result, Err(OrmError::DoesNotExist(_))));

    let result = query.get_by(&[("age", Value::from(30))]).await;
    assert!(matches!(result, Err(OrmError::MultipleObjectsReturned(_))));
}

#[tokio::test]
async fn test_update_by_primary_key() {
    let schema = user_schema();
    let db = setup(&schema).await;

    let mut session = Session::new(Arc::clone(&db));
    session.add(user(&schema, "lrh", 30));
    session.commit().await.unwrap();

    let query = Query::new(Arc::clone(&schema), db.as_ref());
    let mut record = query
        .get_by(&[("username", Value::from("lrh"))])
        .await
        .unwrap();
    record.set("age", 31).unwrap();
    session.add(record);
    session.commit().await.unwrap();

    let row = query
        .get_by(&[("username", Value::from("lrh"))])
        .await
        .unwrap();
    assert_eq!(row.get("age").unwrap(), &Value::Int(31));
    assert_eq!(query.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_without_primary_key_matches_unchanged_fields() {
    let schema = pref_schema();
    let db = setup(&schema).await;

    let mut session = Session::new(Arc::clone(&db));
    let mut record = Record::new(Arc::clone(&schema));
    record.set("key", "theme").unwrap();
    record.set("val", "light").unwrap();
    session.add(record);
    session.commit().await.unwrap();

    let query = Query::new(Arc::clone(&schema), db.as_ref());
    let mut record = query
        .get_by(&[("key", Value::from("theme"))])
        .await
        .unwrap();
    record.set("val", "dark").unwrap();
    session.add(record);
    session.commit().await.unwrap();

    let row = query
        .get_by(&[("key", Value::from("theme"))])
        .await
        .unwrap();
    assert_eq!(row.get("val").unwrap(), &Value::from("dark"));
}

#[tokio::test]
async fn test_delete() {
    let schema = user_schema();
    let db = setup(&schema).await;

    let mut session = Session::new(Arc::clone(&db));
    session.add_all([user(&schema, "lrh", 30), user(&schema, "guest", 20)]);
    session.commit().await.unwrap();

    let query = Query::new(Arc::clone(&schema), db.as_ref());
    let record = query
        .get_by(&[("username", Value::from("guest"))])
        .await
        .unwrap();
    session.remove(record);
    session.commit().await.unwrap();

    assert_eq!(query.count().await.unwrap(), 1);
    let result = query.get_by(&[("username", Value::from("guest"))]).await;
    assert!(matches!(result, Err(OrmError::DoesNotExist(_))));
}

#[tokio::test]
async fn test_partial_batch_failure_keeps_earlier_statements() {
    let schema = user_schema();
    let db = setup(&schema).await;

    let mut session = Session::new(Arc::clone(&db));
    session.add(user(&schema, "taken", 30));
    session.commit().await.unwrap();

    // Second op violates the UNIQUE constraint on username.
    session.add(user(&schema, "fresh", 21));
    session.add(user(&schema, "taken", 22));
    session.add(user(&schema, "later", 23));

    let result = session.commit().await;
    assert!(matches!(result, Err(OrmError::Integrity(_))));

    // The first statement committed on its own; the failed op and the one
    // behind it are still queued.
    assert_eq!(session.len(), 2);
    let query = Query::new(Arc::clone(&schema), db.as_ref());
    assert_eq!(query.count().await.unwrap(), 2);
    assert_eq!(
        query
            .filter_by(&[("username", Value::from("fresh"))])
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(query
        .filter_by(&[("username", Value::from("later"))])
        .await
        .unwrap()
        .is_empty());

    session.clear();
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_commit_order_is_fifo() {
    let schema = user_schema();
    let db = setup(&schema).await;

    let mut session = Session::new(Arc::clone(&db));
    for (i, name) in ["first", "second", "third"].iter().enumerate() {
        session.add(user(&schema, name, i as i64 + 20));
    }
    let persisted = session.commit().await.unwrap();

    // Auto-increment ids mirror execution order.
    let ids: Vec<&Value> = persisted.iter().map(|r| r.get("id").unwrap()).collect();
    assert_eq!(ids, vec![&Value::Int(1), &Value::Int(2), &Value::Int(3)]);
}

#[tokio::test]
async fn test_bulk_insert() {
    let schema = user_schema();
    let db = setup(&schema).await;

    let session = Session::new(Arc::clone(&db));
    let records = vec![
        user(&schema, "a", 20),
        user(&schema, "b", 21),
        user(&schema, "c", 22),
    ];
    let affected = session.bulk_insert(&records).await.unwrap();
    assert_eq!(affected, 3);

    let query = Query::new(Arc::clone(&schema), db.as_ref());
    assert_eq!(query.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_bulk_insert_rejects_mixed_schemas() {
    let schema = user_schema();
    let other = pref_schema();
    let db = setup(&schema).await;

    let session = Session::new(Arc::clone(&db));
    let records = vec![user(&schema, "a", 20), Record::new(Arc::clone(&other))];
    let result = session.bulk_insert(&records).await;
    assert!(matches!(result, Err(OrmError::ImproperlyConfigured(_))));
}

#[tokio::test]
async fn test_registry_create_and_drop() {
    let schema = user_schema();
    let db: Arc<dyn DbExecutor> = Arc::new(SqliteBackend::memory().unwrap());

    let mut registry = Registry::new();
    registry.register(Arc::clone(&schema));
    registry.create_all(db.as_ref()).await.unwrap();
    // Idempotent thanks to IF NOT EXISTS.
    registry.create_all(db.as_ref()).await.unwrap();

    registry.drop_all(db.as_ref()).await.unwrap();
    let query = Query::new(Arc::clone(&schema), db.as_ref());
    assert!(query.count().await.is_err());
}

#[tokio::test]
async fn test_date_fields_round_trip_as_iso_strings() {
    let schema = Arc::new(
        TableSchema::new(
            "event",
            vec![
                FieldDef::integer("id").primary_key().auto_increment(),
                FieldDef::date("day"),
                FieldDef::timestamp("at"),
            ],
        )
        .unwrap(),
    );
    let db = setup(&schema).await;

    let mut record = Record::new(Arc::clone(&schema));
    record.set("day", "2024-06-15").unwrap();
    record.set("at", 1_718_445_600_i64).unwrap();

    let mut session = Session::new(Arc::clone(&db));
    session.add(record);
    session.commit().await.unwrap();

    let query = Query::new(Arc::clone(&schema), db.as_ref());
    let row = query.get_by(&[("id", Value::from(1))]).await.unwrap();
    assert_eq!(row.get("day").unwrap(), &Value::from("2024-06-15"));
    assert_eq!(row.get("at").unwrap(), &Value::from("2024-06-15 10:00:00"));
}
