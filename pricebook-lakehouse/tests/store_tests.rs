//! DeltaStore integration tests — init, append, typed updates and deletes, id sequences

use std::sync::Arc;

use deltalake::arrow::array::{Array, ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use deltalake::datafusion::prelude::{col, lit};
use tempfile::TempDir;

use pricebook_lakehouse::config::CatalogConfig;
use pricebook_lakehouse::schema;
use pricebook_lakehouse::sequence::{Entity, IdSequence};
use pricebook_lakehouse::store::{row_count, DeltaStore, Window};

fn test_config(dir: &TempDir) -> CatalogConfig {
    CatalogConfig::new(dir.path()).with_jwt_secret("test-secret-key-for-testing-only")
}

fn make_item_batch(rows: &[(i64, &str, f64)]) -> RecordBatch {
    RecordBatch::try_new(
        schema::items_arrow_schema(),
        vec![
            Arc::new(Int64Array::from(rows.iter().map(|r| r.0).collect::<Vec<_>>())) as ArrayRef,
            Arc::new(StringArray::from(rows.iter().map(|r| r.1).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.2).collect::<Vec<_>>())),
        ],
    )
    .unwrap()
}

fn names(batches: &[RecordBatch]) -> Vec<String> {
    batches
        .iter()
        .flat_map(|b| {
            let col = b
                .column_by_name("name")
                .unwrap()
                .as_any()
                .downcast_ref::<StringArray>()
                .unwrap();
            (0..col.len()).map(|i| col.value(i).to_string()).collect::<Vec<_>>()
        })
        .collect()
}

#[tokio::test]
async fn test_store_init_creates_tables() {
    let dir = TempDir::new().unwrap();
    let store = DeltaStore::new(test_config(&dir)).await.unwrap();

    for table in [schema::TABLE_USERS, schema::TABLE_ITEMS, schema::TABLE_ID_SEQUENCES] {
        assert_eq!(store.version(table).await.unwrap(), 0, "{table}");
        assert!(dir.path().join(table).join("_delta_log").exists(), "{table}");
    }
}

#[tokio::test]
async fn test_store_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = DeltaStore::new(test_config(&dir)).await.unwrap();
    store
        .append(schema::TABLE_ITEMS, make_item_batch(&[(1, "Widget", 9.99)]))
        .await
        .unwrap();
    drop(store);

    let reopened = DeltaStore::new(test_config(&dir)).await.unwrap();
    assert_eq!(row_count(&reopened.scan(schema::TABLE_ITEMS).await.unwrap()), 1);
}

#[tokio::test]
async fn test_append_and_scan() {
    let dir = TempDir::new().unwrap();
    let store = DeltaStore::new(test_config(&dir)).await.unwrap();

    let v1 = store
        .append(schema::TABLE_ITEMS, make_item_batch(&[(1, "Widget", 9.99)]))
        .await
        .unwrap();
    let v2 = store
        .append(
            schema::TABLE_ITEMS,
            make_item_batch(&[(2, "Gadget", 19.5), (3, "Doohickey", 1.0)]),
        )
        .await
        .unwrap();
    assert_eq!(v2, v1 + 1);

    let batches = store.scan(schema::TABLE_ITEMS).await.unwrap();
    assert_eq!(row_count(&batches), 3);
}

#[tokio::test]
async fn test_select_filter_order_window() {
    let dir = TempDir::new().unwrap();
    let store = DeltaStore::new(test_config(&dir)).await.unwrap();
    store
        .append(
            schema::TABLE_ITEMS,
            make_item_batch(&[(1, "A", 5.0), (2, "B", 50.0), (3, "C", 25.0), (4, "D", 500.0)]),
        )
        .await
        .unwrap();

    let batches = store
        .select(
            schema::TABLE_ITEMS,
            Some(col("price").lt(lit(100.0))),
            vec![col("price").sort(false, false)],
            Some(Window { skip: 1, fetch: 5 }),
        )
        .await
        .unwrap();

    assert_eq!(names(&batches), vec!["C", "A"]);
}

#[tokio::test]
async fn test_update_and_delete_report_row_counts() {
    let dir = TempDir::new().unwrap();
    let store = DeltaStore::new(test_config(&dir)).await.unwrap();
    store
        .append(schema::TABLE_ITEMS, make_item_batch(&[(1, "Widget", 9.99), (2, "Gadget", 3.0)]))
        .await
        .unwrap();

    let updated = store
        .update(
            schema::TABLE_ITEMS,
            col("id").eq(lit(1_i64)),
            vec![("name", lit("Renamed")), ("price", lit(12.0))],
        )
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let missing = store
        .update(schema::TABLE_ITEMS, col("id").eq(lit(99_i64)), vec![("price", lit(1.0))])
        .await
        .unwrap();
    assert_eq!(missing, 0);

    assert_eq!(
        store.delete(schema::TABLE_ITEMS, col("id").eq(lit(2_i64))).await.unwrap(),
        1
    );
    assert_eq!(
        store.delete(schema::TABLE_ITEMS, col("id").eq(lit(2_i64))).await.unwrap(),
        0
    );

    let batches = store.scan(schema::TABLE_ITEMS).await.unwrap();
    assert_eq!(names(&batches), vec!["Renamed"]);
}

#[tokio::test]
async fn test_predicate_values_are_not_sql() {
    let dir = TempDir::new().unwrap();
    let store = DeltaStore::new(test_config(&dir)).await.unwrap();
    store
        .append(schema::TABLE_ITEMS, make_item_batch(&[(1, "Widget", 9.99)]))
        .await
        .unwrap();

    let hostile = "x' OR '1'='1";
    let batches = store
        .select(schema::TABLE_ITEMS, Some(col("name").eq(lit(hostile))), Vec::new(), None)
        .await
        .unwrap();
    assert_eq!(row_count(&batches), 0);
}

#[tokio::test]
async fn test_id_sequence_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DeltaStore::new(test_config(&dir)).await.unwrap());

    let mut items = IdSequence::load(store.clone(), Entity::Items).await.unwrap();
    assert_eq!(items.last(), 0);
    assert_eq!(items.next().await.unwrap(), 1);
    assert_eq!(items.next().await.unwrap(), 2);

    // Separate id space per entity
    let mut users = IdSequence::load(store.clone(), Entity::Users).await.unwrap();
    assert_eq!(users.next().await.unwrap(), 1);

    let mut reloaded = IdSequence::load(store, Entity::Items).await.unwrap();
    assert_eq!(reloaded.last(), 2);
    assert_eq!(reloaded.next().await.unwrap(), 3);
}
