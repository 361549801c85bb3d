//! ItemService integration tests — CRUD, events, search, id allocation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tempfile::TempDir;
use tokio::sync::mpsc;

use pricebook_lakehouse::config::{CatalogConfig, HashCost};
use pricebook_lakehouse::error::{CatalogError, Result};
use pricebook_lakehouse::events::{ChannelSink, EventSink};
use pricebook_lakehouse::items::{ItemAction, ItemEvent, ItemFields, SearchParams, SearchQuery};
use pricebook_lakehouse::Catalog;

fn test_config(dir: &TempDir) -> CatalogConfig {
    CatalogConfig::new(dir.path())
        .with_jwt_secret("test-secret-jwt-key-min-32-chars!!")
        .with_hash_cost(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .with_publish_timeout(Duration::from_millis(200))
}

async fn open(dir: &TempDir) -> (Catalog, mpsc::Receiver<ItemEvent>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let (sink, rx) = ChannelSink::new(64);
    let catalog = Catalog::open_with_sink(test_config(dir), Arc::new(sink))
        .await
        .unwrap();
    (catalog, rx)
}

/// Always refuses, like a broker that is down
struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn publish(&self, _event: &ItemEvent) -> Result<()> {
        Err(CatalogError::EventPublish("broker unavailable".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Never answers
struct StalledSink;

#[async_trait]
impl EventSink for StalledSink {
    async fn publish(&self, _event: &ItemEvent) -> Result<()> {
        futures::future::pending::<Result<()>>().await
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

fn search(params: SearchParams) -> SearchQuery {
    SearchQuery::from_params(params).unwrap()
}

#[tokio::test]
async fn test_crud_lifecycle_publishes_events() {
    let dir = TempDir::new().unwrap();
    let (catalog, mut events) = open(&dir).await;
    let items = &catalog.items;

    let created = items.create(ItemFields::new("Widget", 9.99)).await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(items.get(1).await.unwrap(), created);

    let updated = items.update(1, ItemFields::new("Widget Pro", 14.5)).await.unwrap();
    assert_eq!(updated.name, "Widget Pro");
    assert_eq!(items.get(1).await.unwrap().price, 14.5);

    let deleted = items.delete(1).await.unwrap();
    assert_eq!(deleted, updated);
    assert!(matches!(items.get(1).await, Err(CatalogError::ItemNotFound(1))));

    let actions: Vec<_> = [
        events.recv().await.unwrap(),
        events.recv().await.unwrap(),
        events.recv().await.unwrap(),
    ]
    .into_iter()
    .map(|e| (e.action, e.item.name))
    .collect();
    assert_eq!(
        actions,
        vec![
            (ItemAction::Created, "Widget".to_string()),
            (ItemAction::Updated, "Widget Pro".to_string()),
            (ItemAction::Deleted, "Widget Pro".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_reads_do_not_publish() {
    let dir = TempDir::new().unwrap();
    let (catalog, mut events) = open(&dir).await;

    catalog.items.create(ItemFields::new("Lamp", 30.0)).await.unwrap();
    events.recv().await.unwrap();

    catalog.items.get(1).await.unwrap();
    catalog.items.list().await.unwrap();
    catalog.items.search(SearchQuery::default()).await.unwrap();
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_missing_item_errors_and_no_event() {
    let dir = TempDir::new().unwrap();
    let (catalog, mut events) = open(&dir).await;

    assert!(matches!(
        catalog.items.update(42, ItemFields::new("Ghost", 1.0)).await,
        Err(CatalogError::ItemNotFound(42))
    ));
    assert!(matches!(
        catalog.items.delete(42).await,
        Err(CatalogError::ItemNotFound(42))
    ));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_invalid_fields_rejected_before_store() {
    let dir = TempDir::new().unwrap();
    let (catalog, _events) = open(&dir).await;

    for fields in [ItemFields::new("", 1.0), ItemFields::new("Neg", -1.0)] {
        assert!(matches!(
            catalog.items.create(fields).await,
            Err(CatalogError::Validation(_))
        ));
    }
    // No id was consumed
    let item = catalog.items.create(ItemFields::new("First", 1.0)).await.unwrap();
    assert_eq!(item.id, 1);
}

#[tokio::test]
async fn test_publish_failure_keeps_mutation() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::open_with_sink(test_config(&dir), Arc::new(FailingSink))
        .await
        .unwrap();

    let err = catalog
        .items
        .create(ItemFields::new("Orphan", 5.0))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::EventPublish(_)));

    // Durable state changed regardless
    let stored = catalog.items.get(1).await.unwrap();
    assert_eq!(stored.name, "Orphan");
}

#[tokio::test]
async fn test_stalled_publish_times_out() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::open_with_sink(test_config(&dir), Arc::new(StalledSink))
        .await
        .unwrap();

    let err = catalog
        .items
        .create(ItemFields::new("Slow", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Timeout { operation: "event publish" }));
    assert!(catalog.items.get(1).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_creates_get_unique_ids() {
    let dir = TempDir::new().unwrap();
    let (catalog, _events) = open(&dir).await;

    let results = join_all((0..10).map(|i| {
        let items = catalog.items.clone();
        async move { items.create(ItemFields::new(format!("item-{i}"), i as f64)).await }
    }))
    .await;

    let mut ids: Vec<u64> = results.into_iter().map(|r| r.unwrap().id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_deleted_ids_not_reused() {
    let dir = TempDir::new().unwrap();
    let (catalog, _events) = open(&dir).await;

    catalog.items.create(ItemFields::new("A", 1.0)).await.unwrap();
    catalog.items.create(ItemFields::new("B", 2.0)).await.unwrap();
    catalog.items.delete(2).await.unwrap();

    let next = catalog.items.create(ItemFields::new("C", 3.0)).await.unwrap();
    assert_eq!(next.id, 3);
}

#[tokio::test]
async fn test_list_in_id_order() {
    let dir = TempDir::new().unwrap();
    let (catalog, _events) = open(&dir).await;
    for (name, price) in [("Zed", 1.0), ("Amy", 3.0), ("Max", 2.0)] {
        catalog.items.create(ItemFields::new(name, price)).await.unwrap();
    }

    let ids: Vec<u64> = catalog.items.list().await.unwrap().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_search_filters_sorts_and_pages() {
    let dir = TempDir::new().unwrap();
    let (catalog, _events) = open(&dir).await;
    for (name, price) in [
        ("Red Chair", 40.0),
        ("Blue chair", 25.0),
        ("Table", 120.0),
        ("CHAIR cushion", 10.0),
        ("Lamp", 25.0),
    ] {
        catalog.items.create(ItemFields::new(name, price)).await.unwrap();
    }

    // Case-insensitive substring, default price ascending
    let page = catalog
        .items
        .search(search(SearchParams {
            search: Some("chair".into()),
            ..Default::default()
        }))
        .await
        .unwrap();
    let names: Vec<_> = page.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["CHAIR cushion", "Blue chair", "Red Chair"]);

    // Inclusive price range, name descending
    let page = catalog
        .items
        .search(search(SearchParams {
            min_price: Some(25.0),
            max_price: Some(40.0),
            sort_by: Some("name".into()),
            sort_order: Some("DESC".into()),
            ..Default::default()
        }))
        .await
        .unwrap();
    let names: Vec<_> = page.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Red Chair", "Lamp", "Blue chair"]);

    // Equal prices break ties by id; second page of two
    let page = catalog
        .items
        .search(search(SearchParams {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        }))
        .await
        .unwrap();
    let ids: Vec<_> = page.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![5, 1]);
    assert_eq!((page.page, page.limit), (2, 2));
}

#[tokio::test]
async fn test_search_hostile_input_is_inert() {
    let dir = TempDir::new().unwrap();
    let (catalog, _events) = open(&dir).await;
    catalog.items.create(ItemFields::new("B", 2.0)).await.unwrap();
    catalog.items.create(ItemFields::new("A", 1.0)).await.unwrap();

    // Unknown sort column falls back to price
    let page = catalog
        .items
        .search(search(SearchParams {
            sort_by: Some("id; DROP TABLE items".into()),
            sort_order: Some("ASC; --".into()),
            ..Default::default()
        }))
        .await
        .unwrap();
    let names: Vec<_> = page.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);

    // LIKE wildcards in the search text match literally
    let page = catalog
        .items
        .search(search(SearchParams {
            search: Some("%".into()),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert!(page.items.is_empty());

    assert_eq!(catalog.items.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_item_ids_independent_of_user_ids() {
    let dir = TempDir::new().unwrap();
    let (catalog, _events) = open(&dir).await;

    catalog
        .auth
        .register("admin".into(), "pw".into(), pricebook_lakehouse::Role::Admin)
        .await
        .unwrap();
    let item = catalog.items.create(ItemFields::new("Widget", 1.0)).await.unwrap();
    assert_eq!(item.id, 1);
}
