use donburi_store::{ListFilter, MemoryStore, Resource, ResourceStore, StoreError};
use serde_json::json;

fn resource(v: serde_json::Value) -> Resource {
    donburi_store::store::into_resource(v).unwrap()
}

#[tokio::test]
async fn create_fetch_update_delete() {
    let store = MemoryStore::new();
    store
        .create("network", resource(json!({"id": "n1", "name": "a", "tenant_id": "t1"})))
        .await
        .unwrap();

    let fetched = store
        .fetch("network", "n1", &ListFilter::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.get("name"), Some(&json!("a")));

    let updated = store
        .update("network", "n1", resource(json!({"name": "b"})))
        .await
        .unwrap();
    assert_eq!(updated.get("name"), Some(&json!("b")));
    assert_eq!(updated.get("tenant_id"), Some(&json!("t1")));

    store.delete("network", "n1").await.unwrap();
    assert!(store.is_empty("network").await);
    assert!(matches!(
        store.delete("network", "n1").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn duplicate_ids_conflict() {
    let store = MemoryStore::new();
    store.create("net", resource(json!({"id": "x"}))).await.unwrap();
    let err = store.create("net", resource(json!({"id": "x"}))).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
}

#[tokio::test]
async fn list_filters_by_tenant() {
    let store = MemoryStore::with_resources([(
        "server".to_string(),
        vec![
            resource(json!({"id": "a", "tenant_id": "t1"})),
            resource(json!({"id": "b", "tenant_id": "t2"})),
            resource(json!({"id": "c", "tenant_id": "t1"})),
        ],
    )])
    .unwrap();

    let all = store.list("server", &ListFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    let t1 = store.list("server", &ListFilter::tenant("t1")).await.unwrap();
    let ids: Vec<&str> = t1.iter().filter_map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert!(store
        .fetch("server", "b", &ListFilter::tenant("t1"))
        .await
        .unwrap()
        .is_none());
    assert!(store.list("missing", &ListFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_requires_an_id() {
    let store = MemoryStore::new();
    let err = store.create("net", resource(json!({"name": "x"}))).await.unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}
