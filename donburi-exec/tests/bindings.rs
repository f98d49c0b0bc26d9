mod common;

use std::sync::Arc;

use serde_json::json;

use common::{document, Probe};
use donburi_core::{Context, EventCategory, EventKind};
use donburi_exec::actions::builtin_registry;
use donburi_exec::{Engine, EventBindings, EventDispatcher, EventHandler};

fn bound(yaml: &str) -> (EventDispatcher, Arc<Probe>) {
    let probe = Arc::new(Probe::default());
    let mut registry = builtin_registry();
    registry.register("probe", probe.clone());
    let engine = Arc::new(Engine::new(registry));
    let mut dispatcher = EventDispatcher::new();
    let bound = EventBindings::new(engine, document(yaml)).bind(&mut dispatcher);
    assert_eq!(bound, 8);
    (dispatcher, probe)
}

#[tokio::test]
async fn every_event_gets_one_handler() {
    let (dispatcher, _) = bound("tasks:\n  - debug: x\n");
    assert_eq!(dispatcher.events().count(), 8);
    for event in EventKind::all() {
        assert_eq!(dispatcher.handler_count(event), 1, "{event}");
    }
}

#[tokio::test]
async fn transactional_events_run_db_tasks() {
    let (dispatcher, probe) = bound(
        r#"
tasks:
  - probe: general
db_tasks:
  - probe: transactional
"#,
    );
    let mut ctx = Context::new();
    dispatcher
        .dispatch(EventKind::transactional(EventCategory::PostUpdate), &mut ctx)
        .await;
    dispatcher
        .dispatch(EventKind::general(EventCategory::Notification), &mut ctx)
        .await;
    assert_eq!(probe.values(), vec![json!("transactional"), json!("general")]);
}

#[tokio::test]
async fn boundary_records_failures_instead_of_raising() {
    let (dispatcher, probe) = bound("tasks:\n  - fail: \"broken {{ id }}\"\n  - probe: never\n");
    let mut ctx = Context::from_value(json!({"id": 7})).unwrap();
    let ran = dispatcher
        .dispatch(EventKind::general(EventCategory::PostCreate), &mut ctx)
        .await;
    assert_eq!(ran, 1);
    assert_eq!(ctx.error(), Some(&json!("broken 7")));
    assert_eq!(probe.count(), 0);
}

#[tokio::test]
async fn lifecycle_document_follows_the_event_type() {
    let (dispatcher, _) = bound(
        r#"
tasks:
  - resources:
      - vars:
          created: "{{ name }}"
        when: "event_type == 'post_create'"
      - eval: "deleted = true"
        when: "event_type == 'pre_delete'"
"#,
    );
    let mut ctx = Context::from_value(json!({"name": "net1"})).unwrap();
    dispatcher
        .dispatch(EventKind::general(EventCategory::PostCreate), &mut ctx)
        .await;
    assert_eq!(ctx.get("created"), Some(&json!("net1")));
    assert!(ctx.get("deleted").is_none());

    dispatcher
        .dispatch(EventKind::general(EventCategory::PreDelete), &mut ctx)
        .await;
    assert_eq!(ctx.get("deleted"), Some(&json!(true)));
    assert!(ctx.error().is_none());
}

#[tokio::test]
async fn handler_can_be_used_directly() {
    let probe = Arc::new(Probe::default());
    let mut registry = builtin_registry();
    registry.register("probe", probe.clone());
    let bindings = EventBindings::new(
        Arc::new(Engine::new(registry)),
        document("tasks:\n  - probe: \"{{ event_type }}\"\n"),
    );
    let event = EventKind::general(EventCategory::PostUpdate);
    let mut ctx = Context::new();
    bindings.handler_for(event).handle(event, &mut ctx).await;
    assert_eq!(probe.values(), vec![json!("post_update")]);
}

#[tokio::test]
async fn unbound_events_run_nothing() {
    let dispatcher = EventDispatcher::new();
    let mut ctx = Context::new();
    let ran = dispatcher
        .dispatch(EventKind::general(EventCategory::PostCreate), &mut ctx)
        .await;
    assert_eq!(ran, 0);
}
