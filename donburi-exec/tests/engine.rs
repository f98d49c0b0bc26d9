mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::{harness, harness_with, tasks, Flaky, POST_CREATE, PRE_DELETE};
use donburi_core::Context;
use donburi_exec::actions::builtin_registry;
use donburi_exec::{EngineConfig, RunScope, TaskError};

fn ctx(v: Value) -> Context {
    Context::from_value(v).unwrap()
}

#[tokio::test]
async fn false_guard_runs_else_once_and_skips_actions() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - probe: body
    when: "flag"
    else:
      - probe: else
"#,
    );
    let mut c = ctx(json!({"flag": false}));
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("else")]);
    assert_eq!(h.sink.count("task.skipped"), 1);
}

#[tokio::test]
async fn literal_false_guard_leaves_context_untouched() {
    let h = harness();
    let list = tasks("tasks:\n  - when: \"false\"\n    vars:\n      y: 1\n");
    let mut c = ctx(json!({"x": 1}));
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(c.into_value(), json!({"x": 1}));
}

#[tokio::test]
async fn boolean_guard_literal_is_accepted() {
    let h = harness();
    let list = tasks("tasks:\n  - probe: a\n    when: true\n  - probe: b\n    when: false\n");
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("a")]);
}

#[tokio::test]
async fn null_and_mapping_guards_run_while_zero_like_values_skip() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - probe: null-field
    when: "cfg.missing"
  - probe: mapping
    when: "cfg"
  - probe: zero-string
    when: "'0'"
  - probe: empty-list
    when: "[]"
"#,
    );
    let mut c = ctx(json!({"cfg": {"missing": null}}));
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("null-field"), json!("mapping")]);
    assert_eq!(h.sink.count("task.skipped"), 2);
}

#[tokio::test]
async fn guard_failure_is_recorded_not_raised() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - probe: body
    when: "missing > 1"
    else:
      - probe: else
  - probe: after
"#,
    );
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("after")]);
    let err = c.error().and_then(Value::as_str).unwrap();
    assert!(err.contains("missing"), "{err}");
    assert_eq!(h.sink.count("task.guard_failed"), 1);
}

#[tokio::test]
async fn retry_with_rescue_rescues_every_attempt() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - fail: "boom"
    retry: 3
    rescue:
      - eval: "rescued += 1"
    always:
      - eval: "always += 1"
"#,
    );
    let mut c = ctx(json!({"rescued": 0, "always": 0}));
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(c.get("rescued"), Some(&json!(3)));
    assert_eq!(c.get("always"), Some(&json!(3)));
    assert_eq!(c.error(), Some(&json!("boom")));
}

#[tokio::test]
async fn retry_without_rescue_records_each_failure_then_raises() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - fail: "boom"
    retry: 2
    always:
      - eval: "always += 1"
  - probe: never
"#,
    );
    let mut c = ctx(json!({"always": 0}));
    let err = h.engine.run(POST_CREATE, &mut c, &list).await.unwrap_err();
    assert!(matches!(err, TaskError::Raised(ref m) if m == "boom"));
    assert_eq!(h.sink.count("attempt.failed"), 2);
    assert_eq!(c.get("always"), Some(&json!(2)));
    assert_eq!(h.probe.count(), 0);
}

#[tokio::test]
async fn retry_runs_every_attempt_and_succeeds_if_the_last_one_does() {
    let flaky = Arc::new(Flaky::new(2));
    let mut registry = builtin_registry();
    registry.register("flaky", flaky.clone());
    let h = harness_with(registry);
    let list = tasks("tasks:\n  - flaky: {}\n    retry: 3\n    register: out\n");
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(flaky.calls(), 3);
    assert_eq!(c.get("out"), Some(&json!("ok")));
    assert_eq!(h.sink.count("attempt.started"), 3);
}

#[tokio::test]
async fn retry_keeps_going_after_success() {
    let h = harness();
    let list = tasks("tasks:\n  - eval: \"n += 1\"\n    retry: 4\n");
    let mut c = ctx(json!({"n": 0}));
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(c.get("n"), Some(&json!(4)));
}

#[tokio::test]
async fn literal_iteration_sources_are_not_rendered_before_the_loop() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - probe: "{{ item }}"
    with_items: ["{{ later }}", "plain"]
  - probe: "{{ item }}"
    with_dict:
      key: "{{ undefined_here }}"
"#,
    );
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(
        h.probe.items(),
        vec![
            Some(json!("{{ later }}")),
            Some(json!("plain")),
            Some(json!({"key": "key", "value": "{{ undefined_here }}"})),
        ]
    );
    assert_eq!(h.sink.count("attempt.failed"), 0);
}

#[tokio::test]
async fn with_items_invokes_once_per_element() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - probe: "value {{ item }}"
    with_items: [10, 20, 30]
    register: collected
"#,
    );
    let mut c = ctx(json!({"item": "outer"}));
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(
        h.probe.items(),
        vec![Some(json!(10)), Some(json!(20)), Some(json!(30))]
    );
    assert_eq!(
        c.get("collected"),
        Some(&json!(["value 10", "value 20", "value 30"]))
    );
    assert_eq!(c.get("item"), Some(&json!("outer")));
}

#[tokio::test]
async fn with_items_from_expression() {
    let h = harness();
    let list = tasks("tasks:\n  - probe: x\n    with_items: \"xs + [3]\"\n");
    let mut c = ctx(json!({"xs": [1, 2]}));
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(h.probe.count(), 3);
    assert!(c.get("item").is_none());
}

#[tokio::test]
async fn with_dict_results_are_keyed_by_entry() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - probe: "{{ item.key }}={{ item.value }}"
    with_dict:
      alice: 18
      bob: 21
    register: pairs
"#,
    );
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(
        c.get("pairs"),
        Some(&json!({"alice": "alice=18", "bob": "bob=21"}))
    );
    assert_eq!(
        h.probe.items()[0],
        Some(json!({"key": "alice", "value": 18}))
    );
}

#[tokio::test]
async fn iteration_source_of_wrong_type_fails_the_task() {
    let h = harness();
    let list = tasks("tasks:\n  - probe: x\n    with_items: \"n\"\n");
    let mut c = ctx(json!({"n": 5}));
    let err = h.engine.run(POST_CREATE, &mut c, &list).await.unwrap_err();
    assert!(matches!(err, TaskError::IterationSource { kind: "with_items", .. }));
    assert_eq!(h.probe.count(), 0);
}

#[tokio::test]
async fn resources_run_in_reverse_for_deletion() {
    let yaml = r#"
tasks:
  - resources:
      - probe: A
      - probe: B
      - probe: C
"#;
    let h = harness();
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &tasks(yaml)).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("A"), json!("B"), json!("C")]);

    let h = harness();
    h.engine.run(PRE_DELETE, &mut c, &tasks(yaml)).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("C"), json!("B"), json!("A")]);
}

#[tokio::test]
async fn vars_are_visible_to_later_templates() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - vars:
      x: "hi"
  - probe: "{{x}}"
  - debug: "{{x}}"
    register: r
"#,
    );
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("hi")]);
    assert_eq!(c.get("r"), Some(&Value::Null));
    assert!(c.error().is_none());
}

#[tokio::test]
async fn unknown_keys_are_ignored() {
    let h = harness();
    let list = tasks("tasks:\n  - not_an_action: 1\n    register: r\n  - probe: after\n");
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(c.get("r"), Some(&Value::Null));
    assert_eq!(h.probe.count(), 1);
}

#[tokio::test]
async fn action_failure_aborts_remaining_entries() {
    let h = harness();
    let list = tasks("tasks:\n  - fail: stop\n    probe: skipped\n    rescue:\n      - probe: rescued\n");
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("rescued")]);
}

#[tokio::test]
async fn template_failure_is_a_task_failure() {
    let h = harness();
    let list = tasks("tasks:\n  - probe: \"{{ nope }}\"\n");
    let mut c = Context::new();
    let err = h.engine.run(POST_CREATE, &mut c, &list).await.unwrap_err();
    assert!(matches!(err, TaskError::Template(_)));
    assert_eq!(err.to_string(), "template rendering failed: undefined variable: nope");
    assert_eq!(h.probe.count(), 0);
    assert!(c.error().is_some());
}

#[tokio::test]
async fn failures_inside_rescue_are_absorbed() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - fail: first
    rescue:
      - fail: second
  - probe: after
"#,
    );
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(c.error(), Some(&json!("second")));
    assert_eq!(h.probe.count(), 1);
}

#[tokio::test]
async fn nesting_beyond_max_depth_fails() {
    let h = harness();
    let engine = h.engine.with_config(EngineConfig {
        max_depth: 1,
        ..EngineConfig::default()
    });
    let list = tasks("tasks:\n  - block:\n      - block:\n          - debug: deep\n");
    let mut c = Context::new();
    let err = engine.run(POST_CREATE, &mut c, &list).await.unwrap_err();
    assert!(matches!(err, TaskError::DepthExceeded(1)));
}

#[tokio::test]
async fn explicit_dispatch_reports_unknown_actions() {
    let h = harness();
    let mut c = Context::new();
    let err = h
        .engine
        .dispatch(RunScope::new(POST_CREATE), &mut c, "nope", &json!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::NoSuchAction(ref n) if n == "nope"));
}

#[tokio::test]
async fn event_type_is_available_to_guards() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - probe: deleting
    when: "event_type == 'pre_delete'"
  - probe: creating
    when: "event_type == 'post_create'"
"#,
    );
    let mut c = Context::new();
    h.engine.run(PRE_DELETE, &mut c, &list).await.unwrap();
    assert_eq!(h.probe.values(), vec![json!("deleting")]);
    assert!(c.event_type().is_none());
}

#[tokio::test]
async fn run_emits_lifecycle_events() {
    let h = harness();
    let list = tasks("tasks:\n  - probe: x\n");
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(
        h.sink.kinds(),
        vec![
            "run.started",
            "attempt.started",
            "attempt.succeeded",
            "run.finished"
        ]
    );
}

#[tokio::test]
async fn end_to_end_flow_document() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - vars:
      result: 3
      message: hello
      people: {alice: 17}
      retry_count: 0
  - eval: "result = result * 7 + 2"
  - vars:
      when_is_working: false
  - eval: "when_is_working = true"
    when: "result == 23"
  - block:
      - fail: "inside block"
    rescue:
      - vars:
          rescue_executed: true
    always:
      - vars:
          always_executed: true
  - vars:
      template_test: "message: {{.message}}"
  - eval: "people[item.key] = item.value + 1"
    with_dict: people
  - eval: "retry_count += 1"
    retry: 3
"#,
    );
    let mut c = Context::new();
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();

    assert_eq!(c.get("result"), Some(&json!(23)));
    assert_eq!(c.get("when_is_working"), Some(&json!(true)));
    assert_eq!(c.get("rescue_executed"), Some(&json!(true)));
    assert_eq!(c.get("always_executed"), Some(&json!(true)));
    assert_eq!(c.get("template_test"), Some(&json!("message: hello")));
    assert_eq!(c.get("people"), Some(&json!({"alice": 18})));
    assert_eq!(c.get("retry_count"), Some(&json!(3)));
    assert_eq!(c.error(), Some(&json!("inside block")));
}

#[tokio::test]
async fn context_data_is_never_executed() {
    let h = harness();
    let list = tasks(
        r#"
tasks:
  - eval: "{{.code}}"
    rescue:
      - probe: rejected
  - probe: "{{ code }}"
"#,
    );
    let mut c = ctx(json!({
        "attacked": false,
        "code": "context['attacked'] = true"
    }));
    h.engine.run(POST_CREATE, &mut c, &list).await.unwrap();
    assert_eq!(c.get("attacked"), Some(&json!(false)));
    assert_eq!(
        h.probe.values(),
        vec![json!("rejected"), json!("context['attacked'] = true")]
    );
}

struct Shout;

impl donburi_exec::TemplateRenderer for Shout {
    fn render(&self, template: &str, _ctx: &Context) -> Result<String, donburi_exec::RenderError> {
        Ok(template.to_uppercase())
    }
}

#[tokio::test]
async fn custom_renderer_replaces_expression_templates() {
    let h = harness();
    let engine = h.engine.with_renderer(Arc::new(Shout));
    let mut c = Context::new();
    engine
        .run(POST_CREATE, &mut c, &tasks("tasks:\n  - probe: quiet\n"))
        .await
        .unwrap();
    assert_eq!(h.probe.values(), vec![json!("QUIET")]);
}
