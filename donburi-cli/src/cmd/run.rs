use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use donburi_core::{validate_document_with, Context, EventKind, ValidateOptions};
use donburi_exec::{
    CompositeEventSink, Engine, EventBindings, EventDispatcher, MetricsCollector,
    MetricsEventSink, NoOpEventSink, StdoutEventSink,
};

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{EngineArgs, EventsMode, HostArgs, OutputArgs};

use super::config::{
    build_engine_config, build_registry, build_store, load_value, merge_set_vars, parse_document,
    read_file,
};

pub struct RunRequest<'a> {
    pub path: &'a Path,
    pub event: &'a str,
    pub context_path: Option<&'a Path>,
    pub set_vars: &'a [String],
    pub events: EventsMode,
    pub metrics: bool,
    pub engine: EngineArgs,
    pub host: HostArgs,
    pub output: OutputArgs,
}

#[derive(Serialize)]
struct RunResult {
    event: String,
    handlers: usize,
    context: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<Value>,
}

pub async fn run_cmd(req: RunRequest<'_>) -> i32 {
    let output = &req.output;

    let event: EventKind = match req.event.parse() {
        Ok(e) => e,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let Some(content) = read_file(req.path, output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let document = match parse_document(&content, req.path) {
        Ok(d) => d,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let store = match build_store(&req.host, output) {
        Ok(s) => s,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let registry = match build_registry(&req.host, Arc::clone(&store)) {
        Ok(r) => r,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    if let Err(err) = validate_document_with(&document, &ValidateOptions::default()) {
        let details: Vec<String> = err
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.path, v.message))
            .collect();
        print_error(
            output.format,
            output.quiet,
            &format!("{err}: {}", details.join("; ")),
        );
        return exit_codes::VALIDATION_FAILED;
    }
    // Unknown actions are handled by the executor at dispatch time.
    let strict = ValidateOptions::with_known_actions(registry.names()).strict();
    if let Err(err) = validate_document_with(&document, &strict) {
        for v in &err.violations {
            tracing::warn!(path = %v.path, "{}", v.message);
        }
    }

    let mut vars = match req.context_path {
        Some(path) => match load_value(path, output) {
            Some(Value::Object(map)) => map,
            Some(_) => {
                print_error(output.format, output.quiet, "context file must hold a mapping");
                return exit_codes::RUNTIME_ERROR;
            }
            None => return exit_codes::RUNTIME_ERROR,
        },
        None => Map::new(),
    };
    if let Err(e) = merge_set_vars(&mut vars, req.set_vars) {
        print_error(output.format, output.quiet, &e);
        return exit_codes::RUNTIME_ERROR;
    }
    let mut ctx = Context::from_map(vars);

    let collector = Arc::new(MetricsCollector::new());
    let mut sinks = CompositeEventSink::new();
    if req.events == EventsMode::Stdout {
        sinks.add(Box::new(StdoutEventSink));
    }
    if req.metrics {
        sinks.add(Box::new(MetricsEventSink::new(
            Arc::clone(&collector),
            Arc::new(NoOpEventSink),
        )));
    }

    let mut engine = Engine::new(registry).with_config(build_engine_config(&req.engine));
    if !sinks.is_empty() {
        engine = engine.with_event_sink(Arc::new(sinks));
    }

    let mut dispatcher = EventDispatcher::new();
    EventBindings::new(Arc::new(engine), document).bind(&mut dispatcher);
    tracing::info!(event = %event, "dispatching event");
    let handlers = dispatcher.dispatch(event, &mut ctx).await;

    let error = ctx.error().cloned();
    let metrics = if req.metrics {
        Some(collector.get_metrics().await.to_json())
    } else {
        None
    };
    let result = RunResult {
        event: event.to_string(),
        handlers,
        context: ctx.into_value(),
        error: error.clone(),
        metrics,
    };

    if output.format == OutputFormat::Text && !output.quiet {
        match serde_json::to_string_pretty(&result.context) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("error: {e}"),
        }
        if let Some(err) = &result.error {
            eprintln!("error recorded: {}", donburi_core::expressions::display(err));
        }
        if let Some(m) = &result.metrics {
            println!("{}", serde_json::to_string_pretty(m).unwrap_or_default());
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if error.is_some() {
        exit_codes::RUN_FAILED
    } else {
        exit_codes::SUCCESS
    }
}
