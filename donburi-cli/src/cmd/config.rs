use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use donburi_core::{parse_document_str, Document, DocumentFormat, ParseError};
use donburi_exec::actions::{builtin_registry, register_host_actions, HostServices};
use donburi_exec::{ActionRegistry, EngineConfig, HostConfig, HttpClient, ReqwestHttpClient};
use donburi_store::{into_resource, MemoryStore, ResourceStore};

use crate::output::print_error;
use crate::{EngineArgs, HostArgs, OutputArgs};

pub fn read_file(path: &Path, output: &OutputArgs) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(v) => Some(v),
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            None
        }
    }
}

pub fn parse_document(content: &str, path: &Path) -> Result<Document, ParseError> {
    parse_document_str(content, DocumentFormat::from_path(path)).map(|p| p.document)
}

/// Read a JSON or YAML value from a file.
pub fn load_value(path: &Path, output: &OutputArgs) -> Option<Value> {
    let content = read_file(path, output)?;
    if let Ok(v) = serde_json::from_str(&content) {
        return Some(v);
    }
    if let Ok(v) = serde_yaml::from_str(&content) {
        return Some(v);
    }
    print_error(
        output.format,
        output.quiet,
        &format!("{} is neither valid JSON nor YAML", path.display()),
    );
    None
}

/// Apply `KEY=VALUE` pairs; values that parse as JSON keep their type.
pub fn merge_set_vars(vars: &mut Map<String, Value>, set_vars: &[String]) -> Result<(), String> {
    for s in set_vars {
        let Some((k, v)) = s.split_once('=') else {
            return Err(format!("expected KEY=VALUE, got '{s}'"));
        };
        let value = serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_string()));
        vars.insert(k.trim().to_string(), value);
    }
    Ok(())
}

pub fn build_engine_config(args: &EngineArgs) -> EngineConfig {
    EngineConfig {
        max_depth: args.max_depth,
        log_values: args.log_values,
    }
}

pub fn build_host_config(args: &HostArgs) -> Result<HostConfig, String> {
    let rest_base_url = args
        .rest_url
        .as_deref()
        .map(url::Url::parse)
        .transpose()
        .map_err(|e| format!("invalid rest url: {e}"))?;
    Ok(HostConfig {
        rest_base_url,
        http_timeout: Duration::from_millis(args.http_timeout_ms),
    })
}

/// Seed the in-memory store from `schema -> [resource]`.
pub fn build_store(args: &HostArgs, output: &OutputArgs) -> Result<Arc<MemoryStore>, String> {
    let Some(path) = &args.store_seed else {
        return Ok(Arc::new(MemoryStore::new()));
    };
    let seed = load_value(path, output).ok_or_else(|| "failed to load store seed".to_string())?;
    let Value::Object(tables) = seed else {
        return Err("store seed must be a mapping of schema to resources".into());
    };
    let mut entries = Vec::with_capacity(tables.len());
    for (schema, resources) in tables {
        let Value::Array(items) = resources else {
            return Err(format!("store seed for '{schema}' must be a list"));
        };
        let resources = items
            .into_iter()
            .map(into_resource)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;
        entries.push((schema, resources));
    }
    MemoryStore::with_resources(entries)
        .map(Arc::new)
        .map_err(|e| e.to_string())
}

/// Built-ins plus the reference host actions the flags enable.
pub fn build_registry(
    args: &HostArgs,
    store: Arc<MemoryStore>,
) -> Result<ActionRegistry, String> {
    let config = build_host_config(args)?;
    let http: Option<Arc<dyn HttpClient>> = if args.http || config.rest_base_url.is_some() {
        let client = ReqwestHttpClient::new().map_err(|e| e.to_string())?;
        Some(Arc::new(client))
    } else {
        None
    };

    let mut registry = builtin_registry();
    register_host_actions(
        &mut registry,
        HostServices {
            store: Some(store as Arc<dyn ResourceStore>),
            http,
            config,
        },
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_vars_keep_json_types() {
        let mut vars = Map::new();
        merge_set_vars(
            &mut vars,
            &["n=3".into(), "name=web".into(), "flags=[1, 2]".into()],
        )
        .unwrap();
        assert_eq!(Value::Object(vars), json!({"n": 3, "name": "web", "flags": [1, 2]}));
    }

    #[test]
    fn set_vars_require_equals() {
        let mut vars = Map::new();
        assert!(merge_set_vars(&mut vars, &["oops".into()]).is_err());
    }

    #[test]
    fn rest_url_must_parse() {
        let args = HostArgs {
            rest_url: Some("not a url".into()),
            http: false,
            http_timeout_ms: 1000,
            store_seed: None,
        };
        assert!(build_host_config(&args).is_err());
    }
}
