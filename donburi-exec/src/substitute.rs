use serde_json::{Map, Value};

use donburi_core::expressions::render_template;
use donburi_core::Context;

use crate::error::RenderError;

/// Renders one templated string against the context.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, ctx: &Context) -> Result<String, RenderError>;
}

/// Default renderer: `{{ expr }}` placeholders evaluated by the expression language.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionRenderer;

impl TemplateRenderer for ExpressionRenderer {
    fn render(&self, template: &str, ctx: &Context) -> Result<String, RenderError> {
        Ok(render_template(template, ctx)?)
    }
}

/// Structure-preserving substitution: strings are rendered, lists and mappings
/// are rebuilt element-wise, every other scalar is returned as is.
pub fn substitute(
    renderer: &dyn TemplateRenderer,
    ctx: &Context,
    value: &Value,
) -> Result<Value, RenderError> {
    match value {
        Value::String(s) => renderer.render(s, ctx).map(Value::String),
        Value::Array(items) => items
            .iter()
            .map(|item| substitute(renderer, ctx, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), substitute(renderer, ctx, v)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Upper;

    impl TemplateRenderer for Upper {
        fn render(&self, template: &str, _ctx: &Context) -> Result<String, RenderError> {
            Ok(template.to_uppercase())
        }
    }

    #[test]
    fn preserves_structure_and_scalars() {
        let ctx = Context::from_value(json!({"name": "web", "port": 80})).unwrap();
        let value = json!({
            "name": "{{ name }}",
            "ports": ["{{ port }}", 443],
            "enabled": true,
            "nothing": null
        });
        let out = substitute(&ExpressionRenderer, &ctx, &value).unwrap();
        assert_eq!(
            out,
            json!({"name": "web", "ports": ["80", 443], "enabled": true, "nothing": null})
        );
    }

    #[test]
    fn renderer_is_pluggable() {
        let out = substitute(&Upper, &Context::new(), &json!(["a", {"b": "c"}])).unwrap();
        assert_eq!(out, json!(["A", {"b": "C"}]));
    }

    #[test]
    fn failures_surface() {
        let err = substitute(&ExpressionRenderer, &Context::new(), &json!({"x": ["{{ y }}"]}));
        assert!(matches!(err, Err(RenderError::Template(_))));
    }
}
