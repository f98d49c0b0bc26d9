use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::TaskError;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::registry::{Action, ActionCall};

#[derive(Debug, Deserialize)]
struct HttpParams {
    #[serde(default = "default_method")]
    method: String,
    url: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Encode a request body: strings are sent verbatim, anything else as JSON.
pub(crate) fn encode_body(
    body: Option<Value>,
    headers: &mut BTreeMap<String, String>,
) -> Result<Option<Vec<u8>>, serde_json::Error> {
    match body {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.into_bytes())),
        Some(other) => {
            if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
                headers.insert("Content-Type".to_string(), "application/json".to_string());
            }
            serde_json::to_vec(&other).map(Some)
        }
    }
}

/// `{status_code, headers, body}` plus `data` when a 2xx body parses as JSON.
pub(crate) fn response_value(resp: &HttpResponse) -> Value {
    let headers: Map<String, Value> = resp
        .headers
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    let mut out = json!({
        "status_code": resp.status,
        "headers": headers,
        "body": resp.body_text(),
    });
    if resp.is_success() {
        if let Ok(data) = serde_json::from_slice::<Value>(&resp.body) {
            out["data"] = data;
        }
    }
    out
}

/// Generic HTTP request. Non-2xx responses are returned, not raised; only
/// transport errors fail the task.
pub struct HttpAction {
    client: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl HttpAction {
    pub fn new(client: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Action for HttpAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: HttpParams = call.params()?;
        let mut headers = params.headers;
        let body = encode_body(params.body, &mut headers).map_err(|e| call.invalid(e.to_string()))?;
        let req = HttpRequest {
            method: params.method,
            url: params.url,
            headers,
            body,
        };
        tracing::debug!(method = %req.method, url = %req.url, "http request");
        let resp = self.client.send(req, self.timeout).await?;
        Ok(response_value(&resp))
    }
}
