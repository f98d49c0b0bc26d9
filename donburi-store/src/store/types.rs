use serde_json::{Map, Value};

/// A stored resource: a JSON object carrying at least an `id` string.
pub type Resource = Map<String, Value>;

pub const ID_FIELD: &str = "id";
pub const TENANT_FIELD: &str = "tenant_id";

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl ListFilter {
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
        }
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        match &self.tenant_id {
            None => true,
            Some(t) => resource.get(TENANT_FIELD).and_then(Value::as_str) == Some(t.as_str()),
        }
    }
}

pub fn resource_id(resource: &Resource) -> Option<&str> {
    resource.get(ID_FIELD).and_then(Value::as_str)
}
