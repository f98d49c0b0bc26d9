pub type AnyValue = serde_json::Value;

/// Action entries of a task (`action name -> parameters`), in document order.
pub type ActionEntries = serde_json::Map<String, serde_json::Value>;
