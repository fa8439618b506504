use serde::{Deserialize, Deserializer};

/// Cell as encoded by the service, before its tag is checked.
#[derive(Debug, Deserialize)]
pub struct RawDataValue {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: i64,
    #[serde(rename = "Value", default)]
    pub value: serde_json::Value,
}

/// Body of every non-success response.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Treats an explicit JSON `null` like a missing field.
///
/// The service encodes empty lists and maps as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Human-readable JSON kind, used in diagnostics.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
