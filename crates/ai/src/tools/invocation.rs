//! Tool invocation parsing and the discriminated tool result.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Tool arguments as delivered by a vendor: an object or a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub enum RawToolArgs {
    Json(Value),
    Text(String),
}

impl From<Value> for RawToolArgs {
    fn from(value: Value) -> Self {
        RawToolArgs::Json(value)
    }
}

impl From<&str> for RawToolArgs {
    fn from(value: &str) -> Self {
        RawToolArgs::Text(value.to_string())
    }
}

impl From<String> for RawToolArgs {
    fn from(value: String) -> Self {
        RawToolArgs::Text(value)
    }
}

/// A parsed tool call. Only constructed through [`ToolInvocation::parse`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    /// Parse raw arguments into an argument object.
    ///
    /// Blank strings become `{}`. A JSON string holding an encoded object is
    /// decoded once more. Anything else that is not an object is rejected.
    pub fn parse(name: &str, raw: RawToolArgs) -> Result<Self, String> {
        let value = match raw {
            RawToolArgs::Json(Value::String(s)) | RawToolArgs::Text(s) => parse_text(&s)?,
            RawToolArgs::Json(Value::Null) => Value::Object(Map::new()),
            RawToolArgs::Json(value) => value,
        };

        match value {
            Value::Object(arguments) => Ok(Self {
                id: Uuid::now_v7().to_string(),
                name: name.to_string(),
                arguments,
            }),
            other => Err(format!(
                "Tool arguments must be a JSON object, got {}",
                json_kind(&other)
            )),
        }
    }
}

fn parse_text(text: &str) -> Result<Value, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(text).map_err(|e| format!("Invalid tool arguments JSON: {}", e))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Outcome of one tool execution. Never an `Err`: every failure is a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolExecutionResult {
    Success {
        data: Value,
        data_provenance: Vec<String>,
    },
    Failure {
        error: String,
        data_provenance: Vec<String>,
    },
}

impl ToolExecutionResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            data_provenance: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data_provenance(&self) -> &[String] {
        match self {
            Self::Success {
                data_provenance, ..
            }
            | Self::Failure {
                data_provenance, ..
            } => data_provenance,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Success {
                data,
                data_provenance,
            } => serde_json::json!({
                "success": true,
                "data": data,
                "data_provenance": data_provenance,
            }),
            Self::Failure {
                error,
                data_provenance,
            } => serde_json::json!({
                "success": false,
                "error": error,
                "data_provenance": data_provenance,
            }),
        }
    }

    /// Serialized form sent back to the model.
    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }
}

impl Serialize for ToolExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Tool output paired with the collaborator calls that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Traced<T> {
    pub data: T,
    pub data_provenance: Vec<String>,
}

impl<T> Traced<T> {
    pub fn new(data: T, data_provenance: Vec<String>) -> Self {
        Self {
            data,
            data_provenance,
        }
    }
}

/// Semantic checks that serde alone cannot express.
pub trait ValidateArgs {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_empty_string_is_empty_object() {
        let invocation = ToolInvocation::parse("get_holdings", "  ".into()).unwrap();
        assert!(invocation.arguments.is_empty());
    }

    #[test]
    fn test_parse_encoded_string() {
        let invocation =
            ToolInvocation::parse("get_holdings", json!("{\"limit\":5}").into()).unwrap();
        assert_eq!(invocation.arguments.get("limit"), Some(&json!(5)));
    }

    #[test]
    fn test_parse_rejects_bad_json_and_non_objects() {
        let err = ToolInvocation::parse("get_holdings", "{not json".into()).unwrap_err();
        assert!(err.starts_with("Invalid tool arguments JSON"));

        let err = ToolInvocation::parse("get_holdings", json!([1, 2]).into()).unwrap_err();
        assert!(err.contains("array"));
    }

    #[test]
    fn test_result_serialization() {
        let ok = ToolExecutionResult::Success {
            data: json!({"x": 1}),
            data_provenance: vec!["repository.list_holdings".to_string()],
        };
        assert_eq!(
            ok.to_value(),
            json!({"success": true, "data": {"x": 1}, "data_provenance": ["repository.list_holdings"]})
        );

        let err = ToolExecutionResult::failure("Unknown tool: nope");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"success": false, "error": "Unknown tool: nope", "data_provenance": []})
        );
    }
}
