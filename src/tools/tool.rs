//! Tool trait and shared tool types.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::context::ToolContext;

/// Error from a tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool timed out after {0:?}")]
    Timeout(Duration),
}

/// Result of a successful tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    /// JSON result handed back to the model.
    pub result: serde_json::Value,
    /// Wall time spent in the tool.
    pub duration: Duration,
}

impl ToolOutput {
    pub fn success(result: serde_json::Value, duration: Duration) -> Self {
        Self { result, duration }
    }

    pub fn text(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            result: serde_json::Value::String(text.into()),
            duration,
        }
    }

    /// The result as the string fed back in a tool-result message.
    pub fn to_content(&self) -> String {
        match &self.result {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A capability the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the parameters object.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;
}

/// Read a required string parameter.
pub fn require_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{}' parameter", key)))
}

/// Read an optional string parameter; `null` counts as absent.
pub fn optional_str<'a>(
    params: &'a serde_json::Value,
    key: &str,
) -> Result<Option<&'a str>, ToolError> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ToolError::InvalidParameters(format!(
            "'{}' must be a string, got {}",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn require_str_reports_missing_key() {
        let params = json!({"mode": "single"});
        assert_eq!(require_str(&params, "mode").unwrap(), "single");
        let err = require_str(&params, "count").unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters(_)));
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn optional_str_treats_null_as_absent() {
        let params = json!({"a": null, "b": "x", "c": 3});
        assert_eq!(optional_str(&params, "a").unwrap(), None);
        assert_eq!(optional_str(&params, "missing").unwrap(), None);
        assert_eq!(optional_str(&params, "b").unwrap(), Some("x"));
        assert!(optional_str(&params, "c").is_err());
    }

    #[test]
    fn output_content_is_compact_json() {
        let out = ToolOutput::success(json!([{"cardName": "The Fool"}]), Duration::ZERO);
        assert_eq!(out.to_content(), r#"[{"cardName":"The Fool"}]"#);
        assert_eq!(ToolOutput::text("hi", Duration::ZERO).to_content(), "hi");
    }
}
