//! Wire format of one transport request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use seedbank_types::Principal;

/// One request line.
///
/// ```json
/// {"request_id": "…", "operation": "register-species", "args": ["…"], "caller": "curator"}
/// ```
///
/// A request carrying `caller` is a mutating call; one without is a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireRequest {
    /// Optional client-chosen id enabling response deduplication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,

    /// Wire name of the operation.
    pub operation: String,

    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,

    /// Identity of the caller, present for mutating calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Principal>,
}

impl WireRequest {
    /// A mutating request.
    pub fn mutating(
        operation: impl Into<String>,
        args: Vec<Value>,
        caller: Principal,
    ) -> Self {
        Self {
            request_id: None,
            operation: operation.into(),
            args,
            caller: Some(caller),
        }
    }

    /// A read request.
    pub fn read(operation: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            request_id: None,
            operation: operation.into(),
            args,
            caller: None,
        }
    }

    /// Attach a deduplication id.
    #[must_use]
    pub const fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Parse one transport line.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the line is not a valid request object.
    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn caller_marks_a_mutating_request() {
        let line = r#"{"operation":"register-species","args":["A","B","C"],"caller":"curator"}"#;
        let request = WireRequest::parse_line(line).ok();
        assert_eq!(
            request,
            Some(WireRequest::mutating(
                "register-species",
                vec![json!("A"), json!("B"), json!("C")],
                Principal::new("curator"),
            ))
        );
    }

    #[test]
    fn read_request_needs_only_operation_and_args() {
        let request = WireRequest::parse_line(r#"{"operation":"get-species","args":[1]}"#).ok();
        assert_eq!(request, Some(WireRequest::read("get-species", vec![json!(1)])));
    }

    #[test]
    fn request_id_is_parsed() {
        let id = Uuid::new_v4();
        let line = format!(r#"{{"request_id":"{id}","operation":"get-species","args":[1]}}"#);
        let request = WireRequest::parse_line(&line).ok();
        assert_eq!(request.and_then(|r| r.request_id), Some(id));
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(WireRequest::parse_line("not json").is_err());
        assert!(WireRequest::parse_line(r#"{"args":[]}"#).is_err());
        assert!(WireRequest::parse_line(r#"{"operation":"get-species","extra":1}"#).is_err());
    }
}
