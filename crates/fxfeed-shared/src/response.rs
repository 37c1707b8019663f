//! Response envelopes. Every body the API returns is one of these two.

use serde::{Deserialize, Serialize};

/// Successful response: `{ success: true, data, message? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Success with nothing to return, e.g. after a delete.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// One offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorBody {
    pub field: String,
    pub message: String,
}

/// Failed response:
/// `{ success: false, message, status, requestId?, errors?, stack? }`.
///
/// `stack` is only filled in development builds of the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            status,
            request_id: None,
            errors: Vec::new(),
            stack: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<FieldErrorBody>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(401, "Unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_omits_empty_parts() {
        let body = serde_json::to_value(ErrorResponse::not_found("News not found")).unwrap();
        assert_eq!(
            body,
            json!({ "success": false, "message": "News not found", "status": 404 })
        );
    }

    #[test]
    fn test_error_envelope_camel_case() {
        let body = serde_json::to_value(
            ErrorResponse::bad_request("Missing required fields")
                .with_request_id("req-1")
                .with_errors(vec![FieldErrorBody {
                    field: "title".into(),
                    message: "is required".into(),
                }]),
        )
        .unwrap();
        assert_eq!(body["requestId"], "req-1");
        assert_eq!(body["errors"][0]["field"], "title");
    }

    #[test]
    fn test_message_only_success() {
        let body = serde_json::to_value(ApiResponse::message("News deleted")).unwrap();
        assert_eq!(
            body,
            json!({ "success": true, "data": null, "message": "News deleted" })
        );
    }
}
