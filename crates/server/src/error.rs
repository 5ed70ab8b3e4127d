//! Structured errors for tool parameter validation in the host.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Errors raised by the host before a request reaches the agent.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be resolved against the scope.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let (code, message) = match &err {
            HostError::InvalidInput(msg) => (-32602, msg.clone()),
            HostError::InvalidUrl(msg) => (-32003, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
