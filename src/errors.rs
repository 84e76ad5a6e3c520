/// Main error type for the A2A framework
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // === Request Validation Errors ===
    #[error("Validation error: {field}: {reason}")]
    Validation { field: String, reason: String },

    // === Task Lifecycle Errors ===
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Invalid task state transition for {task_id}: {from} -> {to}")]
    InvalidTaskStateTransition {
        task_id: String,
        from: String,
        to: String,
    },

    // === Capability Errors ===
    #[error("Operation not supported: {operation}")]
    UnsupportedOperation { operation: String },

    // === Backend Errors ===
    #[error("Backend error: {message}")]
    Backend { message: String },

    // === Configuration Errors ===
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Missing configuration: {field}")]
    MissingConfiguration { field: String },

    // === Serialization Errors ===
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl AgentError {
    /// JSON-RPC error code for this error when surfaced at the protocol layer.
    ///
    /// Standard JSON-RPC codes cover envelope-level faults; the -32000 range
    /// carries the A2A-specific ones.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => -32602,
            Self::TaskNotFound { .. } => -32001,
            Self::InvalidTaskStateTransition { .. } => -32002,
            Self::UnsupportedOperation { .. } => -32004,
            Self::Backend { .. } => -32603,
            Self::InvalidConfiguration { .. } | Self::MissingConfiguration { .. } => -32603,
            Self::Serialization { .. } => -32700,
        }
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::TaskNotFound { .. } | Self::InvalidTaskStateTransition { .. } => "task",
            Self::UnsupportedOperation { .. } => "capability",
            Self::Backend { .. } => "backend",
            Self::InvalidConfiguration { .. } | Self::MissingConfiguration { .. } => "config",
            Self::Serialization { .. } => "io",
        }
    }

    /// Whether this error is fatal at startup (the server refuses to bind).
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::MissingConfiguration { .. }
        )
    }
}

/// Convenience type alias
pub type AgentResult<T> = std::result::Result<T, AgentError>;

impl From<serde_json::Error> for AgentError {
    fn from(error: serde_json::Error) -> Self {
        AgentError::Serialization {
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories_and_codes() {
        let task_err = AgentError::TaskNotFound {
            task_id: "test".to_string(),
        };
        assert_eq!(task_err.category(), "task");
        assert_eq!(task_err.json_rpc_code(), -32001);
        assert!(!task_err.is_startup_fatal());

        let validation_err = AgentError::Validation {
            field: "message".to_string(),
            reason: "first part must be text".to_string(),
        };
        assert_eq!(validation_err.category(), "validation");
        assert_eq!(validation_err.json_rpc_code(), -32602);

        let streaming_err = AgentError::UnsupportedOperation {
            operation: "streaming".to_string(),
        };
        assert_eq!(streaming_err.json_rpc_code(), -32004);

        let config_err = AgentError::MissingConfiguration {
            field: "url".to_string(),
        };
        assert!(config_err.is_startup_fatal());
    }

    #[test]
    fn test_serde_conversion() {
        let json_err: AgentError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert_eq!(json_err.category(), "io");
        assert_eq!(json_err.json_rpc_code(), -32700);
    }
}
