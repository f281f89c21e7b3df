//! Cloud orchestration error types

use thiserror::Error;

/// Errors raised by cloudflow operations
#[derive(Error, Debug)]
pub enum CloudError {
    /// The provider rejected or failed a request
    #[error("{service} {operation} failed: {message}")]
    Api {
        service: &'static str,
        operation: &'static str,
        message: String,
    },

    /// A poll loop exhausted its budget before the target state was observed
    #[error("Timed out waiting for {resource} to become {target} ({attempts} attempts)")]
    WaitTimeout {
        resource: String,
        target: String,
        attempts: u32,
    },

    /// The resource entered a state from which the target is unreachable
    #[error("{resource} can no longer become {target}: observed '{observed}'")]
    WaitFailed {
        resource: String,
        target: String,
        observed: String,
    },

    #[error("Database did not accept logins after {attempts} attempts")]
    LoginTimeout { attempts: u32 },

    #[error("{address}:{port} was not reachable after {attempts} attempts")]
    ReachabilityTimeout {
        address: String,
        port: u16,
        attempts: u32,
    },

    #[error("Instance {instance_id} has no '{tag}' tag")]
    MissingTag { instance_id: String, tag: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Build an [`CloudError::Api`] from any displayable provider error
    pub fn api(service: &'static str, operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Api {
            service,
            operation,
            message: err.to_string(),
        }
    }

    /// True for errors produced by an exhausted wait budget
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::WaitTimeout { .. } | Self::LoginTimeout { .. } | Self::ReachabilityTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
