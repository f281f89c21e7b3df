//! Notable-transition notifications
//!
//! Core operations never print. They report attempts, fallbacks and
//! deployment starts to an [`Observer`]; the default one discards everything.

use std::fmt;

/// Something worth telling a human about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A poll attempt did not observe the awaited condition
    AttemptFailed {
        operation: String,
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },
    /// Explicit credentials were not found; ambient resolution is used instead
    CredentialFallback { reason: String },
    /// A deployment was created
    DeploymentStarted {
        application: String,
        group: String,
        deployment_id: String,
    },
    /// One step of a compute resize finished
    ResizeStep {
        instance_id: String,
        step: ResizeStep,
    },
}

/// Steps of the compute resize sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeStep {
    Stopping,
    Stopped,
    Modified,
    Starting,
    Running,
}

impl fmt::Display for ResizeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeStep::Stopping => write!(f, "stopping"),
            ResizeStep::Stopped => write!(f, "stopped"),
            ResizeStep::Modified => write!(f, "modified"),
            ResizeStep::Starting => write!(f, "starting"),
            ResizeStep::Running => write!(f, "running"),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::AttemptFailed {
                operation,
                attempt,
                max_attempts,
                reason,
            } => write!(f, "{operation}: attempt {attempt}/{max_attempts} failed: {reason}"),
            Event::CredentialFallback { reason } => write!(
                f,
                "{reason}; falling back to IAM roles/other automatic credentials"
            ),
            Event::DeploymentStarted {
                application,
                group,
                deployment_id,
            } => write!(
                f,
                "Starting deployment of {application} to {group} ({deployment_id})"
            ),
            Event::ResizeStep { instance_id, step } => write!(f, "{instance_id}: {step}"),
        }
    }
}

/// Receives [`Event`]s from core operations
pub trait Observer: Send + Sync {
    fn notify(&self, event: &Event);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn notify(&self, _event: &Event) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, event: &Event) {
        match event {
            Event::CredentialFallback { .. } => tracing::warn!("{}", event),
            Event::AttemptFailed { .. } => tracing::debug!("{}", event),
            _ => tracing::info!("{}", event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = Event::DeploymentStarted {
            application: "shop".to_string(),
            group: "web".to_string(),
            deployment_id: "d-123".to_string(),
        };
        assert_eq!(event.to_string(), "Starting deployment of shop to web (d-123)");

        let event = Event::AttemptFailed {
            operation: "login".to_string(),
            attempt: 2,
            max_attempts: 40,
            reason: "connection refused".to_string(),
        };
        assert_eq!(event.to_string(), "login: attempt 2/40 failed: connection refused");
    }
}
