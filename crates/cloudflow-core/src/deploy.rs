//! Deployment orchestration
//!
//! `Created -> InProgress -> {Succeeded, Failed}`. Starting, awaiting and
//! summarizing are separate steps so callers decide whether a failed
//! deployment is worth the extra describe calls a summary costs.

use crate::cloud::Cloud;
use crate::error::{CloudError, Result};
use crate::model::{
    DeploymentGroupInfo, DeploymentHandle, DeploymentStatus, InstanceDeploymentStatus,
    LifecycleEvent, LifecycleEventStatus, Revision, TagFilter, Target,
};
use crate::observer::Event;
use crate::retry::Probe;
use crate::status::lookup_name_by_id;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Terminal result of a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    Succeeded,
    /// Ended as `Failed` or `Stopped`
    Failed(DeploymentStatus),
}

/// Details kept for a lifecycle event whose status is `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub script_name: Option<String>,
    pub message: Option<String>,
    pub log_tail: Vec<String>,
}

/// A lifecycle event that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReport {
    pub name: String,
    pub status: LifecycleEventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
}

/// Non-succeeded events of one failed instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceFailureReport {
    pub instance_name: String,
    pub instance_id: String,
    pub events: Vec<EventReport>,
}

/// Per-instance failure reports of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub deployment_id: String,
    pub instances: Vec<InstanceFailureReport>,
}

impl FailureSummary {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Strip an ARN-style prefix (`arn:...:instance/i-123`) down to the bare id
pub fn bare_instance_id(raw: &str) -> &str {
    raw.rsplit('/').next().unwrap_or(raw)
}

impl EventReport {
    fn from_event(event: &LifecycleEvent) -> Self {
        let failure = (event.status == LifecycleEventStatus::Failed).then(|| {
            let diagnostics = event.diagnostics.clone().unwrap_or_default();
            FailureDetail {
                start_time: event.start_time,
                end_time: event.end_time,
                error_code: diagnostics.error_code,
                script_name: diagnostics.script_name,
                message: diagnostics.message,
                log_tail: diagnostics
                    .log_tail
                    .as_deref()
                    .map(|tail| tail.split('\n').map(str::to_string).collect())
                    .unwrap_or_default(),
            }
        });

        Self {
            name: event.name.clone(),
            status: event.status.clone(),
            failure,
        }
    }
}

impl Cloud {
    /// Create a deployment and return immediately
    pub async fn start_deployment(
        &self,
        application: &str,
        group: &str,
        revision: &Revision,
    ) -> Result<DeploymentHandle> {
        tracing::info!("Starting deployment of {} to {}...", application, group);

        let deployment_id = self
            .deployment()
            .create_deployment(application, group, revision)
            .await?;

        self.poller().observer().notify(&Event::DeploymentStarted {
            application: application.to_string(),
            group: group.to_string(),
            deployment_id: deployment_id.clone(),
        });

        Ok(DeploymentHandle {
            deployment_id,
            application: application.to_string(),
            group: group.to_string(),
        })
    }

    /// Poll until the deployment succeeds, fails or is stopped
    pub async fn await_deployment_outcome(
        &self,
        handle: &DeploymentHandle,
    ) -> Result<DeploymentOutcome> {
        let deployment = self.deployment();
        let id = handle.deployment_id.as_str();

        self.poller()
            .poll_until(
                &format!("deployment {id}"),
                &self.waits().deployment,
                |_| async move {
                    let status = deployment.deployment_status(id).await?;
                    Ok(if status == DeploymentStatus::Succeeded {
                        Probe::Ready(DeploymentOutcome::Succeeded)
                    } else if status.is_terminal() {
                        Probe::Ready(DeploymentOutcome::Failed(status))
                    } else {
                        Probe::NotYet(format!("deployment {id} is {status}"))
                    })
                },
                |attempts, _| CloudError::WaitTimeout {
                    resource: format!("deployment {id}"),
                    target: DeploymentStatus::Succeeded.to_string(),
                    attempts,
                },
            )
            .await
    }

    /// Reduce a failed deployment to the failing instances and their
    /// non-succeeded lifecycle events, named by their `Name` tag
    pub async fn summarize_failures(&self, handle: &DeploymentHandle) -> Result<FailureSummary> {
        let deployment_id = handle.deployment_id.as_str();

        let instance_ids = self
            .deployment()
            .list_deployment_instances(deployment_id)
            .await?;
        let summaries = if instance_ids.is_empty() {
            Vec::new()
        } else {
            self.deployment()
                .batch_get_deployment_instances(deployment_id, &instance_ids)
                .await?
        };

        let failed: Vec<_> = summaries
            .iter()
            .filter(|s| s.status == InstanceDeploymentStatus::Failed)
            .collect();
        tracing::debug!(
            "Deployment {}: {} of {} instance(s) failed",
            deployment_id,
            failed.len(),
            summaries.len()
        );

        if failed.is_empty() {
            return Ok(FailureSummary {
                deployment_id: deployment_id.to_string(),
                instances: Vec::new(),
            });
        }

        let records = self.compute_status(&Target::All).await?;

        let instances = failed
            .into_iter()
            .map(|summary| {
                let instance_id = bare_instance_id(&summary.instance_id);
                let instance_name = lookup_name_by_id(instance_id, &records)?;
                Ok(InstanceFailureReport {
                    instance_name: instance_name.to_string(),
                    instance_id: instance_id.to_string(),
                    events: summary
                        .lifecycle_events
                        .iter()
                        .filter(|e| e.status != LifecycleEventStatus::Succeeded)
                        .map(EventReport::from_event)
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FailureSummary {
            deployment_id: deployment_id.to_string(),
            instances,
        })
    }

    pub async fn deployment_group(
        &self,
        application: &str,
        group: &str,
    ) -> Result<DeploymentGroupInfo> {
        self.deployment()
            .get_deployment_group(application, group)
            .await
    }

    pub async fn update_deployment_group_filter(
        &self,
        application: &str,
        group: &str,
        filters: &[TagFilter],
    ) -> Result<()> {
        tracing::info!(
            "Updating tag filters of {}/{} ({} filter(s))",
            application,
            group,
            filters.len()
        );
        self.deployment()
            .update_deployment_group_filter(application, group, filters)
            .await
    }
}

impl fmt::Display for FailureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deployment Errors:")?;
        for instance in &self.instances {
            writeln!(f, "Instance: {}", instance.instance_name)?;
            writeln!(f, "------------------------------")?;
            for event in &instance.events {
                writeln!(f, "  {}: {}", event.name, event.status)?;
                let Some(detail) = &event.failure else {
                    continue;
                };
                if let Some(code) = &detail.error_code {
                    writeln!(f, "    error code: {code}")?;
                }
                if let Some(script) = &detail.script_name {
                    writeln!(f, "    script:     {script}")?;
                }
                if let Some(message) = &detail.message {
                    writeln!(f, "    message:    {message}")?;
                }
                if let (Some(start), Some(end)) = (detail.start_time, detail.end_time) {
                    writeln!(f, "    time:       {start} - {end}")?;
                }
                if !detail.log_tail.is_empty() {
                    writeln!(f, "    log tail:")?;
                    for line in &detail.log_tail {
                        writeln!(f, "      {line}")?;
                    }
                }
            }
        }
        Ok(())
    }
}
