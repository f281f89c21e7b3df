//! Instance lifecycle operations
//!
//! Start/stop/reboot are fire-and-confirm: they return once the provider
//! accepted the request. Only the compute resize waits, because the size
//! class can only be changed on a stopped instance.

use crate::cloud::Cloud;
use crate::error::{CloudError, Result};
use crate::model::InstanceState;
use crate::observer::{Event, ResizeStep};
use serde::Serialize;
use tokio::task::JoinSet;

/// What a compute resize did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeOutcome {
    pub instance_id: String,
    pub previous_type: String,
    pub new_type: String,
    /// The instance was running before and has been started again
    pub restarted: bool,
}

impl Cloud {
    pub async fn start_instances(&self, ids: &[String]) -> Result<()> {
        tracing::info!("Starting instances: {}", ids.join(", "));
        self.compute().start_instances(ids).await
    }

    pub async fn stop_instances(&self, ids: &[String]) -> Result<()> {
        tracing::info!("Stopping instances: {}", ids.join(", "));
        self.compute().stop_instances(ids).await
    }

    pub async fn reboot_instances(&self, ids: &[String]) -> Result<()> {
        tracing::info!("Rebooting instances: {}", ids.join(", "));
        self.compute().reboot_instances(ids).await
    }

    /// Change the size class of one compute instance
    ///
    /// A running instance is stopped, resized and started again; a stopped
    /// instance stays stopped. Each step waits for the previous one to be
    /// observed before issuing the next request.
    pub async fn resize_compute_instance(&self, id: &str, size: &str) -> Result<ResizeOutcome> {
        let ids = [id.to_string()];

        let instance = self
            .compute()
            .describe_instances_by_id(&ids)
            .await?
            .into_iter()
            .find(|i| i.id == id)
            .ok_or_else(|| CloudError::InstanceNotFound(id.to_string()))?;

        let was_running = instance.state == InstanceState::Running;
        tracing::info!(
            "Resizing {} from {} to {} (currently {})",
            id,
            instance.instance_type,
            size,
            instance.state
        );

        if was_running {
            self.compute().stop_instances(&ids).await?;
            self.notify_step(id, ResizeStep::Stopping);
        }
        // Also covers instances that were already stopping or stopped.
        self.wait_for_compute_state(&ids, InstanceState::Stopped)
            .await?;
        self.notify_step(id, ResizeStep::Stopped);

        self.compute().modify_instance_type(id, size).await?;
        self.notify_step(id, ResizeStep::Modified);

        if was_running {
            self.compute().start_instances(&ids).await?;
            self.notify_step(id, ResizeStep::Starting);
            self.wait_for_compute_state(&ids, InstanceState::Running)
                .await?;
            self.notify_step(id, ResizeStep::Running);
        }

        Ok(ResizeOutcome {
            instance_id: id.to_string(),
            previous_type: instance.instance_type,
            new_type: size.to_string(),
            restarted: was_running,
        })
    }

    /// Resize several instances concurrently
    ///
    /// Every resize runs to completion. If any of them failed, the first
    /// failure to complete is returned; the others are not rolled back.
    /// Successful outcomes are returned in input order.
    pub async fn resize_compute_instances(
        &self,
        ids: &[String],
        size: &str,
    ) -> Result<Vec<ResizeOutcome>> {
        let mut tasks = JoinSet::new();
        for (index, id) in ids.iter().enumerate() {
            let cloud = self.clone();
            let id = id.clone();
            let size = size.to_string();
            tasks.spawn(async move { (index, cloud.resize_compute_instance(&id, &size).await) });
        }

        let mut outcomes: Vec<Option<ResizeOutcome>> = vec![None; ids.len()];
        let mut first_error = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(outcome))) => outcomes[index] = Some(outcome),
                Ok((index, Err(e))) => {
                    tracing::warn!("Resize of {} failed: {}", ids[index], e);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(CloudError::TaskFailed(e.to_string()));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcomes.into_iter().flatten().collect()),
        }
    }

    /// Request a new instance class, applied immediately
    ///
    /// Returns once the request is accepted; poll with
    /// [`Cloud::wait_for_database_state`] for the `modifying -> available`
    /// transition.
    pub async fn resize_database_instance(&self, identifier: &str, class: &str) -> Result<()> {
        tracing::info!("Resizing database {} to {}", identifier, class);
        self.database()
            .modify_db_instance_class(identifier, class)
            .await
    }

    pub async fn start_database_instance(&self, identifier: &str) -> Result<()> {
        tracing::info!("Starting database {}", identifier);
        self.database().start_db_instance(identifier).await
    }

    pub async fn stop_database_instance(&self, identifier: &str) -> Result<()> {
        tracing::info!("Stopping database {}", identifier);
        self.database().stop_db_instance(identifier).await
    }

    pub async fn reboot_database_instance(&self, identifier: &str) -> Result<()> {
        tracing::info!("Rebooting database {}", identifier);
        self.database().reboot_db_instance(identifier).await
    }

    fn notify_step(&self, instance_id: &str, step: ResizeStep) {
        self.poller().observer().notify(&Event::ResizeStep {
            instance_id: instance_id.to_string(),
            step,
        });
    }
}
