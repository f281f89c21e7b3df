//! Wait primitives
//!
//! Compute and database waits poll describe calls until the provider reports
//! the target state. Login and TCP waits probe the endpoint itself, since a
//! database reported as `available` can refuse logins for up to a minute.

use crate::cloud::Cloud;
use crate::error::{CloudError, Result};
use crate::model::{DatabaseInstance, InstanceState};
use crate::retry::{Poller, Probe, RetryConfig};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// Database status the provider reports once an instance is usable
pub const DB_AVAILABLE: &str = "available";

const DB_UNRECOVERABLE: &[&str] = &[
    "deleted",
    "deleting",
    "failed",
    "incompatible-restore",
    "incompatible-parameters",
];

/// States from which a compute instance will not reach `target` on its own
fn is_compute_dead_end(target: &InstanceState, observed: &InstanceState) -> bool {
    match target {
        InstanceState::Running => matches!(
            observed,
            InstanceState::ShuttingDown | InstanceState::Terminated | InstanceState::Stopping
        ),
        InstanceState::Stopped => {
            matches!(observed, InstanceState::Pending | InstanceState::Terminated)
        }
        _ => false,
    }
}

impl Cloud {
    /// Wait until every instance in `ids` reports `target`
    ///
    /// An id the provider does not know fails with
    /// [`CloudError::InstanceNotFound`] on the first describe.
    pub async fn wait_for_compute_state(&self, ids: &[String], target: InstanceState) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let resource = format!("instances [{}]", ids.join(", "));
        let compute = self.compute();
        let target_ref = &target;
        let resource_ref = &resource;

        tracing::debug!("Waiting for {} to become {}", resource, target);

        self.poller()
            .poll_until(
                &format!("wait for {target}"),
                &self.waits().compute,
                |_| async move {
                    let instances = compute.describe_instances_by_id(ids).await?;

                    if let Some(missing) = ids
                        .iter()
                        .find(|id| !instances.iter().any(|i| &i.id == *id))
                    {
                        return Err(CloudError::InstanceNotFound(missing.clone()));
                    }

                    if let Some(dead) = instances
                        .iter()
                        .find(|i| is_compute_dead_end(target_ref, &i.state))
                    {
                        return Err(CloudError::WaitFailed {
                            resource: dead.id.clone(),
                            target: target_ref.to_string(),
                            observed: dead.state.to_string(),
                        });
                    }

                    let pending: Vec<String> = ids
                        .iter()
                        .filter(|id| {
                            !instances
                                .iter()
                                .any(|i| &i.id == *id && i.state == *target_ref)
                        })
                        .filter_map(|id| {
                            instances
                                .iter()
                                .find(|i| &i.id == id)
                                .map(|i| format!("{id}={}", i.state))
                        })
                        .collect();

                    if pending.is_empty() {
                        Ok(Probe::Ready(()))
                    } else {
                        Ok(Probe::NotYet(format!(
                            "{} not yet {}: {}",
                            resource_ref,
                            target_ref,
                            pending.join(", ")
                        )))
                    }
                },
                |attempts, _| CloudError::WaitTimeout {
                    resource: resource.clone(),
                    target: target.to_string(),
                    attempts,
                },
            )
            .await
    }

    /// Wait until the database reports `target` (e.g. [`DB_AVAILABLE`])
    ///
    /// This only reflects the provider's view. Use [`wait_for_login_ready`]
    /// when the caller needs to actually connect.
    pub async fn wait_for_database_state(
        &self,
        identifier: &str,
        target: &str,
    ) -> Result<DatabaseInstance> {
        let database = self.database();

        self.poller()
            .poll_until(
                &format!("wait for {identifier} {target}"),
                &self.waits().database,
                |_| async move {
                    let instance = database
                        .describe_db_instances(Some(identifier))
                        .await?
                        .into_iter()
                        .find(|db| db.identifier == identifier);

                    match instance {
                        Some(db) if db.status == target => Ok(Probe::Ready(db)),
                        Some(db)
                            if target == DB_AVAILABLE
                                && DB_UNRECOVERABLE.contains(&db.status.as_str()) =>
                        {
                            Err(CloudError::WaitFailed {
                                resource: identifier.to_string(),
                                target: target.to_string(),
                                observed: db.status,
                            })
                        }
                        Some(db) => Ok(Probe::NotYet(format!(
                            "{identifier} is {}, waiting for {target}",
                            db.status
                        ))),
                        None => Ok(Probe::NotYet(format!("{identifier} not listed yet"))),
                    }
                },
                |attempts, _| CloudError::WaitTimeout {
                    resource: identifier.to_string(),
                    target: target.to_string(),
                    attempts,
                },
            )
            .await
    }
}

/// One authenticated connection attempt against a database
///
/// Implementations must release whatever connection they open before
/// returning, whether the login succeeded or not.
#[async_trait]
pub trait LoginProbe: Send + Sync {
    /// Human-readable description of the endpoint
    fn describe(&self) -> String;

    async fn try_login(&self) -> anyhow::Result<()>;
}

/// Probe `probe` until a login succeeds
///
/// Sleeps `config`'s interval between failed attempts and fails with
/// [`CloudError::LoginTimeout`] once `config.max_attempts` probes failed.
/// Returns the number of attempts it took.
pub async fn wait_for_login_ready(
    poller: &Poller,
    probe: &dyn LoginProbe,
    config: &RetryConfig,
) -> Result<u32> {
    let target = probe.describe();
    tracing::info!("Waiting for {} to accept logins", target);

    poller
        .poll_until(
            &format!("login to {target}"),
            config,
            |attempt| async move {
                match probe.try_login().await {
                    Ok(()) => Ok(Probe::Ready(attempt)),
                    Err(e) => Ok(Probe::NotYet(e.to_string())),
                }
            },
            |attempts, _| CloudError::LoginTimeout { attempts },
        )
        .await
}

/// Budget for [`wait_for_tcp_reachable`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityConfig {
    /// Overall time limit in minutes; the attempt budget is twice this
    pub time_limit_minutes: u32,

    /// Delay before retrying after a connection closed without data
    pub retry_interval: Duration,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            time_limit_minutes: 20,
            retry_interval: Duration::from_secs(30),
        }
    }
}

impl ReachabilityConfig {
    pub fn attempt_budget(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(2)
    }
}

/// Wait until `address:port` accepts a connection and sends at least one byte
///
/// A connection that is refused, or closed by the peer before any data
/// arrived, consumes one unit of the budget. A connection that stays open
/// silently is waited on until data, close or cancellation.
pub async fn wait_for_tcp_reachable(
    poller: &Poller,
    address: &str,
    port: u16,
    config: &ReachabilityConfig,
) -> Result<u32> {
    let retry = RetryConfig::fixed(config.retry_interval, config.attempt_budget());
    let cancel = poller.cancellation();

    poller
        .poll_until(
            &format!("connect to {address}:{port}"),
            &retry,
            |attempt| async move {
                tokio::select! {
                    _ = cancel.cancelled() => Err(CloudError::Cancelled),
                    outcome = probe_tcp(address, port) => Ok(match outcome {
                        Probe::Ready(()) => Probe::Ready(attempt),
                        Probe::NotYet(reason) => Probe::NotYet(reason),
                    }),
                }
            },
            |attempts, _| CloudError::ReachabilityTimeout {
                address: address.to_string(),
                port,
                attempts,
            },
        )
        .await
}

async fn probe_tcp(address: &str, port: u16) -> Probe<()> {
    let mut stream = match TcpStream::connect((address, port)).await {
        Ok(stream) => stream,
        Err(e) => return Probe::NotYet(format!("connection failed: {e}")),
    };

    let mut buf = [0u8; 1];
    match stream.read(&mut buf).await {
        Ok(0) => Probe::NotYet("connection closed without data".to_string()),
        Ok(_) => Probe::Ready(()),
        Err(e) => Probe::NotYet(format!("connection closed: {e}")),
    }
}
