//! Immutable client context shared by every operation

use crate::observer::{NoopObserver, Observer};
use crate::provider::{ComputeApi, DatabaseApi, DeploymentApi, KeyValueApi};
use crate::retry::{Poller, WaitSettings};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Handles to the four provider services plus wait budgets
///
/// Cheap to clone; all handles are shared and read-only after construction.
/// Lifecycle, status, wait and deployment operations are implemented as
/// methods on this type in their respective modules.
#[derive(Clone)]
pub struct Cloud {
    compute: Arc<dyn ComputeApi>,
    database: Arc<dyn DatabaseApi>,
    deployment: Arc<dyn DeploymentApi>,
    key_value: Arc<dyn KeyValueApi>,
    waits: WaitSettings,
    poller: Poller,
}

impl Cloud {
    /// Build a context from one provider implementing every service
    pub fn new<P>(provider: Arc<P>) -> Self
    where
        P: ComputeApi + DatabaseApi + DeploymentApi + KeyValueApi + 'static,
    {
        Self::from_parts(
            provider.clone(),
            provider.clone(),
            provider.clone(),
            provider,
        )
    }

    /// Build a context from separate service handles
    pub fn from_parts(
        compute: Arc<dyn ComputeApi>,
        database: Arc<dyn DatabaseApi>,
        deployment: Arc<dyn DeploymentApi>,
        key_value: Arc<dyn KeyValueApi>,
    ) -> Self {
        Self {
            compute,
            database,
            deployment,
            key_value,
            waits: WaitSettings::default(),
            poller: Poller::new(Arc::new(NoopObserver), CancellationToken::new()),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.poller = Poller::new(observer, self.poller.cancellation().clone());
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.poller = Poller::new(self.poller.observer_arc(), cancel);
        self
    }

    pub fn with_wait_settings(mut self, waits: WaitSettings) -> Self {
        self.waits = waits;
        self
    }

    pub fn compute(&self) -> &dyn ComputeApi {
        self.compute.as_ref()
    }

    pub fn database(&self) -> &dyn DatabaseApi {
        self.database.as_ref()
    }

    pub fn deployment(&self) -> &dyn DeploymentApi {
        self.deployment.as_ref()
    }

    pub fn key_value(&self) -> &dyn KeyValueApi {
        self.key_value.as_ref()
    }

    pub fn waits(&self) -> &WaitSettings {
        &self.waits
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }
}
