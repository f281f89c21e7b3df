//! Provider facade traits
//!
//! One trait per remote service. Implementations are stateless handles that
//! are safe to share between concurrent operations; every method is a single
//! request/response exchange (paginated listings are drained by the
//! implementation). Nothing here waits for a state transition.

use crate::error::Result;
use crate::model::{
    ComputeInstance, DatabaseInstance, DeploymentGroupInfo, DeploymentInstanceSummary,
    DeploymentStatus, Item, Revision, TagFilter, Target,
};
use async_trait::async_trait;

/// Compute service (virtual machines)
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Describe every instance selected by `target`, terminated ones included
    async fn describe_instances(&self, target: &Target) -> Result<Vec<ComputeInstance>>;

    /// Describe the given instances; unknown ids are simply absent from the result
    async fn describe_instances_by_id(&self, ids: &[String]) -> Result<Vec<ComputeInstance>>;

    async fn start_instances(&self, ids: &[String]) -> Result<()>;

    async fn stop_instances(&self, ids: &[String]) -> Result<()>;

    async fn reboot_instances(&self, ids: &[String]) -> Result<()>;

    /// Change the size class of a stopped instance
    async fn modify_instance_type(&self, id: &str, instance_type: &str) -> Result<()>;
}

/// Relational database service
#[async_trait]
pub trait DatabaseApi: Send + Sync {
    /// Describe one instance, or all of them when `identifier` is `None`
    async fn describe_db_instances(&self, identifier: Option<&str>)
    -> Result<Vec<DatabaseInstance>>;

    async fn start_db_instance(&self, identifier: &str) -> Result<()>;

    async fn stop_db_instance(&self, identifier: &str) -> Result<()>;

    async fn reboot_db_instance(&self, identifier: &str) -> Result<()>;

    /// Change the instance class, applied immediately rather than in the
    /// next maintenance window
    async fn modify_db_instance_class(&self, identifier: &str, class: &str) -> Result<()>;
}

/// Deployment service
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Create a deployment and return its id
    async fn create_deployment(
        &self,
        application: &str,
        group: &str,
        revision: &Revision,
    ) -> Result<String>;

    async fn deployment_status(&self, deployment_id: &str) -> Result<DeploymentStatus>;

    /// Raw ids of every instance taking part in the deployment
    async fn list_deployment_instances(&self, deployment_id: &str) -> Result<Vec<String>>;

    async fn batch_get_deployment_instances(
        &self,
        deployment_id: &str,
        instance_ids: &[String],
    ) -> Result<Vec<DeploymentInstanceSummary>>;

    async fn get_deployment_group(
        &self,
        application: &str,
        group: &str,
    ) -> Result<DeploymentGroupInfo>;

    /// Replace the compute tag filters of a deployment group
    async fn update_deployment_group_filter(
        &self,
        application: &str,
        group: &str,
        filters: &[TagFilter],
    ) -> Result<()>;
}

/// Key-value store
#[async_trait]
pub trait KeyValueApi: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>>;

    async fn put_item(&self, table: &str, item: &Item) -> Result<()>;

    async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>>;

    async fn delete_item(&self, table: &str, key: &Item) -> Result<()>;
}
