//! Status projection
//!
//! Flattens describe responses into compact records. Records are recomputed
//! from a fresh describe call every time and never cached.

use crate::cloud::Cloud;
use crate::error::{CloudError, Result};
use crate::model::{ComputeInstance, DatabaseInstance, InstanceState, Target};
use futures_util::future::try_join_all;
use serde::Serialize;

/// Application label used when an instance has no `Application` tag
pub const DEFAULT_APPLICATION: &str = "db";

pub const NAME_TAG: &str = "Name";
pub const APPLICATION_TAG: &str = "Application";
pub const ENVIRONMENT_TAG: &str = "Environment";

/// Compact view of a compute instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeStatus {
    pub name: String,
    pub state: InstanceState,
    pub application: String,
    pub environment: Option<String>,
    pub address: Option<String>,
    pub size: String,
    pub id: String,
}

impl ComputeStatus {
    /// Project one instance; fails when it carries no `Name` tag
    pub fn from_instance(instance: &ComputeInstance) -> Result<Self> {
        let name = instance
            .tag(NAME_TAG)
            .ok_or_else(|| CloudError::MissingTag {
                instance_id: instance.id.clone(),
                tag: NAME_TAG.to_string(),
            })?;

        Ok(Self {
            name: name.to_string(),
            state: instance.state.clone(),
            application: instance
                .tag(APPLICATION_TAG)
                .unwrap_or(DEFAULT_APPLICATION)
                .to_string(),
            environment: instance.tag(ENVIRONMENT_TAG).map(str::to_string),
            address: instance.public_ip.clone(),
            size: instance.instance_type.clone(),
            id: instance.id.clone(),
        })
    }
}

/// Compact view of a database instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStatus {
    pub name: String,
    pub state: String,
    pub address: Option<String>,
    pub size: String,
}

impl From<&DatabaseInstance> for DatabaseStatus {
    fn from(db: &DatabaseInstance) -> Self {
        Self {
            name: db.identifier.clone(),
            state: db.status.clone(),
            address: db.endpoint.as_ref().map(|e| e.host.clone()),
            size: db.class.clone(),
        }
    }
}

/// Project non-terminated instances, preserving their order
pub fn project_compute(instances: &[ComputeInstance]) -> Result<Vec<ComputeStatus>> {
    instances
        .iter()
        .filter(|i| i.state != InstanceState::Terminated)
        .map(ComputeStatus::from_instance)
        .collect()
}

pub fn project_databases(instances: &[DatabaseInstance]) -> Vec<DatabaseStatus> {
    instances.iter().map(DatabaseStatus::from).collect()
}

/// Name of the record whose id is `id`
pub fn lookup_name_by_id<'a>(id: &str, records: &'a [ComputeStatus]) -> Result<&'a str> {
    records
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.name.as_str())
        .ok_or_else(|| CloudError::NotFound(format!("no compute instance with id {id}")))
}

impl Cloud {
    /// Status of every live instance selected by `target`
    pub async fn compute_status(&self, target: &Target) -> Result<Vec<ComputeStatus>> {
        let instances = self.compute().describe_instances(target).await?;
        tracing::debug!("{:?}: {} instance(s) described", target, instances.len());
        project_compute(&instances)
    }

    /// Fan out one lookup per target; results are concatenated in input order
    pub async fn compute_status_many(&self, targets: &[Target]) -> Result<Vec<ComputeStatus>> {
        let results = try_join_all(targets.iter().map(|t| self.compute_status(t))).await?;
        Ok(results.into_iter().flatten().collect())
    }

    /// Status of one database, or all of them when `identifier` is `None`
    pub async fn database_status(&self, identifier: Option<&str>) -> Result<Vec<DatabaseStatus>> {
        let identifier = identifier.filter(|id| !id.trim().is_empty());
        let instances = self.database().describe_db_instances(identifier).await?;
        Ok(project_databases(&instances))
    }

    pub async fn database_status_many(&self, identifiers: &[String]) -> Result<Vec<DatabaseStatus>> {
        let results = try_join_all(
            identifiers
                .iter()
                .map(|id| self.database_status(Some(id.as_str()))),
        )
        .await?;
        Ok(results.into_iter().flatten().collect())
    }
}
