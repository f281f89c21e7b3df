//! CodeDeploy deployment facade
//!
//! The per-instance deployment APIs are deprecated upstream in favor of
//! deployment targets but remain the only ones reporting EC2 lifecycle
//! diagnostics in this shape.

#![allow(deprecated)]

use crate::{AwsProvider, sdk_error};
use async_trait::async_trait;
use aws_sdk_codedeploy::primitives::DateTime as SmithyDateTime;
use aws_sdk_codedeploy::types as cd;
use chrono::{DateTime, Utc};
use cloudflow_core::{
    CloudError, DeploymentApi, DeploymentGroupInfo, DeploymentInstanceSummary, DeploymentStatus,
    Diagnostics, InstanceDeploymentStatus, LifecycleEvent, LifecycleEventStatus, Result, Revision,
    TagFilter, TagFilterType,
};

const SERVICE: &str = "codedeploy";

/// BatchGetDeploymentInstances accepts at most this many ids per call
const BATCH_LIMIT: usize = 25;

fn to_chrono(time: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

fn to_revision_location(revision: &Revision) -> cd::RevisionLocation {
    match revision {
        Revision::S3 {
            bucket,
            key,
            bundle_type,
            version,
            etag,
        } => cd::RevisionLocation::builder()
            .revision_type(cd::RevisionLocationType::S3)
            .s3_location(
                cd::S3Location::builder()
                    .bucket(bucket)
                    .key(key)
                    .bundle_type(cd::BundleType::from(bundle_type.as_str()))
                    .set_version(version.clone())
                    .set_e_tag(etag.clone())
                    .build(),
            )
            .build(),
        Revision::GitHub {
            repository,
            commit_id,
        } => cd::RevisionLocation::builder()
            .revision_type(cd::RevisionLocationType::GitHub)
            .git_hub_location(
                cd::GitHubLocation::builder()
                    .repository(repository)
                    .commit_id(commit_id)
                    .build(),
            )
            .build(),
    }
}

fn to_lifecycle_event(event: &cd::LifecycleEvent) -> LifecycleEvent {
    LifecycleEvent {
        name: event.lifecycle_event_name().unwrap_or_default().to_string(),
        status: event
            .status()
            .map(|s| LifecycleEventStatus::from(s.as_str()))
            .unwrap_or(LifecycleEventStatus::Pending),
        start_time: event.start_time().and_then(to_chrono),
        end_time: event.end_time().and_then(to_chrono),
        diagnostics: event.diagnostics().map(|d| Diagnostics {
            error_code: d.error_code().map(|c| c.as_str().to_string()),
            script_name: d.script_name().map(str::to_string),
            message: d.message().map(str::to_string),
            log_tail: d.log_tail().map(str::to_string),
        }),
    }
}

fn to_instance_summary(summary: &cd::InstanceSummary) -> DeploymentInstanceSummary {
    DeploymentInstanceSummary {
        instance_id: summary.instance_id().unwrap_or_default().to_string(),
        status: summary
            .status()
            .map(|s| InstanceDeploymentStatus::from(s.as_str()))
            .unwrap_or(InstanceDeploymentStatus::Unknown(String::new())),
        lifecycle_events: summary
            .lifecycle_events()
            .iter()
            .map(to_lifecycle_event)
            .collect(),
    }
}

fn to_tag_filter(filter: &cd::Ec2TagFilter) -> TagFilter {
    let filter_type = match filter.r#type() {
        Some(cd::Ec2TagFilterType::KeyOnly) => TagFilterType::KeyOnly,
        Some(cd::Ec2TagFilterType::ValueOnly) => TagFilterType::ValueOnly,
        _ => TagFilterType::KeyAndValue,
    };
    TagFilter {
        key: filter.key().map(str::to_string),
        value: filter.value().map(str::to_string),
        filter_type,
    }
}

fn to_ec2_tag_filter(filter: &TagFilter) -> cd::Ec2TagFilter {
    cd::Ec2TagFilter::builder()
        .set_key(filter.key.clone())
        .set_value(filter.value.clone())
        .r#type(cd::Ec2TagFilterType::from(filter.filter_type.as_str()))
        .build()
}

#[async_trait]
impl DeploymentApi for AwsProvider {
    async fn create_deployment(
        &self,
        application: &str,
        group: &str,
        revision: &Revision,
    ) -> Result<String> {
        tracing::debug!("CreateDeployment {}/{}", application, group);
        let output = self
            .codedeploy
            .create_deployment()
            .application_name(application)
            .deployment_group_name(group)
            .revision(to_revision_location(revision))
            .send()
            .await
            .map_err(sdk_error(SERVICE, "CreateDeployment"))?;

        output
            .deployment_id()
            .map(str::to_string)
            .ok_or_else(|| {
                CloudError::MalformedResponse("CreateDeployment returned no deployment id".into())
            })
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<DeploymentStatus> {
        tracing::debug!("GetDeployment {}", deployment_id);
        let output = self
            .codedeploy
            .get_deployment()
            .deployment_id(deployment_id)
            .send()
            .await
            .map_err(sdk_error(SERVICE, "GetDeployment"))?;

        output
            .deployment_info()
            .and_then(|info| info.status())
            .map(|s| DeploymentStatus::from(s.as_str()))
            .ok_or_else(|| {
                CloudError::MalformedResponse(format!("deployment {deployment_id} has no status"))
            })
    }

    async fn list_deployment_instances(&self, deployment_id: &str) -> Result<Vec<String>> {
        tracing::debug!("ListDeploymentInstances {}", deployment_id);
        let mut ids = Vec::new();
        let mut next_token = None;

        loop {
            let output = self
                .codedeploy
                .list_deployment_instances()
                .deployment_id(deployment_id)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(sdk_error(SERVICE, "ListDeploymentInstances"))?;

            ids.extend(output.instances_list().iter().cloned());
            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(ids)
    }

    async fn batch_get_deployment_instances(
        &self,
        deployment_id: &str,
        instance_ids: &[String],
    ) -> Result<Vec<DeploymentInstanceSummary>> {
        let mut summaries = Vec::with_capacity(instance_ids.len());
        for chunk in instance_ids.chunks(BATCH_LIMIT) {
            tracing::debug!(
                "BatchGetDeploymentInstances {} ({} id(s))",
                deployment_id,
                chunk.len()
            );
            let output = self
                .codedeploy
                .batch_get_deployment_instances()
                .deployment_id(deployment_id)
                .set_instance_ids(Some(chunk.to_vec()))
                .send()
                .await
                .map_err(sdk_error(SERVICE, "BatchGetDeploymentInstances"))?;

            if let Some(message) = output.error_message() {
                tracing::warn!("BatchGetDeploymentInstances: {}", message);
            }
            summaries.extend(output.instances_summary().iter().map(to_instance_summary));
        }
        Ok(summaries)
    }

    async fn get_deployment_group(
        &self,
        application: &str,
        group: &str,
    ) -> Result<DeploymentGroupInfo> {
        tracing::debug!("GetDeploymentGroup {}/{}", application, group);
        let output = self
            .codedeploy
            .get_deployment_group()
            .application_name(application)
            .deployment_group_name(group)
            .send()
            .await
            .map_err(sdk_error(SERVICE, "GetDeploymentGroup"))?;

        let info = output
            .deployment_group_info()
            .ok_or_else(|| CloudError::NotFound(format!("deployment group {application}/{group}")))?;

        Ok(DeploymentGroupInfo {
            application: info.application_name().unwrap_or(application).to_string(),
            group_name: info.deployment_group_name().unwrap_or(group).to_string(),
            group_id: info.deployment_group_id().map(str::to_string),
            service_role_arn: info.service_role_arn().map(str::to_string),
            deployment_config_name: info.deployment_config_name().map(str::to_string),
            ec2_tag_filters: info.ec2_tag_filters().iter().map(to_tag_filter).collect(),
        })
    }

    async fn update_deployment_group_filter(
        &self,
        application: &str,
        group: &str,
        filters: &[TagFilter],
    ) -> Result<()> {
        tracing::debug!("UpdateDeploymentGroup {}/{}", application, group);
        self.codedeploy
            .update_deployment_group()
            .application_name(application)
            .current_deployment_group_name(group)
            .set_ec2_tag_filters(Some(filters.iter().map(to_ec2_tag_filter).collect()))
            .send()
            .await
            .map_err(sdk_error(SERVICE, "UpdateDeploymentGroup"))?;
        Ok(())
    }
}
