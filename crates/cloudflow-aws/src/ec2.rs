//! EC2 compute facade

use crate::{AwsProvider, sdk_error};
use async_trait::async_trait;
use aws_sdk_ec2::error::ProvideErrorMetadata;
use aws_sdk_ec2::types::{AttributeValue, Filter, Instance};
use cloudflow_core::{ComputeApi, ComputeInstance, InstanceState, Result, Tag, Target};

const SERVICE: &str = "ec2";

/// Error code EC2 returns when an explicitly requested id does not exist
const INSTANCE_NOT_FOUND: &str = "InvalidInstanceID.NotFound";

fn to_instance(instance: &Instance) -> ComputeInstance {
    ComputeInstance {
        id: instance.instance_id().unwrap_or_default().to_string(),
        state: instance
            .state()
            .and_then(|s| s.name())
            .map(|name| InstanceState::from(name.as_str()))
            .unwrap_or_else(|| InstanceState::Unknown(String::new())),
        instance_type: instance
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        public_ip: instance.public_ip_address().map(str::to_string),
        tags: instance
            .tags()
            .iter()
            .filter_map(|t| Some(Tag::new(t.key()?, t.value().unwrap_or_default())))
            .collect(),
    }
}

fn tag_filters(target: &Target) -> Option<Vec<Filter>> {
    target.tag_filter().map(|(key, value)| {
        vec![
            Filter::builder()
                .name(format!("tag:{key}"))
                .values(value)
                .build(),
        ]
    })
}

impl AwsProvider {
    async fn describe(
        &self,
        filters: Option<Vec<Filter>>,
        ids: Option<Vec<String>>,
    ) -> Result<Vec<ComputeInstance>> {
        let mut pages = self
            .ec2
            .describe_instances()
            .set_filters(filters)
            .set_instance_ids(ids)
            .into_paginator()
            .send();

        // Every instance of every reservation on every page
        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(sdk_error(SERVICE, "DescribeInstances"))?;
            for reservation in page.reservations() {
                instances.extend(reservation.instances().iter().map(to_instance));
            }
        }
        Ok(instances)
    }
}

#[async_trait]
impl ComputeApi for AwsProvider {
    async fn describe_instances(&self, target: &Target) -> Result<Vec<ComputeInstance>> {
        tracing::debug!("DescribeInstances {:?}", target);
        self.describe(tag_filters(target), None).await
    }

    async fn describe_instances_by_id(&self, ids: &[String]) -> Result<Vec<ComputeInstance>> {
        tracing::debug!("DescribeInstances ids={:?}", ids);
        let result = self
            .ec2
            .describe_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .send()
            .await;

        match result {
            Ok(output) => Ok(output
                .reservations()
                .iter()
                .flat_map(|r| r.instances())
                .map(to_instance)
                .collect()),
            Err(err) if err.code() == Some(INSTANCE_NOT_FOUND) => Ok(Vec::new()),
            Err(err) => Err(sdk_error(SERVICE, "DescribeInstances")(err)),
        }
    }

    async fn start_instances(&self, ids: &[String]) -> Result<()> {
        tracing::debug!("StartInstances {:?}", ids);
        self.ec2
            .start_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .send()
            .await
            .map_err(sdk_error(SERVICE, "StartInstances"))?;
        Ok(())
    }

    async fn stop_instances(&self, ids: &[String]) -> Result<()> {
        tracing::debug!("StopInstances {:?}", ids);
        self.ec2
            .stop_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .send()
            .await
            .map_err(sdk_error(SERVICE, "StopInstances"))?;
        Ok(())
    }

    async fn reboot_instances(&self, ids: &[String]) -> Result<()> {
        tracing::debug!("RebootInstances {:?}", ids);
        self.ec2
            .reboot_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .send()
            .await
            .map_err(sdk_error(SERVICE, "RebootInstances"))?;
        Ok(())
    }

    async fn modify_instance_type(&self, id: &str, instance_type: &str) -> Result<()> {
        tracing::debug!("ModifyInstanceAttribute {} instanceType={}", id, instance_type);
        self.ec2
            .modify_instance_attribute()
            .instance_id(id)
            .instance_type(AttributeValue::builder().value(instance_type).build())
            .send()
            .await
            .map_err(sdk_error(SERVICE, "ModifyInstanceAttribute"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{InstanceStateName, InstanceType};

    #[test]
    fn test_to_instance() {
        let raw = Instance::builder()
            .instance_id("i-0abc")
            .state(
                aws_sdk_ec2::types::InstanceState::builder()
                    .name(InstanceStateName::Stopped)
                    .build(),
            )
            .instance_type(InstanceType::T3Small)
            .tags(
                aws_sdk_ec2::types::Tag::builder()
                    .key("Name")
                    .value("web-1")
                    .build(),
            )
            .tags(aws_sdk_ec2::types::Tag::builder().value("orphan").build())
            .build();

        let instance = to_instance(&raw);
        assert_eq!(instance.id, "i-0abc");
        assert_eq!(instance.state, InstanceState::Stopped);
        assert_eq!(instance.instance_type, "t3.small");
        assert_eq!(instance.public_ip, None);
        assert_eq!(instance.tags, vec![Tag::new("Name", "web-1")]);
    }

    #[test]
    fn test_tag_filters() {
        assert!(tag_filters(&Target::All).is_none());

        let filters = tag_filters(&Target::environment("prod")).unwrap();
        assert_eq!(filters[0].name(), Some("tag:Environment"));
        assert_eq!(filters[0].values(), ["prod".to_string()]);
    }
}
