//! RDS database facade

use crate::{AwsProvider, sdk_error};
use async_trait::async_trait;
use aws_sdk_rds::types::DbInstance;
use cloudflow_core::{DatabaseApi, DatabaseInstance, Endpoint, Result};

const SERVICE: &str = "rds";

fn to_database(db: &DbInstance) -> DatabaseInstance {
    DatabaseInstance {
        identifier: db.db_instance_identifier().unwrap_or_default().to_string(),
        status: db.db_instance_status().unwrap_or_default().to_string(),
        class: db.db_instance_class().unwrap_or_default().to_string(),
        engine: db.engine().map(str::to_string),
        endpoint: db.endpoint().and_then(|e| {
            Some(Endpoint {
                host: e.address()?.to_string(),
                port: e.port().and_then(|p| u16::try_from(p).ok()).unwrap_or_default(),
            })
        }),
    }
}

#[async_trait]
impl DatabaseApi for AwsProvider {
    async fn describe_db_instances(
        &self,
        identifier: Option<&str>,
    ) -> Result<Vec<DatabaseInstance>> {
        tracing::debug!("DescribeDBInstances {:?}", identifier);
        let mut pages = self
            .rds
            .describe_db_instances()
            .set_db_instance_identifier(identifier.map(str::to_string))
            .into_paginator()
            .send();

        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(sdk_error(SERVICE, "DescribeDBInstances"))?;
            instances.extend(page.db_instances().iter().map(to_database));
        }
        Ok(instances)
    }

    async fn start_db_instance(&self, identifier: &str) -> Result<()> {
        tracing::debug!("StartDBInstance {}", identifier);
        self.rds
            .start_db_instance()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(sdk_error(SERVICE, "StartDBInstance"))?;
        Ok(())
    }

    async fn stop_db_instance(&self, identifier: &str) -> Result<()> {
        tracing::debug!("StopDBInstance {}", identifier);
        self.rds
            .stop_db_instance()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(sdk_error(SERVICE, "StopDBInstance"))?;
        Ok(())
    }

    async fn reboot_db_instance(&self, identifier: &str) -> Result<()> {
        tracing::debug!("RebootDBInstance {}", identifier);
        self.rds
            .reboot_db_instance()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(sdk_error(SERVICE, "RebootDBInstance"))?;
        Ok(())
    }

    async fn modify_db_instance_class(&self, identifier: &str, class: &str) -> Result<()> {
        tracing::debug!("ModifyDBInstance {} class={}", identifier, class);
        self.rds
            .modify_db_instance()
            .db_instance_identifier(identifier)
            .db_instance_class(class)
            .apply_immediately(true)
            .send()
            .await
            .map_err(sdk_error(SERVICE, "ModifyDBInstance"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_database() {
        let raw = DbInstance::builder()
            .db_instance_identifier("orders")
            .db_instance_status("available")
            .db_instance_class("db.t3.medium")
            .engine("postgres")
            .endpoint(
                aws_sdk_rds::types::Endpoint::builder()
                    .address("orders.abc.ap-northeast-1.rds.amazonaws.com")
                    .port(5432)
                    .build(),
            )
            .build();

        let db = to_database(&raw);
        assert_eq!(db.identifier, "orders");
        assert_eq!(db.status, "available");
        assert_eq!(db.engine.as_deref(), Some("postgres"));
        assert_eq!(
            db.endpoint,
            Some(Endpoint {
                host: "orders.abc.ap-northeast-1.rds.amazonaws.com".to_string(),
                port: 5432,
            })
        );
    }

    #[test]
    fn test_endpoint_without_address_is_dropped() {
        let raw = DbInstance::builder()
            .db_instance_identifier("creating")
            .db_instance_status("creating")
            .endpoint(aws_sdk_rds::types::Endpoint::builder().port(3306).build())
            .build();

        assert_eq!(to_database(&raw).endpoint, None);
    }
}
