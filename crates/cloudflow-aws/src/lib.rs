//! cloudflow AWS provider
//!
//! Implements the cloudflow-core provider traits on top of the AWS SDK:
//!
//! | Trait | Service |
//! |-------|---------|
//! | `ComputeApi` | EC2 |
//! | `DatabaseApi` | RDS |
//! | `DeploymentApi` | CodeDeploy |
//! | `KeyValueApi` | DynamoDB |
//!
//! Each trait method is one request (or one paginated request) with the SDK
//! error mapped to `CloudError::Api`.

pub mod codedeploy;
pub mod config;
pub mod dynamodb;
pub mod ec2;
pub mod login;
pub mod rds;

pub use config::load_sdk_config;
pub use login::SqlLoginProbe;

use aws_config::SdkConfig;
use cloudflow_config::ResolvedCredentials;
use cloudflow_core::{CloudError, Event, Observer};

/// AWS implementation of every cloudflow provider trait
#[derive(Clone, Debug)]
pub struct AwsProvider {
    ec2: aws_sdk_ec2::Client,
    rds: aws_sdk_rds::Client,
    codedeploy: aws_sdk_codedeploy::Client,
    dynamodb: aws_sdk_dynamodb::Client,
}

impl AwsProvider {
    /// Build clients from an already loaded SDK config
    pub fn from_conf(config: &SdkConfig) -> Self {
        Self {
            ec2: aws_sdk_ec2::Client::new(config),
            rds: aws_sdk_rds::Client::new(config),
            codedeploy: aws_sdk_codedeploy::Client::new(config),
            dynamodb: aws_sdk_dynamodb::Client::new(config),
        }
    }

    /// Load the SDK config for `credentials` and build all clients
    ///
    /// Ambient credentials are reported to `observer` as a
    /// [`Event::CredentialFallback`].
    pub async fn connect(credentials: &ResolvedCredentials, observer: &dyn Observer) -> Self {
        if let Some(reason) = credentials.fallback_reason() {
            observer.notify(&Event::CredentialFallback {
                reason: reason.to_string(),
            });
        }

        let config = load_sdk_config(credentials).await;
        tracing::debug!("AWS clients configured for region {:?}", config.region());
        Self::from_conf(&config)
    }
}

/// Map an SDK error to [`CloudError::Api`] keeping the full error chain
pub(crate) fn sdk_error<E>(
    service: &'static str,
    operation: &'static str,
) -> impl FnOnce(E) -> CloudError
where
    E: std::error::Error,
{
    move |err| CloudError::api(service, operation, aws_sdk_ec2::error::DisplayErrorContext(&err))
}
