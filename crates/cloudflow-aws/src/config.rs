//! SDK configuration from resolved credentials

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ec2::config::Credentials;
use cloudflow_config::ResolvedCredentials;

/// Name reported by explicit credentials in SDK diagnostics
const PROVIDER_NAME: &str = "environment";

/// Load an [`SdkConfig`]
///
/// Explicit credentials are installed as a static provider. Ambient
/// credentials leave the default provider chain in charge and only pin the
/// region when one was found.
pub async fn load_sdk_config(credentials: &ResolvedCredentials) -> SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest());

    let loader = match credentials {
        ResolvedCredentials::Explicit {
            access_key_id,
            secret_access_key,
            region,
        } => loader
            .region(Region::new(region.clone()))
            .credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                PROVIDER_NAME,
            )),
        ResolvedCredentials::Ambient {
            region: Some(region),
            ..
        } => loader.region(Region::new(region.clone())),
        ResolvedCredentials::Ambient { region: None, .. } => loader,
    };

    loader.load().await
}
