//! Provider-agnostic resource model
//!
//! These types are what the provider facades hand back to the core. They are
//! transient: built from a fresh describe call and dropped at the end of the
//! call chain that asked for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Declares a provider status enum that round-trips through its wire string
/// and keeps unrecognized values instead of failing on them.
macro_rules! provider_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this version does not know about
            Unknown(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown(s) => s.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($wire => Self::$variant,)+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

provider_enum! {
    /// Power state of a compute instance
    pub enum InstanceState {
        Pending => "pending",
        Running => "running",
        ShuttingDown => "shutting-down",
        Stopping => "stopping",
        Stopped => "stopped",
        Terminated => "terminated",
    }
}

provider_enum! {
    /// Overall status of a deployment
    pub enum DeploymentStatus {
        Created => "Created",
        Queued => "Queued",
        InProgress => "InProgress",
        Baking => "Baking",
        Ready => "Ready",
        Succeeded => "Succeeded",
        Failed => "Failed",
        Stopped => "Stopped",
    }
}

provider_enum! {
    /// Status of one instance within a deployment
    pub enum InstanceDeploymentStatus {
        Pending => "Pending",
        InProgress => "InProgress",
        Succeeded => "Succeeded",
        Failed => "Failed",
        Skipped => "Skipped",
        Ready => "Ready",
    }
}

provider_enum! {
    /// Status of one lifecycle event on one instance
    pub enum LifecycleEventStatus {
        Pending => "Pending",
        InProgress => "InProgress",
        Succeeded => "Succeeded",
        Failed => "Failed",
        Skipped => "Skipped",
    }
}

impl DeploymentStatus {
    /// Deployment reached a state that will not change any more
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Stopped)
    }
}

/// Which compute instances a lookup selects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Every instance in the account/region
    All,
    /// Instances whose `Name` tag equals the value
    ByName(String),
    /// Instances whose `Environment` tag equals the value
    ByEnvironment(String),
}

impl Target {
    /// Name lookup; an empty name selects everything
    pub fn name(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            Self::All
        } else {
            Self::ByName(name)
        }
    }

    /// Environment lookup; an empty label selects everything
    pub fn environment(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        if environment.trim().is_empty() {
            Self::All
        } else {
            Self::ByEnvironment(environment)
        }
    }

    /// Tag key and value this target filters on, if any
    pub fn tag_filter(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::All => None,
            Self::ByName(name) => Some(("Name", name.as_str())),
            Self::ByEnvironment(env) => Some(("Environment", env.as_str())),
        }
    }
}

/// Key/value label on a compute instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A compute instance as reported by a describe call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeInstance {
    pub id: String,
    pub state: InstanceState,
    pub instance_type: String,
    pub public_ip: Option<String>,
    pub tags: Vec<Tag>,
}

impl ComputeInstance {
    /// First value of the tag with the given key
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

/// Network endpoint of a database instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// A managed database instance as reported by a describe call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInstance {
    pub identifier: String,
    pub status: String,
    pub class: String,
    pub engine: Option<String>,
    pub endpoint: Option<Endpoint>,
}

/// Archive format of a revision stored in object storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    Tar,
    Tgz,
    Zip,
    Yaml,
    Json,
}

impl BundleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::Tgz => "tgz",
            Self::Zip => "zip",
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }
}

impl std::str::FromStr for BundleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tar" => Ok(Self::Tar),
            "tgz" => Ok(Self::Tgz),
            "zip" => Ok(Self::Zip),
            "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown bundle type '{other}'")),
        }
    }
}

/// Location of an application revision to deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Revision {
    S3 {
        bucket: String,
        key: String,
        bundle_type: BundleType,
        version: Option<String>,
        etag: Option<String>,
    },
    GitHub {
        repository: String,
        commit_id: String,
    },
}

/// Reference to a created deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentHandle {
    pub deployment_id: String,
    pub application: String,
    pub group: String,
}

/// Failure diagnostics attached to a lifecycle event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub error_code: Option<String>,
    pub script_name: Option<String>,
    pub message: Option<String>,
    pub log_tail: Option<String>,
}

/// One step (ApplicationStop, Install, ...) of a deployment on one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleEvent {
    pub name: String,
    pub status: LifecycleEventStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub diagnostics: Option<Diagnostics>,
}

/// Per-instance view of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentInstanceSummary {
    /// Raw id as the deployment service reports it (may be ARN-like)
    pub instance_id: String,
    pub status: InstanceDeploymentStatus,
    pub lifecycle_events: Vec<LifecycleEvent>,
}

/// How a deployment group tag filter matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagFilterType {
    KeyOnly,
    ValueOnly,
    KeyAndValue,
}

impl TagFilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyOnly => "KEY_ONLY",
            Self::ValueOnly => "VALUE_ONLY",
            Self::KeyAndValue => "KEY_AND_VALUE",
        }
    }
}

/// Compute tag filter selecting the members of a deployment group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub key: Option<String>,
    pub value: Option<String>,
    pub filter_type: TagFilterType,
}

impl std::str::FromStr for TagFilter {
    type Err = String;

    /// Parses `KEY=VALUE`, `KEY` (key only) or `=VALUE` (value only)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = match s.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (s.trim(), None),
        };

        match (key.is_empty(), value.filter(|v| !v.is_empty())) {
            (false, Some(v)) => Ok(Self {
                key: Some(key.to_string()),
                value: Some(v.to_string()),
                filter_type: TagFilterType::KeyAndValue,
            }),
            (false, None) => Ok(Self {
                key: Some(key.to_string()),
                value: None,
                filter_type: TagFilterType::KeyOnly,
            }),
            (true, Some(v)) => Ok(Self {
                key: None,
                value: Some(v.to_string()),
                filter_type: TagFilterType::ValueOnly,
            }),
            (true, None) => Err(format!("empty tag filter '{s}'")),
        }
    }
}

/// Deployment group configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentGroupInfo {
    pub application: String,
    pub group_name: String,
    pub group_id: Option<String>,
    pub service_role_arn: Option<String>,
    pub deployment_config_name: Option<String>,
    pub ec2_tag_filters: Vec<TagFilter>,
}

/// Opaque key-value item supplied by the caller
pub type Item = serde_json::Map<String, serde_json::Value>;

/// SQL engine family used for login probing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbEngine {
    Postgres,
    MySql,
}

impl DbEngine {
    /// Map a provider engine name (`postgres`, `aurora-mysql`, ...) to a family
    pub fn from_engine_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("postgres") {
            Some(Self::Postgres)
        } else if name.contains("mysql") || name.contains("mariadb") {
            Some(Self::MySql)
        } else {
            None
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::MySql => 3306,
        }
    }
}

/// Parameters for an authenticated database connection
#[derive(Clone)]
pub struct ConnectionParams {
    pub engine: DbEngine,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}
