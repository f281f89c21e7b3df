//! cloudflow core
//!
//! Provider-agnostic orchestration over compute, managed database,
//! deployment and key-value services: multi-step lifecycle operations,
//! polling waits, status projection and deployment failure summaries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 cloudflow CLI                    │
//! │            (cflow ec2/rds/deploy/...)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cloudflow-core                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Cloud context (lifecycle / status /     │   │
//! │  │  deploy / wait)                          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ retry/poller │  │   observer   │            │
//! │  └──────────────┘  └──────────────┘            │
//! │  trait ComputeApi / DatabaseApi /               │
//! │        DeploymentApi / KeyValueApi              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │ cloudflow-aws │
//!           └───────────────┘
//! ```

pub mod cloud;
pub mod deploy;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod observer;
pub mod provider;
pub mod retry;
pub mod status;
pub mod wait;

// Re-exports
pub use cloud::Cloud;
pub use deploy::{
    DeploymentOutcome, EventReport, FailureDetail, FailureSummary, InstanceFailureReport,
    bare_instance_id,
};
pub use error::{CloudError, Result};
pub use lifecycle::ResizeOutcome;
pub use model::{
    BundleType, ComputeInstance, ConnectionParams, DatabaseInstance, DbEngine, DeploymentGroupInfo,
    DeploymentHandle, DeploymentInstanceSummary, DeploymentStatus, Diagnostics, Endpoint,
    InstanceDeploymentStatus, InstanceState, Item, LifecycleEvent, LifecycleEventStatus, Revision,
    Tag, TagFilter, TagFilterType, Target,
};
pub use observer::{Event, NoopObserver, Observer, ResizeStep, TracingObserver};
pub use provider::{ComputeApi, DatabaseApi, DeploymentApi, KeyValueApi};
pub use retry::{Poller, Probe, RetryConfig, WaitSettings, delay};
pub use status::{
    ComputeStatus, DEFAULT_APPLICATION, DatabaseStatus, lookup_name_by_id, project_compute,
    project_databases,
};
pub use wait::{
    DB_AVAILABLE, LoginProbe, ReachabilityConfig, wait_for_login_ready, wait_for_tcp_reachable,
};
pub use tokio_util::sync::CancellationToken;
