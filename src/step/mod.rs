//! Containerized pipeline steps
//!
//! Every step has a host half, which stages a workspace and launches a
//! container, and a guest half, which runs inside that container. The two
//! halves share nothing but the execution id, the serialized
//! configuration and the mounted output directory.

pub mod config;
mod errors;
pub mod guest;
pub mod host;
mod identity;
pub mod java_staging;
mod kind;
pub mod paths;
pub mod repository;
pub mod sources_generation;

pub use config::{
    ApiTarget, GeneratorArtifacts, JavaStagingConfig, ModuleMapping, RepoConfig,
    SourcesGenerationConfig, StagingRepoConfig, StepConfig,
};
pub use errors::StepError;
pub use guest::GuestContext;
pub use host::{ExecutionHandle, ExecutionStatus, HostSettings, HostStep, StepRunner};
pub use identity::ExecutionId;
pub use kind::{ARTIFACT_ARCHIVE, ARTIFACT_METADATA, StepKind};
pub use paths::{GuestPaths, HostPaths};
