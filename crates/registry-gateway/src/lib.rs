//! Registry-Gateway: Container Registry Access for ECR Retention
//!
//! This crate owns every call the retention engine makes to a container
//! registry. It exposes a narrow async trait plus the record types that
//! cross it.
//!
//! ## Layer 0 - Registry Access
//!
//! Focus: list repositories, list images, delete one image by digest.
//!
//! ## Key Components
//!
//! - `RegistryGateway`: the trait the engine depends on
//! - `EcrGateway`: AWS ECR implementation
//! - `MemoryRegistryGateway`: in-memory fake with failure injection

pub mod ecr;
mod error;
pub mod fakes;
pub mod gateway;

pub use ecr::EcrGateway;
pub use error::GatewayError;
pub use gateway::{
    GatewayResult, ImageDigest, ImageRecord, RegistryGateway, RepositoryRecord,
};
