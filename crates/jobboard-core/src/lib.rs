//! `jobboard-core`: configuration and shared error type for the jobboard
//! service crates.

pub mod config;
pub mod error;

pub use config::{DatabaseConfig, GatewayConfig, JobboardConfig, PipelineConfig};
pub use error::{CoreError, Result};
