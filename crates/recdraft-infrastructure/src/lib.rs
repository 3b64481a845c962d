//! Durable storage backends, configuration loading and path resolution.

pub mod config_service;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::{PathError, RecdraftPaths};
pub use crate::storage::{JsonFileStorage, MemoryStorage};
