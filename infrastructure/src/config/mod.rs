//! Configuration loading and file format

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileCouncilConfig, FileEngineConfig, FileGatewayConfig, FileLoggingConfig,
    FileStoreConfig, FileWarriorConfig,
};
pub use loader::ConfigLoader;
