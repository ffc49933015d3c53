//! Infrastructure layer for quest-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileCouncilConfig, FileEngineConfig, FileGatewayConfig,
    FileLoggingConfig, FileStoreConfig, FileWarriorConfig,
};
pub use gateway::HttpCompletionGateway;
pub use logging::JsonlAttemptLogger;
pub use store::SqliteQuestStore;
