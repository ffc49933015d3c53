//! Application layer for quest-council
//!
//! This crate contains use cases, port definitions, and engine parameters.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::EngineParams;
pub use ports::{
    action_executor::{ActionExecutor, ExecutorError},
    attempt_logger::{AttemptEvent, AttemptLogger, NoAttemptLog},
    completion_gateway::{CompletionGateway, CompletionRequest, GatewayError},
    progress::{DispatchProgress, NoProgress},
    quest_store::{QuestStore, StoreError},
};
pub use use_cases::dispatch_council::{DispatchCouncilUseCase, DispatchError, DispatchInput};
pub use use_cases::quest_engine::{AttemptOutcome, EngineError, QuestEngine};
pub use use_cases::quest_manager::QuestManager;
pub use use_cases::quest_service::{
    CreateQuestRequest, CreateQuestResponse, HealthResponse, HistoryResponse, QuestDetailResponse,
    QuestListResponse, QuestService, ServiceError, StatsResponse, StatusChangeResponse,
};
