//! Use cases for quest-council

pub mod dispatch_council;
pub mod quest_engine;
pub mod quest_manager;
pub mod quest_service;
