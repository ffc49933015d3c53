//! Durable quest storage adapters

mod sqlite;

pub use sqlite::SqliteQuestStore;
