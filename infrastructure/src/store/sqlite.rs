//! Sqlite-backed quest store.
//!
//! Three tables: `quests` (one row per quest, derived counters inline),
//! `attempts` (append-only, `UNIQUE(quest_id, attempt_number)`), and
//! `checkpoints` (opaque blobs). Every write that touches counters runs in
//! one transaction so a concurrent reader never sees a partially-updated
//! quest summary. Timestamps are stored as unix milliseconds.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use council_application::ports::quest_store::{QuestStore, StoreError};
use council_domain::{
    Attempt, DispatchResult, NewAttempt, NewQuest, Quest, QuestStats, QuestStatus,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS quests (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  goal TEXT NOT NULL,
  strategy TEXT NOT NULL,
  status TEXT NOT NULL CHECK (status IN ('created','running','paused','completed','failed','stopped')),
  priority INTEGER NOT NULL DEFAULT 0,
  max_attempts INTEGER NOT NULL DEFAULT -1,
  timeout_minutes INTEGER NOT NULL DEFAULT -1,
  attempts_count INTEGER NOT NULL DEFAULT 0,
  success_count INTEGER NOT NULL DEFAULT 0,
  best_score REAL NOT NULL DEFAULT 0.0,
  best_solution TEXT,
  created_at INTEGER NOT NULL,
  started_at INTEGER,
  paused_at INTEGER,
  completed_at INTEGER
);

CREATE TABLE IF NOT EXISTS attempts (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  quest_id INTEGER NOT NULL,
  attempt_number INTEGER NOT NULL,
  approach TEXT NOT NULL,
  result_summary TEXT NOT NULL,
  score REAL NOT NULL,
  success INTEGER NOT NULL CHECK (success IN (0,1)),
  execution_time_ms INTEGER NOT NULL,
  responses_json TEXT NOT NULL,
  learned TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  UNIQUE(quest_id, attempt_number),
  FOREIGN KEY (quest_id) REFERENCES quests(id)
);

CREATE INDEX IF NOT EXISTS idx_attempts_quest ON attempts(quest_id, attempt_number DESC);

CREATE TABLE IF NOT EXISTS checkpoints (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  quest_id INTEGER NOT NULL,
  created_at INTEGER NOT NULL,
  blob BLOB NOT NULL,
  FOREIGN KEY (quest_id) REFERENCES quests(id)
);
";

/// Transactional quest store over an embedded sqlite database.
pub struct SqliteQuestStore {
    conn: Mutex<Connection>,
}

impl SqliteQuestStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref()).map_err(backend)?;
        Self::init(conn, Some(path.as_ref()))
    }

    /// In-memory store, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<&Path>) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL").map_err(backend)?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        if let Some(path) = path {
            info!("Quest store opened at {}", path.display());
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".to_string()))
    }
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn parse_status(s: &str) -> Result<QuestStatus, StoreError> {
    s.parse()
        .map_err(|e: String| StoreError::Backend(format!("corrupt status column: {e}")))
}

fn quest_from_row(row: &Row<'_>) -> rusqlite::Result<(Quest, String)> {
    let status: String = row.get("status")?;
    let quest = Quest {
        id: row.get("id")?,
        goal: row.get("goal")?,
        strategy: row.get("strategy")?,
        // Placeholder; the caller parses the status string it gets back
        status: QuestStatus::Created,
        priority: row.get("priority")?,
        max_attempts: row.get("max_attempts")?,
        timeout_minutes: row.get("timeout_minutes")?,
        attempts_count: row.get("attempts_count")?,
        success_count: row.get("success_count")?,
        best_score: row.get("best_score")?,
        best_solution: row.get("best_solution")?,
        created_at: from_millis(row.get("created_at")?),
        started_at: row.get::<_, Option<i64>>("started_at")?.map(from_millis),
        paused_at: row.get::<_, Option<i64>>("paused_at")?.map(from_millis),
        completed_at: row.get::<_, Option<i64>>("completed_at")?.map(from_millis),
    };
    Ok((quest, status))
}

fn finish_quest(pair: (Quest, String)) -> Result<Quest, StoreError> {
    let (mut quest, status) = pair;
    quest.status = parse_status(&status)?;
    Ok(quest)
}

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<(Attempt, String)> {
    let responses_json: String = row.get("responses_json")?;
    let attempt = Attempt {
        quest_id: row.get("quest_id")?,
        attempt_number: row.get("attempt_number")?,
        approach: row.get("approach")?,
        result_summary: row.get("result_summary")?,
        score: row.get("score")?,
        success: row.get("success")?,
        execution_time_ms: row.get::<_, i64>("execution_time_ms")? as u64,
        responses: Vec::new(),
        learned: row.get("learned")?,
        created_at: from_millis(row.get("created_at")?),
    };
    Ok((attempt, responses_json))
}

fn finish_attempt(pair: (Attempt, String)) -> Result<Attempt, StoreError> {
    let (mut attempt, responses_json) = pair;
    attempt.responses = serde_json::from_str::<Vec<DispatchResult>>(&responses_json)
        .map_err(|e| StoreError::Backend(format!("corrupt responses column: {e}")))?;
    Ok(attempt)
}

const QUEST_COLUMNS: &str = "id, goal, strategy, status, priority, max_attempts, \
     timeout_minutes, attempts_count, success_count, best_score, best_solution, \
     created_at, started_at, paused_at, completed_at";

const ATTEMPT_COLUMNS: &str = "quest_id, attempt_number, approach, result_summary, score, \
     success, execution_time_ms, responses_json, learned, created_at";

#[async_trait]
impl QuestStore for SqliteQuestStore {
    async fn create_quest(&self, new_quest: NewQuest) -> Result<Quest, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO quests (goal, strategy, status, priority, max_attempts, \
             timeout_minutes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new_quest.goal.content(),
                new_quest.strategy,
                QuestStatus::Created.as_str(),
                new_quest.priority,
                new_quest.max_attempts,
                new_quest.timeout_minutes,
                to_millis(now),
            ],
        )
        .map_err(backend)?;
        let id = conn.last_insert_rowid();

        Ok(Quest {
            id,
            goal: new_quest.goal.into_content(),
            strategy: new_quest.strategy,
            status: QuestStatus::Created,
            priority: new_quest.priority,
            max_attempts: new_quest.max_attempts,
            timeout_minutes: new_quest.timeout_minutes,
            attempts_count: 0,
            success_count: 0,
            best_score: 0.0,
            best_solution: None,
            created_at: now,
            started_at: None,
            paused_at: None,
            completed_at: None,
        })
    }

    async fn quest(&self, id: i64) -> Result<Quest, StoreError> {
        let conn = self.lock()?;
        let pair = conn
            .query_row(
                &format!("SELECT {QUEST_COLUMNS} FROM quests WHERE id = ?1"),
                params![id],
                quest_from_row,
            )
            .optional()
            .map_err(backend)?
            .ok_or(StoreError::QuestNotFound(id))?;
        finish_quest(pair)
    }

    async fn quests(&self, status: Option<QuestStatus>) -> Result<Vec<Quest>, StoreError> {
        let conn = self.lock()?;
        let mut quests = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {QUEST_COLUMNS} FROM quests WHERE status = ?1 \
                         ORDER BY created_at DESC, id DESC"
                    ))
                    .map_err(backend)?;
                let rows = stmt
                    .query_map(params![status.as_str()], quest_from_row)
                    .map_err(backend)?;
                for row in rows {
                    quests.push(finish_quest(row.map_err(backend)?)?);
                }
            }
            None => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {QUEST_COLUMNS} FROM quests ORDER BY created_at DESC, id DESC"
                    ))
                    .map_err(backend)?;
                let rows = stmt.query_map([], quest_from_row).map_err(backend)?;
                for row in rows {
                    quests.push(finish_quest(row.map_err(backend)?)?);
                }
            }
        }
        Ok(quests)
    }

    async fn active_quests(&self) -> Result<Vec<Quest>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {QUEST_COLUMNS} FROM quests WHERE status = 'running' \
                 ORDER BY priority DESC, created_at ASC, id ASC"
            ))
            .map_err(backend)?;
        let rows = stmt.query_map([], quest_from_row).map_err(backend)?;
        let mut quests = Vec::new();
        for row in rows {
            quests.push(finish_quest(row.map_err(backend)?)?);
        }
        Ok(quests)
    }

    async fn update_status(&self, id: i64, status: QuestStatus) -> Result<Quest, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(backend)?;

        let pair = tx
            .query_row(
                &format!("SELECT {QUEST_COLUMNS} FROM quests WHERE id = ?1"),
                params![id],
                quest_from_row,
            )
            .optional()
            .map_err(backend)?
            .ok_or(StoreError::QuestNotFound(id))?;
        let mut quest = finish_quest(pair)?;

        quest
            .status
            .validate_transition(status, quest.success_count)?;

        let now = Utc::now();
        let timestamp_column = match status {
            // started_at is stamped once; resuming from pause keeps the original
            QuestStatus::Running if quest.started_at.is_none() => Some("started_at"),
            QuestStatus::Paused => Some("paused_at"),
            QuestStatus::Completed | QuestStatus::Failed | QuestStatus::Stopped => {
                Some("completed_at")
            }
            _ => None,
        };

        match timestamp_column {
            Some(column) => {
                tx.execute(
                    &format!("UPDATE quests SET status = ?1, {column} = ?2 WHERE id = ?3"),
                    params![status.as_str(), to_millis(now), id],
                )
                .map_err(backend)?;
                match column {
                    "started_at" => quest.started_at = Some(now),
                    "paused_at" => quest.paused_at = Some(now),
                    _ => quest.completed_at = Some(now),
                }
            }
            None => {
                tx.execute(
                    "UPDATE quests SET status = ?1 WHERE id = ?2",
                    params![status.as_str(), id],
                )
                .map_err(backend)?;
            }
        }

        tx.commit().map_err(backend)?;
        quest.status = status;
        Ok(quest)
    }

    async fn log_attempt(
        &self,
        quest_id: i64,
        new_attempt: NewAttempt,
    ) -> Result<(Quest, Attempt), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(backend)?;

        let pair = tx
            .query_row(
                &format!("SELECT {QUEST_COLUMNS} FROM quests WHERE id = ?1"),
                params![quest_id],
                quest_from_row,
            )
            .optional()
            .map_err(backend)?
            .ok_or(StoreError::QuestNotFound(quest_id))?;
        let mut quest = finish_quest(pair)?;

        let now = Utc::now();
        let attempt = Attempt {
            quest_id,
            // attempt_number is exactly the count at insertion, so numbers
            // are gapless; UNIQUE(quest_id, attempt_number) backstops it
            attempt_number: quest.attempts_count + 1,
            approach: new_attempt.approach,
            result_summary: new_attempt.result_summary,
            score: new_attempt.score,
            success: new_attempt.success,
            execution_time_ms: new_attempt.execution_time_ms,
            responses: new_attempt.responses,
            learned: new_attempt.learned,
            created_at: now,
        };

        let responses_json = serde_json::to_string(&attempt.responses)
            .map_err(|e| StoreError::Backend(format!("serialize responses: {e}")))?;

        tx.execute(
            &format!(
                "INSERT INTO attempts ({ATTEMPT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                attempt.quest_id,
                attempt.attempt_number,
                attempt.approach,
                attempt.result_summary,
                attempt.score,
                attempt.success,
                attempt.execution_time_ms as i64,
                responses_json,
                attempt.learned,
                to_millis(now),
            ],
        )
        .map_err(backend)?;

        quest.attempts_count += 1;
        if attempt.success {
            quest.success_count += 1;
            if attempt.score > quest.best_score {
                quest.best_score = attempt.score;
                quest.best_solution = Some(attempt.result_summary.clone());
            }
        }

        tx.execute(
            "UPDATE quests SET attempts_count = ?1, success_count = ?2, \
             best_score = ?3, best_solution = ?4 WHERE id = ?5",
            params![
                quest.attempts_count,
                quest.success_count,
                quest.best_score,
                quest.best_solution,
                quest_id,
            ],
        )
        .map_err(backend)?;

        tx.commit().map_err(backend)?;
        Ok((quest, attempt))
    }

    async fn history(&self, quest_id: i64, limit: usize) -> Result<Vec<Attempt>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE quest_id = ?1 \
                 ORDER BY attempt_number DESC LIMIT ?2"
            ))
            .map_err(backend)?;
        let rows = stmt
            .query_map(params![quest_id, limit as i64], attempt_from_row)
            .map_err(backend)?;
        let mut attempts = Vec::new();
        for row in rows {
            attempts.push(finish_attempt(row.map_err(backend)?)?);
        }
        Ok(attempts)
    }

    async fn stats(&self) -> Result<QuestStats, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*), \
             COALESCE(SUM(CASE WHEN status IN ('running','paused') THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(attempts_count), 0), \
             COALESCE(SUM(success_count), 0) \
             FROM quests",
            [],
            |row| {
                let total_attempts: i64 = row.get(4)?;
                let total_successes: i64 = row.get(5)?;
                Ok(QuestStats {
                    total_quests: row.get::<_, i64>(0)? as u64,
                    active: row.get::<_, i64>(1)? as u64,
                    completed: row.get::<_, i64>(2)? as u64,
                    failed: row.get::<_, i64>(3)? as u64,
                    total_attempts: total_attempts as u64,
                    total_successes: total_successes as u64,
                    success_rate: if total_attempts > 0 {
                        total_successes as f64 / total_attempts as f64
                    } else {
                        0.0
                    },
                })
            },
        )
        .map_err(backend)
    }

    async fn save_checkpoint(&self, quest_id: i64, blob: &[u8]) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO checkpoints (quest_id, created_at, blob) VALUES (?1, ?2, ?3)",
            params![quest_id, to_millis(Utc::now()), blob],
        )
        .map_err(backend)?;
        Ok(())
    }

    async fn latest_checkpoint(&self, quest_id: i64) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT blob FROM checkpoints WHERE quest_id = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
            params![quest_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(backend)
    }
}
