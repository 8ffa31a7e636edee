//! Database module - PostgreSQL
//!
//! Provides storage for:
//! - problems: read-only catalog entries with JSONB test cases and signatures
//! - submissions: status and per-test output written by the worker

mod postgres;
mod store;

pub use postgres::{init_pool, migrations, verify_database, PostgresPool};
pub use store::{JudgeStore, MemoryJudgeStore, PgJudgeStore};
