//! # GeekJudge
//!
//! Submission-execution worker for a coding-practice judge.
//!
//! ## Pipeline
//!
//! - **Queue:** submission ids are popped from a Redis list
//! - **Marshaling:** JSON test values become typed arrays, strings, matrices,
//!   linked lists and binary trees
//! - **Synthesis:** the submitted source is wrapped into one runnable Python,
//!   JavaScript or C++ program per test case
//! - **Sandbox:** each program runs in a throwaway Docker container under a
//!   wall-clock timeout
//! - **Verdicts:** output is compared per test, stopping at the first failure,
//!   and the final status is written back to PostgreSQL

pub mod config;
pub mod database;
pub mod error;
pub mod judge;
pub mod marshal;
pub mod model;
pub mod queue;
pub mod sandbox;
pub mod synth;
pub mod verdict;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use judge::Judge;
pub use worker::{Worker, WorkerContext};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
