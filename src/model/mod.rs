//! Domain records the worker reads and writes
//!
//! - `problem`: Problem catalog entries, test cases and function signatures
//! - `submission`: Submission records and the status state machine
//! - `language`: Languages with marshaling/synthesis support

mod language;
mod problem;
mod submission;

pub use language::Language;
pub use problem::{Difficulty, FunctionSignature, Parameter, Problem, TestCase};
pub use submission::{Submission, SubmissionStatus};
