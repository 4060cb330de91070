pub mod suite;
pub mod types;

pub use suite::{TestCase, run_suite};
pub use types::{StageFailure, StageResult, SuiteSummary, TestContext};
