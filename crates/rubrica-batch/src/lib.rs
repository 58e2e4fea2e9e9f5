//! Spreadsheet batch grading for rubrica
//!
//! Reads base texts and submissions from a workbook, pairs them by ID,
//! grades each pair through an [`Evaluator`](rubrica_core::Evaluator) and
//! writes one results row per graded or failed submission.

pub mod export;
pub mod plan;
pub mod runner;
pub mod workbook;

pub use export::{header, write_results, Cell, ResultRow, RESULTS_SHEET};
pub use plan::{plan, BatchPlan, Job, SkipReason, Skipped};
pub use runner::{run_batch, BatchReport};
pub use workbook::{read_workbook, BatchInput, SubmissionRow, BASE_SHEET, SUBMISSION_SHEET};
