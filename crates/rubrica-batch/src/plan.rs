//! Matching submissions with their base texts

use rubrica_core::EvaluationRequest;
use serde::Serialize;
use std::fmt;

use crate::workbook::BatchInput;

/// A submission ready to be graded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub row: usize,
    pub id: i64,
    pub author: String,
    pub summary: String,
    pub request: EvaluationRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The ID cell was blank or not a number
    MissingId,
    /// No base text carries this ID
    UnknownId(i64),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingId => write!(f, "no valid ID"),
            SkipReason::UnknownId(id) => write!(f, "no base text for ID {}", id),
        }
    }
}

/// A submission left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub row: usize,
    pub author: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub jobs: Vec<Job>,
    pub skipped: Vec<Skipped>,
}

/// Pair every submission with its base text, in sheet order
///
/// Rows without an ID are skipped with a warning; rows whose ID has no base
/// text are skipped with an error.
pub fn plan(input: &BatchInput) -> BatchPlan {
    let mut plan = BatchPlan::default();

    for submission in &input.submissions {
        let Some(id) = submission.id else {
            tracing::warn!(
                row = submission.row,
                author = %submission.author,
                "submission has no valid ID; skipping"
            );
            plan.skipped.push(Skipped {
                row: submission.row,
                author: submission.author.clone(),
                reason: SkipReason::MissingId,
            });
            continue;
        };

        let Some(base_text) = input.base_texts.get(&id) else {
            tracing::error!(
                row = submission.row,
                id,
                author = %submission.author,
                "no base text for this ID; skipping"
            );
            plan.skipped.push(Skipped {
                row: submission.row,
                author: submission.author.clone(),
                reason: SkipReason::UnknownId(id),
            });
            continue;
        };

        plan.jobs.push(Job {
            row: submission.row,
            id,
            author: submission.author.clone(),
            summary: submission.summary.clone(),
            request: EvaluationRequest::new(base_text.clone(), submission.summary.clone()),
        });
    }

    plan
}
