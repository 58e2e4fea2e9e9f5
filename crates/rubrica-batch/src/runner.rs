//! Running a batch plan through an evaluator

use futures::stream::{self, StreamExt};
use rubrica_core::{EvaluationOutcome, Evaluator, GradingProvider};

use crate::export::ResultRow;
use crate::plan::Job;

/// Totals for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub rows: Vec<ResultRow>,
    pub graded: usize,
    pub failed: usize,
}

/// Evaluate every job and flatten the outcomes, preserving job order
///
/// With `concurrency` 1 (the default the CLI uses) requests go out strictly
/// one after another. Larger values keep up to that many requests in flight;
/// rows still come back in plan order. Failures never stop the run.
/// `on_outcome` is called once per job as results arrive.
pub async fn run_batch<P, F>(
    evaluator: &Evaluator<P>,
    jobs: Vec<Job>,
    concurrency: usize,
    mut on_outcome: F,
) -> BatchReport
where
    P: GradingProvider,
    F: FnMut(&Job, &EvaluationOutcome),
{
    let total = jobs.len();
    let mut report = BatchReport::default();

    let mut outcomes = std::pin::pin!(stream::iter(jobs.into_iter().enumerate())
        .map(|(index, job)| async move {
            tracing::info!(
                row = index + 1,
                total,
                author = %job.author,
                id = job.id,
                "evaluating submission"
            );
            let outcome = evaluator.evaluate(&job.request).await;
            (job, outcome)
        })
        .buffered(concurrency.max(1)));

    while let Some((job, outcome)) = outcomes.next().await {
        on_outcome(&job, &outcome);
        if outcome.is_graded() {
            report.graded += 1;
        } else {
            report.failed += 1;
        }
        report
            .rows
            .push(ResultRow::from_outcome(&job.author, &job.summary, &outcome));
    }

    report
}
