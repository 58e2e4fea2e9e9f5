//! Grading pipeline: prompt, provider call, reply parsing, normalization

use std::time::Instant;

use crate::normalizer::normalize;
use crate::parser::parse_reply;
use crate::{
    EvaluationFailure, EvaluationOutcome, EvaluationRequest, GradingProvider, PromptBuilder,
    PromptVariant,
};

/// Evaluates summaries with a grading provider
///
/// `evaluate` never fails: every problem ends up as
/// [`EvaluationOutcome::Failed`]. Presenting the outcome is left to the caller.
pub struct Evaluator<P: GradingProvider> {
    provider: P,
    prompts: PromptBuilder,
}

impl<P: GradingProvider> Evaluator<P> {
    /// Create a new evaluator using the given prompt layout
    pub fn new(provider: P, variant: PromptVariant) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(variant),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn variant(&self) -> PromptVariant {
        self.prompts.variant()
    }

    /// Run one request through the whole pipeline
    pub async fn evaluate(&self, request: &EvaluationRequest) -> EvaluationOutcome {
        let start = Instant::now();
        let messages = self.prompts.build(request);

        tracing::debug!(
            model = self.provider.model_id(),
            variant = %self.prompts.variant(),
            source_chars = request.source_text.chars().count(),
            submission_chars = request.submission_text.chars().count(),
            "sending evaluation request"
        );

        let decoded = match self
            .provider
            .complete(&messages)
            .await
            .and_then(|reply| parse_reply(&reply))
        {
            Ok(decoded) => decoded,
            Err(err) => {
                let failure = EvaluationFailure::from(err);
                tracing::error!(kind = %failure.kind, elapsed = ?start.elapsed(), "{}", failure.message);
                return EvaluationOutcome::Failed(failure);
            }
        };

        let result = normalize(&decoded);
        if !result.is_consistent() {
            tracing::warn!(
                total = result.total_score,
                criteria_sum = result.criteria_sum(),
                "model total differs from the sum of its criterion scores"
            );
        }

        tracing::debug!(total = result.total_score, elapsed = ?start.elapsed(), "evaluation complete");
        EvaluationOutcome::Graded { result, decoded }
    }
}
