//! Interactive single-submission form

use colored::*;
use rubrica_core::{EvaluationOutcome, EvaluationRequest, Evaluator, GradingProvider, Result};
use std::fs;
use std::path::Path;

use crate::ui::{read_text_block, render_outcome};

/// The two text fields of the form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub source_text: String,
    pub submission_text: String,
}

impl FormInputs {
    pub fn new(source_text: impl Into<String>, submission_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            submission_text: submission_text.into(),
        }
    }

    /// Both fields must hold something other than whitespace
    pub fn into_request(self) -> Option<EvaluationRequest> {
        if self.source_text.trim().is_empty() || self.submission_text.trim().is_empty() {
            return None;
        }
        Some(EvaluationRequest::new(self.source_text, self.submission_text))
    }
}

/// Fill the form from files where given, prompting on stdin otherwise
pub fn collect_inputs(source_file: Option<&Path>, submission_file: Option<&Path>) -> Result<FormInputs> {
    let source_text = match source_file {
        Some(path) => fs::read_to_string(path)?,
        None => read_text_block("Texto Original")?,
    };
    let submission_text = match submission_file {
        Some(path) => fs::read_to_string(path)?,
        None => read_text_block("Resumen del Estudiante")?,
    };
    Ok(FormInputs {
        source_text,
        submission_text,
    })
}

/// Evaluate the form and print the outcome
///
/// Returns `None` without contacting the model when a field is blank.
pub async fn run_form<P: GradingProvider>(
    evaluator: &Evaluator<P>,
    inputs: FormInputs,
    show_raw: bool,
) -> Option<EvaluationOutcome> {
    let Some(request) = inputs.into_request() else {
        println!(
            "{} {}",
            "⚠️".yellow(),
            "Por favor, completa ambos campos de texto.".yellow()
        );
        return None;
    };

    println!(
        "{} El modelo está pensando... Esto puede tardar unos segundos...",
        "🤖".blue()
    );
    let outcome = evaluator.evaluate(&request).await;
    render_outcome(&outcome, show_raw);
    Some(outcome)
}
