//! Common types used across rubrica

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::GradingError;

/// Highest total the rubric allows (five criteria, five points each)
pub const MAX_TOTAL_SCORE: i64 = 25;

/// Text used whenever the model left a feedback field out
pub const MISSING_TEXT: &str = "N/A";

/// The five rubric criteria, each scored 1-5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Criterion {
    /// Logical sequence of ideas
    Structure,
    /// Spelling and grammar
    Spelling,
    /// Shows the source text was understood
    Comprehension,
    /// Clear, concise prose
    Writing,
    /// Focus on the essentials
    Synthesis,
}

impl Criterion {
    /// All criteria in rubric order
    pub fn all() -> [Criterion; 5] {
        [
            Criterion::Structure,
            Criterion::Spelling,
            Criterion::Comprehension,
            Criterion::Writing,
            Criterion::Synthesis,
        ]
    }

    /// Key used inside `calificaciones_criterios`
    pub fn key(&self) -> &'static str {
        match self {
            Criterion::Structure => "estructura",
            Criterion::Spelling => "ortografia",
            Criterion::Comprehension => "comprension",
            Criterion::Writing => "redaccion",
            Criterion::Synthesis => "sintesis",
        }
    }

    /// Key used by the flat reply shape
    pub fn flat_key(&self) -> &'static str {
        match self {
            Criterion::Structure => "nota_estructura",
            Criterion::Spelling => "nota_ortografia",
            Criterion::Comprehension => "nota_comprension",
            Criterion::Writing => "nota_redaccion",
            Criterion::Synthesis => "nota_sintesis",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Structure => "Estructura",
            Criterion::Spelling => "Ortografía",
            Criterion::Comprehension => "Comprensión",
            Criterion::Writing => "Redacción",
            Criterion::Synthesis => "Síntesis",
        }
    }

    /// Resolve a criterion name as a model may write it.
    ///
    /// Case and Spanish accents are ignored, so `Ortografía`, `ORTOGRAFIA`
    /// and `ortografia` all resolve to [`Criterion::Spelling`].
    pub fn from_key(name: &str) -> Option<Criterion> {
        let folded = fold_name(name);
        Criterion::all().into_iter().find(|c| c.key() == folded)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn fold_name(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// One submission to grade against its source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub source_text: String,
    pub submission_text: String,
}

impl EvaluationRequest {
    pub fn new(source_text: impl Into<String>, submission_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            submission_text: submission_text.into(),
        }
    }
}

/// Per-criterion scores; always holds all five criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CriterionScores(BTreeMap<Criterion, i64>);

impl CriterionScores {
    /// Every criterion at zero
    pub fn zeroed() -> Self {
        Self(Criterion::all().into_iter().map(|c| (c, 0)).collect())
    }

    pub fn get(&self, criterion: Criterion) -> i64 {
        self.0.get(&criterion).copied().unwrap_or(0)
    }

    pub fn set(&mut self, criterion: Criterion, score: i64) {
        self.0.insert(criterion, score);
    }

    /// Scores in rubric order
    pub fn iter(&self) -> impl Iterator<Item = (Criterion, i64)> + '_ {
        self.0.iter().map(|(c, s)| (*c, *s))
    }

    pub fn sum(&self) -> i64 {
        self.0.values().sum()
    }
}

impl Default for CriterionScores {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Free-text feedback the model gave for one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionFeedback {
    /// Criterion label as written by the model
    pub criterion: String,
    pub feedback: String,
}

/// Canonical grading record produced by the normalizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    /// Total as computed by the model; never recomputed here
    pub total_score: i64,
    pub scores: CriterionScores,
    pub general_feedback: String,
    pub specific_feedback: Option<Vec<CriterionFeedback>>,
}

impl EvaluationResult {
    /// Sum of the five criterion scores
    pub fn criteria_sum(&self) -> i64 {
        self.scores.sum()
    }

    /// Whether the model's total matches the sum of its own criterion scores
    pub fn is_consistent(&self) -> bool {
        self.total_score == self.criteria_sum()
    }

    /// Render back into the nested reply shape.
    ///
    /// Normalizing the returned value yields `self` again.
    pub fn to_value(&self) -> Value {
        let scores: Map<String, Value> = self
            .scores
            .iter()
            .map(|(c, s)| (c.key().to_string(), Value::from(s)))
            .collect();

        let mut value = json!({
            "calificacion_total": self.total_score,
            "calificaciones_criterios": scores,
            "retroalimentacion_general": self.general_feedback,
        });

        if let Some(entries) = &self.specific_feedback {
            value["retroalimentacion_especifica"] = entries
                .iter()
                .map(|e| json!({ "criterio": e.criterion, "feedback": e.feedback }))
                .collect();
        }

        value
    }
}

/// Category of a failed evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    ConnectionError,
    UnexpectedResponseShape,
    NoJsonFound,
    MalformedJson,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ConnectionError => "ConnectionError",
            FailureKind::UnexpectedResponseShape => "UnexpectedResponseShape",
            FailureKind::NoJsonFound => "NoJsonFound",
            FailureKind::MalformedJson => "MalformedJson",
        };
        f.write_str(name)
    }
}

/// Produced instead of an [`EvaluationResult`] when grading fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationFailure {
    pub kind: FailureKind,
    pub message: String,
    /// The model's reply, when there was one
    pub raw_reply: Option<String>,
    /// The brace-delimited slice that failed to decode
    pub extracted: Option<String>,
}

impl From<GradingError> for EvaluationFailure {
    fn from(err: GradingError) -> Self {
        let kind = match &err {
            GradingError::Connection(_) => FailureKind::ConnectionError,
            GradingError::UnexpectedResponseShape(_) => FailureKind::UnexpectedResponseShape,
            GradingError::NoJsonFound { .. } => FailureKind::NoJsonFound,
            GradingError::MalformedJson { .. } => FailureKind::MalformedJson,
        };
        let extracted = match &err {
            GradingError::MalformedJson { slice, .. } => Some(slice.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            raw_reply: err.raw_reply().map(str::to_string),
            extracted,
        }
    }
}

/// What a single evaluation produced
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// Normalized result plus the decoded JSON it came from
    Graded {
        result: EvaluationResult,
        decoded: Value,
    },
    Failed(EvaluationFailure),
}

impl EvaluationOutcome {
    pub fn is_graded(&self) -> bool {
        matches!(self, EvaluationOutcome::Graded { .. })
    }

    pub fn result(&self) -> Option<&EvaluationResult> {
        match self {
            EvaluationOutcome::Graded { result, .. } => Some(result),
            EvaluationOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&EvaluationFailure> {
        match self {
            EvaluationOutcome::Graded { .. } => None,
            EvaluationOutcome::Failed(failure) => Some(failure),
        }
    }
}
