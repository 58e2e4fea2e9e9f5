//! Normalization of decoded replies into [`EvaluationResult`]
//!
//! Two reply layouts are accepted. The nested one is recognised by the
//! presence of `calificaciones_criterios`; anything else is read as flat.
//! Missing scores become 0 and missing text becomes `"N/A"`, so a partial
//! reply still yields a complete record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::MISSING_TEXT;
use crate::{Criterion, CriterionFeedback, CriterionScores, EvaluationResult};

const NESTED_MARKER: &str = "calificaciones_criterios";

/// Reply with every score at the top level
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlatEvaluation {
    #[serde(default, deserialize_with = "lenient::score")]
    pub nota_estructura: i64,
    #[serde(default, deserialize_with = "lenient::score")]
    pub nota_ortografia: i64,
    #[serde(default, deserialize_with = "lenient::score")]
    pub nota_comprension: i64,
    #[serde(default, deserialize_with = "lenient::score")]
    pub nota_redaccion: i64,
    #[serde(default, deserialize_with = "lenient::score")]
    pub nota_sintesis: i64,
    #[serde(default, deserialize_with = "lenient::score")]
    pub calificacion_total: i64,
    #[serde(default = "lenient::missing_text", deserialize_with = "lenient::text")]
    pub retroalimentacion_general: String,
}

impl Default for FlatEvaluation {
    fn default() -> Self {
        Self {
            nota_estructura: 0,
            nota_ortografia: 0,
            nota_comprension: 0,
            nota_redaccion: 0,
            nota_sintesis: 0,
            calificacion_total: 0,
            retroalimentacion_general: MISSING_TEXT.to_string(),
        }
    }
}

/// Reply with a `calificaciones_criterios` object and per-criterion feedback
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NestedEvaluation {
    #[serde(default, deserialize_with = "lenient::score")]
    pub calificacion_total: i64,
    #[serde(default, deserialize_with = "lenient::score_map")]
    pub calificaciones_criterios: BTreeMap<String, i64>,
    #[serde(default = "lenient::missing_text", deserialize_with = "lenient::text")]
    pub retroalimentacion_general: String,
    #[serde(default, deserialize_with = "lenient::feedback_list")]
    pub retroalimentacion_especifica: Option<Vec<CriterionFeedback>>,
}

/// A decoded reply, resolved once into one of the supported layouts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvaluation {
    Flat(FlatEvaluation),
    Nested(NestedEvaluation),
}

impl RawEvaluation {
    /// Detect the layout and read the fields leniently
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            tracing::warn!("decoded reply is not a JSON object; every field defaults");
            return RawEvaluation::Flat(FlatEvaluation::default());
        };

        if object.contains_key(NESTED_MARKER) {
            match NestedEvaluation::deserialize(value) {
                Ok(nested) => return RawEvaluation::Nested(nested),
                Err(e) => tracing::warn!(error = %e, "nested reply unreadable; falling back to flat"),
            }
        }

        RawEvaluation::Flat(FlatEvaluation::deserialize(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "flat reply unreadable; every field defaults");
            FlatEvaluation::default()
        }))
    }

    /// Canonical record with all five criteria present
    pub fn into_result(self) -> EvaluationResult {
        match self {
            RawEvaluation::Flat(flat) => {
                let mut scores = CriterionScores::zeroed();
                scores.set(Criterion::Structure, flat.nota_estructura);
                scores.set(Criterion::Spelling, flat.nota_ortografia);
                scores.set(Criterion::Comprehension, flat.nota_comprension);
                scores.set(Criterion::Writing, flat.nota_redaccion);
                scores.set(Criterion::Synthesis, flat.nota_sintesis);

                EvaluationResult {
                    total_score: flat.calificacion_total,
                    scores,
                    general_feedback: flat.retroalimentacion_general,
                    specific_feedback: None,
                }
            }
            RawEvaluation::Nested(nested) => {
                let mut scores = CriterionScores::zeroed();
                for (name, score) in &nested.calificaciones_criterios {
                    match Criterion::from_key(name) {
                        Some(criterion) => scores.set(criterion, *score),
                        None => tracing::debug!(criterion = %name, "ignoring unknown criterion"),
                    }
                }

                EvaluationResult {
                    total_score: nested.calificacion_total,
                    scores,
                    general_feedback: nested.retroalimentacion_general,
                    specific_feedback: nested.retroalimentacion_especifica,
                }
            }
        }
    }
}

/// Normalize a decoded reply of either layout
pub fn normalize(value: &Value) -> EvaluationResult {
    RawEvaluation::from_value(value).into_result()
}

mod lenient {
    use super::*;

    pub fn missing_text() -> String {
        MISSING_TEXT.to_string()
    }

    /// Integers, integral floats (rounded) and numeric strings
    pub fn score_of(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
            }
            _ => None,
        }
    }

    fn text_of(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => MISSING_TEXT.to_string(),
            other => other.to_string(),
        }
    }

    pub fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(score_of(&value).unwrap_or(0))
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(text_of(&value))
    }

    pub fn score_map<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, i64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let Value::Object(map) = value else {
            return Ok(BTreeMap::new());
        };
        Ok(map
            .into_iter()
            .map(|(name, score)| {
                let score = score_of(&score).unwrap_or(0);
                (name, score)
            })
            .collect())
    }

    pub fn feedback_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<CriterionFeedback>>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let Value::Array(items) = value else {
            return Ok(None);
        };
        Ok(Some(
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|item| CriterionFeedback {
                    criterion: item.get("criterio").map(text_of).unwrap_or_else(missing_text),
                    feedback: item.get("feedback").map(text_of).unwrap_or_else(missing_text),
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_with_only_total_defaults_everything_else() {
        let result = normalize(&json!({"calificacion_total": 18}));

        assert_eq!(result.total_score, 18);
        for criterion in Criterion::all() {
            assert_eq!(result.scores.get(criterion), 0);
        }
        assert_eq!(result.general_feedback, "N/A");
        assert_eq!(result.specific_feedback, None);
    }

    #[test]
    fn test_nested_maps_scores_exactly() {
        let value = json!({
            "calificacion_total": 20,
            "calificaciones_criterios": {
                "estructura": 4, "ortografia": 5, "comprension": 4, "redaccion": 3, "sintesis": 4
            },
            "retroalimentacion_general": "Buen trabajo"
        });
        let result = normalize(&value);

        assert_eq!(result.total_score, 20);
        assert_eq!(result.scores.get(Criterion::Structure), 4);
        assert_eq!(result.scores.get(Criterion::Spelling), 5);
        assert_eq!(result.scores.get(Criterion::Comprehension), 4);
        assert_eq!(result.scores.get(Criterion::Writing), 3);
        assert_eq!(result.scores.get(Criterion::Synthesis), 4);
        assert_eq!(result.general_feedback, "Buen trabajo");
        assert_eq!(result.specific_feedback, None);
    }

    #[test]
    fn test_flat_reads_every_key() {
        let value = json!({
            "nota_estructura": 3,
            "nota_ortografia": 4,
            "nota_comprension": 5,
            "nota_redaccion": 2,
            "nota_sintesis": 1,
            "calificacion_total": 15,
            "retroalimentacion_general": "Correcto"
        });
        assert!(matches!(RawEvaluation::from_value(&value), RawEvaluation::Flat(_)));

        let result = normalize(&value);
        assert_eq!(result.scores.get(Criterion::Comprehension), 5);
        assert_eq!(result.scores.get(Criterion::Synthesis), 1);
        assert!(result.is_consistent());
    }

    #[test]
    fn test_nested_detection_and_specific_feedback_order() {
        let value = json!({
            "calificacion_total": 9,
            "calificaciones_criterios": {"Ortografía": 2},
            "retroalimentacion_especifica": [
                {"criterio": "Síntesis", "feedback": "Demasiado largo"},
                {"criterio": "Estructura"},
                "basura",
                {"criterio": "Redacción", "feedback": "Clara"}
            ]
        });
        assert!(matches!(RawEvaluation::from_value(&value), RawEvaluation::Nested(_)));

        let result = normalize(&value);
        assert_eq!(result.scores.get(Criterion::Spelling), 2);
        assert_eq!(result.scores.get(Criterion::Structure), 0);
        assert_eq!(result.general_feedback, "N/A");

        let feedback = result.specific_feedback.unwrap();
        let criteria: Vec<_> = feedback.iter().map(|f| f.criterion.as_str()).collect();
        assert_eq!(criteria, vec!["Síntesis", "Estructura", "Redacción"]);
        assert_eq!(feedback[1].feedback, "N/A");
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let value = json!({
            "calificacion_total": 10,
            "modelo": "llama",
            "calificaciones_criterios": {"estructura": 2, "originalidad": 5}
        });
        let result = normalize(&value);
        assert_eq!(result.scores.get(Criterion::Structure), 2);
        assert_eq!(result.criteria_sum(), 2);
    }

    #[test]
    fn test_lenient_scalars() {
        let value = json!({
            "nota_estructura": "4",
            "nota_ortografia": 3.6,
            "nota_comprension": "cinco",
            "nota_redaccion": null,
            "calificacion_total": " 12 ",
            "retroalimentacion_general": 7
        });
        let result = normalize(&value);
        assert_eq!(result.scores.get(Criterion::Structure), 4);
        assert_eq!(result.scores.get(Criterion::Spelling), 4);
        assert_eq!(result.scores.get(Criterion::Comprehension), 0);
        assert_eq!(result.scores.get(Criterion::Writing), 0);
        assert_eq!(result.total_score, 12);
        assert_eq!(result.general_feedback, "7");
    }

    #[test]
    fn test_non_object_defaults() {
        let result = normalize(&json!([1, 2, 3]));
        assert_eq!(result.total_score, 0);
        assert_eq!(result.general_feedback, "N/A");
    }

    #[test]
    fn test_criteria_not_an_object_still_nested() {
        let value = json!({"calificacion_total": 5, "calificaciones_criterios": "n/a"});
        let raw = RawEvaluation::from_value(&value);
        assert!(matches!(raw, RawEvaluation::Nested(_)));
        assert_eq!(raw.into_result().criteria_sum(), 0);
    }

    #[test]
    fn test_normalizing_canonical_result_is_idempotent() {
        let value = json!({
            "calificacion_total": 17,
            "calificaciones_criterios": {
                "estructura": 3, "ortografia": 4, "comprension": 4, "redaccion": 3, "sintesis": 3
            },
            "retroalimentacion_general": "Aceptable",
            "retroalimentacion_especifica": [
                {"criterio": "Estructura", "feedback": "Ordenado"}
            ]
        });
        let first = normalize(&value);
        let second = normalize(&first.to_value());
        assert_eq!(first, second);

        let flat = normalize(&json!({"calificacion_total": 18}));
        assert_eq!(normalize(&flat.to_value()), flat);
    }
}
