//! Prompt construction for summary grading

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ChatMessage, Error, EvaluationRequest};

const RUBRIC: &str = "Eres un asistente de evaluación académica. Tu tarea es calificar el resumen \
de un estudiante basándote en un texto original y una rúbrica. Debes ser objetivo y estricto. \
La rúbrica es la siguiente:

1.  **Estructura (1-5 puntos):** ¿El resumen sigue una secuencia lógica? ¿Presenta las ideas principales ordenadamente?
2.  **Ortografía (1-5 puntos):** ¿Está libre de errores ortográficos y gramaticales?
3.  **Comprensión (1-5 puntos):** ¿El resumen demuestra que el autor entendió el texto original? ¿Captura la esencia?
4.  **Redacción (1-5 puntos):** ¿El texto es claro, conciso y fácil de leer?
5.  **Síntesis (1-5 puntos):** ¿El resumen se enfoca en lo esencial sin incluir opiniones personales o detalles irrelevantes?
";

const FLAT_SCHEMA: &str = "Tu respuesta DEBE ser únicamente un objeto JSON válido, sin texto \
introductorio. Revisa las comillas, las comas entre elementos y el cierre de llaves. \
Usa este formato \"plano\":
{
  \"nota_estructura\": 0,
  \"nota_ortografia\": 0,
  \"nota_comprension\": 0,
  \"nota_redaccion\": 0,
  \"nota_sintesis\": 0,
  \"calificacion_total\": 0,
  \"retroalimentacion_general\": \"Tu feedback general aquí\"
}
";

const NESTED_SCHEMA: &str = "Tu respuesta DEBE ser únicamente un objeto JSON válido, sin texto \
introductorio, despedidas ni comillas de bloque (```json). El formato JSON debe ser el siguiente:
{
  \"calificacion_total\": 0,
  \"calificaciones_criterios\": {
    \"estructura\": 0,
    \"ortografia\": 0,
    \"comprension\": 0,
    \"redaccion\": 0,
    \"sintesis\": 0
  },
  \"retroalimentacion_general\": \"(Tu feedback general aquí)\",
  \"retroalimentacion_especifica\": [
    {\"criterio\": \"Estructura\", \"feedback\": \"(Tu feedback para este criterio)\"},
    {\"criterio\": \"Ortografía\", \"feedback\": \"(Tu feedback para este criterio)\"},
    {\"criterio\": \"Comprensión\", \"feedback\": \"(Tu feedback para este criterio)\"},
    {\"criterio\": \"Redacción\", \"feedback\": \"(Tu feedback para este criterio)\"},
    {\"criterio\": \"Síntesis\", \"feedback\": \"(Tu feedback para este criterio)\"}
  ]
}
";

pub const SOURCE_DELIMITER: &str = "--- TEXTO ORIGINAL ---";
pub const SUBMISSION_DELIMITER: &str = "--- RESUMEN DEL ESTUDIANTE ---";

/// Which reply layout the system prompt asks the model for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptVariant {
    /// Top-level `nota_*` keys; easier for small models
    Flat,
    /// `calificaciones_criterios` object plus per-criterion feedback
    #[default]
    Nested,
}

impl PromptVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptVariant::Flat => "flat",
            PromptVariant::Nested => "nested",
        }
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" | "plano" => Ok(PromptVariant::Flat),
            "nested" | "anidado" => Ok(PromptVariant::Nested),
            other => Err(Error::Configuration(format!(
                "unknown prompt variant '{}' (expected 'flat' or 'nested')",
                other
            ))),
        }
    }
}

/// Builds the system and user messages for one evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    variant: PromptVariant,
}

impl PromptBuilder {
    pub fn new(variant: PromptVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> PromptVariant {
        self.variant
    }

    /// Rubric plus the output schema for the configured variant
    pub fn system_prompt(&self) -> String {
        let schema = match self.variant {
            PromptVariant::Flat => FLAT_SCHEMA,
            PromptVariant::Nested => NESTED_SCHEMA,
        };
        format!("{}\n{}", RUBRIC, schema)
    }

    /// Both texts, verbatim, between labeled delimiters
    pub fn user_prompt(&self, request: &EvaluationRequest) -> String {
        format!(
            "Por favor, evalúa el siguiente resumen basándote en el texto original.\n\
            \n\
            {}\n\
            {}\n\
            \n\
            {}\n\
            {}\n",
            SOURCE_DELIMITER, request.source_text, SUBMISSION_DELIMITER, request.submission_text
        )
    }

    /// System message followed by user message
    pub fn build(&self, request: &EvaluationRequest) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.user_prompt(request)),
        ]
    }
}
