//! UI utilities for the CLI

use colored::*;
use crossterm::terminal::size;
use rubrica_batch::{BatchReport, Skipped};
use rubrica_core::{
    EvaluationFailure, EvaluationOutcome, EvaluationResult, Result, MAX_TOTAL_SCORE,
};
use serde_json::Value;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

/// Line that ends a text block in interactive input
pub const END_OF_BLOCK: &str = ".";

/// Display startup banner
pub fn display_banner(model_id: &str, endpoint: &str) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let lines = [
        "Evaluador Automático de Resúmenes".to_string(),
        String::new(),
        format!("Modelo: {}", model_id),
        format!("Servidor: {}", endpoint),
    ];
    for line in lines {
        let width = line.chars().count();
        let padding = (banner_width - 4).saturating_sub(width);
        println!("{}", format!("│  {}{}│", line, " ".repeat(padding)).blue());
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
}

/// Read a multi-line block of text from stdin
///
/// On a terminal the block ends with a line holding only `.`; piped input
/// may also simply end.
pub fn read_text_block(title: &str) -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        println!("{}", title.bold());
        println!(
            "{}",
            format!("(pega el texto y termina con una línea que contenga solo '{}')", END_OF_BLOCK)
                .dimmed()
        );
        io::stdout().flush()?;
    }
    read_block_from(&mut stdin.lock())
}

/// Collect lines until the end marker or EOF
pub fn read_block_from(reader: &mut impl BufRead) -> Result<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let content = line.trim_end_matches(['\n', '\r']);
        if content.trim() == END_OF_BLOCK {
            break;
        }
        lines.push(content.to_string());
    }
    Ok(lines.join("\n"))
}

/// Per-criterion score table
pub fn format_score_table(result: &EvaluationResult) -> String {
    let width = result
        .scores
        .iter()
        .map(|(c, _)| c.label().chars().count())
        .max()
        .unwrap_or(0)
        .max("Criterio".len());

    let mut table = format!("{:<width$}  Nota\n", "Criterio", width = width);
    table.push_str(&format!("{}  ----\n", "-".repeat(width)));
    for (criterion, score) in result.scores.iter() {
        let label = criterion.label();
        let pad = width - label.chars().count();
        table.push_str(&format!("{}{}  {:>4}\n", label, " ".repeat(pad), score));
    }
    table
}

/// Show a graded result
pub fn render_result(result: &EvaluationResult) {
    println!("{} {}", "✅".green(), "¡Evaluación completada!".green().bold());
    println!();
    println!(
        "{} {}",
        "Calificación Total:".bold(),
        format!("{} / {}", result.total_score, MAX_TOTAL_SCORE).cyan().bold()
    );
    if !result.is_consistent() {
        println!(
            "{} la suma de los criterios es {}",
            "⚠️".yellow(),
            result.criteria_sum()
        );
    }

    println!();
    println!("{}", "Retroalimentación General".bold());
    println!("{}", result.general_feedback);

    println!();
    println!("{}", "Calificaciones por Criterio".bold());
    print!("{}", format_score_table(result));

    if let Some(entries) = &result.specific_feedback {
        println!();
        println!("{}", "Retroalimentación Específica".bold());
        for entry in entries {
            println!("  {} {}: {}", "•".cyan(), entry.criterion.bold(), entry.feedback);
        }
    }
}

/// Why an evaluation failed, with the model's reply when there is one
pub fn format_failure(failure: &EvaluationFailure) -> String {
    let mut text = format!("{} ({})\n", failure.message, failure.kind);
    if let Some(raw) = &failure.raw_reply {
        text.push_str(&format!("\nRespuesta Cruda (Original):\n{}\n", raw));
    }
    if let Some(extracted) = &failure.extracted {
        text.push_str(&format!("\nIntento de JSON (Limpio):\n{}\n", extracted));
    }
    text
}

/// Show a failed evaluation
pub fn render_failure(failure: &EvaluationFailure) {
    let text = format_failure(failure);
    let mut lines = text.lines();
    if let Some(headline) = lines.next() {
        println!("{} {}", "❌".red(), headline.red());
    }
    for line in lines {
        println!("{}", line);
    }
}

/// Show an outcome; `show_raw` adds the decoded JSON
pub fn render_outcome(outcome: &EvaluationOutcome, show_raw: bool) {
    println!();
    println!("{}", "Resultados de la Evaluación".bold().underline());
    match outcome {
        EvaluationOutcome::Graded { result, decoded } => {
            render_result(result);
            if show_raw {
                render_decoded(decoded);
            }
        }
        EvaluationOutcome::Failed(failure) => render_failure(failure),
    }
}

fn render_decoded(decoded: &Value) {
    println!();
    println!("{}", "Respuesta JSON del modelo".bold());
    match serde_json::to_string_pretty(decoded) {
        Ok(pretty) => println!("{}", pretty.dimmed()),
        Err(_) => println!("{}", decoded),
    }
}

/// Progress line for one batch row
pub fn render_batch_progress(author: &str, id: i64, outcome: &EvaluationOutcome) {
    match outcome {
        EvaluationOutcome::Graded { result, .. } => println!(
            "  {} {} (ID: {}) → {} / {}",
            "✓".green(),
            author,
            id,
            result.total_score,
            MAX_TOTAL_SCORE
        ),
        EvaluationOutcome::Failed(failure) => println!(
            "  {} {} (ID: {}) → {}",
            "✗".red(),
            author,
            id,
            failure.kind.to_string().red()
        ),
    }
}

/// Closing summary of a batch run
pub fn render_batch_summary(report: &BatchReport, skipped: &[Skipped], output: &Path) {
    println!();
    for skip in skipped {
        println!(
            "{} fila {} ({}): {}",
            "⚠️".yellow(),
            skip.row,
            skip.author,
            skip.reason
        );
    }
    println!(
        "{} {} evaluados, {} con error, {} omitidos",
        "📊".cyan(),
        report.graded,
        report.failed,
        skipped.len()
    );
    println!(
        "{} Resultados guardados en {}",
        "✅".green(),
        output.display().to_string().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubrica_core::{normalize, FailureKind, GradingError};
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_read_block_stops_at_marker() {
        let mut input = Cursor::new("primera línea\nsegunda\r\n.\nsobrante\n");
        let block = read_block_from(&mut input).unwrap();
        assert_eq!(block, "primera línea\nsegunda");

        let rest = read_block_from(&mut input).unwrap();
        assert_eq!(rest, "sobrante");
    }

    #[test]
    fn test_read_block_until_eof() {
        let mut input = Cursor::new("sin marcador");
        assert_eq!(read_block_from(&mut input).unwrap(), "sin marcador");
        assert_eq!(read_block_from(&mut input).unwrap(), "");
    }

    #[test]
    fn test_score_table() {
        let result = normalize(&json!({
            "calificacion_total": 20,
            "calificaciones_criterios": {
                "estructura": 4, "ortografia": 5, "comprension": 4, "redaccion": 3, "sintesis": 4
            }
        }));

        insta::assert_snapshot!(format_score_table(&result), @r###"
        Criterio     Nota
        -----------  ----
        Estructura      4
        Ortografía      5
        Comprensión     4
        Redacción       3
        Síntesis        4
        "###);
    }

    #[test]
    fn test_connection_failure_text() {
        let failure = EvaluationFailure::from(GradingError::Connection(
            "could not reach http://localhost:1234".to_string(),
        ));

        insta::assert_snapshot!(format_failure(&failure), @r###"
        Connection error: could not reach http://localhost:1234 (ConnectionError)
        "###);
    }

    #[test]
    fn test_malformed_failure_text_shows_reply_and_slice() {
        let failure = EvaluationFailure {
            kind: FailureKind::MalformedJson,
            message: "Malformed JSON in the model reply: expected value".to_string(),
            raw_reply: Some("Resultado: {\"nota\": }".to_string()),
            extracted: Some("{\"nota\": }".to_string()),
        };

        insta::assert_snapshot!(format_failure(&failure), @r###"
        Malformed JSON in the model reply: expected value (MalformedJson)

        Respuesta Cruda (Original):
        Resultado: {"nota": }

        Intento de JSON (Limpio):
        {"nota": }
        "###);
    }
}
