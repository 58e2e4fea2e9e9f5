//! Flattening outcomes into result rows and writing the results workbook

use rubrica_core::{Criterion, EvaluationOutcome, EvaluationResult, Error, Result};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::path::Path;

use crate::workbook::{COL_AUTHOR, COL_SUMMARY};

pub const RESULTS_SHEET: &str = "Resultados";

pub const COL_ERROR: &str = "Error";
pub const COL_RAW_REPLY: &str = "Respuesta Cruda";
pub const COL_TOTAL: &str = "Calificación Total";
pub const COL_GENERAL: &str = "Retroalimentación General";
pub const COL_SPECIFIC: &str = "Retroalimentación Específica";

/// Longest text Excel stores in one cell
const MAX_CELL_CHARS: usize = 32_767;

/// Column title for a criterion score, e.g. `Nota Ortografía`
pub fn score_column(criterion: Criterion) -> String {
    format!("Nota {}", criterion.label())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Cell {
    Text(String),
    Number(i64),
}

/// One output row: ordered (column, value) pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    cells: Vec<(String, Cell)>,
}

impl ResultRow {
    /// Flatten an outcome the way the results sheet shows it
    pub fn from_outcome(author: &str, summary: &str, outcome: &EvaluationOutcome) -> Self {
        let mut row = Self { cells: Vec::new() };
        row.push_text(COL_AUTHOR, author);
        row.push_text(COL_SUMMARY, summary);

        match outcome {
            EvaluationOutcome::Graded { result, .. } => row.push_result(result),
            EvaluationOutcome::Failed(failure) => {
                row.push_text(COL_ERROR, &failure.message);
                row.push_text(COL_RAW_REPLY, failure.raw_reply.as_deref().unwrap_or(""));
            }
        }

        row
    }

    fn push_result(&mut self, result: &EvaluationResult) {
        self.cells
            .push((COL_TOTAL.to_string(), Cell::Number(result.total_score)));
        self.push_text(COL_GENERAL, &result.general_feedback);
        for (criterion, score) in result.scores.iter() {
            self.cells
                .push((score_column(criterion), Cell::Number(score)));
        }
        self.push_text(COL_SPECIFIC, &join_specific_feedback(result));
    }

    fn push_text(&mut self, column: &str, text: &str) {
        self.cells
            .push((column.to_string(), Cell::Text(text.to_string())));
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }
}

/// `- <criterio>: <feedback>` lines, empty when there is no specific feedback
pub fn join_specific_feedback(result: &EvaluationResult) -> String {
    result
        .specific_feedback
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|entry| format!("- {}: {}", entry.criterion, entry.feedback))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header for a set of rows: every column, in order of first appearance
pub fn header(rows: &[ResultRow]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for column in rows.iter().flat_map(|row| row.columns()) {
        if !columns.iter().any(|c| c == column) {
            columns.push(column.to_string());
        }
    }
    if columns.is_empty() {
        columns = vec![COL_AUTHOR.to_string(), COL_SUMMARY.to_string()];
    }
    columns
}

/// Write the rows to a single `Resultados` sheet, overwriting `path`
pub fn write_results(path: &Path, rows: &[ResultRow]) -> Result<()> {
    let columns = header(rows);
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(RESULTS_SHEET).map_err(sheet_error)?;

    for (c, title) in columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, c as u16, title, &bold)
            .map_err(sheet_error)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let line = r as u32 + 1;
        for (c, title) in columns.iter().enumerate() {
            match row.get(title) {
                Some(Cell::Text(text)) => {
                    worksheet
                        .write_string(line, c as u16, fit_cell(text, title))
                        .map_err(sheet_error)?;
                }
                Some(Cell::Number(n)) => {
                    worksheet
                        .write_number(line, c as u16, *n as f64)
                        .map_err(sheet_error)?;
                }
                None => {}
            }
        }
    }

    workbook.save(path).map_err(|e| {
        Error::Spreadsheet(format!(
            "could not save {} (is it open in another program?): {}",
            path.display(),
            e
        ))
    })
}

fn fit_cell<'a>(text: &'a str, column: &str) -> &'a str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            tracing::warn!(column, "cell text longer than Excel allows; truncating");
            &text[..cut]
        }
        None => text,
    }
}

fn sheet_error(err: rust_xlsxwriter::XlsxError) -> Error {
    Error::Spreadsheet(err.to_string())
}
