//! Reading base texts and submissions from the input workbook

use calamine::{open_workbook_auto, Data, Range, Reader};
use rubrica_core::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

pub const BASE_SHEET: &str = "Textos Base";
pub const SUBMISSION_SHEET: &str = "Resúmenes";

pub const COL_ID: &str = "ID";
pub const COL_BASE_TEXT: &str = "Texto Base";
pub const COL_AUTHOR: &str = "Autor";
pub const COL_SUMMARY: &str = "Resumen";

/// One row of the submissions sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRow {
    /// 1-based row number as shown by spreadsheet programs
    pub row: usize,
    pub id: Option<i64>,
    pub author: String,
    pub summary: String,
}

/// Everything the batch runner needs from the input workbook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInput {
    pub base_texts: HashMap<i64, String>,
    pub submissions: Vec<SubmissionRow>,
}

/// Open an `.xlsx`/`.xls`/`.ods` workbook and read both sheets
pub fn read_workbook(path: &Path) -> Result<BatchInput> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Spreadsheet(format!("could not open {}: {}", path.display(), e)))?;

    let sheets = workbook.sheet_names();
    for required in [BASE_SHEET, SUBMISSION_SHEET] {
        if !sheets.iter().any(|s| s == required) {
            return Err(Error::Spreadsheet(format!(
                "{} has no sheet named '{}' (found: {})",
                path.display(),
                required,
                sheets.join(", ")
            )));
        }
    }

    let base = workbook
        .worksheet_range(BASE_SHEET)
        .map_err(|e| Error::Spreadsheet(format!("could not read '{}': {}", BASE_SHEET, e)))?;
    let submissions = workbook
        .worksheet_range(SUBMISSION_SHEET)
        .map_err(|e| Error::Spreadsheet(format!("could not read '{}': {}", SUBMISSION_SHEET, e)))?;

    Ok(BatchInput {
        base_texts: parse_base_texts(&base)?,
        submissions: parse_submissions(&submissions)?,
    })
}

/// ID → base text; the first row wins when an ID repeats
pub fn parse_base_texts(range: &Range<Data>) -> Result<HashMap<i64, String>> {
    let header = Header::locate(range, BASE_SHEET, &[COL_ID, COL_BASE_TEXT])?;
    let (id_col, text_col) = (header.columns[0], header.columns[1]);

    let mut texts = HashMap::new();
    for (offset, row) in range.rows().enumerate().skip(1) {
        let line = header.first_row + offset + 1;
        let Some(id) = row.get(id_col).and_then(cell_id) else {
            if !row.iter().all(is_blank) {
                tracing::warn!(sheet = BASE_SHEET, row = line, "base text without a valid ID; skipping");
            }
            continue;
        };

        let text = row.get(text_col).map(cell_text).unwrap_or_default();
        if texts.contains_key(&id) {
            tracing::warn!(sheet = BASE_SHEET, row = line, id, "duplicate ID; keeping the first base text");
            continue;
        }
        texts.insert(id, text);
    }

    Ok(texts)
}

/// All non-empty submission rows, including those without an ID
pub fn parse_submissions(range: &Range<Data>) -> Result<Vec<SubmissionRow>> {
    let header = Header::locate(range, SUBMISSION_SHEET, &[COL_ID, COL_AUTHOR, COL_SUMMARY])?;
    let (id_col, author_col, summary_col) =
        (header.columns[0], header.columns[1], header.columns[2]);

    Ok(range
        .rows()
        .enumerate()
        .skip(1)
        .filter(|(_, row)| !row.iter().all(is_blank))
        .map(|(offset, row)| SubmissionRow {
            row: header.first_row + offset + 1,
            id: row.get(id_col).and_then(cell_id),
            author: row.get(author_col).map(cell_text).unwrap_or_default(),
            summary: row.get(summary_col).map(cell_text).unwrap_or_default(),
        })
        .collect())
}

/// Column positions resolved from a sheet's first row
struct Header {
    first_row: usize,
    columns: Vec<usize>,
}

impl Header {
    fn locate(range: &Range<Data>, sheet: &str, names: &[&str]) -> Result<Self> {
        let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
        let titles: Vec<String> = range
            .rows()
            .next()
            .map(|row| row.iter().map(|c| cell_text(c).trim().to_lowercase()).collect())
            .unwrap_or_default();

        let columns = names
            .iter()
            .map(|name| {
                let wanted = name.to_lowercase();
                titles.iter().position(|t| *t == wanted).ok_or_else(|| {
                    Error::Spreadsheet(format!("sheet '{}' has no '{}' column", sheet, name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { first_row, columns })
    }
}

/// Integer IDs, integral floats and numeric text; anything else is missing
pub fn cell_id(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
        Data::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
