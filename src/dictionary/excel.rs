//! Spreadsheet dictionaries
//!
//! A dictionary sheet lists one variable per row: name, type label, length
//! and storage format, in four configurable columns. Type labels and formats
//! follow statistical-package conventions (`NUM` with `BEST12.`, `CHAR`,
//! `NUM` with `DDMMYY10.`, ...).

use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::Dictionary;
use super::error::DictionaryError;
use crate::catalog::formats::{canonical_format, legacy_temporal_type, looks_temporal};
use crate::catalog::{MetadataCatalog, TypeFlags, VariableMetadata, VariableType};
use crate::location::DataLocation;

static INTEGER_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+(\.0?)?$").unwrap());
static DECIMAL_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").unwrap());
static F_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^F[0-9]+\.[0-9]*$").unwrap());
static RCI_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^RCI_[0-9]+_[0-9]+_\.$").unwrap());
static Z_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Z_[0-9]+_[0-9]+_\.$").unwrap());

/// One row of a dictionary sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub name: String,
    pub type_label: String,
    pub length: u32,
    pub format: String,
}

impl DictionaryEntry {
    pub fn new(
        name: impl Into<String>,
        type_label: impl Into<String>,
        length: u32,
        format: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_label: type_label.into(),
            length,
            format: format.into(),
        }
    }
}

/// Spreadsheet columns holding each dictionary field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryColumns {
    pub name: String,
    pub type_label: String,
    pub length: String,
    pub format: String,
}

impl Default for DictionaryColumns {
    fn default() -> Self {
        Self {
            name: "A".to_string(),
            type_label: "B".to_string(),
            length: "C".to_string(),
            format: "D".to_string(),
        }
    }
}

/// Dictionary stored in a spreadsheet sheet
///
/// Produces case-sensitive catalogs.
#[derive(Debug, Clone)]
pub struct ExcelDictionary {
    path: PathBuf,
    sheet: String,
    header_row: usize,
    columns: DictionaryColumns,
}

impl ExcelDictionary {
    /// Point at a sheet of an existing workbook
    pub fn new(path: impl AsRef<Path>, sheet: impl Into<String>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DictionaryError::FileNotFound(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            sheet: sheet.into(),
            header_row: 0,
            columns: DictionaryColumns::default(),
        })
    }

    /// Zero-based index of the header row; entries start on the next row
    pub fn header_row(mut self, row: usize) -> Self {
        self.header_row = row;
        self
    }

    /// Column letters of the dictionary fields
    pub fn columns(mut self, columns: DictionaryColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Read the sheet's entries
    pub fn read_entries(&self) -> Result<Vec<DictionaryEntry>, DictionaryError> {
        let workbook_error = |reason: String| DictionaryError::Workbook {
            path: self.path.clone(),
            reason,
        };
        let indices = [
            column_index(&self.columns.name)?,
            column_index(&self.columns.type_label)?,
            column_index(&self.columns.length)?,
            column_index(&self.columns.format)?,
        ];

        let mut workbook = open_workbook_auto(&self.path).map_err(|e| workbook_error(e.to_string()))?;
        let range = workbook
            .worksheet_range(&self.sheet)
            .map_err(|e| workbook_error(format!("sheet {}: {}", self.sheet, e)))?;

        // Cells are addressed absolutely; the used range may not start at A1
        let last_row = range.end().map_or(0, |(row, _)| row as usize);
        let mut entries = Vec::new();
        for row in (self.header_row + 1)..=last_row {
            let cell = |i: usize| {
                range
                    .get_value((row as u32, indices[i] as u32))
                    .map(cell_text)
                    .unwrap_or_default()
            };
            let name = cell(0);
            // Blank rows separate blocks in hand-edited sheets
            if name.is_empty() {
                continue;
            }
            let length = parse_length(&cell(2)).ok_or_else(|| DictionaryError::InvalidEntry {
                row: row + 1,
                reason: format!("length of {} is not a number: {}", name, cell(2)),
            })?;
            entries.push(DictionaryEntry::new(name, cell(1), length, cell(3)));
        }

        debug!(
            path = %self.path.display(),
            sheet = %self.sheet,
            entries = entries.len(),
            "Read dictionary sheet"
        );
        Ok(entries)
    }
}

impl Dictionary for ExcelDictionary {
    fn read_metadata(&self, _location: &DataLocation) -> Result<MetadataCatalog, DictionaryError> {
        let catalog = catalog_from_entries(&self.read_entries()?)?;
        info!(
            path = %self.path.display(),
            variables = catalog.size(),
            "Loaded spreadsheet dictionary"
        );
        Ok(catalog)
    }
}

/// Classify dictionary entries into a case-sensitive catalog
pub fn catalog_from_entries(entries: &[DictionaryEntry]) -> Result<MetadataCatalog, DictionaryError> {
    let variables = entries
        .iter()
        .map(classify_entry)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MetadataCatalog::new(variables, true)?)
}

/// Classify one entry
///
/// Each type flag is decided independently; entries matching zero or several
/// rules surface later in the catalog's completeness check. A `NUM` entry
/// whose format looks like a datetime token we cannot translate is an error.
pub fn classify_entry(entry: &DictionaryEntry) -> Result<VariableMetadata, DictionaryError> {
    let label = entry.type_label.trim().to_uppercase();
    let format = entry.format.trim().to_uppercase();
    let is_num = label == "NUM";

    let mut flags = TypeFlags::default();
    flags.is_boolean = matches!(label.as_str(), "BOOLEAN" | "LOGICAL" | "FLAG");
    flags.is_integer =
        matches!(label.as_str(), "INT" | "INTEGER") || (is_num && INTEGER_FORMAT.is_match(&format));
    flags.is_float = matches!(label.as_str(), "FLOAT" | "DECIMAL" | "NUMERIC")
        || (is_num && !flags.is_integer && is_float_format(&format));
    flags.is_text = matches!(label.as_str(), "CHAR" | "TEXT");

    let temporal = if is_num { legacy_temporal_type(&format) } else { None };
    flags.is_date = temporal == Some(VariableType::Date);
    flags.is_time = temporal == Some(VariableType::Time);
    flags.is_timestamp = temporal == Some(VariableType::Timestamp);

    if is_num && flags.count() == 0 && looks_temporal(&format) {
        return Err(DictionaryError::UnsupportedDatetimeFormat {
            variable: entry.name.clone(),
            format: entry.format.clone(),
        });
    }

    let mut variable = VariableMetadata::with_flags(entry.name.trim(), flags)
        .num_bytes(entry.length)
        .type_in_source(entry.type_label.trim());
    if temporal.is_some()
        && let Some(canonical) = canonical_format(&format)
    {
        variable = variable.datetime_format(canonical);
    }
    Ok(variable)
}

fn is_float_format(format: &str) -> bool {
    format.is_empty()
        || format.starts_with("BEST")
        || format.starts_with("COMMA")
        || format.starts_with("PERCENT")
        || DECIMAL_FORMAT.is_match(format)
        || F_FORMAT.is_match(format)
        || RCI_FORMAT.is_match(format)
        || Z_FORMAT.is_match(format)
}

/// Zero-based index of a column letter (`A` is 0, `AA` is 26)
fn column_index(letters: &str) -> Result<usize, DictionaryError> {
    let letters = letters.trim().to_uppercase();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(DictionaryError::InvalidColumn(letters));
    }
    Ok(letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A') as usize + 1)
        - 1)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

fn parse_length(text: &str) -> Option<u32> {
    if text.is_empty() {
        return Some(0);
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .map(|n| n as u32)
}
