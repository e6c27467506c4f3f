//! Header-indexed CSV reader for run artifacts
//!
//! The artifacts are plain numeric tables written by the benchmark driver:
//! no quoting, one header row. Columns are located by header name so extra
//! or reordered columns are harmless.

use crate::error::{AnalysisError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// A parsed CSV table with header-name column lookup
#[derive(Debug)]
pub struct CsvTable {
    file: String,
    columns: HashMap<String, usize>,
    rows: Vec<CsvRow>,
}

/// One data row, remembering its 1-based line number for error reports
#[derive(Debug)]
pub struct CsvRow {
    line: usize,
    fields: Vec<String>,
}

impl CsvTable {
    /// Read a table from disk, failing with `MissingArtifact` if absent
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalysisError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(&file, &text)
    }

    /// Parse a table from text; `file` is used only in error messages
    pub fn parse(file: &str, text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .filter(|(_, l)| !l.trim().is_empty());

        let columns = match lines.next() {
            Some((_, header)) => split_fields(header)
                .into_iter()
                .enumerate()
                .map(|(i, name)| (name, i))
                .collect(),
            None => return Err(AnalysisError::malformed(file, 1, "missing header row")),
        };

        let rows = lines
            .map(|(line, l)| CsvRow {
                line,
                fields: split_fields(l),
            })
            .collect();

        Ok(Self {
            file: file.to_string(),
            columns,
            rows,
        })
    }

    /// File name used in error messages
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn rows(&self) -> &[CsvRow] {
        &self.rows
    }

    /// Column index for a header name, or `MalformedRecord` if absent
    pub fn column(&self, name: &str) -> Result<usize> {
        self.columns.get(name).copied().ok_or_else(|| {
            AnalysisError::malformed(&self.file, 1, format!("missing column '{}'", name))
        })
    }

    /// Column index for an optional header name
    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Parse a field of `row` at column `col` as `T`
    pub fn parse_field<T: FromStr>(&self, row: &CsvRow, col: usize, name: &str) -> Result<T> {
        let raw = self.raw_field(row, col, name)?;
        raw.parse::<T>().map_err(|_| {
            AnalysisError::malformed(
                &self.file,
                row.line,
                format!("column '{}' has unparseable value {:?}", name, raw),
            )
        })
    }

    /// Parse a 0/1 (or true/false) flag column
    pub fn parse_flag(&self, row: &CsvRow, col: usize, name: &str) -> Result<bool> {
        match self.raw_field(row, col, name)? {
            "0" | "false" | "False" | "FALSE" => Ok(false),
            "1" | "true" | "True" | "TRUE" => Ok(true),
            other => Err(AnalysisError::malformed(
                &self.file,
                row.line,
                format!("column '{}' is not a 0/1 flag: {:?}", name, other),
            )),
        }
    }

    fn raw_field<'a>(&self, row: &'a CsvRow, col: usize, name: &str) -> Result<&'a str> {
        row.fields.get(col).map(String::as_str).ok_or_else(|| {
            AnalysisError::malformed(
                &self.file,
                row.line,
                format!("row is missing column '{}'", name),
            )
        })
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|f| f.trim().to_string()).collect()
}
