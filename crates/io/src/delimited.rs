// Delimited text import (comma by default, quote-aware)
//
// Not RFC 4180: a `"` toggles literal mode and is stripped, so
// `""` inside a field is two toggles rather than an escaped quote.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

pub const DEFAULT_DELIMITER: char = ',';

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ParseError {
    /// Source path does not exist.
    FileNotFound(String),
    /// Source exists but could not be read.
    Read { path: String, message: String },
    /// Input has no header line.
    Empty,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "file not found: {path}"),
            Self::Read { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::Empty => write!(f, "no header line found"),
        }
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One parsed row. Field names are shared with the owning `RecordSet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Build a record against a header, padding or truncating `values` to fit.
    pub fn new(fields: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.resize(fields.len(), String::new());
        Self { fields, values }
    }

    /// Convenience for tests and ad-hoc callers: `[(field, value), ...]`.
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields: Arc<[String]> = pairs.iter().map(|(k, _)| k.as_ref().to_string()).collect();
        let values = pairs.iter().map(|(_, v)| v.as_ref().to_string()).collect();
        Self::new(fields, values)
    }

    /// Value of `field`, or `None` when the header has no such column.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| self.values[i].as_str())
    }

    /// Value of `field`, treating a missing column as empty.
    pub fn value(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.as_str(), v.as_str()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// RecordSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub fields: Arc<[String]>,
    pub rows: Vec<Record>,
    /// Rows that carried more values than the header has columns.
    pub overflow_rows: usize,
}

impl RecordSet {
    pub fn empty() -> Self {
        Self {
            fields: Arc::from(Vec::new()),
            rows: Vec::new(),
            overflow_rows: 0,
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse(text: &str) -> Result<RecordSet, ParseError> {
    parse_with_delimiter(text, DEFAULT_DELIMITER)
}

pub fn parse_with_delimiter(text: &str, delimiter: char) -> Result<RecordSet, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty());

    let header_line = lines.next().ok_or(ParseError::Empty)?;
    let fields: Arc<[String]> = unique_headers(split_line(header_line, delimiter)).into();

    let mut rows = Vec::new();
    let mut overflow_rows = 0;
    for line in lines {
        let values: Vec<String> = split_line(line, delimiter)
            .into_iter()
            .map(|v| v.trim().to_string())
            .collect();
        if values.len() > fields.len() {
            overflow_rows += 1;
        }
        rows.push(Record::new(Arc::clone(&fields), values));
    }

    Ok(RecordSet {
        fields,
        rows,
        overflow_rows,
    })
}

/// Split one line on `delimiter`, honoring double-quoted literals.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == delimiter && !in_quotes {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    out.push(current);
    out
}

/// Trim header names and suffix repeats (`Name`, `Name_2`, ...) so lookups stay unambiguous.
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let base = name.trim().to_string();
        let mut candidate = base.clone();
        let mut n = 2;
        while out.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn read(path: &Path) -> Result<RecordSet, ParseError> {
    let content = read_file_as_utf8(path)?;
    parse(&content)
}

/// Read file and convert to UTF-8 if needed (spreadsheet exports are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, ParseError> {
    if !path.exists() {
        return Err(ParseError::FileNotFound(path.display().to_string()));
    }
    let read_err = |e: std::io::Error| ParseError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}
