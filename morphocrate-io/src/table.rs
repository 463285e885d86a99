//! Delimited result tables
//!
//! The centroid-size table has a header row and one row per record, in the
//! order the records are given. Files are replaced atomically.

use crate::write_atomically;
use morphocrate_core::{CentroidSizeRecord, Result};
use std::path::Path;

/// Field separator of a written table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Semicolon,
}

impl Delimiter {
    /// Get the character representation of the delimiter
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }
}

/// Write options for the centroid-size table
#[derive(Debug, Clone)]
pub struct TableWriteOptions {
    pub delimiter: Delimiter,
    /// Decimal places of the centroid size column
    pub precision: usize,
    /// Header of the identifier and value columns
    pub headers: [String; 2],
}

impl Default for TableWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            precision: 6,
            headers: ["Mesh File".to_string(), "Centroid Size".to_string()],
        }
    }
}

impl TableWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_headers<S: Into<String>>(mut self, identifier: S, value: S) -> Self {
        self.headers = [identifier.into(), value.into()];
        self
    }
}

/// Writer for the two-column centroid-size table
pub struct CentroidSizeTableWriter;

impl CentroidSizeTableWriter {
    /// Render the table as text, header first
    pub fn render(records: &[CentroidSizeRecord], options: &TableWriteOptions) -> String {
        let delimiter = options.delimiter.as_char();
        let mut out = format!(
            "{}{}{}\n",
            quote_field(&options.headers[0], delimiter),
            delimiter,
            quote_field(&options.headers[1], delimiter)
        );
        for record in records {
            out.push_str(&format!(
                "{}{}{:.*}\n",
                quote_field(&record.identifier, delimiter),
                delimiter,
                options.precision,
                record.centroid_size
            ));
        }
        out
    }

    /// Write the table to `path`; an existing file is replaced only on success
    pub fn write<P: AsRef<Path>>(
        records: &[CentroidSizeRecord],
        path: P,
        options: &TableWriteOptions,
    ) -> Result<()> {
        let text = Self::render(records, options);
        write_atomically(path.as_ref(), text.as_bytes())
    }
}

/// Write a one-column table headed `Filename`
pub fn write_filename_table<P: AsRef<Path>>(names: &[String], path: P) -> Result<()> {
    let mut out = String::from("Filename\n");
    for name in names {
        out.push_str(&quote_field(name, ','));
        out.push('\n');
    }
    write_atomically(path.as_ref(), out.as_bytes())
}

/// Quote a field if it contains the delimiter, a quote or a line break
fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(|c| c == delimiter || c == '"' || c == '\n' || c == '\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
