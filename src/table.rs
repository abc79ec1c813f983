//! String-backed table for the vendor's delimited payloads.
//!
//! Payloads arrive as a preamble line, a header line, then data rows; column
//! sets vary by endpoint and by day, so rows stay as text until the day
//! aggregate applies its coercions.

use anyhow::{Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parses `raw` after dropping `skip_preamble` leading lines; the next
    /// line is the header. With `lenient`, body rows that are malformed or
    /// have the wrong field count are dropped instead of failing the parse.
    pub fn parse(raw: &str, skip_preamble: usize, lenient: bool) -> Result<Table> {
        let body = raw
            .lines()
            .skip(skip_preamble)
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(lenient)
            .from_reader(body.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() || (columns.len() == 1 && columns[0].is_empty()) {
            bail!("payload has no header line");
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            match record {
                Ok(record) if record.len() == columns.len() => {
                    rows.push(record.iter().map(str::to_string).collect());
                }
                Ok(record) => {
                    if !lenient {
                        bail!(
                            "row has {} fields, header has {}",
                            record.len(),
                            columns.len()
                        );
                    }
                    debug!(fields = record.len(), "dropping row with odd field count");
                }
                Err(err) if lenient => {
                    debug!(%err, "dropping malformed row");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Table { columns, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Inserts a column at `index`, one value per row.
    pub fn insert_column(&mut self, index: usize, name: impl Into<String>, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.insert(index, name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(index, value);
        }
    }

    /// Appends a column on the right, one value per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) {
        let index = self.columns.len();
        self.insert_column(index, name, values);
    }

    /// Inserts a column holding the same value in every row.
    pub fn insert_constant(&mut self, index: usize, name: impl Into<String>, value: &str) {
        let values = vec![value.to_string(); self.rows.len()];
        self.insert_column(index, name, values);
    }

    /// Appends a column holding the same value in every row.
    pub fn push_constant(&mut self, name: impl Into<String>, value: &str) {
        let values = vec![value.to_string(); self.rows.len()];
        self.push_column(name, values);
    }

    /// Removes a column by name. Returns false if no such column exists.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(index) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        true
    }

    /// Writes the table as CSV at `path`, replacing any existing file. A
    /// table with no columns produces an empty file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
