//! Per-day concatenation, end-of-day coercion, and artifact output.

use crate::coerce;
use crate::table::Table;
use anyhow::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

/// Columns rendered as integer text after concatenation.
const INT_COLUMNS: &[&str] = &["AnimalName", "cow", "greenfeed"];

/// Identifier column round-tripped through i64 to collapse the
/// scientific-notation renderings the vendor export drifts into.
const RFID_COLUMN: &str = "RFID";

/// Concatenates accepted per-device tables into one day table.
///
/// The first table fixes the initial column order; columns first seen in a
/// later table are appended on the right. Rows keep an empty cell for every
/// column their source table lacked; column-order mismatches are matched by
/// name, never reconciled positionally.
pub fn concat(tables: Vec<Table>) -> Table {
    let mut merged = Table::default();

    for table in tables {
        let mut indices = Vec::with_capacity(table.columns.len());
        for name in &table.columns {
            let index = match merged.column_index(name) {
                Some(index) => index,
                None => {
                    merged.columns.push(name.clone());
                    for row in &mut merged.rows {
                        row.push(String::new());
                    }
                    merged.columns.len() - 1
                }
            };
            indices.push(index);
        }

        for row in table.rows {
            let mut out = vec![String::new(); merged.columns.len()];
            for (value, &index) in row.into_iter().zip(&indices) {
                out[index] = value;
            }
            merged.rows.push(out);
        }
    }

    merged
}

/// End-of-day cleanup: blanks become `0`, then the best-effort integer
/// coercions run over the identifier columns.
pub fn finalize(table: &mut Table) {
    for row in &mut table.rows {
        for cell in row.iter_mut() {
            if cell.trim().is_empty() {
                *cell = "0".to_string();
            }
        }
    }

    for name in INT_COLUMNS {
        coerce_column(table, name);
    }
    coerce_column(table, RFID_COLUMN);
}

fn coerce_column(table: &mut Table, name: &str) {
    let Some(index) = table.column_index(name) else {
        return;
    };
    for row in &mut table.rows {
        row[index] = coerce::int_or_original(&row[index]);
    }
}

/// Merges one day's accepted tables and writes the day artifact, replacing
/// any previous file for that day. Zero accepted tables still produce a
/// (possibly empty) artifact.
pub fn write_day(
    tables: Vec<Table>,
    out_dir: &Path,
    file_stem: &str,
    day: NaiveDate,
) -> Result<PathBuf> {
    let mut table = concat(tables);
    finalize(&mut table);

    let path = out_dir.join(format!("{file_stem}_{day}.csv"));
    table.write_csv(&path)?;
    info!(path = %path.display(), rows = table.rows.len(), "day artifact written");
    Ok(path)
}
