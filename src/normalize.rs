//! Shape validation and derived-column injection for vendor payloads.
//!
//! A rejection is expected vendor behavior, not an error: the device/day
//! pair simply contributes nothing to that day's aggregate. Only the caller
//! decides whether to log it.

use crate::coerce;
use crate::table::Table;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use tracing::debug;

/// Payloads shorter than this are the vendor's way of saying "no data".
pub const MIN_PAYLOAD_LEN: usize = 100;

/// A table must have strictly more data rows than this to be kept.
const MIN_ROWS: usize = 10;
/// Summary tables must have strictly more columns than this.
const MIN_SUMMARY_COLUMNS: usize = 5;
/// Raw-stream tables must have strictly more columns than this.
const MIN_RAW_COLUMNS: usize = 2;

/// Lines before the true header in data payloads.
const PREAMBLE_LINES: usize = 1;

pub const SUMMARY_TIMESTAMP_COLUMN: &str = "StartTime";
pub const RAW_TIMESTAMP_COLUMN: &str = "DateTime";

/// Which payload shape is being normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Per-visit emission summaries (`getemissions?d=visits`).
    Summary,
    /// Raw feed/RFID event streams (`getraw`).
    Raw,
}

/// Why a payload was dropped from aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Undersized { len: usize },
    Malformed(String),
    TooFewColumns { found: usize },
    TooFewRows { found: usize },
    MissingColumn(&'static str),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Undersized { len } => {
                write!(f, "payload too short ({len} bytes, no data)")
            }
            Rejection::Malformed(detail) => write!(f, "payload did not parse: {detail}"),
            Rejection::TooFewColumns { found } => write!(f, "only {found} columns"),
            Rejection::TooFewRows { found } => write!(f, "only {found} data rows"),
            Rejection::MissingColumn(name) => write!(f, "missing {name} column"),
        }
    }
}

/// Validates one raw payload and injects the derived columns.
///
/// Summary tables come out ordered `date, cow, greenfeed, <vendor columns
/// minus FeederID>, user`; raw-stream tables keep the vendor columns and
/// append `cow, user, greenfeed, date`.
pub fn normalize(
    raw: &str,
    mode: Mode,
    device_id: &str,
    user: &str,
    day: NaiveDate,
) -> Result<Table, Rejection> {
    if mode == Mode::Summary && raw.len() < MIN_PAYLOAD_LEN {
        return Err(Rejection::Undersized { len: raw.len() });
    }

    let lenient = mode == Mode::Raw;
    let mut table = Table::parse(raw, PREAMBLE_LINES, lenient)
        .map_err(|err| Rejection::Malformed(err.to_string()))?;

    let min_columns = match mode {
        Mode::Summary => MIN_SUMMARY_COLUMNS,
        Mode::Raw => MIN_RAW_COLUMNS,
    };
    if table.columns.len() <= min_columns {
        return Err(Rejection::TooFewColumns {
            found: table.columns.len(),
        });
    }
    if table.rows.len() <= MIN_ROWS {
        return Err(Rejection::TooFewRows {
            found: table.rows.len(),
        });
    }

    let timestamp_column = match mode {
        Mode::Summary => SUMMARY_TIMESTAMP_COLUMN,
        Mode::Raw => RAW_TIMESTAMP_COLUMN,
    };
    let timestamp_index = table
        .column_index(timestamp_column)
        .ok_or(Rejection::MissingColumn(timestamp_column))?;
    let dates: Vec<String> = table
        .rows
        .iter()
        .map(|row| date_portion(&row[timestamp_index]))
        .collect();

    let device_value = coerce::int_or_original(device_id);
    match mode {
        Mode::Summary => {
            table.drop_column("FeederID");
            table.insert_column(0, "date", dates);
            table.insert_constant(1, "cow", "0");
            table.insert_constant(2, "greenfeed", &device_value);
            table.push_constant("user", user);
        }
        Mode::Raw => {
            table.push_constant("cow", "0");
            table.push_constant("user", user);
            table.push_constant("greenfeed", &device_value);
            table.push_column("date", dates);
        }
    }

    debug!(device = device_id, %day, rows = table.rows.len(), "payload accepted");
    Ok(table)
}

/// Date portion of a vendor timestamp (`2024-01-01 10:23:45` becomes
/// `2024-01-01`). Unparseable values pass through unchanged, same tolerance
/// contract as the integer coercions.
fn date_portion(value: &str) -> String {
    let trimmed = value.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return ts.date().to_string();
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return day.to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// Preamble + header + 12 rows with 7 columns, the §8-style happy path.
    fn summary_payload(device: &str) -> String {
        let mut out = String::from("Generated by portal\n");
        out.push_str(
            "FeederID,AnimalName,RFID,StartTime,EndTime,GoodDataDuration,CO2GramsPerDay\n",
        );
        for i in 0..12 {
            out.push_str(&format!(
                "{device},8{i},8.40003123456789e+14,2024-01-01 0{}:1{}:00,2024-01-01 0{}:3{}:00,180,310.5\n",
                i % 10,
                i % 6,
                i % 10,
                i % 6,
            ));
        }
        out
    }

    fn raw_payload(rows: usize) -> String {
        let mut out = String::from("Raw export\n");
        out.push_str("DateTime,FeedEvent,Amount\n");
        for i in 0..rows {
            out.push_str(&format!("2024-01-01 05:0{}:00,drop,{}\n", i % 10, i));
        }
        out
    }

    #[test]
    fn test_summary_happy_path() {
        let table = normalize(&summary_payload("1234"), Mode::Summary, "1234", "barn", day())
            .unwrap();

        assert_eq!(table.rows.len(), 12);
        assert_eq!(table.columns[0], "date");
        assert_eq!(table.columns[1], "cow");
        assert_eq!(table.columns[2], "greenfeed");
        assert_eq!(table.columns.last().unwrap(), "user");
        assert!(table.column_index("FeederID").is_none());

        for row in &table.rows {
            assert_eq!(row[0], "2024-01-01");
            assert_eq!(row[1], "0");
            assert_eq!(row[2], "1234");
            assert_eq!(row.last().unwrap(), "barn");
        }
    }

    #[test]
    fn test_summary_undersized_rejected() {
        let result = normalize("FeederID\n1234\n", Mode::Summary, "1234", "barn", day());
        assert_eq!(result.unwrap_err(), Rejection::Undersized { len: 14 });
    }

    #[test]
    fn test_summary_too_few_rows() {
        let mut payload = String::from("preamble\nFeederID,AnimalName,RFID,StartTime,EndTime,X\n");
        for _ in 0..10 {
            payload.push_str("1234,81,1,2024-01-01 01:00:00,2024-01-01 02:00:00,0\n");
        }
        assert!(payload.len() >= MIN_PAYLOAD_LEN);

        let result = normalize(&payload, Mode::Summary, "1234", "barn", day());
        assert_eq!(result.unwrap_err(), Rejection::TooFewRows { found: 10 });
    }

    #[test]
    fn test_summary_too_few_columns() {
        let mut payload = String::from("preamble\na,b,c,d,e\n");
        for _ in 0..12 {
            payload.push_str("1,2,3,4,5\n");
        }
        let result = normalize(&payload, Mode::Summary, "1234", "barn", day());
        assert_eq!(result.unwrap_err(), Rejection::TooFewColumns { found: 5 });
    }

    #[test]
    fn test_summary_missing_timestamp_column() {
        let mut payload = String::from("preamble\nFeederID,a,b,c,d,e\n");
        for _ in 0..12 {
            payload.push_str("1234,1,2,3,4,5\n");
        }
        let result = normalize(&payload, Mode::Summary, "1234", "barn", day());
        assert_eq!(
            result.unwrap_err(),
            Rejection::MissingColumn(SUMMARY_TIMESTAMP_COLUMN)
        );
    }

    #[test]
    fn test_summary_requires_clean_parse() {
        let mut payload = summary_payload("1234");
        payload.push_str("1234,trailing,row,with,too,few\n");
        let result = normalize(&payload, Mode::Summary, "1234", "barn", day());
        assert!(matches!(result.unwrap_err(), Rejection::Malformed(_)));
    }

    #[test]
    fn test_raw_happy_path_appends_columns() {
        let table = normalize(&raw_payload(12), Mode::Raw, "512", "barn", day()).unwrap();

        assert_eq!(
            table.columns,
            vec!["DateTime", "FeedEvent", "Amount", "cow", "user", "greenfeed", "date"]
        );
        assert_eq!(table.rows.len(), 12);
        for row in &table.rows {
            assert_eq!(row.last().unwrap(), "2024-01-01");
            assert_eq!(row[5], "512");
        }
    }

    #[test]
    fn test_raw_lenient_skips_malformed_rows() {
        let mut payload = String::from("Raw export\nDateTime,FeedEvent,Amount\n");
        for i in 0..12 {
            payload.push_str(&format!("2024-01-01 05:00:0{},drop,{}\n", i % 10, i));
            payload.push_str("broken,row\n");
        }
        let table = normalize(&payload, Mode::Raw, "512", "barn", day()).unwrap();
        assert_eq!(table.rows.len(), 12);
    }

    #[test]
    fn test_raw_too_few_columns() {
        let mut payload = String::from("Raw export\nDateTime,Amount\n");
        for i in 0..12 {
            payload.push_str(&format!("2024-01-01 05:00:00,{i}\n"));
        }
        let result = normalize(&payload, Mode::Raw, "512", "barn", day());
        assert_eq!(result.unwrap_err(), Rejection::TooFewColumns { found: 2 });
    }

    #[test]
    fn test_raw_short_payload_is_not_undersized() {
        // The 100-byte floor only applies to summary mode; a short raw
        // payload fails on shape instead.
        let result = normalize("x\nDateTime,a,b\n", Mode::Raw, "512", "barn", day());
        assert_eq!(result.unwrap_err(), Rejection::TooFewRows { found: 0 });
    }

    #[test]
    fn test_date_portion_variants() {
        assert_eq!(date_portion("2024-01-01 10:23:45"), "2024-01-01");
        assert_eq!(date_portion("2024-01-01T10:23:45.123"), "2024-01-01");
        assert_eq!(date_portion("2024-01-01"), "2024-01-01");
        assert_eq!(date_portion("not a time"), "not a time");
    }
}
