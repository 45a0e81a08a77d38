use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{AuditError, Result};
use crate::models::{FxRate, RecordSet, TransactionRecord};

pub const TRANSACTION_COLUMNS: &[&str] = &["trade_id", "account_id", "currency", "amount", "timestamp"];
pub const FX_COLUMNS: &[&str] = &["currency", "usd_rate"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y", "%Y/%m/%d"];

// ---------------------------------------------------------------------------
// Value normalization
// ---------------------------------------------------------------------------

pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| !v.is_nan())
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    // Offset-aware stamps that are not strict RFC 3339, e.g. a space separator
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.naive_utc());
    }
    let s = s.strip_suffix('Z').unwrap_or(s);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn normalize_currency(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Positions of the required columns in a header row.
struct Columns(Vec<usize>);

impl Columns {
    fn resolve(dataset: &'static str, headers: &StringRecord, required: &[&str]) -> Result<Self> {
        let mut positions = Vec::with_capacity(required.len());
        let mut missing = Vec::new();
        for name in required {
            match headers.iter().position(|h| h.trim() == *name) {
                Some(i) => positions.push(i),
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(AuditError::MissingColumns {
                dataset,
                columns: missing,
            });
        }
        Ok(Self(positions))
    }

    fn get<'r>(&self, record: &'r StringRecord, idx: usize) -> Option<&'r str> {
        record.get(self.0[idx])
    }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

pub fn read_transactions<R: Read>(input: R) -> Result<Vec<TransactionRecord>> {
    let mut rdr = reader(input);
    let cols = Columns::resolve("transactions", rdr.headers()?, TRANSACTION_COLUMNS)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(TransactionRecord {
            trade_id: cols.get(&record, 0).map(str::to_string),
            account_id: cols.get(&record, 1).unwrap_or_default().trim().to_string(),
            currency: normalize_currency(cols.get(&record, 2).unwrap_or_default()),
            amount: cols.get(&record, 3).and_then(parse_number),
            timestamp: cols.get(&record, 4).and_then(parse_timestamp),
        });
    }
    Ok(rows)
}

pub fn read_fx_rates<R: Read>(input: R) -> Result<Vec<FxRate>> {
    let mut rdr = reader(input);
    let cols = Columns::resolve("fx_rates", rdr.headers()?, FX_COLUMNS)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(FxRate {
            currency: normalize_currency(cols.get(&record, 0).unwrap_or_default()),
            usd_rate: cols.get(&record, 1).and_then(parse_number),
        });
    }
    Ok(rows)
}

pub fn load_transactions(path: &Path) -> Result<Vec<TransactionRecord>> {
    let file = std::fs::File::open(path)?;
    read_transactions(std::io::BufReader::new(file))
}

pub fn load_fx_rates(path: &Path) -> Result<Vec<FxRate>> {
    let file = std::fs::File::open(path)?;
    read_fx_rates(std::io::BufReader::new(file))
}

/// Loads both datasets. Either file failing its column check aborts the
/// whole load before any checks can run.
pub fn load_all(transactions_path: &Path, fx_path: &Path) -> Result<RecordSet> {
    let transactions = load_transactions(transactions_path)?;
    let fx_rates = load_fx_rates(fx_path)?;
    info!(
        transactions = transactions.len(),
        fx_rates = fx_rates.len(),
        "loaded record set"
    );
    Ok(RecordSet {
        transactions,
        fx_rates,
    })
}
