use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

/// Maximum number of failing trade ids kept on a result.
pub const SAMPLE_LIMIT: usize = 5;

/// Rendering of a missing trade id inside `sample_ids`.
pub const NULL_ID_PLACEHOLDER: &str = "nan";

/// One row of the input batch, normalized by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub trade_id: Option<String>,
    pub account_id: String,
    pub currency: String,
    pub amount: Option<f64>,
    pub timestamp: Option<NaiveDateTime>,
}

impl TransactionRecord {
    /// Trade id as it appears in sample lists.
    pub fn display_id(&self) -> String {
        self.trade_id
            .clone()
            .unwrap_or_else(|| NULL_ID_PLACEHOLDER.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FxRate {
    pub currency: String,
    pub usd_rate: Option<f64>,
}

/// One complete snapshot of both datasets for a run.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub transactions: Vec<TransactionRecord>,
    pub fx_rates: Vec<FxRate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

macro_rules! sql_text_enum {
    ($ty:ident { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($ty))),
                }
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

sql_text_enum!(Status { "PASS" => Pass, "FAIL" => Fail });
sql_text_enum!(Severity { "HIGH" => High, "MEDIUM" => Medium, "LOW" => Low });

/// Outcome of one rule over one record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub check_name: String,
    pub failed_rows: usize,
    pub status: Status,
    pub severity: Severity,
    pub sample_ids: Vec<String>,
}

impl CheckResult {
    /// Builds a result from the failing rows of a scan, in row order.
    /// Status and samples are derived from the same iterator, so a result
    /// never reports PASS with failures or samples without failures.
    pub fn from_failures<'a, I>(check_name: &str, severity: Severity, failing: I) -> Self
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        let mut failed_rows = 0usize;
        let mut sample_ids = Vec::with_capacity(SAMPLE_LIMIT);
        for record in failing {
            if failed_rows < SAMPLE_LIMIT {
                sample_ids.push(record.display_id());
            }
            failed_rows += 1;
        }
        let status = if failed_rows == 0 {
            Status::Pass
        } else {
            Status::Fail
        };
        Self {
            check_name: check_name.to_string(),
            failed_rows,
            status,
            severity,
            sample_ids,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }
}

/// A persisted row of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub run_id: String,
    pub check_name: String,
    pub status: Status,
    pub severity: Severity,
    pub failed_rows: i64,
    pub sample_ids: String,
    pub created_at_utc: String,
}

impl AuditLogEntry {
    /// Splits the stored samples. A failing entry always has at least one
    /// sample, even when that id is the empty string.
    pub fn sample_id_list(&self) -> Vec<&str> {
        if self.failed_rows == 0 {
            Vec::new()
        } else {
            self.sample_ids.split(',').collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(id: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            trade_id: id.map(str::to_string),
            account_id: "A1".to_string(),
            currency: "USD".to_string(),
            amount: Some(1.0),
            timestamp: None,
        }
    }

    #[test]
    fn test_from_failures_empty_is_pass() {
        let r = CheckResult::from_failures("x", Severity::Low, std::iter::empty::<&TransactionRecord>());
        assert_eq!(r.status, Status::Pass);
        assert_eq!(r.failed_rows, 0);
        assert!(r.sample_ids.is_empty());
    }

    #[test]
    fn test_from_failures_caps_samples() {
        let rows: Vec<_> = (0..8).map(|i| txn(Some(&format!("T{i}")))).collect();
        let r = CheckResult::from_failures("x", Severity::High, &rows);
        assert_eq!(r.status, Status::Fail);
        assert_eq!(r.failed_rows, 8);
        assert_eq!(r.sample_ids, vec!["T0", "T1", "T2", "T3", "T4"]);
    }

    #[test]
    fn test_missing_trade_id_uses_placeholder() {
        let rows = vec![txn(None), txn(Some(""))];
        let r = CheckResult::from_failures("x", Severity::High, &rows);
        assert_eq!(r.sample_ids, vec!["nan", ""]);
    }

    #[test]
    fn test_status_and_severity_text() {
        assert_eq!("PASS".parse::<Status>().unwrap(), Status::Pass);
        assert_eq!(Severity::Medium.to_string(), "MEDIUM");
        assert!("pass".parse::<Status>().is_err());
    }

    #[test]
    fn test_result_json_shape() {
        let rows = vec![txn(Some("T9"))];
        let r = CheckResult::from_failures("amount_positive", Severity::High, &rows);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["check_name"], "amount_positive");
        assert_eq!(json["failed_rows"], 1);
        assert_eq!(json["status"], "FAIL");
        assert_eq!(json["severity"], "HIGH");
        assert_eq!(json["sample_ids"][0], "T9");
    }

    #[test]
    fn test_sample_id_list_splits() {
        let entry = AuditLogEntry {
            id: 1,
            run_id: "r".into(),
            check_name: "c".into(),
            status: Status::Fail,
            severity: Severity::High,
            failed_rows: 2,
            sample_ids: "T1,T2".into(),
            created_at_utc: String::new(),
        };
        assert_eq!(entry.sample_id_list(), vec!["T1", "T2"]);

        let blank = AuditLogEntry { failed_rows: 1, sample_ids: String::new(), ..entry.clone() };
        assert_eq!(blank.sample_id_list(), vec![""]);
        let passing = AuditLogEntry { failed_rows: 0, sample_ids: String::new(), ..entry };
        assert!(passing.sample_id_list().is_empty());
    }
}
