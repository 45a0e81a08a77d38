use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::models::{CheckResult, FxRate, RecordSet, Severity, TransactionRecord};

// ---------------------------------------------------------------------------
// Check kinds: enum dispatch over a fixed registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    NoNullTradeId,
    AmountPositive,
    ValidTimestamp,
    CurrencySupported,
    FxMapped,
}

impl CheckKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoNullTradeId => "no_null_trade_id",
            Self::AmountPositive => "amount_positive",
            Self::ValidTimestamp => "valid_timestamp",
            Self::CurrencySupported => "currency_supported",
            Self::FxMapped => "fx_mapped",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::ValidTimestamp => Severity::Medium,
            _ => Severity::High,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NoNullTradeId => "trade_id is present and not blank",
            Self::AmountPositive => "amount parsed and strictly greater than zero",
            Self::ValidTimestamp => "timestamp parsed",
            Self::CurrencySupported => "currency appears in the fx rate table",
            Self::FxMapped => "currency joins to an fx rate row",
        }
    }

    pub fn run(&self, records: &RecordSet) -> CheckResult {
        let txns = &records.transactions;
        match self {
            Self::NoNullTradeId => self.tally(txns.iter().filter(|t| is_blank_trade_id(t))),
            Self::AmountPositive => self.tally(txns.iter().filter(|t| !is_positive_amount(t))),
            Self::ValidTimestamp => self.tally(txns.iter().filter(|t| t.timestamp.is_none())),
            Self::CurrencySupported => check_currency_supported(*self, txns, &records.fx_rates),
            Self::FxMapped => check_fx_mapped(*self, txns, &records.fx_rates),
        }
    }

    fn tally<'a>(&self, failing: impl Iterator<Item = &'a TransactionRecord>) -> CheckResult {
        CheckResult::from_failures(self.name(), self.severity(), failing)
    }
}

pub const ALL_CHECKS: &[CheckKind] = &[
    CheckKind::NoNullTradeId,
    CheckKind::AmountPositive,
    CheckKind::ValidTimestamp,
    CheckKind::CurrencySupported,
    CheckKind::FxMapped,
];

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn is_blank_trade_id(txn: &TransactionRecord) -> bool {
    txn.trade_id
        .as_deref()
        .map_or(true, |id| id.trim().is_empty())
}

fn is_positive_amount(txn: &TransactionRecord) -> bool {
    matches!(txn.amount, Some(a) if a > 0.0)
}

fn check_currency_supported(
    kind: CheckKind,
    txns: &[TransactionRecord],
    fx: &[FxRate],
) -> CheckResult {
    let supported: HashSet<&str> = fx.iter().map(|r| r.currency.as_str()).collect();
    kind.tally(txns.iter().filter(|t| !supported.contains(t.currency.as_str())))
}

/// Left join of transactions onto the rate table. A transaction with no
/// rate row on the right side is a failure; matched rows may fan out when
/// the rate table repeats a currency, but only unmatched rows are counted.
fn check_fx_mapped(kind: CheckKind, txns: &[TransactionRecord], fx: &[FxRate]) -> CheckResult {
    let mut rates_by_currency: HashMap<&str, Vec<&FxRate>> = HashMap::new();
    for rate in fx {
        rates_by_currency
            .entry(rate.currency.as_str())
            .or_default()
            .push(rate);
    }

    let joined = txns.iter().map(|t| {
        let matches = rates_by_currency
            .get(t.currency.as_str())
            .map_or(0, |rows| rows.len());
        (t, matches)
    });
    kind.tally(joined.filter(|(_, matches)| *matches == 0).map(|(t, _)| t))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs the registered checks in order against one record set.
#[derive(Debug, Clone)]
pub struct CheckEngine {
    checks: &'static [CheckKind],
}

impl Default for CheckEngine {
    fn default() -> Self {
        Self { checks: ALL_CHECKS }
    }
}

impl CheckEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checks(&self) -> &[CheckKind] {
        self.checks
    }

    pub fn run_all(&self, records: &RecordSet) -> Vec<CheckResult> {
        info!(
            transactions = records.transactions.len(),
            fx_rates = records.fx_rates.len(),
            "running {} checks",
            self.checks.len()
        );
        self.checks
            .iter()
            .map(|kind| {
                let result = kind.run(records);
                debug!(
                    check = result.check_name.as_str(),
                    failed_rows = result.failed_rows,
                    status = %result.status,
                    "check evaluated"
                );
                if !result.passed() && result.severity == Severity::High {
                    warn!(
                        check = result.check_name.as_str(),
                        failed_rows = result.failed_rows,
                        "high severity check failed"
                    );
                }
                result
            })
            .collect()
    }
}

pub fn failed_count(results: &[CheckResult]) -> usize {
    results.iter().filter(|r| !r.passed()).count()
}

pub fn high_failures(results: &[CheckResult]) -> usize {
    results
        .iter()
        .filter(|r| !r.passed() && r.severity == Severity::High)
        .count()
}
