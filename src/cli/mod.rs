pub mod backup;
pub mod check;
pub mod history;
pub mod init;
pub mod rules;
pub mod run;
pub mod status;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};

use crate::audit::{AuditStore, DEFAULT_HISTORY_LIMIT};
use crate::error::Result;
use crate::fmt::{severity_label, short_stamp, status_label};
use crate::models::{AuditLogEntry, CheckResult};
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "dq-audit",
    about = "Audit transaction batches against FX reference rates and keep a log of every run."
)]
pub struct Cli {
    /// Data directory holding the audit database and reports (overrides settings)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the audit database.
    Init,
    /// Check a batch, write the JSON report and append the results to the audit log.
    Run {
        /// Transactions CSV (trade_id, account_id, currency, amount, timestamp)
        #[arg(long)]
        transactions: String,
        /// FX rates CSV (currency, usd_rate)
        #[arg(long)]
        fx: String,
        /// Run identifier (default: current UTC time, YYYYMMDD_HHMMSS)
        #[arg(long = "run-id")]
        run_id: Option<String>,
        /// Write the report but do not append to the audit log
        #[arg(long = "no-persist")]
        no_persist: bool,
        /// Exit with status 2 when a HIGH severity check fails
        #[arg(long = "fail-on-error")]
        fail_on_error: bool,
    },
    /// Check a batch and print the results without writing anything.
    Check {
        #[arg(long)]
        transactions: String,
        #[arg(long)]
        fx: String,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Exit with status 2 when a HIGH severity check fails
        #[arg(long = "fail-on-error")]
        fail_on_error: bool,
    },
    /// Show recent audit log entries, newest first.
    History {
        /// Maximum number of entries
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
        /// Only show entries for this run
        #[arg(long = "run")]
        run_id: Option<String>,
    },
    /// List the built-in checks.
    Rules,
    /// Show settings and audit log statistics.
    Status,
    /// Back up the audit database.
    Backup {
        /// Output path (default: <data_dir>/backups/dq_audit-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
}

/// Opens the audit database under the data dir, creating both if needed.
pub(crate) fn open_store(settings: &Settings) -> Result<AuditStore> {
    std::fs::create_dir_all(settings.data_path())?;
    let store = AuditStore::open(&settings.db_path())?;
    store.ensure_schema()?;
    Ok(store)
}

pub(crate) fn results_table(results: &[CheckResult]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Check", "Status", "Severity", "Failed rows", "Sample ids"]);
    for r in results {
        table.add_row(vec![
            Cell::new(&r.check_name),
            Cell::new(status_label(r.status)),
            Cell::new(severity_label(r.severity)),
            Cell::new(r.failed_rows),
            Cell::new(r.sample_ids.join(", ")),
        ]);
    }
    table
}

pub(crate) fn history_table(entries: &[AuditLogEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Created (UTC)", "Run", "Check", "Status", "Severity", "Failed", "Samples"]);
    for e in entries {
        table.add_row(vec![
            Cell::new(short_stamp(&e.created_at_utc)),
            Cell::new(&e.run_id),
            Cell::new(&e.check_name),
            Cell::new(status_label(e.status)),
            Cell::new(severity_label(e.severity)),
            Cell::new(e.failed_rows),
            Cell::new(e.sample_id_list().join(", ")),
        ]);
    }
    table
}
