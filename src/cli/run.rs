use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use tracing::info;

use crate::checks::{failed_count, high_failures, CheckEngine};
use crate::cli::{history_table, open_store, results_table};
use crate::error::{AuditError, Result};
use crate::loader::load_all;
use crate::report::{generate_run_id, InputFile, Inputs, RunReport};
use crate::settings::resolve;

pub fn run(
    data_dir: Option<&str>,
    transactions: &str,
    fx: &str,
    run_id: Option<String>,
    persist: bool,
    fail_on_error: bool,
) -> Result<()> {
    let settings = resolve(data_dir);
    let tx_path = Path::new(transactions);
    let fx_path = Path::new(fx);

    let records = load_all(tx_path, fx_path)?;
    let results = CheckEngine::new().run_all(&records);

    let run_id = run_id.unwrap_or_else(|| generate_run_id(Utc::now()));
    let inputs = Inputs {
        transactions: InputFile::fingerprint(tx_path)?,
        fx_rates: InputFile::fingerprint(fx_path)?,
    };
    let report = RunReport::new(&run_id, records.transactions.len(), inputs, results);
    let report_path = report.write_to(&settings.reports_dir())?;

    println!("Data Quality Report generated: {}", report_path.display());
    println!("{}", results_table(&report.checks));

    let failed = failed_count(&report.checks);
    if failed == 0 {
        println!("{}", format!("All {} checks passed", report.checks.len()).green());
    } else {
        println!("{}", format!("{failed} of {} checks failed", report.checks.len()).red());
    }

    if persist {
        let mut store = open_store(&settings)?;
        store.persist(&run_id, &report.checks)?;
        info!(run_id = run_id.as_str(), "run recorded");

        let recent = store.history(settings.summary_history)?;
        if !recent.is_empty() {
            println!("\nRecent audit history\n{}", history_table(&recent));
        }
    }

    let high = high_failures(&report.checks);
    if fail_on_error && high > 0 {
        return Err(AuditError::ChecksFailed(high));
    }
    Ok(())
}
