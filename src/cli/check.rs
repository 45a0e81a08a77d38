use std::path::Path;

use crate::checks::{high_failures, CheckEngine};
use crate::cli::results_table;
use crate::error::{AuditError, Result};
use crate::loader::load_all;

pub fn run(transactions: &str, fx: &str, json: bool, fail_on_error: bool) -> Result<()> {
    let records = load_all(Path::new(transactions), Path::new(fx))?;
    let results = CheckEngine::new().run_all(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("Scanned {} transactions", records.transactions.len());
        println!("{}", results_table(&results));
    }

    let high = high_failures(&results);
    if fail_on_error && high > 0 {
        return Err(AuditError::ChecksFailed(high));
    }
    Ok(())
}
