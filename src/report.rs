use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::loader::compute_checksum;
use crate::models::CheckResult;

#[derive(Debug, Clone, Serialize)]
pub struct InputFile {
    pub path: String,
    pub sha256: String,
}

impl InputFile {
    pub fn fingerprint(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_string_lossy().to_string(),
            sha256: compute_checksum(path)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Inputs {
    pub transactions: InputFile,
    pub fx_rates: InputFile,
}

/// JSON document written once per run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub scanned_rows: usize,
    pub generated_at_utc: String,
    pub inputs: Inputs,
    pub checks: Vec<CheckResult>,
}

impl RunReport {
    pub fn new(run_id: &str, scanned_rows: usize, inputs: Inputs, checks: Vec<CheckResult>) -> Self {
        Self {
            run_id: run_id.to_string(),
            scanned_rows,
            generated_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            inputs,
            checks,
        }
    }

    pub fn file_name(&self) -> String {
        format!("dq_report_{}.json", self.run_id)
    }

    pub fn write_to(&self, reports_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(reports_dir)?;
        let path = reports_dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, format!("{json}\n"))?;
        info!(path = %path.display(), "wrote report");
        Ok(path)
    }
}

pub fn generate_run_id(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}
