use std::path::PathBuf;

use crate::audit::AuditStore;
use crate::error::{AuditError, Result};
use crate::fmt::format_bytes;
use crate::settings::resolve;

pub fn run(data_dir: Option<&str>, output: Option<String>) -> Result<()> {
    let settings = resolve(data_dir);
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(AuditError::Settings(format!(
            "No audit database at {}",
            db_path.display()
        )));
    }
    let store = AuditStore::open(&db_path)?;

    let dest_path = match output {
        Some(p) => PathBuf::from(p),
        None => {
            let backups_dir = settings.data_path().join("backups");
            std::fs::create_dir_all(&backups_dir)?;
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            backups_dir.join(format!("dq_audit-{stamp}.db"))
        }
    };

    store.backup(&dest_path)?;

    let size = std::fs::metadata(&dest_path)?.len();
    println!("Backup saved to {}", dest_path.display());
    println!("Size: {}", format_bytes(size));
    Ok(())
}
