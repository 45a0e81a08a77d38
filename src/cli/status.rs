use crate::audit::AuditStore;
use crate::error::Result;
use crate::fmt::{format_bytes, short_stamp};
use crate::settings::resolve;

pub fn run(data_dir: Option<&str>) -> Result<()> {
    let settings = resolve(data_dir);
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_path().display());
    println!("Database:   {}", db_path.display());
    println!("Reports:    {}", settings.reports_dir().display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let store = AuditStore::open(&db_path)?;
        store.ensure_schema()?;
        let entries = store.entry_count()?;
        let runs = store.run_count()?;

        println!();
        println!("Runs:          {runs}");
        println!("Log entries:   {entries}");
        if let Some(last) = store.history(1)?.first() {
            println!("Last run:      {} at {}", last.run_id, short_stamp(&last.created_at_utc));
        }
    } else {
        println!();
        println!("Database not found. Run `dq-audit init` to set up.");
    }

    Ok(())
}
