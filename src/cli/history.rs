use crate::cli::{history_table, open_store};
use crate::error::Result;
use crate::settings::resolve;

pub fn run(data_dir: Option<&str>, limit: usize, run_id: Option<&str>) -> Result<()> {
    let settings = resolve(data_dir);
    let store = open_store(&settings)?;

    let entries = match run_id {
        Some(id) => store.run_entries(id)?,
        None => store.history(limit)?,
    };

    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    println!("Audit history\n{}", history_table(&entries));
    Ok(())
}
