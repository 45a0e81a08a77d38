use crate::cli::open_store;
use crate::error::Result;
use crate::settings::{resolve, save_settings};

pub fn run(data_dir: Option<&str>) -> Result<()> {
    let settings = resolve(data_dir);
    save_settings(&settings)?;

    std::fs::create_dir_all(settings.reports_dir())?;
    open_store(&settings)?;

    println!("Initialized dq-audit at {}", settings.data_path().display());
    println!("Audit log:  {}", settings.db_path().display());
    Ok(())
}
