use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::load_database;

pub fn run_export(db_paths: &[PathBuf], output: &Path) -> Result<()> {
    let db = load_database(db_paths)?;
    let yaml = fw_yaml::write_database_yaml(&db).context("writing YAML")?;
    std::fs::write(output, &yaml).with_context(|| format!("writing {}", output.display()))?;

    log::info!("Written: {}", output.display());
    println!(
        "Exported {} platforms ({} firmware strings) -> {}",
        db.len(),
        db.firmware_count(),
        output.display()
    );
    Ok(())
}
