use anyhow::{Result, bail};
use fw_query::{QueryRegistry, Severity, check_database};
use std::path::PathBuf;

use crate::{load_database, read_text};

pub fn run_check(db_paths: &[PathBuf], quiet: bool, summary: bool) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    // Schema validation per file, before anything is merged
    for path in db_paths {
        let text = read_text(path)?;
        if let Err(issues) = fw_yaml::validate_yaml_schema(&text) {
            for issue in &issues {
                errors.push(format!("{}: schema: {issue}", path.display()));
            }
        }
    }

    // Consistency checks need a loadable database
    if errors.is_empty() {
        let db = load_database(db_paths)?;
        let registry = QueryRegistry::builtin();
        for issue in check_database(&db, &registry) {
            match issue.severity {
                Severity::Error => errors.push(issue.to_string()),
                Severity::Warning => warnings.push(issue.to_string()),
            }
        }
    }

    if !quiet && !summary {
        for w in &warnings {
            eprintln!("{w}");
        }
        for e in &errors {
            eprintln!("{e}");
        }
    }

    if errors.is_empty() {
        if !quiet {
            if warnings.is_empty() {
                println!("database: valid");
            } else {
                println!("database: valid, {} warning{}", warnings.len(), plural(warnings.len()));
            }
        }
        return Ok(());
    }

    if summary || !quiet {
        println!(
            "database: {} error{}, {} warning{}",
            errors.len(),
            plural(errors.len()),
            warnings.len(),
            plural(warnings.len())
        );
    }

    bail!("{} validation error{}", errors.len(), plural(errors.len()));
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
