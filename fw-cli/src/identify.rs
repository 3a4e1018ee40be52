use anyhow::{Context, Result, bail};
use fw_ir::{Brand, ObservedFirmware};
use fw_query::{Identification, MatchOptions, Matcher, QueryRegistry};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::{load_database, read_text};

pub fn run_identify(
    observed: &[PathBuf],
    db_paths: &[PathBuf],
    brand: Option<Brand>,
    allow_exact: bool,
    allow_fuzzy: bool,
) -> Result<()> {
    let db = load_database(db_paths)?;
    let registry = QueryRegistry::builtin();
    let matcher = Matcher::new(&db, &registry).context("building matcher")?;
    let options = MatchOptions {
        allow_exact,
        allow_fuzzy,
    };

    let results: Vec<(&PathBuf, Result<Identification>)> = observed
        .par_iter()
        .map(|path| (path, identify_file(&matcher, path, brand, options)))
        .collect();

    let mut failures = 0usize;
    for (path, result) in &results {
        match result {
            Ok(identification) => println!("{}: {identification}", path.display()),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {e:#}", path.display());
            }
        }
    }

    if failures > 0 {
        bail!(
            "{failures} of {} observation file{} could not be identified",
            results.len(),
            if results.len() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

fn identify_file(
    matcher: &Matcher<'_>,
    path: &Path,
    brand: Option<Brand>,
    options: MatchOptions,
) -> Result<Identification> {
    let text = read_text(path)?;
    let file = fw_yaml::parse_observed_yaml(&text)
        .with_context(|| format!("parsing {}", path.display()))?;

    let brand = brand.or(file.brand);
    let observed = ObservedFirmware::from_readings(&file.readings, brand);
    log::debug!(
        "{}: {} usable ECU identities of {} readings",
        path.display(),
        observed.len(),
        file.readings.len()
    );

    let identification = match brand {
        Some(brand) => matcher.identify(&observed, brand, options)?,
        None => matcher.identify_any(&observed, options)?,
    };
    Ok(identification)
}
