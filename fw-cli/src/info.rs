use anyhow::Result;
use fw_ir::PlatformFlag;
use fw_query::{PlatformCode, QueryRegistry, SignatureIndex};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::load_database;

pub fn run_info(db_paths: &[PathBuf]) -> Result<()> {
    let db = load_database(db_paths)?;
    let registry = QueryRegistry::builtin();
    let signatures = SignatureIndex::build(&db, &registry);

    for path in db_paths {
        println!("File:        {}", path.display());
    }
    println!("Platforms:   {}", db.len());
    println!("Firmware:    {}", db.firmware_count());

    for brand in db.brands() {
        let platforms: Vec<&str> = db.platforms_for(brand).map(|(p, _)| p.as_str()).collect();
        let ecus: usize = db.platforms_for(brand).map(|(_, e)| e.ecus().count()).sum();
        let canfd = db
            .platforms_for(brand)
            .filter(|(_, e)| e.has_flag(PlatformFlag::CanFd))
            .count();

        println!();
        println!("Brand:       {brand}");
        println!("Platforms:   {} ({})", platforms.len(), platforms.join(", "));
        println!("ECUs:        {ecus}");
        if canfd > 0 {
            println!("CAN-FD:      {canfd}");
        }
        match registry.get(brand) {
            Ok(config) => {
                println!("Requests:    {}", config.requests.len());
                println!(
                    "Fuzzy:       {}",
                    if config.supports_fuzzy() { "yes" } else { "no" }
                );
            }
            Err(e) => println!("Requests:    {e}"),
        }

        // Platform codes the fuzzy phase can match on
        let mut codes: BTreeSet<&PlatformCode> = BTreeSet::new();
        let mut uncoded: Vec<&str> = Vec::new();
        for (platform, _) in db.platforms_for(brand) {
            match signatures.signature(brand, platform) {
                Some(sig) if !sig.is_empty() => codes.extend(sig),
                Some(_) => uncoded.push(platform.as_str()),
                None => {}
            }
        }
        if !codes.is_empty() {
            println!("Codes:       {}", codes.len());
        }
        if !uncoded.is_empty() {
            println!("Uncoded:     {}", uncoded.join(", "));
        }
        if let Some(rules) = db.check_rules(brand) {
            if !rules.ambiguous_platforms.is_empty() {
                println!("Ambiguous:   {}", rules.ambiguous_platforms.len());
            }
        }
    }

    Ok(())
}
