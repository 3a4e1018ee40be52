//! Firmware database -> YAML writer.
//!
//! Emits one document per brand, in brand order, separated by `---`, in the
//! same layout the parser reads. Addresses are written as `0x` strings.

use crate::yaml_model::*;
use fw_ir::*;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum YamlWriteError {
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Write a database to a YAML string.
pub fn write_database_yaml(db: &FirmwareDatabase) -> Result<String, YamlWriteError> {
    let mut out = String::new();
    for (i, brand) in db.brands().into_iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&serde_yaml::to_string(&brand_to_yaml(db, brand))?);
    }
    Ok(out)
}

fn brand_to_yaml(db: &FirmwareDatabase, brand: Brand) -> YamlDatabase {
    let platforms = db
        .platforms_for(brand)
        .map(|(platform, entry)| (platform.to_string(), platform_to_yaml(entry)))
        .collect();

    YamlDatabase {
        schema: SCHEMA_ID.to_string(),
        brand: brand.to_string(),
        checks: db.check_rules(brand).map(checks_to_yaml),
        platforms,
    }
}

fn platform_to_yaml(entry: &PlatformEntry) -> YamlPlatform {
    YamlPlatform {
        flags: entry.flags().iter().map(ToString::to_string).collect(),
        ecus: entry
            .ecus()
            .map(|(identity, record)| YamlEcu {
                role: identity.role.to_string(),
                address: hex_value(identity.address),
                sub_address: identity.sub_address.map(|s| hex_value(u32::from(s))),
                firmware: record.iter().map(FirmwareVersion::to_latin1).collect(),
            })
            .collect(),
    }
}

fn checks_to_yaml(rules: &CheckRules) -> YamlChecks {
    let names = |set: &std::collections::BTreeSet<Platform>| -> Vec<String> {
        set.iter().map(ToString::to_string).collect()
    };
    let platform_code_ecu_exempt: BTreeMap<String, Vec<String>> = rules
        .platform_code_ecu_exempt
        .iter()
        .map(|(role, platforms)| (role.to_string(), names(platforms)))
        .collect();

    YamlChecks {
        ambiguous_platforms: names(&rules.ambiguous_platforms),
        part_number_exempt: names(&rules.part_number_exempt),
        platform_code_ecu_exempt,
    }
}

fn hex_value(v: u32) -> serde_yaml::Value {
    serde_yaml::Value::String(format!("0x{v:x}"))
}
