//! YAML documents -> firmware database / observed readings.
//!
//! A database file holds one or more `---` separated documents, one per
//! brand. Each is deserialized into the YAML model and then fed through a
//! [`DatabaseBuilder`], so every structural rule of the database is enforced
//! at load time.

use crate::yaml_model::*;
use fw_ir::*;
use serde::Deserialize;
use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error)]
pub enum YamlParseError {
    #[error("YAML deserialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Parse every document in `yaml` and merge them into one database.
pub fn parse_database_yaml(yaml: &str) -> Result<FirmwareDatabase, YamlParseError> {
    let mut builder = DatabaseBuilder::new();
    let mut documents = 0usize;
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let doc = YamlDatabase::deserialize(document)?;
        add_document(&mut builder, &doc)?;
        documents += 1;
    }
    let db = builder.build()?;
    log::debug!(
        "parsed {documents} database document(s): {} platforms, {} firmware strings",
        db.len(),
        db.firmware_count()
    );
    Ok(db)
}

/// Merge several already parsed databases, e.g. one per brand file.
pub fn merge_databases(
    databases: impl IntoIterator<Item = FirmwareDatabase>,
) -> Result<FirmwareDatabase, SchemaError> {
    let mut builder = DatabaseBuilder::new();
    for db in databases {
        builder.extend(db)?;
    }
    builder.build()
}

fn add_document(builder: &mut DatabaseBuilder, doc: &YamlDatabase) -> Result<(), SchemaError> {
    if !doc.schema.is_empty() && doc.schema != SCHEMA_ID {
        return Err(SchemaError::invalid_value(
            "schema",
            format!("unsupported schema '{}', expected '{SCHEMA_ID}'", doc.schema),
        ));
    }
    let brand: Brand = doc
        .brand
        .parse()
        .map_err(|e: ParseNameError| SchemaError::invalid_value("brand", e.to_string()))?;

    for (name, platform) in &doc.platforms {
        let path = format!("platforms.{name}");
        let flags = platform
            .flags
            .iter()
            .map(|f| {
                f.parse::<PlatformFlag>()
                    .map_err(|e| SchemaError::invalid_value(format!("{path}.flags"), e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let id = Platform::new(name.as_str());
        builder.add_platform(id.clone(), brand, flags)?;

        for (i, ecu) in platform.ecus.iter().enumerate() {
            let ecu_path = format!("{path}.ecus[{i}]");
            let identity = parse_identity(&ecu.role, &ecu.address, ecu.sub_address.as_ref(), &ecu_path)?;
            let versions = ecu
                .firmware
                .iter()
                .enumerate()
                .map(|(j, s)| parse_firmware(s, &format!("{ecu_path}.firmware[{j}]")))
                .collect::<Result<Vec<_>, _>>()?;
            builder.add_firmware(&id, identity, versions)?;
        }
    }

    if let Some(checks) = &doc.checks {
        builder.set_rules(brand, parse_checks(checks)?)?;
    }
    Ok(())
}

fn parse_checks(checks: &YamlChecks) -> Result<CheckRules, SchemaError> {
    let mut rules = CheckRules {
        ambiguous_platforms: names(&checks.ambiguous_platforms),
        part_number_exempt: names(&checks.part_number_exempt),
        ..CheckRules::default()
    };
    for (role, platforms) in &checks.platform_code_ecu_exempt {
        let role: EcuRole = role.parse().map_err(|e: ParseNameError| {
            SchemaError::invalid_value("checks.platform_code_ecu_exempt", e.to_string())
        })?;
        rules
            .platform_code_ecu_exempt
            .insert(role, names(platforms));
    }
    Ok(rules)
}

fn names(list: &[String]) -> BTreeSet<Platform> {
    list.iter().map(|s| Platform::new(s.as_str())).collect()
}

fn parse_identity(
    role: &str,
    address: &serde_yaml::Value,
    sub_address: Option<&serde_yaml::Value>,
    path: &str,
) -> Result<EcuIdentity, SchemaError> {
    let role: EcuRole = role
        .parse()
        .map_err(|e: ParseNameError| SchemaError::invalid_value(format!("{path}.role"), e.to_string()))?;
    let address = parse_address(address, &format!("{path}.address"))?;
    let sub_address = match sub_address {
        None | Some(serde_yaml::Value::Null) => None,
        Some(v) => {
            let sub_path = format!("{path}.sub_address");
            let raw = parse_address(v, &sub_path)?;
            Some(u8::try_from(raw).map_err(|_| {
                SchemaError::invalid_value(sub_path, format!("0x{raw:x} does not fit in one byte"))
            })?)
        }
    };
    Ok(EcuIdentity::new(role, address, sub_address))
}

/// Parse an address given as an integer or a `0x`-prefixed string.
fn parse_address(value: &serde_yaml::Value, path: &str) -> Result<u32, SchemaError> {
    let parsed = match value {
        serde_yaml::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_yaml::Value::String(s) => {
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                u32::from_str_radix(hex, 16).ok()
            } else {
                s.parse::<u32>().ok()
            }
        }
        _ => None,
    };
    parsed.ok_or_else(|| SchemaError::invalid_value(path, format!("invalid address {value:?}")))
}

fn parse_firmware(s: &str, path: &str) -> Result<FirmwareVersion, SchemaError> {
    FirmwareVersion::from_latin1(s).ok_or_else(|| {
        SchemaError::invalid_value(path, "firmware string contains a character above U+00FF")
    })
}

/// Readings captured from one vehicle, as loaded from an observation file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedFile {
    pub brand: Option<Brand>,
    pub readings: Vec<FirmwareReading>,
}

impl ObservedFile {
    /// Matcher input: usable readings, filtered to the file's brand if set.
    pub fn to_observed(&self) -> ObservedFirmware {
        ObservedFirmware::from_readings(&self.readings, self.brand)
    }
}

/// Parse an observation file.
pub fn parse_observed_yaml(yaml: &str) -> Result<ObservedFile, YamlParseError> {
    let doc: YamlObserved = serde_yaml::from_str(yaml)?;
    let brand = doc
        .brand
        .as_deref()
        .map(|b| parse_brand(b, "brand"))
        .transpose()?;

    let mut readings = Vec::with_capacity(doc.firmware.len());
    for (i, r) in doc.firmware.iter().enumerate() {
        let path = format!("firmware[{i}]");
        let identity = parse_identity(&r.ecu, &r.address, r.sub_address.as_ref(), &path)?;
        readings.push(FirmwareReading {
            ecu: identity.role,
            address: identity.address,
            sub_address: identity.sub_address,
            fw_version: parse_firmware(&r.fw_version, &format!("{path}.fw_version"))?,
            brand: r
                .brand
                .as_deref()
                .map(|b| parse_brand(b, &format!("{path}.brand")))
                .transpose()?,
            logging: r.logging,
        });
    }
    Ok(ObservedFile { brand, readings })
}

fn parse_brand(s: &str, path: &str) -> Result<Brand, SchemaError> {
    s.parse()
        .map_err(|e: ParseNameError| SchemaError::invalid_value(path, e.to_string()))
}
