//! Serde types matching the firmware database and observation YAML files.
//!
//! These mirror the on-disk layout only. Conversion to the `fw-ir` types,
//! including byte-string and address decoding, lives in parser.rs and
//! writer.rs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_ID: &str = "fwprint.firmware/v1";

/// One brand's database document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YamlDatabase {
    #[serde(default)]
    pub schema: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<YamlChecks>,
    #[serde(default)]
    pub platforms: BTreeMap<String, YamlPlatform>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YamlChecks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguous_platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub part_number_exempt: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub platform_code_ecu_exempt: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YamlPlatform {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default)]
    pub ecus: Vec<YamlEcu>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YamlEcu {
    pub role: String,
    /// Integer or `0x`-prefixed hex string.
    pub address: serde_yaml::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_address: Option<serde_yaml::Value>,
    /// Latin-1 strings: each character is one byte.
    #[serde(default)]
    pub firmware: Vec<String>,
}

/// A file of raw readings captured from one vehicle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YamlObserved {
    /// Only readings of this brand are used when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub firmware: Vec<YamlReading>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YamlReading {
    pub ecu: String,
    pub address: serde_yaml::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_address: Option<serde_yaml::Value>,
    pub fw_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub logging: bool,
}
