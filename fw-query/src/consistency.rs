//! Offline validation of a firmware database against the query registry.
//!
//! None of these checks run during identification; they are meant for CI and
//! for `fwprint check` after editing the data files.

use crate::config::{QueryConfig, QueryRegistry};
use crate::matcher::Matcher;
use fw_ir::*;
use std::collections::{BTreeMap, BTreeSet};

/// Severity of a consistency finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A consistency finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyIssue {
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl ConsistencyIssue {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if self.path.is_empty() {
            write!(f, "{prefix}: {}", self.message)
        } else {
            write!(f, "{prefix}: {}: {}", self.path, self.message)
        }
    }
}

/// Run every consistency check.
///
/// Returns a list of issues (errors and warnings). Empty means consistent.
pub fn check_database(db: &FirmwareDatabase, registry: &QueryRegistry) -> Vec<ConsistencyIssue> {
    let mut issues = Vec::new();

    check_registered_brands(db, registry, &mut issues);
    check_protocol_partition(db, &mut issues);
    check_auxiliary_coverage(db, registry, &mut issues);
    check_platform_code_ecus(db, registry, &mut issues);
    check_part_numbers(db, registry, &mut issues);
    check_date_formats(db, registry, &mut issues);
    check_fuzzy_ambiguity(db, registry, &mut issues);
    check_request_reachability(db, registry, &mut issues);
    check_extra_ecus(db, registry, &mut issues);

    log::debug!("consistency check finished with {} issue(s)", issues.len());
    issues
}

fn platform_path(platform: &Platform) -> String {
    format!("platforms/{platform}")
}

fn ecu_path(platform: &Platform, identity: &EcuIdentity) -> String {
    format!("platforms/{platform}/{identity}")
}

/// Iterate the platforms whose brand is registered, with their config.
fn configured<'a>(
    db: &'a FirmwareDatabase,
    registry: &'a QueryRegistry,
) -> impl Iterator<Item = (&'a Platform, &'a PlatformEntry, &'a QueryConfig)> {
    db.entries()
        .filter_map(|(platform, entry)| Some((platform, entry, registry.get(entry.brand()).ok()?)))
}

/// Every platform's brand must have a query configuration.
pub fn check_registered_brands(
    db: &FirmwareDatabase,
    registry: &QueryRegistry,
    issues: &mut Vec<ConsistencyIssue>,
) {
    for (platform, entry) in db.entries() {
        if !registry.contains(entry.brand()) {
            issues.push(ConsistencyIssue::error(
                platform_path(platform),
                format!("brand '{}' has no query configuration", entry.brand()),
            ));
        }
    }
}

/// CAN-FD platforms must not appear in any legacy-CAN feature list.
pub fn check_protocol_partition(db: &FirmwareDatabase, issues: &mut Vec<ConsistencyIssue>) {
    for (platform, entry) in db.entries() {
        if !entry.has_flag(PlatformFlag::CanFd) {
            continue;
        }
        for flag in entry.flags().iter().filter(|f| f.is_legacy_can_only()) {
            issues.push(ConsistencyIssue::error(
                platform_path(platform),
                format!("CAN-FD platform carries legacy CAN flag '{flag}'"),
            ));
        }
    }
}

/// Every ECU role of a CAN-FD platform must be reachable by an auxiliary
/// request.
pub fn check_auxiliary_coverage(
    db: &FirmwareDatabase,
    registry: &QueryRegistry,
    issues: &mut Vec<ConsistencyIssue>,
) {
    for (platform, entry, config) in configured(db, registry) {
        if !entry.has_flag(PlatformFlag::CanFd) {
            continue;
        }
        let whitelist = config.auxiliary_whitelist();
        for (identity, _) in entry.ecus() {
            if !whitelist.contains(&identity.role) {
                issues.push(ConsistencyIssue::error(
                    ecu_path(platform, identity),
                    format!(
                        "ECU role '{}' is not in any auxiliary request whitelist",
                        identity.role
                    ),
                ));
            }
        }
    }
}

/// Every platform-code role must be catalogued, except maintained
/// exemptions.
pub fn check_platform_code_ecus(
    db: &FirmwareDatabase,
    registry: &QueryRegistry,
    issues: &mut Vec<ConsistencyIssue>,
) {
    let no_rules = CheckRules::default();
    for (platform, entry, config) in configured(db, registry) {
        let rules = db.check_rules(entry.brand()).unwrap_or(&no_rules);
        let roles = entry.roles();
        for &role in &config.platform_code_ecus {
            let exempt = rules.is_code_ecu_exempt(role, platform);
            match (roles.contains(&role), exempt) {
                (false, false) => issues.push(ConsistencyIssue::error(
                    platform_path(platform),
                    format!("missing platform-code ECU '{role}'"),
                )),
                (true, true) => issues.push(ConsistencyIssue::warning(
                    platform_path(platform),
                    format!("exempt from platform-code ECU '{role}' but catalogues it"),
                )),
                _ => {}
            }
        }
    }
}

/// Stored platform-code-role firmware must contain a part number, except on
/// exempt platforms.
pub fn check_part_numbers(
    db: &FirmwareDatabase,
    registry: &QueryRegistry,
    issues: &mut Vec<ConsistencyIssue>,
) {
    for (platform, entry, config) in configured(db, registry) {
        if !config.has_part_number_pattern() {
            continue;
        }
        let exempt = db
            .check_rules(entry.brand())
            .is_some_and(|r| r.part_number_exempt.contains(platform));
        if exempt {
            continue;
        }
        for (identity, record) in entry.ecus() {
            if !config.is_platform_code_ecu(identity.role) {
                continue;
            }
            for fw in record.iter() {
                if config.find_part_number(fw.as_bytes()) == Some(false) {
                    issues.push(ConsistencyIssue::error(
                        ecu_path(platform, identity),
                        format!("no part number in firmware \"{fw}\""),
                    ));
                }
            }
        }
    }
}

/// Per platform and platform-code ECU, either every code is dated or none
/// is, and either every code has a part suffix or none has.
pub fn check_date_formats(
    db: &FirmwareDatabase,
    registry: &QueryRegistry,
    issues: &mut Vec<ConsistencyIssue>,
) {
    for (platform, entry, config) in configured(db, registry) {
        for (identity, record) in entry.ecus() {
            if !config.is_platform_code_ecu(identity.role) {
                continue;
            }
            let codes = config.fuzzy_get_platform_codes(record.iter().map(FirmwareVersion::as_bytes));
            let dated: BTreeSet<bool> = codes.iter().map(|c| c.date.is_some()).collect();
            let suffixed: BTreeSet<bool> = codes.iter().map(|c| c.has_part_suffix()).collect();
            if dated.len() > 1 {
                issues.push(ConsistencyIssue::error(
                    ecu_path(platform, identity),
                    "firmware mixes dated and undated platform codes",
                ));
            }
            if suffixed.len() > 1 {
                issues.push(ConsistencyIssue::error(
                    ecu_path(platform, identity),
                    "firmware mixes platform codes with and without part numbers",
                ));
            }
        }
    }
}

/// Fuzzy self-test: each platform's own firmware must resolve to exactly
/// itself by platform codes, except the maintained ambiguous list.
pub fn check_fuzzy_ambiguity(
    db: &FirmwareDatabase,
    registry: &QueryRegistry,
    issues: &mut Vec<ConsistencyIssue>,
) {
    let matcher = Matcher::unchecked(db, registry);
    let mut shared: BTreeMap<Brand, BTreeSet<Platform>> = BTreeMap::new();

    for (platform, entry, config) in configured(db, registry) {
        if !config.supports_fuzzy() {
            continue;
        }
        let observed = ObservedFirmware::from_entry(entry);
        let Ok(found) = matcher.fuzzy(&observed, entry.brand()) else {
            continue;
        };
        if found.len() == 1 {
            if !found.contains(platform) {
                let other: Vec<&str> = found.iter().map(Platform::as_str).collect();
                issues.push(ConsistencyIssue::error(
                    platform_path(platform),
                    format!("platform codes resolve to {}", other.join(", ")),
                ));
            }
        } else {
            shared.entry(entry.brand()).or_default().insert(platform.clone());
        }
    }

    for config in registry.configs().filter(|c| c.supports_fuzzy()) {
        let brand = config.brand;
        let actual = shared.remove(&brand).unwrap_or_default();
        let expected = db
            .check_rules(brand)
            .map(|r| r.ambiguous_platforms.clone())
            .unwrap_or_default();
        for platform in actual.difference(&expected) {
            issues.push(ConsistencyIssue::error(
                platform_path(platform),
                "platform codes are shared with another platform but the platform is not listed in ambiguous_platforms",
            ));
        }
        for platform in expected.difference(&actual) {
            issues.push(ConsistencyIssue::error(
                format!("checks/{brand}/ambiguous_platforms"),
                format!("'{platform}' now resolves uniquely and should be removed from the list"),
            ));
        }
    }
}

/// Every catalogued role must be answered by at least one request.
pub fn check_request_reachability(
    db: &FirmwareDatabase,
    registry: &QueryRegistry,
    issues: &mut Vec<ConsistencyIssue>,
) {
    let mut seen: BTreeSet<(Brand, EcuRole)> = BTreeSet::new();
    for (platform, entry, config) in configured(db, registry) {
        for role in entry.roles() {
            if !config.queries(role) && seen.insert((entry.brand(), role)) {
                issues.push(ConsistencyIssue::warning(
                    platform_path(platform),
                    format!("no {} request queries ECU role '{role}'", entry.brand()),
                ));
            }
        }
    }
}

/// Identities queried for logging only must never be catalogued.
pub fn check_extra_ecus(
    db: &FirmwareDatabase,
    registry: &QueryRegistry,
    issues: &mut Vec<ConsistencyIssue>,
) {
    for (platform, entry, config) in configured(db, registry) {
        for identity in &config.extra_ecus {
            if entry.get(identity).is_some() {
                issues.push(ConsistencyIssue::error(
                    ecu_path(platform, identity),
                    "logging-only ECU must not be catalogued",
                ));
            }
        }
    }
}
