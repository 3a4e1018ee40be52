//! Platform resolution: exact firmware matching with a platform-code
//! fallback.
//!
//! The exact phase accepts a platform when every ECU identity the vehicle
//! and the platform share has at least one byte-identical firmware string.
//! When that does not single out one platform, the fuzzy phase compares the
//! platform codes of the vehicle's eligible ECUs with the precomputed
//! [`SignatureIndex`].

use crate::config::{ConfigurationError, QueryRegistry};
use crate::signature::SignatureIndex;
use fw_ir::*;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no firmware was observed")]
    EmptyObserved,
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Which matching phases may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub allow_exact: bool,
    pub allow_fuzzy: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            allow_exact: true,
            allow_fuzzy: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchMethod {
    Exact,
    Fuzzy,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::Exact => f.write_str("exact"),
            MatchMethod::Fuzzy => f.write_str("fuzzy"),
        }
    }
}

/// Outcome of one identification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    Resolved {
        platform: Platform,
        method: MatchMethod,
    },
    /// Several platforms fit; none may be picked.
    Ambiguous {
        candidates: BTreeSet<Platform>,
        method: MatchMethod,
    },
    Unidentified,
}

impl Identification {
    fn from_candidates(mut candidates: BTreeSet<Platform>, method: MatchMethod) -> Self {
        match candidates.len() {
            0 => Identification::Unidentified,
            1 => match candidates.pop_first() {
                Some(platform) => Identification::Resolved { platform, method },
                None => Identification::Unidentified,
            },
            _ => Identification::Ambiguous { candidates, method },
        }
    }

    pub fn platform(&self) -> Option<&Platform> {
        match self {
            Identification::Resolved { platform, .. } => Some(platform),
            _ => None,
        }
    }

    pub fn method(&self) -> Option<MatchMethod> {
        match self {
            Identification::Resolved { method, .. } | Identification::Ambiguous { method, .. } => {
                Some(*method)
            }
            Identification::Unidentified => None,
        }
    }

    /// The candidate set: empty, a singleton or several platforms.
    pub fn candidates(&self) -> BTreeSet<Platform> {
        match self {
            Identification::Resolved { platform, .. } => BTreeSet::from([platform.clone()]),
            Identification::Ambiguous { candidates, .. } => candidates.clone(),
            Identification::Unidentified => BTreeSet::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Identification::Resolved { .. })
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identification::Resolved { platform, method } => write!(f, "{platform} ({method})"),
            Identification::Ambiguous { candidates, method } => {
                let names: Vec<&str> = candidates.iter().map(Platform::as_str).collect();
                write!(f, "ambiguous ({method}): {}", names.join(", "))
            }
            Identification::Unidentified => f.write_str("unidentified"),
        }
    }
}

/// Resolves observed firmware against one database and registry.
///
/// Immutable once built and safe to share across threads.
#[derive(Debug)]
pub struct Matcher<'a> {
    db: &'a FirmwareDatabase,
    registry: &'a QueryRegistry,
    index: SignatureIndex,
}

impl<'a> Matcher<'a> {
    /// Build a matcher, rejecting CAN-FD platforms with ECU roles no
    /// auxiliary request reaches.
    pub fn new(db: &'a FirmwareDatabase, registry: &'a QueryRegistry) -> Result<Self, SchemaError> {
        for (platform, entry) in db.entries() {
            if !entry.has_flag(PlatformFlag::CanFd) {
                continue;
            }
            let Ok(config) = registry.get(entry.brand()) else {
                continue;
            };
            let whitelist = config.auxiliary_whitelist();
            if let Some(role) = entry.roles().into_iter().find(|r| !whitelist.contains(r)) {
                return Err(SchemaError::UncoveredAuxiliaryRole {
                    brand: entry.brand(),
                    platform: platform.clone(),
                    role,
                });
            }
        }
        Ok(Self::unchecked(db, registry))
    }

    /// Build without the auxiliary coverage check, for offline validation.
    pub(crate) fn unchecked(db: &'a FirmwareDatabase, registry: &'a QueryRegistry) -> Self {
        Self {
            db,
            registry,
            index: SignatureIndex::build(db, registry),
        }
    }

    /// Platforms of `brand` whose catalog agrees with every shared identity.
    pub fn exact(&self, observed: &ObservedFirmware, brand: Brand) -> Result<BTreeSet<Platform>, ResolveError> {
        self.check_input(observed, brand)?;
        Ok(self.exact_candidates(observed, brand))
    }

    /// Platforms of `brand` sharing a platform code with the vehicle.
    pub fn fuzzy(&self, observed: &ObservedFirmware, brand: Brand) -> Result<BTreeSet<Platform>, ResolveError> {
        self.check_input(observed, brand)?;
        self.fuzzy_candidates(observed, brand)
    }

    /// Candidate set with default options.
    pub fn resolve(&self, observed: &ObservedFirmware, brand: Brand) -> Result<BTreeSet<Platform>, ResolveError> {
        Ok(self.identify(observed, brand, MatchOptions::default())?.candidates())
    }

    pub fn identify(
        &self,
        observed: &ObservedFirmware,
        brand: Brand,
        options: MatchOptions,
    ) -> Result<Identification, ResolveError> {
        self.check_input(observed, brand)?;

        let exact = if options.allow_exact {
            self.exact_candidates(observed, brand)
        } else {
            BTreeSet::new()
        };
        log::debug!("{brand}: exact phase matched {} platform(s)", exact.len());

        let (candidates, method) = if exact.len() == 1 || !options.allow_fuzzy {
            (exact, MatchMethod::Exact)
        } else {
            let fuzzy = self.fuzzy_candidates(observed, brand)?;
            log::debug!("{brand}: fuzzy phase matched {} platform(s)", fuzzy.len());
            if exact.is_empty() {
                (fuzzy, MatchMethod::Fuzzy)
            } else {
                let narrowed: BTreeSet<Platform> = exact.intersection(&fuzzy).cloned().collect();
                if narrowed.is_empty() || narrowed.len() == exact.len() {
                    (exact, MatchMethod::Exact)
                } else {
                    (narrowed, MatchMethod::Fuzzy)
                }
            }
        };

        let result = Identification::from_candidates(candidates, method);
        if let Identification::Ambiguous { candidates, .. } = &result {
            log::warn!("{brand}: inconclusive match between {} platforms", candidates.len());
        }
        Ok(result)
    }

    /// Resolve without knowing the brand: exact across every registered
    /// brand first, platform codes only if nothing matched exactly.
    pub fn resolve_any(
        &self,
        observed: &ObservedFirmware,
        options: MatchOptions,
    ) -> Result<BTreeSet<Platform>, ResolveError> {
        Ok(self.identify_any(observed, options)?.candidates())
    }

    pub fn identify_any(
        &self,
        observed: &ObservedFirmware,
        options: MatchOptions,
    ) -> Result<Identification, ResolveError> {
        if observed.is_empty() {
            return Err(ResolveError::EmptyObserved);
        }
        if options.allow_exact {
            let exact: BTreeSet<Platform> = self
                .registry
                .brands()
                .flat_map(|brand| self.exact_candidates(observed, brand))
                .collect();
            if !exact.is_empty() {
                return Ok(Identification::from_candidates(exact, MatchMethod::Exact));
            }
        }
        if options.allow_fuzzy {
            let mut fuzzy = BTreeSet::new();
            for brand in self.registry.brands() {
                fuzzy.extend(self.fuzzy_candidates(observed, brand)?);
            }
            return Ok(Identification::from_candidates(fuzzy, MatchMethod::Fuzzy));
        }
        Ok(Identification::Unidentified)
    }

    fn check_input(&self, observed: &ObservedFirmware, brand: Brand) -> Result<(), ResolveError> {
        if observed.is_empty() {
            return Err(ResolveError::EmptyObserved);
        }
        self.registry.get(brand)?;
        Ok(())
    }

    fn exact_candidates(&self, observed: &ObservedFirmware, brand: Brand) -> BTreeSet<Platform> {
        self.db
            .platforms_for(brand)
            .filter(|(_, entry)| matches_exactly(observed, entry))
            .map(|(platform, _)| platform.clone())
            .collect()
    }

    fn fuzzy_candidates(&self, observed: &ObservedFirmware, brand: Brand) -> Result<BTreeSet<Platform>, ResolveError> {
        let config = self.registry.get(brand)?;
        if !config.supports_fuzzy() {
            return Ok(BTreeSet::new());
        }
        let vehicle = config.fuzzy_get_platform_codes(
            observed
                .versions_where(|role| config.is_platform_code_ecu(role))
                .map(FirmwareVersion::as_bytes),
        );
        if vehicle.is_empty() {
            return Ok(BTreeSet::new());
        }
        Ok(self.index.candidates(brand, &vehicle))
    }
}

/// At least one shared identity, and every shared identity agrees.
fn matches_exactly(observed: &ObservedFirmware, entry: &PlatformEntry) -> bool {
    let mut shared = 0usize;
    for (identity, versions) in observed.iter() {
        let Some(record) = entry.get(identity) else {
            continue;
        };
        if !versions.iter().any(|v| record.contains(v.as_bytes())) {
            return false;
        }
        shared += 1;
    }
    shared > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(identity: EcuIdentity, fw: &[u8]) -> PlatformEntry {
        let mut b = DatabaseBuilder::new();
        let p = Platform::from("P");
        b.add_platform(p.clone(), Brand::Mazda, []).unwrap();
        b.add_firmware(&p, identity, [FirmwareVersion::from(fw)]).unwrap();
        b.build().unwrap().entry(&p).unwrap().clone()
    }

    #[test]
    fn test_unshared_identities_are_ignored() {
        let eps = EcuIdentity::new(EcuRole::Eps, 0x730, None);
        let engine = EcuIdentity::new(EcuRole::Engine, 0x7e0, None);
        let entry = entry_with(eps, b"a");
        let observed: ObservedFirmware = [
            (eps, FirmwareVersion::from(b"a")),
            (engine, FirmwareVersion::from(b"zzz")),
        ]
        .into_iter()
        .collect();
        assert!(matches_exactly(&observed, &entry));
    }

    #[test]
    fn test_no_shared_identity_is_no_match() {
        let eps = EcuIdentity::new(EcuRole::Eps, 0x730, None);
        let entry = entry_with(eps, b"a");
        let observed: ObservedFirmware =
            [(EcuIdentity::new(EcuRole::Eps, 0x731, None), FirmwareVersion::from(b"a"))]
                .into_iter()
                .collect();
        assert!(!matches_exactly(&observed, &entry));
    }

    #[test]
    fn test_one_of_several_observed_strings_suffices() {
        let eps = EcuIdentity::new(EcuRole::Eps, 0x730, None);
        let entry = entry_with(eps, b"a");
        let observed: ObservedFirmware = [
            (eps, FirmwareVersion::from(b"b")),
            (eps, FirmwareVersion::from(b"a")),
        ]
        .into_iter()
        .collect();
        assert!(matches_exactly(&observed, &entry));
    }

    #[test]
    fn test_identification_display() {
        let resolved = Identification::from_candidates(BTreeSet::from([Platform::from("A")]), MatchMethod::Exact);
        assert_eq!(resolved.to_string(), "A (exact)");
        let ambiguous = Identification::from_candidates(
            BTreeSet::from([Platform::from("A"), Platform::from("B")]),
            MatchMethod::Fuzzy,
        );
        assert_eq!(ambiguous.to_string(), "ambiguous (fuzzy): A, B");
        assert_eq!(Identification::Unidentified.to_string(), "unidentified");
    }
}
