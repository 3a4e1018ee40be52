use crate::config::QueryRegistry;
use crate::extractor::PlatformCode;
use fw_ir::{Brand, FirmwareDatabase, FirmwareVersion, Platform};
use std::collections::{BTreeMap, BTreeSet};

/// Platform-code signatures of every catalogued platform, grouped by brand.
///
/// A platform's signature is the set of platform codes extracted from every
/// stored firmware string of its platform-code-eligible roles.
#[derive(Debug, Clone, Default)]
pub struct SignatureIndex {
    by_brand: BTreeMap<Brand, BTreeMap<Platform, BTreeSet<PlatformCode>>>,
}

impl SignatureIndex {
    /// Brands that are unregistered or have no extractor are left out.
    pub fn build(db: &FirmwareDatabase, registry: &QueryRegistry) -> Self {
        let mut by_brand = BTreeMap::new();
        for config in registry.configs().filter(|c| c.supports_fuzzy()) {
            let signatures: BTreeMap<Platform, BTreeSet<PlatformCode>> = db
                .platforms_for(config.brand)
                .map(|(platform, entry)| {
                    let versions = entry
                        .ecus()
                        .filter(|(id, _)| config.is_platform_code_ecu(id.role))
                        .flat_map(|(_, record)| record.iter().map(FirmwareVersion::as_bytes));
                    (platform.clone(), config.fuzzy_get_platform_codes(versions))
                })
                .collect();
            log::debug!(
                "{}: indexed platform codes of {} platforms",
                config.brand,
                signatures.len()
            );
            by_brand.insert(config.brand, signatures);
        }
        Self { by_brand }
    }

    pub fn signature(&self, brand: Brand, platform: &Platform) -> Option<&BTreeSet<PlatformCode>> {
        self.by_brand.get(&brand)?.get(platform)
    }

    /// Platforms of `brand` sharing at least one code with `vehicle`.
    pub fn candidates(&self, brand: Brand, vehicle: &BTreeSet<PlatformCode>) -> BTreeSet<Platform> {
        let Some(signatures) = self.by_brand.get(&brand) else {
            return BTreeSet::new();
        };
        signatures
            .iter()
            .filter(|(_, sig)| !sig.is_disjoint(vehicle))
            .map(|(platform, _)| platform.clone())
            .collect()
    }
}
