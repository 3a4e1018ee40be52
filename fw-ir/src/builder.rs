use crate::types::*;
use crate::validate::{SchemaError, validate_rules};
use std::collections::{BTreeMap, BTreeSet};

/// Incremental, fail-fast construction of a [`FirmwareDatabase`].
///
/// ```
/// use fw_ir::*;
///
/// let mut builder = DatabaseBuilder::new();
/// let platform = Platform::new("MAZDA_CX5");
/// builder.add_platform(platform.clone(), Brand::Mazda, []).unwrap();
/// builder
///     .add_firmware(
///         &platform,
///         EcuIdentity::new(EcuRole::Eps, 0x730, None),
///         [FirmwareVersion::from(b"K319-3210X-A-00")],
///     )
///     .unwrap();
/// let db = builder.build().unwrap();
/// assert_eq!(db.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    platforms: BTreeMap<Platform, PlatformEntry>,
    rules: BTreeMap<Brand, CheckRules>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_platform(
        &mut self,
        platform: Platform,
        brand: Brand,
        flags: impl IntoIterator<Item = PlatformFlag>,
    ) -> Result<(), SchemaError> {
        if self.platforms.contains_key(&platform) {
            return Err(SchemaError::DuplicatePlatform(platform));
        }
        self.platforms.insert(
            platform,
            PlatformEntry {
                brand,
                flags: flags.into_iter().collect(),
                ecus: BTreeMap::new(),
            },
        );
        Ok(())
    }

    pub fn add_firmware(
        &mut self,
        platform: &Platform,
        identity: EcuIdentity,
        versions: impl IntoIterator<Item = FirmwareVersion>,
    ) -> Result<(), SchemaError> {
        let entry = self
            .platforms
            .get_mut(platform)
            .ok_or_else(|| SchemaError::UnknownPlatform(platform.clone()))?;
        if entry.ecus.contains_key(&identity) {
            return Err(SchemaError::DuplicateIdentity {
                platform: platform.clone(),
                identity,
            });
        }
        let record = FirmwareRecord::new(versions).ok_or_else(|| SchemaError::EmptyFirmware {
            platform: platform.clone(),
            identity,
        })?;
        entry.ecus.insert(identity, record);
        Ok(())
    }

    pub fn set_rules(&mut self, brand: Brand, rules: CheckRules) -> Result<(), SchemaError> {
        if self.rules.contains_key(&brand) {
            return Err(SchemaError::DuplicateRules(brand));
        }
        self.rules.insert(brand, rules);
        Ok(())
    }

    /// Merge an already built database, e.g. one loaded from another brand file.
    pub fn extend(&mut self, db: FirmwareDatabase) -> Result<(), SchemaError> {
        for (platform, entry) in db.platforms {
            if self.platforms.contains_key(&platform) {
                return Err(SchemaError::DuplicatePlatform(platform));
            }
            self.platforms.insert(platform, entry);
        }
        for (brand, rules) in db.rules {
            self.set_rules(brand, rules)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<FirmwareDatabase, SchemaError> {
        if let Some((platform, _)) = self.platforms.iter().find(|(_, e)| e.ecus.is_empty()) {
            return Err(SchemaError::EmptyPlatform(platform.clone()));
        }
        for (brand, rules) in &self.rules {
            validate_rules(*brand, rules, |p| self.platforms.get(p).map(|e| e.brand))?;
        }

        let brands: BTreeSet<Brand> = self.platforms.values().map(|e| e.brand).collect();
        log::debug!(
            "built firmware database: {} platforms across {} brands",
            self.platforms.len(),
            brands.len()
        );

        Ok(FirmwareDatabase {
            platforms: self.platforms,
            rules: self.rules,
        })
    }
}
