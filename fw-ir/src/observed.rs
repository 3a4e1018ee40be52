use crate::types::{Brand, EcuIdentity, EcuRole, FirmwareVersion, PlatformEntry};
use std::collections::{BTreeMap, BTreeSet};

/// One firmware response as reported by the bus query collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareReading {
    pub ecu: EcuRole,
    pub address: u32,
    /// Collaborators report "no sub-address" as `Some(0)`.
    pub sub_address: Option<u8>,
    pub fw_version: FirmwareVersion,
    /// Brand whose query produced this reading, if known.
    pub brand: Option<Brand>,
    /// Readings gathered for logging only never take part in matching.
    pub logging: bool,
}

impl FirmwareReading {
    /// Database key of this reading. Sub-address 0 means none.
    pub fn identity(&self) -> EcuIdentity {
        let sub_address = self.sub_address.filter(|&sub| sub != 0);
        EcuIdentity::new(self.ecu, self.address, sub_address)
    }
}

/// Firmware observed on one vehicle: `EcuIdentity -> [firmware]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedFirmware {
    ecus: BTreeMap<EcuIdentity, BTreeSet<FirmwareVersion>>,
}

impl ObservedFirmware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: EcuIdentity, version: FirmwareVersion) {
        self.ecus.entry(identity).or_default().insert(version);
    }

    /// Build from raw readings.
    ///
    /// Logging-only readings, empty firmware strings and, when `brand` is
    /// given, readings of other brands are skipped.
    pub fn from_readings<'a>(
        readings: impl IntoIterator<Item = &'a FirmwareReading>,
        brand: Option<Brand>,
    ) -> Self {
        let mut observed = Self::new();
        for r in readings {
            if r.logging || r.fw_version.is_empty() {
                continue;
            }
            if let (Some(want), Some(got)) = (brand, r.brand) {
                if want != got {
                    continue;
                }
            }
            observed.insert(r.identity(), r.fw_version.clone());
        }
        observed
    }

    /// Observation containing every firmware string stored for a platform.
    pub fn from_entry(entry: &PlatformEntry) -> Self {
        let mut observed = Self::new();
        for (identity, record) in entry.ecus() {
            for v in record.iter() {
                observed.insert(*identity, v.clone());
            }
        }
        observed
    }

    pub fn get(&self, identity: &EcuIdentity) -> Option<&BTreeSet<FirmwareVersion>> {
        self.ecus.get(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EcuIdentity, &BTreeSet<FirmwareVersion>)> {
        self.ecus.iter()
    }

    /// All observed firmware strings for ECUs whose role passes `keep`.
    pub fn versions_where(&self, keep: impl Fn(EcuRole) -> bool) -> impl Iterator<Item = &FirmwareVersion> {
        self.ecus
            .iter()
            .filter(move |(id, _)| keep(id.role))
            .flat_map(|(_, versions)| versions.iter())
    }

    pub fn len(&self) -> usize {
        self.ecus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ecus.is_empty()
    }
}

impl FromIterator<(EcuIdentity, FirmwareVersion)> for ObservedFirmware {
    fn from_iter<T: IntoIterator<Item = (EcuIdentity, FirmwareVersion)>>(iter: T) -> Self {
        let mut observed = Self::new();
        for (identity, version) in iter {
            observed.insert(identity, version);
        }
        observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(brand: Option<Brand>, logging: bool, fw: &[u8]) -> FirmwareReading {
        FirmwareReading {
            ecu: EcuRole::FwdCamera,
            address: 0x7c4,
            sub_address: None,
            fw_version: FirmwareVersion::from(fw),
            brand,
            logging,
        }
    }

    #[test]
    fn test_from_readings_filters_brand_and_logging() {
        let readings = vec![
            reading(Some(Brand::Hyundai), false, b"a"),
            reading(Some(Brand::Mazda), false, b"b"),
            reading(Some(Brand::Hyundai), true, b"c"),
            reading(None, false, b"d"),
            reading(Some(Brand::Hyundai), false, b""),
        ];
        let observed = ObservedFirmware::from_readings(&readings, Some(Brand::Hyundai));
        let id = EcuIdentity::new(EcuRole::FwdCamera, 0x7c4, None);
        let got: Vec<&[u8]> = observed.get(&id).unwrap().iter().map(FirmwareVersion::as_bytes).collect();
        assert_eq!(got, vec![b"a".as_slice(), b"d".as_slice()]);
    }

    #[test]
    fn test_from_readings_without_filter_keeps_all_brands() {
        let readings = vec![
            reading(Some(Brand::Hyundai), false, b"a"),
            reading(Some(Brand::Mazda), false, b"b"),
        ];
        let observed = ObservedFirmware::from_readings(&readings, None);
        assert_eq!(observed.iter().map(|(_, v)| v.len()).sum::<usize>(), 2);
    }

    #[test]
    fn test_zero_sub_address_means_none() {
        let mut zero = reading(Some(Brand::Hyundai), false, b"a");
        zero.sub_address = Some(0);
        let mut real = reading(Some(Brand::Hyundai), false, b"b");
        real.sub_address = Some(0x0f);

        assert_eq!(zero.identity(), EcuIdentity::new(EcuRole::FwdCamera, 0x7c4, None));
        assert_eq!(real.identity().sub_address, Some(0x0f));

        let observed = ObservedFirmware::from_readings(&[zero, real], None);
        assert!(observed.get(&EcuIdentity::new(EcuRole::FwdCamera, 0x7c4, None)).is_some());
        assert_eq!(observed.len(), 2);
    }
}
