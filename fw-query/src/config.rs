//! Per-brand query policy: which diagnostic requests are sent, which ECUs
//! answer them, and how that brand's firmware strings are parsed.

use crate::brands;
use crate::extractor::{ExtractFn, PlatformCode};
use fw_ir::{Brand, EcuIdentity, EcuRole};
use regex::bytes::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// A brand has no query configuration registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no query configuration registered for brand '{0}'")]
    UnregisteredBrand(Brand),
}

/// One diagnostic request/response exchange and the ECUs expected to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Request frames, sent in order.
    pub request: Vec<Vec<u8>>,
    /// Expected response prefixes, one per request frame.
    pub response: Vec<Vec<u8>>,
    /// Roles queried by this request. Empty means every ECU on the bus.
    pub whitelist_ecus: BTreeSet<EcuRole>,
    pub bus: u8,
    /// Offset from request to response arbitration ID.
    pub rx_offset: u32,
    /// Sent on auxiliary buses, the only route to CAN-FD ECUs.
    pub auxiliary: bool,
}

impl RequestDescriptor {
    pub fn new(request: Vec<Vec<u8>>, response: Vec<Vec<u8>>) -> Self {
        Self {
            request,
            response,
            whitelist_ecus: BTreeSet::new(),
            bus: 1,
            rx_offset: 0x8,
            auxiliary: false,
        }
    }

    pub fn whitelist(mut self, roles: impl IntoIterator<Item = EcuRole>) -> Self {
        self.whitelist_ecus = roles.into_iter().collect();
        self
    }

    pub fn bus(mut self, bus: u8) -> Self {
        self.bus = bus;
        self
    }

    pub fn rx_offset(mut self, rx_offset: u32) -> Self {
        self.rx_offset = rx_offset;
        self
    }

    pub fn auxiliary(mut self) -> Self {
        self.auxiliary = true;
        self
    }

    /// Whether an ECU of `role` answers this request.
    pub fn queries(&self, role: EcuRole) -> bool {
        self.whitelist_ecus.is_empty() || self.whitelist_ecus.contains(&role)
    }
}

/// Everything the engine knows about querying and parsing one brand.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub brand: Brand,
    pub requests: Vec<RequestDescriptor>,
    /// Roles whose firmware carries a platform code.
    pub platform_code_ecus: BTreeSet<EcuRole>,
    /// Identities queried for logging only; never in the database.
    pub extra_ecus: Vec<EcuIdentity>,
    pub(crate) part_number: Option<&'static Regex>,
    pub(crate) extractor: Option<ExtractFn>,
}

impl QueryConfig {
    /// A config without platform-code support.
    pub fn new(brand: Brand, requests: Vec<RequestDescriptor>) -> Self {
        Self {
            brand,
            requests,
            platform_code_ecus: BTreeSet::new(),
            extra_ecus: Vec::new(),
            part_number: None,
            extractor: None,
        }
    }

    pub fn is_platform_code_ecu(&self, role: EcuRole) -> bool {
        self.platform_code_ecus.contains(&role)
    }

    /// Union of the whitelists of all auxiliary requests.
    pub fn auxiliary_whitelist(&self) -> BTreeSet<EcuRole> {
        self.requests
            .iter()
            .filter(|r| r.auxiliary)
            .flat_map(|r| r.whitelist_ecus.iter().copied())
            .collect()
    }

    /// Whether any request reaches an ECU of `role`.
    pub fn queries(&self, role: EcuRole) -> bool {
        self.requests.iter().any(|r| r.queries(role))
    }

    /// Whether this brand can be matched by platform codes at all.
    pub fn supports_fuzzy(&self) -> bool {
        self.extractor.is_some() && !self.platform_code_ecus.is_empty()
    }

    pub fn has_part_number_pattern(&self) -> bool {
        self.part_number.is_some()
    }

    /// `Some(found)` if the brand defines a part-number pattern.
    pub fn find_part_number(&self, raw: &[u8]) -> Option<bool> {
        self.part_number.map(|re| re.is_match(raw))
    }

    pub fn extract(&self, raw: &[u8]) -> Option<PlatformCode> {
        self.extractor.and_then(|f| f(raw))
    }

    /// Extract, drop unparsable strings and deduplicate.
    pub fn fuzzy_get_platform_codes<'a>(
        &self,
        versions: impl IntoIterator<Item = &'a [u8]>,
    ) -> BTreeSet<PlatformCode> {
        versions
            .into_iter()
            .filter_map(|raw| {
                let code = self.extract(raw);
                if code.is_none() {
                    log::trace!("{}: no platform code in {}", self.brand, raw.escape_ascii());
                }
                code
            })
            .collect()
    }
}

/// The query configs of every registered brand.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    configs: BTreeMap<Brand, QueryConfig>,
}

impl QueryRegistry {
    /// Registry with the built-in config of every known brand.
    pub fn builtin() -> Self {
        Self::with_brands(Brand::ALL)
    }

    pub fn with_brands(selected: impl IntoIterator<Item = Brand>) -> Self {
        let mut registry = Self::default();
        for brand in selected {
            registry.register(brands::config_for(brand));
        }
        registry
    }

    /// Add or replace a brand's config.
    pub fn register(&mut self, config: QueryConfig) {
        self.configs.insert(config.brand, config);
    }

    pub fn get(&self, brand: Brand) -> Result<&QueryConfig, ConfigurationError> {
        self.configs
            .get(&brand)
            .ok_or(ConfigurationError::UnregisteredBrand(brand))
    }

    pub fn contains(&self, brand: Brand) -> bool {
        self.configs.contains_key(&brand)
    }

    pub fn requests_for(&self, brand: Brand) -> Result<&[RequestDescriptor], ConfigurationError> {
        Ok(&self.get(brand)?.requests)
    }

    pub fn auxiliary_whitelist(&self, brand: Brand) -> Result<BTreeSet<EcuRole>, ConfigurationError> {
        Ok(self.get(brand)?.auxiliary_whitelist())
    }

    pub fn brands(&self) -> impl Iterator<Item = Brand> + '_ {
        self.configs.keys().copied()
    }

    pub fn configs(&self) -> impl Iterator<Item = &QueryConfig> {
        self.configs.values()
    }
}
