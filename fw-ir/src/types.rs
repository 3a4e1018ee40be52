use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// --- Brands and roles ---

/// Vehicle manufacturer family. Each brand has its own query configuration
/// and firmware string layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Hyundai,
    Mazda,
    Tesla,
}

impl Brand {
    pub const ALL: [Brand; 3] = [Brand::Hyundai, Brand::Mazda, Brand::Tesla];

    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Hyundai => "hyundai",
            Brand::Mazda => "mazda",
            Brand::Tesla => "tesla",
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Brand {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Brand::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseNameError::new("brand", s))
    }
}

/// Logical role of an ECU on the diagnostic bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EcuRole {
    Engine,
    Eps,
    Abs,
    FwdRadar,
    FwdCamera,
    Transmission,
    Hybrid,
    Srs,
    Gateway,
    Hud,
    CombinationMeter,
    ElectricBrakeBooster,
    ShiftByWire,
    Adas,
    CornerRadar,
    Hvac,
    ParkingAdas,
    Vsa,
    ProgrammedFuelInjection,
    Telematics,
    Body,
    Unknown,
}

impl EcuRole {
    pub const ALL: [EcuRole; 22] = [
        EcuRole::Engine,
        EcuRole::Eps,
        EcuRole::Abs,
        EcuRole::FwdRadar,
        EcuRole::FwdCamera,
        EcuRole::Transmission,
        EcuRole::Hybrid,
        EcuRole::Srs,
        EcuRole::Gateway,
        EcuRole::Hud,
        EcuRole::CombinationMeter,
        EcuRole::ElectricBrakeBooster,
        EcuRole::ShiftByWire,
        EcuRole::Adas,
        EcuRole::CornerRadar,
        EcuRole::Hvac,
        EcuRole::ParkingAdas,
        EcuRole::Vsa,
        EcuRole::ProgrammedFuelInjection,
        EcuRole::Telematics,
        EcuRole::Body,
        EcuRole::Unknown,
    ];

    /// Name as written in database files (`fwdRadar`, `electricBrakeBooster`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EcuRole::Engine => "engine",
            EcuRole::Eps => "eps",
            EcuRole::Abs => "abs",
            EcuRole::FwdRadar => "fwdRadar",
            EcuRole::FwdCamera => "fwdCamera",
            EcuRole::Transmission => "transmission",
            EcuRole::Hybrid => "hybrid",
            EcuRole::Srs => "srs",
            EcuRole::Gateway => "gateway",
            EcuRole::Hud => "hud",
            EcuRole::CombinationMeter => "combinationMeter",
            EcuRole::ElectricBrakeBooster => "electricBrakeBooster",
            EcuRole::ShiftByWire => "shiftByWire",
            EcuRole::Adas => "adas",
            EcuRole::CornerRadar => "cornerRadar",
            EcuRole::Hvac => "hvac",
            EcuRole::ParkingAdas => "parkingAdas",
            EcuRole::Vsa => "vsa",
            EcuRole::ProgrammedFuelInjection => "programmedFuelInjection",
            EcuRole::Telematics => "telematics",
            EcuRole::Body => "body",
            EcuRole::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EcuRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EcuRole {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EcuRole::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseNameError::new("ECU role", s))
    }
}

/// Error for an unrecognised brand or role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseNameError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// One logical ECU slot on the vehicle's diagnostic bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EcuIdentity {
    pub role: EcuRole,
    pub address: u32,
    pub sub_address: Option<u8>,
}

impl EcuIdentity {
    pub fn new(role: EcuRole, address: u32, sub_address: Option<u8>) -> Self {
        Self {
            role,
            address,
            sub_address,
        }
    }
}

impl fmt::Display for EcuIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub_address {
            Some(sub) => write!(f, "{}@0x{:x}.0x{:02x}", self.role, self.address, sub),
            None => write!(f, "{}@0x{:x}", self.role, self.address),
        }
    }
}

// --- Platforms ---

/// Identifier of one vehicle platform, e.g. `HYUNDAI_GENESIS`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Platform(String);

impl Platform {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Platform {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Per-platform capability markers.
///
/// `CanFd` marks the newer bus generation whose ECUs are only reachable
/// through auxiliary requests. The remaining flags mirror the brand's CAN
/// feature lists and must never be set on a CAN-FD platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformFlag {
    CanFd,
    Ev,
    Hybrid,
    CameraScc,
    LegacySafetyMode,
    ChecksumCrc8,
    #[serde(rename = "checksum_6b")]
    Checksum6b,
    TcuGears,
    ClusterGears,
    ElectricGears,
}

impl PlatformFlag {
    pub const ALL: [PlatformFlag; 10] = [
        PlatformFlag::CanFd,
        PlatformFlag::Ev,
        PlatformFlag::Hybrid,
        PlatformFlag::CameraScc,
        PlatformFlag::LegacySafetyMode,
        PlatformFlag::ChecksumCrc8,
        PlatformFlag::Checksum6b,
        PlatformFlag::TcuGears,
        PlatformFlag::ClusterGears,
        PlatformFlag::ElectricGears,
    ];

    /// Whether this flag only makes sense for the legacy CAN generation.
    pub fn is_legacy_can_only(&self) -> bool {
        match self {
            PlatformFlag::CanFd | PlatformFlag::Ev | PlatformFlag::Hybrid => false,
            PlatformFlag::CameraScc
            | PlatformFlag::LegacySafetyMode
            | PlatformFlag::ChecksumCrc8
            | PlatformFlag::Checksum6b
            | PlatformFlag::TcuGears
            | PlatformFlag::ClusterGears
            | PlatformFlag::ElectricGears => true,
        }
    }
}

impl PlatformFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFlag::CanFd => "can_fd",
            PlatformFlag::Ev => "ev",
            PlatformFlag::Hybrid => "hybrid",
            PlatformFlag::CameraScc => "camera_scc",
            PlatformFlag::LegacySafetyMode => "legacy_safety_mode",
            PlatformFlag::ChecksumCrc8 => "checksum_crc8",
            PlatformFlag::Checksum6b => "checksum_6b",
            PlatformFlag::TcuGears => "tcu_gears",
            PlatformFlag::ClusterGears => "cluster_gears",
            PlatformFlag::ElectricGears => "electric_gears",
        }
    }
}

impl fmt::Display for PlatformFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFlag {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformFlag::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ParseNameError::new("platform flag", s))
    }
}

// --- Firmware ---

/// A raw firmware version string as read from an ECU.
///
/// Usually fixed-width, null-padded ASCII, but arbitrary bytes are allowed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FirmwareVersion(Vec<u8>);

impl FirmwareVersion {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode a string where every character is one byte (`U+0000..=U+00FF`).
    ///
    /// Returns `None` if any character is above `U+00FF`.
    pub fn from_latin1(s: &str) -> Option<Self> {
        s.chars()
            .map(|c| u8::try_from(u32::from(c)).ok())
            .collect::<Option<Vec<u8>>>()
            .map(Self)
    }

    /// Inverse of [`FirmwareVersion::from_latin1`].
    pub fn to_latin1(&self) -> String {
        self.0.iter().map(|&b| char::from(b)).collect()
    }

    /// Parse a backslash-escaped string such as `\xf1\x00DH LKAS 1.1 -150210`.
    ///
    /// Supported escapes: `\xNN`, `\0`, `\t`, `\n`, `\r`, `\\`, `\"`, `\'`.
    /// Other characters above `U+00FF` are rejected.
    pub fn parse_escaped(s: &str) -> Result<Self, EscapeError> {
        let mut out = Vec::with_capacity(s.len());
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                let b = u8::try_from(u32::from(c)).map_err(|_| EscapeError::NonByteChar(c))?;
                out.push(b);
                continue;
            }
            match chars.next() {
                Some('x') => {
                    let hex: String = chars.by_ref().take(2).collect();
                    if hex.chars().count() != 2 {
                        return Err(EscapeError::ShortHex(hex));
                    }
                    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                        return Err(EscapeError::BadHex(hex));
                    }
                    let b = u8::from_str_radix(&hex, 16).map_err(|_| EscapeError::BadHex(hex))?;
                    out.push(b);
                }
                Some('0') => out.push(0),
                Some('t') => out.push(b'\t'),
                Some('n') => out.push(b'\n'),
                Some('r') => out.push(b'\r'),
                Some(c @ ('\\' | '"' | '\'')) => out.push(c as u8),
                Some(other) => return Err(EscapeError::UnknownEscape(other)),
                None => return Err(EscapeError::TrailingBackslash),
            }
        }
        Ok(Self(out))
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"{}\"", self.0.escape_ascii())
    }
}

impl From<&[u8]> for FirmwareVersion {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for FirmwareVersion {
    fn from(bytes: &[u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for FirmwareVersion {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// Ordering and hashing of `Vec<u8>` agree with `[u8]`, so sets of versions
// can be queried with raw byte slices.
impl Borrow<[u8]> for FirmwareVersion {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for FirmwareVersion {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscapeError {
    #[error("character '{0}' is not a single byte")]
    NonByteChar(char),
    #[error("incomplete \\x escape '{0}'")]
    ShortHex(String),
    #[error("invalid hex digits in \\x escape '{0}'")]
    BadHex(String),
    #[error("unknown escape '\\{0}'")]
    UnknownEscape(char),
    #[error("trailing backslash")]
    TrailingBackslash,
}

/// The firmware versions known for one ECU identity on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareRecord {
    versions: BTreeSet<FirmwareVersion>,
}

impl FirmwareRecord {
    /// Build a record; returns `None` when `versions` is empty.
    pub fn new(versions: impl IntoIterator<Item = FirmwareVersion>) -> Option<Self> {
        let versions: BTreeSet<FirmwareVersion> = versions.into_iter().collect();
        if versions.is_empty() {
            None
        } else {
            Some(Self { versions })
        }
    }

    pub fn contains(&self, raw: &[u8]) -> bool {
        self.versions.contains(raw)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FirmwareVersion> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Everything the database knows about a single platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEntry {
    pub(crate) brand: Brand,
    pub(crate) flags: BTreeSet<PlatformFlag>,
    pub(crate) ecus: BTreeMap<EcuIdentity, FirmwareRecord>,
}

impl PlatformEntry {
    pub fn brand(&self) -> Brand {
        self.brand
    }

    pub fn flags(&self) -> &BTreeSet<PlatformFlag> {
        &self.flags
    }

    pub fn has_flag(&self, flag: PlatformFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn get(&self, identity: &EcuIdentity) -> Option<&FirmwareRecord> {
        self.ecus.get(identity)
    }

    pub fn ecus(&self) -> impl Iterator<Item = (&EcuIdentity, &FirmwareRecord)> {
        self.ecus.iter()
    }

    /// Distinct roles present in this entry.
    pub fn roles(&self) -> BTreeSet<EcuRole> {
        self.ecus.keys().map(|id| id.role).collect()
    }
}

/// Exception lists maintained next to a brand's data and consumed by the
/// consistency checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckRules {
    /// Platforms expected to stay ambiguous under platform-code matching.
    pub ambiguous_platforms: BTreeSet<Platform>,
    /// Platforms whose firmware carries no part numbers at all.
    pub part_number_exempt: BTreeSet<Platform>,
    /// Platforms allowed to lack a given platform-code ECU role.
    pub platform_code_ecu_exempt: BTreeMap<EcuRole, BTreeSet<Platform>>,
}

impl CheckRules {
    pub fn is_code_ecu_exempt(&self, role: EcuRole, platform: &Platform) -> bool {
        self.platform_code_ecu_exempt
            .get(&role)
            .is_some_and(|set| set.contains(platform))
    }

    /// Every platform named anywhere in the rules.
    pub fn referenced_platforms(&self) -> BTreeSet<&Platform> {
        self.ambiguous_platforms
            .iter()
            .chain(&self.part_number_exempt)
            .chain(self.platform_code_ecu_exempt.values().flatten())
            .collect()
    }
}

/// The static firmware catalog: `Platform -> PlatformEntry`.
///
/// Built once through [`crate::DatabaseBuilder`] and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirmwareDatabase {
    pub(crate) platforms: BTreeMap<Platform, PlatformEntry>,
    pub(crate) rules: BTreeMap<Brand, CheckRules>,
}

impl FirmwareDatabase {
    pub fn get(&self, platform: &Platform, identity: &EcuIdentity) -> Option<&FirmwareRecord> {
        self.platforms.get(platform).and_then(|e| e.get(identity))
    }

    pub fn entry(&self, platform: &Platform) -> Option<&PlatformEntry> {
        self.platforms.get(platform)
    }

    pub fn all_platforms(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Platform, &PlatformEntry)> {
        self.platforms.iter()
    }

    /// ECU identities catalogued for `platform` (empty for unknown platforms).
    pub fn ecus_for(&self, platform: &Platform) -> BTreeSet<EcuIdentity> {
        self.platforms
            .get(platform)
            .map(|e| e.ecus.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn platforms_for(&self, brand: Brand) -> impl Iterator<Item = (&Platform, &PlatformEntry)> {
        self.platforms.iter().filter(move |(_, e)| e.brand == brand)
    }

    pub fn brand_of(&self, platform: &Platform) -> Option<Brand> {
        self.platforms.get(platform).map(|e| e.brand)
    }

    pub fn flags_of(&self, platform: &Platform) -> Option<&BTreeSet<PlatformFlag>> {
        self.platforms.get(platform).map(|e| &e.flags)
    }

    pub fn check_rules(&self, brand: Brand) -> Option<&CheckRules> {
        self.rules.get(&brand)
    }

    /// Brands with at least one platform.
    pub fn brands(&self) -> BTreeSet<Brand> {
        self.platforms.values().map(|e| e.brand).collect()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Total number of stored firmware strings.
    pub fn firmware_count(&self) -> usize {
        self.platforms
            .values()
            .flat_map(|e| e.ecus.values())
            .map(FirmwareRecord::len)
            .sum()
    }
}
