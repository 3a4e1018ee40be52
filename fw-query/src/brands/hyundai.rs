//! Hyundai, Kia and Genesis.
//!
//! Firmware strings echo the `0xf100` identifier (`\xf1\x00`) followed by a
//! short platform code, e.g. `\xf1\x00LX2 MFC  AT USA LHD 1.00 1.07 99211-S8100 220222`.
//! Most also carry a part number after the software version and some end in
//! a six digit date.

use crate::config::{QueryConfig, RequestDescriptor};
use crate::extractor::PlatformCode;
use fw_ir::{Brand, EcuIdentity, EcuRole};
use regex::bytes::Regex;
use std::sync::LazyLock;

/// ReadDataByIdentifier 0xf100.
pub const VERSION_REQUEST_LONG: &[u8] = b"\x22\xf1\x00";
/// ReadDataByIdentifier 0xf187, 0xf181, 0xf100.
pub const VERSION_REQUEST_MULTI: &[u8] = b"\x22\xf1\x87\xf1\x81\xf1\x00";
pub const VERSION_RESPONSE: &[u8] = b"\x62";

pub const PLATFORM_CODE_ECUS: [EcuRole; 3] = [EcuRole::FwdRadar, EcuRole::FwdCamera, EcuRole::Eps];

static PLATFORM_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)\xf1\x00([A-Z]{2}[A-Za-z0-9]{0,2})").expect("platform code pattern is valid")
});

/// Some examples of valid part numbers: `56310-L0010`, `56310L0010`, `56310/M6300`.
static PART_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)[0-9][.,][0-9]{2} ([0-9]{5}[-/]?[A-Z][A-Z0-9]{3}[0-9])")
        .expect("part number pattern is valid")
});

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)[ -]([0-9]{6})$").expect("date pattern is valid"));

/// Parse the platform code, fused part-number suffix and date of one
/// firmware string.
pub fn extract(raw: &[u8]) -> Option<PlatformCode> {
    let code = PLATFORM_CODE.captures(raw)?.get(1)?.as_bytes();
    let mut code = code.to_vec();

    if let Some(part) = PART_NUMBER.captures(raw).and_then(|c| c.get(1)) {
        let part = part.as_bytes();
        code.push(b'-');
        code.extend_from_slice(&part[part.len() - 5..]);
    }

    let date = DATE.captures(raw).and_then(|c| c.get(1)).map(|m| m.as_bytes());
    Some(PlatformCode::new(code, date))
}

pub fn config() -> QueryConfig {
    let requests = vec![
        RequestDescriptor::new(vec![VERSION_REQUEST_LONG.to_vec()], vec![VERSION_RESPONSE.to_vec()])
            .whitelist([
                EcuRole::Transmission,
                EcuRole::Eps,
                EcuRole::Abs,
                EcuRole::FwdRadar,
                EcuRole::FwdCamera,
            ]),
        RequestDescriptor::new(vec![VERSION_REQUEST_MULTI.to_vec()], vec![VERSION_RESPONSE.to_vec()])
            .whitelist([
                EcuRole::Engine,
                EcuRole::Transmission,
                EcuRole::Eps,
                EcuRole::Abs,
                EcuRole::FwdRadar,
            ]),
        // CAN-FD queries on the two auxiliary panda buses
        RequestDescriptor::new(vec![VERSION_REQUEST_LONG.to_vec()], vec![VERSION_RESPONSE.to_vec()])
            .whitelist([
                EcuRole::FwdCamera,
                EcuRole::FwdRadar,
                EcuRole::CornerRadar,
                EcuRole::Hvac,
            ])
            .bus(4)
            .auxiliary(),
        RequestDescriptor::new(vec![VERSION_REQUEST_LONG.to_vec()], vec![VERSION_RESPONSE.to_vec()])
            .whitelist([
                EcuRole::FwdCamera,
                EcuRole::Adas,
                EcuRole::CornerRadar,
                EcuRole::Hvac,
            ])
            .bus(5)
            .auxiliary(),
    ];

    let mut config = QueryConfig::new(Brand::Hyundai, requests);
    config.platform_code_ecus = PLATFORM_CODE_ECUS.into_iter().collect();
    config.extra_ecus = vec![
        EcuIdentity::new(EcuRole::Adas, 0x730, None),
        EcuIdentity::new(EcuRole::ParkingAdas, 0x7b1, None),
        EcuIdentity::new(EcuRole::Hvac, 0x7b3, None),
        EcuIdentity::new(EcuRole::CornerRadar, 0x7b7, None),
    ];
    config.part_number = Some(&*PART_NUMBER);
    config.extractor = Some(extract);
    config
}
