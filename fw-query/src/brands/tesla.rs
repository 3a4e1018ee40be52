//! Tesla. Each query opens with TesterPresent before reading the identifier.

use crate::config::{QueryConfig, RequestDescriptor};
use fw_ir::{Brand, EcuRole};

pub const TESTER_PRESENT_REQUEST: &[u8] = b"\x3e\x00";
pub const TESTER_PRESENT_RESPONSE: &[u8] = b"\x7e\x00";
/// ReadDataByIdentifier 0xf195 (system supplier ECU software version).
pub const SUPPLIER_SOFTWARE_VERSION_REQUEST: &[u8] = b"\x22\xf1\x95";
pub const SUPPLIER_SOFTWARE_VERSION_RESPONSE: &[u8] = b"\x62\xf1\x95";
/// ReadDataByIdentifier 0xf181 (application software identification).
pub const APPLICATION_SOFTWARE_REQUEST: &[u8] = b"\x22\xf1\x81";
pub const APPLICATION_SOFTWARE_RESPONSE: &[u8] = b"\x62\xf1\x81";

pub fn config() -> QueryConfig {
    QueryConfig::new(
        Brand::Tesla,
        vec![
            RequestDescriptor::new(
                vec![TESTER_PRESENT_REQUEST.to_vec(), SUPPLIER_SOFTWARE_VERSION_REQUEST.to_vec()],
                vec![TESTER_PRESENT_RESPONSE.to_vec(), SUPPLIER_SOFTWARE_VERSION_RESPONSE.to_vec()],
            )
            .whitelist([
                EcuRole::Eps,
                EcuRole::Adas,
                EcuRole::ElectricBrakeBooster,
                EcuRole::FwdRadar,
            ])
            .bus(0)
            .rx_offset(0x08),
            RequestDescriptor::new(
                vec![TESTER_PRESENT_REQUEST.to_vec(), APPLICATION_SOFTWARE_REQUEST.to_vec()],
                vec![TESTER_PRESENT_RESPONSE.to_vec(), APPLICATION_SOFTWARE_RESPONSE.to_vec()],
            )
            .whitelist([EcuRole::Engine])
            .bus(1)
            .rx_offset(0x10),
        ],
    )
}
