//! Mazda. Firmware strings carry no platform code, so only exact matching
//! applies.

use crate::config::{QueryConfig, RequestDescriptor};
use fw_ir::Brand;

/// ReadDataByIdentifier 0xf188 (vehicle manufacturer ECU software number).
pub const VERSION_REQUEST: &[u8] = b"\x22\xf1\x88";
pub const VERSION_RESPONSE: &[u8] = b"\x62\xf1\x88";

pub fn config() -> QueryConfig {
    QueryConfig::new(
        Brand::Mazda,
        vec![
            RequestDescriptor::new(vec![VERSION_REQUEST.to_vec()], vec![VERSION_RESPONSE.to_vec()])
                .bus(0),
        ],
    )
}
