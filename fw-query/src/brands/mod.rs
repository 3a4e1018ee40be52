//! Built-in query configurations, one module per brand.

pub mod hyundai;
pub mod mazda;
pub mod tesla;

use crate::config::QueryConfig;
use fw_ir::Brand;

/// Built-in config for `brand`.
pub fn config_for(brand: Brand) -> QueryConfig {
    match brand {
        Brand::Hyundai => hyundai::config(),
        Brand::Mazda => mazda::config(),
        Brand::Tesla => tesla::config(),
    }
}
