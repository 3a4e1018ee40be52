pub mod builder;
pub mod observed;
pub mod types;
pub mod validate;

pub use builder::DatabaseBuilder;
pub use observed::{FirmwareReading, ObservedFirmware};
pub use types::*;
pub use validate::SchemaError;
