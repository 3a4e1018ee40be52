//! Firmware fingerprint resolution: per-brand query configuration,
//! platform-code extraction, exact and fuzzy matching, and the offline
//! consistency checks of a firmware database.

pub mod brands;
pub mod config;
pub mod consistency;
pub mod extractor;
pub mod matcher;
pub mod signature;

pub use config::{ConfigurationError, QueryConfig, QueryRegistry, RequestDescriptor};
pub use consistency::{ConsistencyIssue, Severity, check_database};
pub use extractor::PlatformCode;
pub use matcher::{Identification, MatchMethod, MatchOptions, Matcher, ResolveError};
pub use signature::SignatureIndex;
