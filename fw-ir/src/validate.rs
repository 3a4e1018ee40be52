use crate::types::{Brand, CheckRules, EcuIdentity, EcuRole, Platform};
use thiserror::Error;

/// A malformed database or query configuration entry.
///
/// Raised at load time; a process must not continue with a database that
/// produced one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("platform '{0}' is defined more than once")]
    DuplicatePlatform(Platform),
    #[error("platform '{0}' is not defined")]
    UnknownPlatform(Platform),
    #[error("platform '{0}' has no ECUs")]
    EmptyPlatform(Platform),
    #[error("duplicate ECU identity {identity} in platform '{platform}'")]
    DuplicateIdentity {
        platform: Platform,
        identity: EcuIdentity,
    },
    #[error("empty firmware list for {identity} in platform '{platform}'")]
    EmptyFirmware {
        platform: Platform,
        identity: EcuIdentity,
    },
    #[error("check rules for brand '{0}' are defined more than once")]
    DuplicateRules(Brand),
    #[error("check rules for brand '{brand}' reference platform '{platform}' which is not a {brand} platform")]
    ForeignRulePlatform { brand: Brand, platform: Platform },
    #[error(
        "platform '{platform}' uses ECU role {role} which no auxiliary request of brand '{brand}' whitelists"
    )]
    UncoveredAuxiliaryRole {
        brand: Brand,
        platform: Platform,
        role: EcuRole,
    },
    #[error("{path}: {message}")]
    InvalidValue { path: String, message: String },
}

impl SchemaError {
    pub fn invalid_value(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Check that a brand's rules only name platforms of that brand.
pub(crate) fn validate_rules(
    brand: Brand,
    rules: &CheckRules,
    brand_of: impl Fn(&Platform) -> Option<Brand>,
) -> Result<(), SchemaError> {
    for platform in rules.referenced_platforms() {
        match brand_of(platform) {
            Some(b) if b == brand => {}
            Some(_) => {
                return Err(SchemaError::ForeignRulePlatform {
                    brand,
                    platform: platform.clone(),
                });
            }
            None => return Err(SchemaError::UnknownPlatform(platform.clone())),
        }
    }
    Ok(())
}
