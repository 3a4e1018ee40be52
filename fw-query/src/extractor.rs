use std::fmt;

/// Brand-specific parse of one raw firmware string.
///
/// Returns `None` for strings that carry no platform code; such strings are
/// uninformative, not malformed.
pub type ExtractFn = fn(&[u8]) -> Option<PlatformCode>;

/// A `(platform code, optional date)` pair pulled out of a firmware string.
///
/// Only used to compare a vehicle against the catalog; never stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformCode {
    pub code: Vec<u8>,
    pub date: Option<Vec<u8>>,
}

impl PlatformCode {
    pub fn new(code: impl Into<Vec<u8>>, date: Option<&[u8]>) -> Self {
        Self {
            code: code.into(),
            date: date.map(<[u8]>::to_vec),
        }
    }

    /// Whether a part-number suffix was fused onto the code.
    pub fn has_part_suffix(&self) -> bool {
        self.code.contains(&b'-')
    }
}

impl fmt::Display for PlatformCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code.escape_ascii())?;
        if let Some(date) = &self.date {
            write!(f, " ({})", date.escape_ascii())?;
        }
        Ok(())
    }
}
