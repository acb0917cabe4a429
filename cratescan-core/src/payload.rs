//! QR payload parsing.
//!
//! Labels encode `{release_id}.{instance_id}` where both components are
//! non-negative integer strings. Anything else is an input-validation
//! failure and must be rejected before any network call.

use crate::error::{Result, ScanError};

/// A decoded and validated scan payload.
///
/// Both ids are kept as strings: matching against the collection is
/// string equality, so `"07"` and `"7"` are different identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPayload {
    pub release_id: String,
    pub instance_id: String,
}

impl ScanPayload {
    /// Parse raw decoder output into a payload.
    ///
    /// Leading/trailing whitespace is tolerated (printed labels get
    /// scanned with stray newlines); the payload itself must be exactly
    /// two dot-separated runs of ASCII digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let mut parts = trimmed.split('.');

        let (release_id, instance_id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(release), Some(instance), None) => (release, instance),
            _ => {
                return Err(ScanError::InvalidPayload(format!(
                    "expected release_id.instance_id, got {trimmed:?}"
                )))
            }
        };

        if !is_integer_string(release_id) || !is_integer_string(instance_id) {
            return Err(ScanError::InvalidPayload(format!(
                "ids must be non-negative integers, got {trimmed:?}"
            )));
        }

        Ok(Self {
            release_id: release_id.to_string(),
            instance_id: instance_id.to_string(),
        })
    }
}

impl std::fmt::Display for ScanPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.release_id, self.instance_id)
    }
}

fn is_integer_string(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
