//! Security labels shared by user clearance and resource classification.
//!
//! Both sides of a mandatory access control check use the same fixed,
//! totally ordered hierarchy:
//!
//! ```text
//! public (0) < confidential (1) < restricted (2)
//! ```
//!
//! Labels are persisted as free strings. A label outside the hierarchy is
//! accepted and kept verbatim (so audit entries show what was actually stored),
//! but it always ranks as `public`.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Clearance Level
// =============================================================================

/// A recognized level in the clearance hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearanceLevel {
    /// Lowest rank. Also the rank of every unrecognized label.
    Public,
    /// Middle rank.
    Confidential,
    /// Highest rank.
    Restricted,
}

impl ClearanceLevel {
    /// All levels in ascending rank order.
    pub const ALL: [ClearanceLevel; 3] = [
        ClearanceLevel::Public,
        ClearanceLevel::Confidential,
        ClearanceLevel::Restricted,
    ];

    /// Returns the numeric rank of the level.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Public => 0,
            Self::Confidential => 1,
            Self::Restricted => 2,
        }
    }

    /// Returns the canonical label string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Confidential => "confidential",
            Self::Restricted => "restricted",
        }
    }

    /// Parses a canonical label string. Matching is exact.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "public" => Some(Self::Public),
            "confidential" => Some(Self::Confidential),
            "restricted" => Some(Self::Restricted),
            _ => None,
        }
    }
}

impl fmt::Display for ClearanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Security Label
// =============================================================================

/// A persisted clearance or classification label.
///
/// Wraps the raw string so that unrecognized values survive round-trips
/// through the store and into audit payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityLabel(String);

impl SecurityLabel {
    /// Creates a label from any string, recognized or not.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw label as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the recognized level, or `None` for labels outside the hierarchy.
    #[must_use]
    pub fn recognized(&self) -> Option<ClearanceLevel> {
        ClearanceLevel::parse(&self.0)
    }

    /// Returns `true` if the label is part of the fixed hierarchy.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        self.recognized().is_some()
    }

    /// Returns the effective level. Unrecognized labels rank as `public`.
    #[must_use]
    pub fn level(&self) -> ClearanceLevel {
        self.recognized().unwrap_or(ClearanceLevel::Public)
    }

    /// Returns the effective numeric rank.
    #[must_use]
    pub fn rank(&self) -> u8 {
        self.level().rank()
    }
}

impl Default for SecurityLabel {
    fn default() -> Self {
        ClearanceLevel::Public.into()
    }
}

impl From<ClearanceLevel> for SecurityLabel {
    fn from(level: ClearanceLevel) -> Self {
        Self(level.as_str().to_string())
    }
}

impl From<&str> for SecurityLabel {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for SecurityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_totally_ordered() {
        assert!(ClearanceLevel::Public < ClearanceLevel::Confidential);
        assert!(ClearanceLevel::Confidential < ClearanceLevel::Restricted);
        let ranks: Vec<u8> = ClearanceLevel::ALL.iter().map(|l| l.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(
            ClearanceLevel::parse("restricted"),
            Some(ClearanceLevel::Restricted)
        );
        assert_eq!(ClearanceLevel::parse("Restricted"), None);
        assert_eq!(ClearanceLevel::parse(" public"), None);
    }

    #[test]
    fn test_unknown_label_ranks_as_public() {
        let label = SecurityLabel::new("top-secret");
        assert!(!label.is_recognized());
        assert_eq!(label.level(), ClearanceLevel::Public);
        assert_eq!(label.rank(), 0);
        assert_eq!(label.as_str(), "top-secret");
    }

    #[test]
    fn test_label_serializes_as_raw_string() {
        let label = SecurityLabel::from(ClearanceLevel::Confidential);
        assert_eq!(
            serde_json::to_value(&label).unwrap(),
            serde_json::json!("confidential")
        );
        let parsed: SecurityLabel = serde_json::from_str("\"secret\"").unwrap();
        assert_eq!(parsed.as_str(), "secret");
    }

    #[test]
    fn test_default_label_is_public() {
        assert_eq!(SecurityLabel::default().as_str(), "public");
    }
}
