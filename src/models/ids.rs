//! Identifiers for benchmark resources.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a challenge, series or model.
///
/// The benchmark API sends numeric ids for most resources and strings for a
/// few (readable model ids, placeholder challenges), so both shapes are
/// accepted and stored as text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters of the id, for compact card headers.
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for ResourceId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

/// Type alias for challenge (round) IDs
pub type ChallengeId = ResourceId;

/// Type alias for series IDs
pub type SeriesId = ResourceId;

/// Type alias for readable model IDs
pub type ModelId = ResourceId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_numeric_id() {
        let id: ResourceId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn test_deserialize_string_id() {
        let id: ResourceId = serde_json::from_str(r#""mock-001""#).unwrap();
        assert_eq!(id.as_str(), "mock-001");
    }

    #[test]
    fn test_deserialize_rejects_other_shapes() {
        assert!(serde_json::from_str::<ResourceId>("1.5").is_err());
        assert!(serde_json::from_str::<ResourceId>("null").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = ResourceId::from(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""7""#);
    }

    #[test]
    fn test_short() {
        let id = ResourceId::from("0123456789abcdef");
        assert_eq!(id.short(8), "01234567");
        assert_eq!(ResourceId::from("abc").short(8), "abc");
    }

    #[test]
    fn test_display_and_debug() {
        let id = ResourceId::new("chronos-bolt");
        assert_eq!(format!("{}", id), "chronos-bolt");
        assert!(format!("{:?}", id).contains("chronos-bolt"));
    }

    #[test]
    fn test_equality() {
        assert_eq!(ResourceId::from(5), ResourceId::from("5"));
        assert_ne!(ResourceId::from("a"), ResourceId::from("b"));
    }
}
