//! Component identity: normalized, opaque GUIDs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Opaque identity of a component.
///
/// A `Guid` is usually a UUID string, but the engine never inspects its
/// structure: two GUIDs are the same identity if their normalized text is
/// equal. Normalization trims whitespace, strips surrounding braces, and
/// lowercases, so `{ABC-1}` and `abc-1` name the same component.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Guid(String);

impl Guid {
    /// Build a GUID from any text, normalizing it.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(raw.as_ref()))
    }

    /// Parse a GUID, rejecting empty text and embedded whitespace.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(TypeError::EmptyGuid);
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidGuid(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// The nil GUID ("no identity").
    pub fn nil() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the empty GUID and the all-zero UUID.
    pub fn is_nil(&self) -> bool {
        self.0.is_empty() || self.0 == NIL_UUID
    }

    /// The normalized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short identifier (first 8 characters) for log lines and tooltips.
    pub fn short_id(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let unbraced = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);
    unbraced.trim().to_ascii_lowercase()
}

impl From<String> for Guid {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Guid {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Guid> for String {
    fn from(guid: Guid) -> Self {
        guid.0
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self.0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_and_braces() {
        let a = Guid::new("{1B2C3D4E-AAAA-BBBB-CCCC-000000000001}");
        let b = Guid::new("1b2c3d4e-aaaa-bbbb-cccc-000000000001");
        assert_eq!(a, b);
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(Guid::parse("   "), Err(TypeError::EmptyGuid));
        assert_eq!(Guid::parse("{}"), Err(TypeError::EmptyGuid));
    }

    #[test]
    fn parse_rejects_whitespace() {
        assert!(matches!(
            Guid::parse("abc def"),
            Err(TypeError::InvalidGuid(_))
        ));
    }

    #[test]
    fn nil_detection() {
        assert!(Guid::nil().is_nil());
        assert!(Guid::new(NIL_UUID).is_nil());
        assert!(!Guid::new("g1").is_nil());
    }

    #[test]
    fn short_id_truncates() {
        let id = Guid::new("0123456789abcdef");
        assert_eq!(id.short_id(), "01234567");
        assert_eq!(Guid::new("g1").short_id(), "g1");
    }

    #[test]
    fn serde_normalizes_on_read() {
        let parsed: Guid = serde_json::from_str("\"{ABC}\"").unwrap();
        assert_eq!(parsed, Guid::new("abc"));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"abc\"");
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Guid::new("a") < Guid::new("b"));
    }
}
