//! Claim values and the name-ordered claim set signed into tokens.

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reserved claim names.
pub mod names {
    /// Subject
    pub const SUB: &str = "sub";
    /// Audience
    pub const AUD: &str = "aud";
    /// Issued-at, Unix seconds
    pub const IAT: &str = "iat";
    /// Expiration, Unix seconds
    pub const EXP: &str = "exp";
    /// Unique token identifier
    pub const JTI: &str = "jti";
    /// Policy
    pub const POL: &str = "pol";
}

/// A single claim value.
///
/// Strings and integers get their own variants so timestamps and
/// identifiers compare and serialize predictably; everything else is kept as
/// raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    /// JSON string
    String(String),
    /// JSON number that fits an `i64`
    Integer(i64),
    /// Any other JSON value
    Json(serde_json::Value),
}

impl ClaimValue {
    /// Borrow the value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for ClaimValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Json(serde_json::Value::Number(n)),
            },
            other => Self::Json(other),
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Claims of one token, keyed by claim name.
///
/// Names are unique; inserting an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(BTreeMap<String, ClaimValue>);

impl ClaimSet {
    /// Empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a claims document. The document must be a JSON object.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` for invalid JSON or a non-object document.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, TokenError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| TokenError::malformed(format!("invalid claims document: {e}")))?;
        Self::from_json_value(value)
    }

    /// Build from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` unless the value is an object.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, TokenError> {
        match value {
            serde_json::Value::Object(map) => Ok(Self(
                map.into_iter()
                    .map(|(name, value)| (name, ClaimValue::from(value)))
                    .collect(),
            )),
            other => Err(TokenError::malformed(format!(
                "claims document must be a JSON object, got {other}"
            ))),
        }
    }

    /// Set a claim, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Option<ClaimValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Copy every entry of `other` over this set.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Look up a claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.0.get(name)
    }

    /// Look up a string claim.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ClaimValue::as_str)
    }

    /// Look up an integer claim.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ClaimValue::as_i64)
    }

    /// Whether the claim is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get_str(names::SUB)
    }

    /// `iat` claim.
    #[must_use]
    pub fn issued_at(&self) -> Option<i64> {
        self.get_i64(names::IAT)
    }

    /// `exp` claim.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.get_i64(names::EXP)
    }

    /// Number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate claims in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClaimValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<ClaimValue>> FromIterator<(K, V)> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_classification() {
        assert_eq!(ClaimValue::from(json!("admin")), ClaimValue::String("admin".to_string()));
        assert_eq!(ClaimValue::from(json!(42)), ClaimValue::Integer(42));
        assert_eq!(ClaimValue::from(json!(1.5)), ClaimValue::Json(json!(1.5)));
        assert_eq!(ClaimValue::from(json!(true)), ClaimValue::Json(json!(true)));
        assert_eq!(
            ClaimValue::from(json!({"id": 7})),
            ClaimValue::Json(json!({"id": 7}))
        );
    }

    #[test]
    fn test_document_parsing() {
        let claims = ClaimSet::from_json_slice(br#"{"role":"admin","level":3,"tags":["a"]}"#).unwrap();
        assert_eq!(claims.len(), 3);
        assert_eq!(claims.get_str("role"), Some("admin"));
        assert_eq!(claims.get_i64("level"), Some(3));
        assert_eq!(claims.get("tags"), Some(&ClaimValue::Json(json!(["a"]))));
    }

    #[test]
    fn test_non_object_document_rejected() {
        for doc in [&b"[1,2]"[..], &b"\"sub\""[..], &b"{"[..], &b""[..]] {
            let err = ClaimSet::from_json_slice(doc).unwrap_err();
            assert!(matches!(err, TokenError::MalformedEncoding { .. }));
        }
    }

    #[test]
    fn test_serde_shape_matches_document() {
        let claims: ClaimSet = [("sub", ClaimValue::from("alice")), ("iat", ClaimValue::from(100_i64))]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json, json!({"iat": 100, "sub": "alice"}));

        let back: ClaimSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn test_insert_replaces() {
        let mut claims = ClaimSet::new();
        assert!(claims.insert(names::SUB, "a").is_none());
        assert_eq!(claims.insert(names::SUB, "b"), Some(ClaimValue::from("a")));
        assert_eq!(claims.subject(), Some("b"));
    }

    #[test]
    fn test_display() {
        assert_eq!(ClaimValue::from("x").to_string(), "x");
        assert_eq!(ClaimValue::from(5_i64).to_string(), "5");
        assert_eq!(ClaimValue::from(json!({"a": 1})).to_string(), r#"{"a":1}"#);
    }
}
