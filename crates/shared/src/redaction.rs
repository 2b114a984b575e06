//! Secret detection and redaction utilities.
//!
//! Used by the JSON logger, config error metadata, and `config show` so API
//! keys never reach logs or stdout.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// # Examples
///
/// ```
/// use hybrid_rag_shared::is_secret_key;
///
/// assert!(is_secret_key("OPENAI_API_KEY"));
/// assert!(is_secret_key("apiKey"));
/// assert!(!is_secret_key("QDRANT_URL"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
}

/// Redacts a value if the key is likely a secret.
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display, Debug, and Serialize.
///
/// Deserialization reads the real value so config files can carry keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the secret is blank after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<Box<str>> for SecretString {
    fn from(value: Box<str>) -> Self {
        Self(value)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_secret_patterns() {
        assert!(is_secret_key("OPENAI_API_KEY"));
        assert!(is_secret_key("QDRANT_API_KEY"));
        assert!(is_secret_key("access_token"));
        assert!(is_secret_key("CLIENT_SECRET"));
        assert!(is_secret_key("db_password"));
        assert!(is_secret_key("authorization"));
    }

    #[test]
    fn rejects_non_secret_patterns() {
        assert!(!is_secret_key("LOG_LEVEL"));
        assert!(!is_secret_key("PORT"));
        assert!(!is_secret_key("QDRANT_URL"));
        assert!(!is_secret_key("collectionName"));
    }

    #[test]
    fn redacts_secret_values() {
        assert_eq!(redact_if_secret("apiKey", "sk-123456"), REDACTED);
        assert_eq!(redact_if_secret("LOG_LEVEL", "debug"), "debug");
    }

    #[test]
    fn secret_string_never_prints_its_value() {
        let secret = SecretString::new("sk-live");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "sk-live");
        assert!(!secret.is_blank());
        assert!(SecretString::new("  ").is_blank());
    }
}
