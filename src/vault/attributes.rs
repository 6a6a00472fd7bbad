//! Secret attributes and their external descriptor encoding.
//!
//! A descriptor is a JSON object with exactly three or four fields:
//!
//! ```json
//! { "type": "curve25519", "persistence": "ephemeral", "purpose": "key_agreement", "length": 32 }
//! ```
//!
//! `length` is optional for fixed-size key types and required for
//! `buffer`.  Decoding happens once at the boundary; everything inside
//! the vault works with the typed `SecretAttributes`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, VaultError};

const TYPE_KEY: &str = "type";
const PERSISTENCE_KEY: &str = "persistence";
const PURPOSE_KEY: &str = "purpose";
const LENGTH_KEY: &str = "length";

/// Largest `buffer` secret the vault will hold.
pub const MAX_BUFFER_SECRET_LEN: usize = 4096;

/// The kind of material a secret holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretType {
    #[serde(rename = "buffer")]
    Buffer,
    #[serde(rename = "aes128")]
    Aes128Key,
    #[serde(rename = "aes256")]
    Aes256Key,
    #[serde(rename = "curve25519")]
    Curve25519PrivateKey,
    #[serde(rename = "p256")]
    P256PrivateKey,
}

impl SecretType {
    /// Every defined type, in declaration order.
    pub const ALL: [SecretType; 5] = [
        SecretType::Buffer,
        SecretType::Aes128Key,
        SecretType::Aes256Key,
        SecretType::Curve25519PrivateKey,
        SecretType::P256PrivateKey,
    ];

    /// External spelling used in descriptors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Aes128Key => "aes128",
            Self::Aes256Key => "aes256",
            Self::Curve25519PrivateKey => "curve25519",
            Self::P256PrivateKey => "p256",
        }
    }

    /// Size implied by the type, or `None` for variable-length buffers.
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            Self::Buffer => None,
            Self::Aes128Key => Some(16),
            Self::Aes256Key => Some(32),
            Self::Curve25519PrivateKey | Self::P256PrivateKey => Some(32),
        }
    }

    /// `true` for types usable as an AES-GCM key.
    pub fn is_aes_key(self) -> bool {
        matches!(self, Self::Aes128Key | Self::Aes256Key)
    }

    /// `true` for Diffie-Hellman private keys (which also have a public key).
    pub fn is_private_key(self) -> bool {
        matches!(self, Self::Curve25519PrivateKey | Self::P256PrivateKey)
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| VaultError::InvalidAttributes(format!("unknown secret type '{s}'")))
    }
}

/// Whether a secret outlives the vault instance that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretPersistence {
    Ephemeral,
    Persistent,
}

impl SecretPersistence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ephemeral => "ephemeral",
            Self::Persistent => "persistent",
        }
    }
}

impl fmt::Display for SecretPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretPersistence {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ephemeral" => Ok(Self::Ephemeral),
            "persistent" => Ok(Self::Persistent),
            other => Err(VaultError::InvalidAttributes(format!(
                "unknown persistence '{other}'"
            ))),
        }
    }
}

/// What a secret may be used for. Only key agreement exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretPurpose {
    KeyAgreement,
}

impl SecretPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyAgreement => "key_agreement",
        }
    }
}

impl fmt::Display for SecretPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretPurpose {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "key_agreement" => Ok(Self::KeyAgreement),
            other => Err(VaultError::InvalidAttributes(format!(
                "unknown purpose '{other}'"
            ))),
        }
    }
}

/// Shape and policy of a secret. Immutable once the secret exists.
///
/// `length` is always the true material length: fixed-size types carry
/// their implied size, buffers carry the caller's explicit length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretAttributes {
    #[serde(rename = "type")]
    secret_type: SecretType,
    persistence: SecretPersistence,
    purpose: SecretPurpose,
    length: usize,
}

impl SecretAttributes {
    /// Validate and normalize attributes.
    ///
    /// For fixed-size types `length` may be 0 (derive it) or the type's
    /// size; anything else is rejected.  Buffers need a length between 1
    /// and `MAX_BUFFER_SECRET_LEN`.
    pub fn new(
        secret_type: SecretType,
        persistence: SecretPersistence,
        purpose: SecretPurpose,
        length: usize,
    ) -> Result<Self> {
        let length = match secret_type.fixed_length() {
            Some(fixed) if length == 0 || length == fixed => fixed,
            Some(fixed) => {
                return Err(VaultError::InvalidAttributes(format!(
                    "{secret_type} secrets are {fixed} bytes, length {length} given"
                )))
            }
            None if length == 0 => {
                return Err(VaultError::InvalidAttributes(
                    "buffer secrets require a non-zero length".into(),
                ))
            }
            None if length > MAX_BUFFER_SECRET_LEN => {
                return Err(VaultError::InvalidAttributes(format!(
                    "buffer secrets are at most {MAX_BUFFER_SECRET_LEN} bytes, length {length} given"
                )))
            }
            None => length,
        };

        Ok(Self {
            secret_type,
            persistence,
            purpose,
            length,
        })
    }

    /// Attributes for a fixed-size key type (length derived).
    pub fn key(secret_type: SecretType, persistence: SecretPersistence) -> Result<Self> {
        Self::new(secret_type, persistence, SecretPurpose::KeyAgreement, 0)
    }

    /// Attributes for an ephemeral key-agreement buffer of `length` bytes.
    pub fn buffer(length: usize) -> Result<Self> {
        Self::new(
            SecretType::Buffer,
            SecretPersistence::Ephemeral,
            SecretPurpose::KeyAgreement,
            length,
        )
    }

    pub fn secret_type(&self) -> SecretType {
        self.secret_type
    }

    pub fn persistence(&self) -> SecretPersistence {
        self.persistence
    }

    pub fn purpose(&self) -> SecretPurpose {
        self.purpose
    }

    /// Material length in bytes.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence == SecretPersistence::Persistent
    }
}

// ---------------------------------------------------------------------------
// Descriptor codec
// ---------------------------------------------------------------------------

fn required_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(VaultError::InvalidAttributes(format!(
            "'{key}' must be a string, got {other}"
        ))),
        None => Err(VaultError::InvalidAttributes(format!(
            "missing required field '{key}'"
        ))),
    }
}

fn optional_length(map: &Map<String, Value>) -> Result<usize> {
    let Some(value) = map.get(LENGTH_KEY) else {
        return Ok(0);
    };
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            VaultError::InvalidAttributes(format!(
                "'length' must be a non-negative integer that fits a machine word, got {value}"
            ))
        })
}

/// Decode an external descriptor into validated attributes.
///
/// Rejects non-objects, field counts other than 3 or 4, unknown fields,
/// unknown enumeration values and malformed lengths.
pub fn decode(descriptor: &Value) -> Result<SecretAttributes> {
    let map = descriptor.as_object().ok_or_else(|| {
        VaultError::InvalidAttributes("descriptor must be an object".into())
    })?;

    if !(3..=4).contains(&map.len()) {
        return Err(VaultError::InvalidAttributes(format!(
            "descriptor must have 3 or 4 fields, got {}",
            map.len()
        )));
    }

    if let Some(unknown) = map
        .keys()
        .find(|k| ![TYPE_KEY, PERSISTENCE_KEY, PURPOSE_KEY, LENGTH_KEY].contains(&k.as_str()))
    {
        return Err(VaultError::InvalidAttributes(format!(
            "unknown field '{unknown}'"
        )));
    }

    let secret_type = required_str(map, TYPE_KEY)?.parse()?;
    let persistence = required_str(map, PERSISTENCE_KEY)?.parse()?;
    let purpose = required_str(map, PURPOSE_KEY)?.parse()?;
    let length = optional_length(map)?;

    SecretAttributes::new(secret_type, persistence, purpose, length)
}

/// Encode attributes as an external descriptor with all four fields.
pub fn encode(attributes: &SecretAttributes) -> Value {
    let mut map = Map::with_capacity(4);
    map.insert(TYPE_KEY.into(), attributes.secret_type.as_str().into());
    map.insert(PERSISTENCE_KEY.into(), attributes.persistence.as_str().into());
    map.insert(PURPOSE_KEY.into(), attributes.purpose.as_str().into());
    map.insert(LENGTH_KEY.into(), attributes.length.into());
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_three_field_descriptor() {
        let attrs = decode(&json!({
            "type": "curve25519",
            "persistence": "ephemeral",
            "purpose": "key_agreement",
        }))
        .unwrap();

        assert_eq!(attrs.secret_type(), SecretType::Curve25519PrivateKey);
        assert_eq!(attrs.persistence(), SecretPersistence::Ephemeral);
        assert_eq!(attrs.purpose(), SecretPurpose::KeyAgreement);
        assert_eq!(attrs.length(), 32);
    }

    #[test]
    fn derives_fixed_lengths() {
        for (name, len) in [("aes128", 16), ("aes256", 32), ("p256", 32)] {
            let attrs = decode(&json!({
                "type": name,
                "persistence": "persistent",
                "purpose": "key_agreement",
            }))
            .unwrap();
            assert_eq!(attrs.length(), len, "{name}");
        }
    }

    #[test]
    fn buffer_needs_length() {
        let missing = decode(&json!({
            "type": "buffer",
            "persistence": "ephemeral",
            "purpose": "key_agreement",
        }));
        assert!(matches!(missing, Err(VaultError::InvalidAttributes(_))));

        let ok = decode(&json!({
            "type": "buffer",
            "persistence": "ephemeral",
            "purpose": "key_agreement",
            "length": 48,
        }))
        .unwrap();
        assert_eq!(ok.length(), 48);
    }

    #[test]
    fn rejects_mismatched_fixed_length() {
        let err = decode(&json!({
            "type": "aes128",
            "persistence": "ephemeral",
            "purpose": "key_agreement",
            "length": 32,
        }));
        assert!(matches!(err, Err(VaultError::InvalidAttributes(_))));
    }

    #[test]
    fn rejects_missing_persistence() {
        let err = decode(&json!({
            "type": "aes256",
            "purpose": "key_agreement",
            "length": 32,
        }));
        assert!(matches!(err, Err(VaultError::InvalidAttributes(_))));
    }

    #[test]
    fn rejects_unknown_type() {
        let err = decode(&json!({
            "type": "unknown",
            "persistence": "ephemeral",
            "purpose": "key_agreement",
        }));
        assert!(matches!(err, Err(VaultError::InvalidAttributes(_))));
    }

    #[test]
    fn rejects_five_fields() {
        let err = decode(&json!({
            "type": "aes256",
            "persistence": "ephemeral",
            "purpose": "key_agreement",
            "length": 32,
            "label": "extra",
        }));
        assert!(matches!(err, Err(VaultError::InvalidAttributes(_))));
    }

    #[test]
    fn rejects_unknown_fourth_field() {
        let err = decode(&json!({
            "type": "aes256",
            "persistence": "ephemeral",
            "purpose": "key_agreement",
            "label": "extra",
        }));
        assert!(matches!(err, Err(VaultError::InvalidAttributes(_))));
    }

    #[test]
    fn rejects_bad_length_values() {
        for length in [json!(-1), json!(1.5), json!("32"), json!(null)] {
            let err = decode(&json!({
                "type": "buffer",
                "persistence": "ephemeral",
                "purpose": "key_agreement",
                "length": length,
            }));
            assert!(
                matches!(err, Err(VaultError::InvalidAttributes(_))),
                "length {length} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_string_enumerations() {
        let err = decode(&json!({
            "type": 3,
            "persistence": "ephemeral",
            "purpose": "key_agreement",
        }));
        assert!(matches!(err, Err(VaultError::InvalidAttributes(_))));
        assert!(decode(&json!(["type", "persistence", "purpose"])).is_err());
    }

    #[test]
    fn encode_emits_all_fields_and_decodes_back() {
        let attrs = SecretAttributes::new(
            SecretType::Buffer,
            SecretPersistence::Persistent,
            SecretPurpose::KeyAgreement,
            20,
        )
        .unwrap();

        let descriptor = encode(&attrs);
        assert_eq!(
            descriptor,
            json!({
                "type": "buffer",
                "persistence": "persistent",
                "purpose": "key_agreement",
                "length": 20,
            })
        );
        assert_eq!(decode(&descriptor).unwrap(), attrs);
    }

    #[test]
    fn serde_uses_external_spellings() {
        let attrs = SecretAttributes::key(SecretType::P256PrivateKey, SecretPersistence::Ephemeral)
            .unwrap();
        let text = serde_json::to_string(&attrs).unwrap();
        assert!(text.contains("\"type\":\"p256\""));
        assert!(text.contains("\"purpose\":\"key_agreement\""));
    }

    #[test]
    fn buffer_length_is_bounded() {
        assert!(SecretAttributes::buffer(MAX_BUFFER_SECRET_LEN).is_ok());
        assert!(SecretAttributes::buffer(MAX_BUFFER_SECRET_LEN + 1).is_err());

        let err = decode(&json!({
            "type": "buffer",
            "persistence": "ephemeral",
            "purpose": "key_agreement",
            "length": u64::MAX / 2,
        }))
        .unwrap_err();
        assert!(matches!(err, VaultError::InvalidAttributes(_)));
    }
}
