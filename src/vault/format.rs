//! Binary vault file format with an integrity digest.
//!
//! A `.svlt` file has this layout:
//!
//! ```text
//! [SVLT: 4 bytes][version: 1 byte][body_len: 4 bytes LE][body JSON][SHA-256: 32 bytes]
//! ```
//!
//! - **Magic** (`SVLT`): identifies the file as a vault file.
//! - **Version**: format version (currently `1`).
//! - **Body length**: little-endian u32 length of the body JSON.
//! - **Body JSON**: serialized `VaultDocument` holding persistent secrets.
//! - **SHA-256**: digest over the body bytes, catching truncation and
//!   accidental corruption.  It is not a keyed MAC.
//!
//! Secret material is stored base64-encoded and unencrypted.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::attributes::SecretAttributes;
use crate::crypto::hash::{sha256, SHA256_LEN};
use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"SVLT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (body_len).
const PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One persistent secret as stored on disk.
#[derive(Serialize, Deserialize)]
pub struct StoredSecret {
    /// Backend-assigned record id, stable across re-opens.
    pub id: u64,

    pub attributes: SecretAttributes,

    /// Raw material (base64 in JSON). Wiped when dropped.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub material: Vec<u8>,

    pub created_at: DateTime<Utc>,
}

impl Drop for StoredSecret {
    fn drop(&mut self) {
        self.material.zeroize();
    }
}

/// Everything a vault file holds.
#[derive(Serialize, Deserialize)]
pub struct VaultDocument {
    /// Format version.
    pub version: u8,

    /// When this vault file was first created.
    pub created_at: DateTime<Utc>,

    /// Next record id to assign. Ids are never reused within a file.
    pub next_id: u64,

    pub secrets: Vec<StoredSecret>,
}

impl VaultDocument {
    /// A fresh document with no secrets.
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            created_at: Utc::now(),
            next_id: 1,
            secrets: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write a vault document to disk **atomically**.
///
/// 1. Serialize the document to JSON.
/// 2. Compute the SHA-256 digest over the JSON bytes.
/// 3. Write to a temp file in the same directory (owner-only on Unix).
/// 4. Rename the temp file over the target path.
pub fn write_document(path: &Path, document: &VaultDocument) -> Result<()> {
    let mut body = serde_json::to_vec(document)
        .map_err(|e| VaultError::SerializationError(format!("vault body: {e}")))?;
    let digest = sha256(&body);

    let body_len = u32::try_from(body.len()).map_err(|_| {
        VaultError::SerializationError(format!("body length {} exceeds u32::MAX", body.len()))
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + body.len() + SHA256_LEN);
    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(CURRENT_VERSION); // 1 byte
    buf.extend_from_slice(&body_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&body); // body JSON
    buf.extend_from_slice(&digest); // 32 bytes
    body.zeroize();

    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let written = write_private(&tmp_path, &buf);
    buf.zeroize();
    written?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Write `data` to a new file at `path`, owner-only on Unix from creation.
///
/// A leftover file at `path` is removed first so its permissions are
/// never inherited.
fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

/// Read and verify a vault file.
pub fn read_document(path: &Path) -> Result<VaultDocument> {
    let mut data = fs::read(path)?;
    let parsed = parse_document(&data);
    data.zeroize();
    parsed
}

fn parse_document(data: &[u8]) -> Result<VaultDocument> {
    if data.len() < PREFIX_LEN + SHA256_LEN {
        return Err(invalid("file too small to be a vault"));
    }

    if &data[0..4] != MAGIC {
        return Err(invalid("missing SVLT magic bytes"));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(invalid(&format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let body_len = u32::from_le_bytes(
        data[5..PREFIX_LEN]
            .try_into()
            .map_err(|_| invalid("bad body length"))?,
    );
    let body_len = usize::try_from(body_len)
        .map_err(|_| invalid("body length exceeds platform address space"))?;

    let body_end = PREFIX_LEN + body_len;
    if body_end + SHA256_LEN != data.len() {
        return Err(invalid("body length does not match file size"));
    }

    let body = &data[PREFIX_LEN..body_end];
    if !bool::from(sha256(body).as_slice().ct_eq(&data[body_end..])) {
        return Err(invalid("integrity digest mismatch, file is corrupted"));
    }

    let document: VaultDocument = serde_json::from_slice(body)
        .map_err(|e| invalid(&format!("body JSON: {e}")))?;

    if document.version != CURRENT_VERSION {
        return Err(invalid("document version does not match file header"));
    }

    Ok(document)
}

fn invalid(reason: &str) -> VaultError {
    VaultError::Backend(format!("invalid vault file: {reason}"))
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut encoded = BASE64.encode(data);
    let result = serializer.serialize_str(&encoded);
    encoded.zeroize();
    result
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut s = String::deserialize(deserializer)?;
    let decoded = BASE64.decode(&s).map_err(serde::de::Error::custom);
    s.zeroize();
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::attributes::{SecretPersistence, SecretType};
    use tempfile::TempDir;

    fn sample_document() -> VaultDocument {
        let mut doc = VaultDocument::empty();
        doc.secrets.push(StoredSecret {
            id: 1,
            attributes: SecretAttributes::key(SecretType::Aes256Key, SecretPersistence::Persistent)
                .unwrap(),
            material: vec![0x42; 32],
            created_at: Utc::now(),
        });
        doc.next_id = 2;
        doc
    }

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.svlt");

        write_document(&path, &sample_document()).unwrap();
        let doc = read_document(&path).unwrap();

        assert_eq!(doc.next_id, 2);
        assert_eq!(doc.secrets.len(), 1);
        assert_eq!(doc.secrets[0].material, vec![0x42; 32]);
        assert_eq!(
            doc.secrets[0].attributes.secret_type(),
            SecretType::Aes256Key
        );
    }

    #[test]
    fn detects_flipped_body_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.svlt");
        write_document(&path, &sample_document()).unwrap();

        let mut data = fs::read(&path).unwrap();
        data[PREFIX_LEN + 3] ^= 0x01;
        fs::write(&path, &data).unwrap();

        assert!(read_document(&path).is_err());
    }

    #[test]
    fn rejects_wrong_magic_and_truncation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.svlt");
        write_document(&path, &sample_document()).unwrap();
        let data = fs::read(&path).unwrap();

        let mut bad_magic = data.clone();
        bad_magic[0] = b'X';
        assert!(parse_document(&bad_magic).is_err());

        assert!(parse_document(&data[..data.len() - 1]).is_err());
        assert!(parse_document(&data[..5]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn stale_temp_file_is_replaced_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.svlt");
        let tmp_path = dir.path().join(".test.svlt.tmp");
        fs::write(&tmp_path, b"stale").unwrap();
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o644)).unwrap();

        write_private(&tmp_path, b"fresh").unwrap();
        let mode = fs::metadata(&tmp_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read(&tmp_path).unwrap(), b"fresh");

        write_document(&path, &sample_document()).unwrap();
        assert!(!tmp_path.exists());
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn vault_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.svlt");
        write_document(&path, &VaultDocument::empty()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
