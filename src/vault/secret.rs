//! Secret handles and the records they resolve to.
//!
//! A `SecretHandle` packs the issuing store's tag into the upper 32 bits
//! and the 1-based arena slot into the lower 32 bits.  Handles from one
//! store therefore never resolve in another, and a slot is never handed
//! out twice.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::attributes::SecretAttributes;

/// Opaque identifier for a secret held by a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretHandle(u64);

impl SecretHandle {
    pub(crate) fn new(store_tag: u32, slot: u32) -> Self {
        Self((u64::from(store_tag) << 32) | u64::from(slot))
    }

    /// Wrap a raw value received from a caller.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value to hand to callers.
    pub fn as_raw(self) -> u64 {
        self.0
    }

    pub(crate) fn store_tag(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub(crate) fn slot(self) -> u32 {
        (self.0 & u64::from(u32::MAX)) as u32
    }
}

impl fmt::Display for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// A live secret owned by the store.
///
/// `material` is wiped when the record is dropped.
pub struct SecretRecord {
    attributes: SecretAttributes,
    material: Zeroizing<Vec<u8>>,
    /// Durable record id in the backend, for persistent secrets.
    backend_id: Option<u64>,
    created_at: DateTime<Utc>,
}

impl SecretRecord {
    pub(crate) fn new(
        attributes: SecretAttributes,
        material: Zeroizing<Vec<u8>>,
        backend_id: Option<u64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            attributes,
            material,
            backend_id,
            created_at,
        }
    }

    pub fn attributes(&self) -> &SecretAttributes {
        &self.attributes
    }

    pub(crate) fn material(&self) -> &[u8] {
        &self.material
    }

    pub(crate) fn backend_id(&self) -> Option<u64> {
        self.backend_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// Material never reaches debug output.
impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("attributes", &self.attributes)
            .field("backend_id", &self.backend_id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Lightweight metadata about a live secret (no material).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMetadata {
    pub handle: SecretHandle,
    pub attributes: SecretAttributes,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_packs_tag_and_slot() {
        let h = SecretHandle::new(0xDEAD, 7);
        assert_eq!(h.store_tag(), 0xDEAD);
        assert_eq!(h.slot(), 7);
        assert_eq!(SecretHandle::from_raw(h.as_raw()), h);
    }

    #[test]
    fn debug_output_hides_material() {
        let attrs = SecretAttributes::buffer(4).unwrap();
        let record = SecretRecord::new(attrs, Zeroizing::new(vec![0xAB; 4]), None, Utc::now());
        let text = format!("{record:?}");
        assert!(!text.contains("material"));
        assert!(text.contains("SecretRecord"));
    }
}
