//! In-memory secret store: an append-only arena of slots.
//!
//! Every allocation appends a slot and returns a handle naming it.
//! Destroying a secret drops its record (wiping the material) and leaves
//! a tombstone behind, so the slot number is never issued again and a
//! stale handle can never alias a newer secret.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

use super::secret::{SecretHandle, SecretMetadata, SecretRecord};
use crate::errors::{Result, VaultError};

/// Process-wide counter giving each store a distinct handle tag.
static NEXT_STORE_TAG: AtomicU32 = AtomicU32::new(1);

enum Slot {
    Live(SecretRecord),
    Destroyed,
}

/// Handle-indexed table of secret records owned by one vault.
pub struct SecretStore {
    tag: u32,
    slots: Vec<Slot>,
    live: usize,
}

/// Claim the next store tag. Tags start at 1 and are never reissued.
fn next_tag(counter: &AtomicU32) -> Result<u32> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |tag| tag.checked_add(1))
        .map_err(|_| VaultError::ResourceExhausted)
}

impl SecretStore {
    /// An empty store with a fresh tag.
    ///
    /// Fails with `ResourceExhausted` once every tag has been issued.
    pub fn new() -> Result<Self> {
        Ok(Self {
            tag: next_tag(&NEXT_STORE_TAG)?,
            slots: Vec::new(),
            live: 0,
        })
    }

    /// Take ownership of `record` and return a never-before-issued handle.
    pub fn allocate(&mut self, record: SecretRecord) -> Result<SecretHandle> {
        let slot = u32::try_from(self.slots.len() + 1).map_err(|_| VaultError::ResourceExhausted)?;

        self.slots.push(Slot::Live(record));
        self.live += 1;

        let handle = SecretHandle::new(self.tag, slot);
        debug!(%handle, live = self.live, "allocated secret");
        Ok(handle)
    }

    /// Look up a live record.
    ///
    /// Destroyed, foreign and never-issued handles all yield `SecretNotFound`.
    pub fn resolve(&self, handle: SecretHandle) -> Result<&SecretRecord> {
        match self.index(handle).map(|i| &self.slots[i]) {
            Some(Slot::Live(record)) => Ok(record),
            Some(Slot::Destroyed) | None => Err(VaultError::SecretNotFound(handle.as_raw())),
        }
    }

    /// Remove a live record, leaving a tombstone.
    ///
    /// The record is returned so the caller can purge any durable copy;
    /// its material is wiped when it is dropped.
    pub fn destroy(&mut self, handle: SecretHandle) -> Result<SecretRecord> {
        let index = self
            .index(handle)
            .ok_or(VaultError::SecretNotFound(handle.as_raw()))?;

        match std::mem::replace(&mut self.slots[index], Slot::Destroyed) {
            Slot::Live(record) => {
                self.live -= 1;
                debug!(%handle, live = self.live, "destroyed secret");
                Ok(record)
            }
            Slot::Destroyed => Err(VaultError::SecretNotFound(handle.as_raw())),
        }
    }

    /// Destroy every live record. Returns how many were destroyed.
    pub fn destroy_all(&mut self) -> usize {
        let mut destroyed = 0;
        for slot in &mut self.slots {
            if let Slot::Live(_) = std::mem::replace(slot, Slot::Destroyed) {
                destroyed += 1;
            }
        }
        self.live = 0;
        destroyed
    }

    /// Metadata for every live secret, in handle order.
    pub fn list(&self) -> Vec<SecretMetadata> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Live(record) => Some(SecretMetadata {
                    // Slot count is bounded by `allocate`, so this never truncates.
                    handle: SecretHandle::new(self.tag, (i + 1) as u32),
                    attributes: *record.attributes(),
                    created_at: record.created_at(),
                }),
                Slot::Destroyed => None,
            })
            .collect()
    }

    /// Number of live secrets.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn index(&self, handle: SecretHandle) -> Option<usize> {
        if handle.store_tag() != self.tag || handle.slot() == 0 {
            return None;
        }
        let index = handle.slot() as usize - 1;
        (index < self.slots.len()).then_some(index)
    }
}
