//! Persistent gamepad calibration storage
//!
//! Calibrations are keyed by the gamepad's MAC address and kept in four
//! ring-replaced slots so that a handful of different gamepads can each
//! keep their own calibration. The backing store is a simple file-per-key
//! namespace directory injected at construction; every operation is
//! best-effort and an I/O failure surfaces as "not found" rather than an
//! error, leaving the caller with its defaults and a re-calibrate prompt.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use std::fs;
use std::path::PathBuf;

// Internal
use ctrl_if::cal::{CalSlot, SLOT_BYTES};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Namespace the calibration slots live in.
pub const CAL_NAMESPACE: &str = "multigpcal";

/// Number of calibration slots.
pub const NUM_SLOTS: usize = 4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A file-per-key preferences namespace.
pub struct PrefsStore {
    namespace_dir: PathBuf,
}

/// Keeper of the persistent calibration slots.
pub struct JoyCalKeeper {
    store: PrefsStore,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PrefsStore {
    /// Open (and create if necessary) a namespace under the given root.
    pub fn new(root: PathBuf, namespace: &str) -> Self {
        let mut namespace_dir = root;
        namespace_dir.push(namespace);
        Self { namespace_dir }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let mut path = self.namespace_dir.clone();
        path.push(key);
        path
    }

    /// Whether the key exists in the namespace.
    pub fn is_key(&self, key: &str) -> bool {
        self.key_path(key).exists()
    }

    /// Read the value of a key, or `None` if it does not exist or cannot
    /// be read.
    pub fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.key_path(key)).ok()
    }

    /// Write the value of a key.
    pub fn put_bytes(&self, key: &str, value: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.namespace_dir)?;
        fs::write(self.key_path(key), value)
    }
}

impl JoyCalKeeper {
    pub fn new(store: PrefsStore) -> Self {
        Self { store }
    }

    fn slot_name(slot_index: usize) -> String {
        format!("gpcal_slot_{}", slot_index)
    }

    /// Read and decode one slot.
    fn read_slot(&self, slot_index: usize) -> Option<CalSlot> {
        let bytes = self.store.get_bytes(&Self::slot_name(slot_index))?;
        if bytes.len() != SLOT_BYTES {
            warn!(
                "Calibration slot {} has {} bytes, expected {}",
                slot_index,
                bytes.len(),
                SLOT_BYTES
            );
            return None;
        }
        let mut buf = [0u8; SLOT_BYTES];
        buf.copy_from_slice(&bytes);
        Some(CalSlot::from_bytes(&buf))
    }

    /// Find the slot holding the calibration for the given MAC address,
    /// or `None` if there is none (or the store cannot be read).
    pub fn find_slot_by_mac(&self, mac48: &[u8; 6]) -> Option<usize> {
        for i in 0..NUM_SLOTS {
            if let Some(slot) = self.read_slot(i) {
                if &slot.mac48 == mac48 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Load one slot, or `None` on any error.
    pub fn load_slot(&self, slot_index: usize) -> Option<CalSlot> {
        if slot_index >= NUM_SLOTS {
            return None;
        }
        self.read_slot(slot_index)
    }

    /// Save a slot, returning the index it went to or `None` on failure.
    ///
    /// With an explicit index the slot keeps the sequence number already
    /// stored there. Without one the first hole is filled, or the slot at
    /// the rolling-sequence-number discontinuity is replaced (that slot is
    /// the oldest), wrapping to slot 0 when the ring is fully contiguous.
    pub fn save_slot(
        &mut self,
        slot_index: Option<usize>,
        slot_to_save: &mut CalSlot,
    ) -> Option<usize> {
        let index_to_use;
        let mut sqn_to_use = slot_to_save.seq_num;

        match slot_index {
            Some(i) if i < NUM_SLOTS => {
                index_to_use = i;
                if let Some(existing) = self.read_slot(i) {
                    sqn_to_use = existing.seq_num;
                }
            }
            _ => {
                let slots: Vec<Option<CalSlot>> =
                    (0..NUM_SLOTS).map(|i| self.read_slot(i)).collect();

                match slots.iter().position(|s| s.is_none()) {
                    // A hole! It must be filled!
                    Some(hole) => {
                        index_to_use = hole;
                        sqn_to_use = match hole {
                            0 => 0,
                            i => slots[i - 1]
                                .as_ref()
                                .map(|s| s.seq_num.wrapping_add(1))
                                .unwrap_or(0),
                        };
                    }
                    // Full ring: replace the slot where the sequence
                    // numbers stop being consecutive, or wrap to the
                    // start
                    None => {
                        let mut index = 0;
                        let mut sqn = slots[NUM_SLOTS - 1]
                            .as_ref()
                            .map(|s| s.seq_num.wrapping_add(1))
                            .unwrap_or(0);
                        for i in 1..NUM_SLOTS {
                            let prev = slots[i - 1].as_ref().unwrap().seq_num;
                            let here = slots[i].as_ref().unwrap().seq_num;
                            if here != prev.wrapping_add(1) {
                                index = i;
                                sqn = prev.wrapping_add(1);
                                break;
                            }
                        }
                        index_to_use = index;
                        sqn_to_use = sqn;
                    }
                }
            }
        }

        slot_to_save.seq_num = sqn_to_use;
        let bytes = slot_to_save.to_bytes();

        match self
            .store
            .put_bytes(&Self::slot_name(index_to_use), &bytes)
        {
            Ok(()) => Some(index_to_use),
            Err(e) => {
                warn!("Could not save calibration slot {}: {}", index_to_use, e);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
