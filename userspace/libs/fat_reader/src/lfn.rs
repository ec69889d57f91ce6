/// VFAT long filenames.
///
/// A long name is stored as a run of 32-byte slots in front of the short slot
/// it belongs to, highest sequence number first. Each slot carries 13 UTF-16
/// code units and the checksum of the short name it decorates.

use alloc::string::String;
use alloc::vec::Vec;

use crate::le;

pub const ATTR_LONG_NAME: u8 = 0x0F;
/// Set on the sequence byte of the slot holding the end of the name.
pub const LAST_LONG_ENTRY: u8 = 0x40;
pub const SEQUENCE_MASK: u8 = 0x1F;
pub const CHARS_PER_SLOT: usize = 13;

/// Byte offsets of the 13 code units inside a slot.
const UNIT_OFFSETS: [usize; CHARS_PER_SLOT] = [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];

/// Checksum of an 11-byte short name, as stored in every LFN slot.
pub fn short_name_checksum(short: &[u8; 11]) -> u8 {
    short.iter().fold(0u8, |sum, &b| sum.rotate_right(1).wrapping_add(b))
}

// ─── Slot ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LfnSlot {
    /// Sequence number, 1-based, flag bits removed.
    pub sequence: u8,
    pub last:     bool,
    pub checksum: u8,
    pub units:    [u16; CHARS_PER_SLOT],
}

impl LfnSlot {
    pub fn parse(slot: &[u8; 32]) -> Self {
        let mut units = [0u16; CHARS_PER_SLOT];
        for (unit, &off) in units.iter_mut().zip(UNIT_OFFSETS.iter()) {
            *unit = le::field(slot, off);
        }
        Self {
            sequence: slot[0] & SEQUENCE_MASK,
            last:     slot[0] & LAST_LONG_ENTRY != 0,
            checksum: slot[13],
            units,
        }
    }

    /// Code units up to the `0x0000` terminator; `0xFFFF` padding never
    /// appears before it.
    pub fn name_units(&self) -> &[u16] {
        let end = self.units.iter().position(|&u| u == 0x0000).unwrap_or(CHARS_PER_SLOT);
        &self.units[..end]
    }
}

// ─── Accumulator ───────────────────────────────────────────────────────────────

/// Collects LFN slots until the short slot they belong to shows up.
#[derive(Debug, Default)]
pub struct LongNameAccumulator {
    slots: Vec<LfnSlot>,
}

impl LongNameAccumulator {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn clear(&mut self) { self.slots.clear(); }

    /// A slot flagged as last starts a new name; anything gathered before is
    /// an orphan and dropped.
    pub fn push(&mut self, slot: LfnSlot) {
        if slot.last && !self.slots.is_empty() {
            log::debug!("lfn: dropping {} orphaned slot(s)", self.slots.len());
            self.slots.clear();
        }
        self.slots.push(slot);
    }

    /// Reassemble the pending name for a short slot with `checksum`.
    ///
    /// Always leaves the accumulator empty. `None` if nothing was pending or
    /// the set does not hold together: sequence numbers other than exactly
    /// 1..=n, a missing last flag, or a checksum that does not match.
    pub fn take(&mut self, checksum: u8) -> Option<String> {
        if self.slots.is_empty() {
            return None;
        }
        let mut slots = core::mem::take(&mut self.slots);
        slots.sort_by_key(|s| s.sequence);

        let n = slots.len();
        let numbered = slots.iter().enumerate().all(|(i, s)| usize::from(s.sequence) == i + 1);
        let terminated = slots[n - 1].last;
        if !numbered || !terminated {
            log::debug!("lfn: discarding {n} slot(s) with broken sequence numbers");
            return None;
        }
        if let Some(bad) = slots.iter().find(|s| s.checksum != checksum) {
            log::debug!("lfn: checksum {:#04x} does not match short name {checksum:#04x}", bad.checksum);
            return None;
        }

        let mut units = Vec::with_capacity(n * CHARS_PER_SLOT);
        for slot in &slots {
            let part = slot.name_units();
            units.extend_from_slice(part);
            if part.len() < CHARS_PER_SLOT {
                break;
            }
        }
        let name: String = char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        (!name.is_empty()).then_some(name)
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
