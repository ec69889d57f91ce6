/// Directory slot decoding.
///
/// A directory is a flat run of 32-byte slots. The FAT12/16 root is one fixed
/// region; every other directory is the concatenation of its clusters, which
/// is why [`DirectoryDecoder`] takes regions one at a time and keeps its state
/// (pending long-name slots included) across them.
///
/// ```text
///  0..11  short name        20..22 cluster high
///  11     attributes        22..24 modified time
///  12     NT reserved       24..26 modified date
///  13     created 1/100 s   26..28 cluster low
///  14..18 created time/date 28..32 size
///  18..20 accessed date
/// ```

use alloc::string::String;
use alloc::vec::Vec;
use bitflags::bitflags;

use crate::le;
use crate::lfn::{self, LfnSlot, LongNameAccumulator};
use crate::time::{FatDate, FatDateTime};

pub const SLOT_LEN: usize = 32;

const END_OF_DIRECTORY: u8 = 0x00;
const DELETED: u8 = 0xE5;
/// A leading 0x05 stands for a real 0xE5 first character.
const KANJI_E5: u8 = 0x05;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;

        // Reserved bits are kept as found
        const _ = !0;
    }
}

// ─── Entry ─────────────────────────────────────────────────────────────────────

/// One decoded short-name slot, with its long name if one preceded it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Raw 8.3 name, space padded.
    pub short_name:          [u8; 11],
    pub attributes:          Attributes,
    /// Byte 12; Windows keeps lowercase hints for the short name here.
    pub nt_reserved:         u8,
    /// Extra creation time resolution, 0..=199 hundredths of a second.
    pub creation_hundredths: u8,
    pub created:             FatDateTime,
    pub accessed:            FatDate,
    pub modified:            FatDateTime,
    pub first_cluster:       u32,
    pub size:                u32,
    pub long_name:           Option<String>,
}

impl DirectoryEntry {
    /// Decode a short-name slot. The long name is attached by the caller.
    pub fn decode(slot: &[u8; SLOT_LEN]) -> Self {
        let hi: u16 = le::field(slot, 20);
        let lo: u16 = le::field(slot, 26);
        Self {
            short_name:          le::bytes(slot, 0),
            attributes:          Attributes::from_bits_retain(slot[11]),
            nt_reserved:         slot[12],
            creation_hundredths: slot[13],
            created:             FatDateTime::decode(le::field(slot, 16), le::field(slot, 14)),
            accessed:            FatDate::decode(le::field(slot, 18)),
            modified:            FatDateTime::decode(le::field(slot, 24), le::field(slot, 22)),
            first_cluster:       (u32::from(hi) << 16) | u32::from(lo),
            size:                le::field(slot, 28),
            long_name:           None,
        }
    }

    /// `"HELLO   TXT"` -> `"HELLO.TXT"`, `"README     "` -> `"README"`.
    pub fn short_name_string(&self) -> String {
        let mut raw = self.short_name;
        if raw[0] == KANJI_E5 {
            raw[0] = DELETED;
        }
        let (base, ext) = raw.split_at(8);
        let trim = |part: &[u8]| -> String {
            let end = part.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
            // Bytes above 0x7F are OEM code page; shown as Latin-1.
            part[..end].iter().map(|&b| char::from(b)).collect()
        };
        let mut name = trim(base);
        let ext = trim(ext);
        if !ext.is_empty() {
            name.push('.');
            name.push_str(&ext);
        }
        name
    }

    /// Long name if there is one, short name otherwise.
    pub fn display_name(&self) -> String {
        match &self.long_name {
            Some(long) => long.clone(),
            None => self.short_name_string(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.attributes.contains(Attributes::DIRECTORY)
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes.contains(Attributes::VOLUME_ID) && !self.is_dir()
    }

    /// `.` or `..`.
    pub fn is_dot(&self) -> bool {
        self.short_name[0] == b'.'
    }

    /// Case-insensitive match against the long or the short name.
    /// Volume labels never match.
    pub fn matches(&self, name: &str) -> bool {
        if self.is_volume_label() {
            return false;
        }
        if let Some(long) = &self.long_name {
            if names_match(long, name) {
                return true;
            }
        }
        names_match(&self.short_name_string(), name)
    }
}

/// ASCII case-insensitive comparison; other characters must be identical.
pub fn names_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.chars().zip(b.chars()).all(|(x, y)| x.eq_ignore_ascii_case(&y))
}

// ─── Decoder ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// No terminator seen; feed the next region if there is one.
    Continue,
    /// A `0x00` slot ended the directory.
    Terminated,
}

#[derive(Debug)]
pub struct DirectoryDecoder {
    entries: Vec<DirectoryEntry>,
    lfn:     LongNameAccumulator,
    state:   ScanState,
}

impl Default for DirectoryDecoder {
    fn default() -> Self { Self::new() }
}

impl DirectoryDecoder {
    pub fn new() -> Self {
        Self { entries: Vec::new(), lfn: LongNameAccumulator::new(), state: ScanState::Continue }
    }

    pub fn state(&self) -> ScanState { self.state }

    /// Entries decoded so far.
    pub fn entries(&self) -> &[DirectoryEntry] { &self.entries }

    /// Scan the next region. Trailing bytes short of a full slot are ignored.
    /// Once terminated, further regions are ignored too.
    pub fn feed(&mut self, region: &[u8]) -> ScanState {
        if self.state == ScanState::Terminated {
            return self.state;
        }
        for chunk in region.chunks_exact(SLOT_LEN) {
            let mut slot = [0u8; SLOT_LEN];
            slot.copy_from_slice(chunk);
            match slot[0] {
                END_OF_DIRECTORY => {
                    self.drop_pending("end of directory");
                    self.state = ScanState::Terminated;
                    return self.state;
                }
                DELETED => self.drop_pending("deleted slot"),
                _ if slot[11] == lfn::ATTR_LONG_NAME => self.lfn.push(LfnSlot::parse(&slot)),
                _ => {
                    let mut entry = DirectoryEntry::decode(&slot);
                    entry.long_name = self.lfn.take(lfn::short_name_checksum(&entry.short_name));
                    self.entries.push(entry);
                }
            }
        }
        self.state
    }

    /// The decoded entries in slot order.
    pub fn finish(mut self) -> Vec<DirectoryEntry> {
        self.drop_pending("end of chain");
        self.entries
    }

    fn drop_pending(&mut self, why: &str) {
        if !self.lfn.is_empty() {
            log::debug!("lfn: {why} interrupts a long name, discarding it");
            self.lfn.clear();
        }
    }
}

/// Decode one self-contained region.
pub fn decode_directory(region: &[u8]) -> Vec<DirectoryEntry> {
    let mut decoder = DirectoryDecoder::new();
    decoder.feed(region);
    decoder.finish()
}

// ─── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use crate::time::FatTime;

    fn region(slots: &[[u8; 32]]) -> Vec<u8> {
        slots.iter().flatten().copied().collect()
    }

    #[test]
    fn short_slot_fields() {
        let entries = decode_directory(&short_slot(b"HELLO   TXT", ATTR_ARCHIVE, 0x0003_0007, 1234));
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.short_name_string(), "HELLO.TXT");
        assert_eq!(e.display_name(), "HELLO.TXT");
        assert_eq!(e.attributes, Attributes::ARCHIVE);
        assert_eq!(e.first_cluster, 0x0003_0007);
        assert_eq!(e.size, 1234);
        assert_eq!(e.creation_hundredths, 57);
        assert_eq!(e.modified.date, FatDate { year: 2021, month: 6, day: 15 });
        assert_eq!(e.modified.time, FatTime { hour: 13, minute: 45, second: 30 });
        assert_eq!(e.created.date, FatDate { year: 2020, month: 1, day: 2 });
        assert_eq!(e.created.time, FatTime { hour: 3, minute: 4, second: 6 });
        assert_eq!(e.accessed, FatDate { year: 2021, month: 6, day: 16 });
        assert_eq!(e.long_name, None);
    }

    #[test]
    fn short_name_without_extension() {
        let e = DirectoryEntry::decode(&short_slot(b"README     ", 0, 0, 0));
        assert_eq!(e.short_name_string(), "README");
    }

    #[test]
    fn leading_05_stands_for_e5() {
        let e = DirectoryEntry::decode(&short_slot(b"\x05ABC    TXT", 0, 0, 0));
        assert_eq!(e.short_name_string(), "\u{E5}ABC.TXT");
    }

    #[test]
    fn long_name_from_two_slots() {
        let short = *b"AVERYL~1TXT";
        let mut slots = lfn_slots("A very long name.txt", &short);
        assert_eq!(slots.len(), 2);
        slots.push(short_slot(&short, ATTR_ARCHIVE, 5, 10));

        let mut decoder = DirectoryDecoder::new();
        assert_eq!(decoder.feed(&region(&slots)), ScanState::Continue);
        assert!(decoder.lfn.is_empty());
        let entries = decoder.finish();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].long_name.as_deref(), Some("A very long name.txt"));
        assert_eq!(entries[0].display_name(), "A very long name.txt");
        assert!(entries[0].matches("a VERY long NAME.TXT"));
        assert!(entries[0].matches("averyl~1.txt"));
    }

    #[test]
    fn deleted_slot_drops_pending_long_name() {
        let mut slots = vec![short_slot(b"FIRST   TXT", 0, 3, 1)];
        slots.extend(lfn_slots("orphaned long name.txt", b"ORPHAN~1TXT"));
        slots.push(deleted(short_slot(b"ORPHAN~1TXT", 0, 4, 1)));
        slots.push(short_slot(b"SECOND  TXT", 0, 5, 1));

        let entries = decode_directory(&region(&slots));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_name(), "FIRST.TXT");
        assert_eq!(entries[1].display_name(), "SECOND.TXT");
        assert!(entries.iter().all(|e| e.long_name.is_none()));
    }

    #[test]
    fn terminator_stops_scan() {
        let mut slots = vec![short_slot(b"A          ", 0, 0, 0), [0u8; 32]];
        slots.push(short_slot(b"HIDDEN     ", 0, 0, 0));
        let mut decoder = DirectoryDecoder::new();
        assert_eq!(decoder.feed(&region(&slots)), ScanState::Terminated);
        assert_eq!(decoder.feed(&region(&[short_slot(b"LATER      ", 0, 0, 0)])), ScanState::Terminated);
        let entries = decoder.finish();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name(), "A");
    }

    #[test]
    fn long_name_spans_regions() {
        let short = *b"SPLITN~1TXT";
        let lfn = lfn_slots("split name across clusters.txt", &short);
        assert_eq!(lfn.len(), 3);
        let mut decoder = DirectoryDecoder::new();
        decoder.feed(&region(&lfn[..2]));
        decoder.feed(&region(&[lfn[2], short_slot(&short, 0, 9, 0)]));
        let entries = decoder.finish();
        assert_eq!(entries[0].long_name.as_deref(), Some("split name across clusters.txt"));
    }

    #[test]
    fn chain_exhaustion_without_terminator_is_fine() {
        let slots = [short_slot(b"ONE        ", 0, 0, 0), short_slot(b"TWO        ", 0, 0, 0)];
        let mut decoder = DirectoryDecoder::new();
        assert_eq!(decoder.feed(&region(&slots)), ScanState::Continue);
        assert_eq!(decoder.finish().len(), 2);
    }

    #[test]
    fn volume_label_and_dot_entries() {
        let slots = [
            volume_label_slot(b"MY VOLUME  "),
            short_slot(b".          ", ATTR_DIR, 7, 0),
            short_slot(b"..         ", ATTR_DIR, 0, 0),
        ];
        let entries = decode_directory(&region(&slots));
        assert!(entries[0].is_volume_label());
        assert!(!entries[0].matches("MY VOLUME"));
        assert!(entries[1].is_dot() && entries[1].is_dir());
        assert_eq!(entries[2].display_name(), "..");
        assert_eq!(entries[2].first_cluster, 0);
    }

    #[test]
    fn reserved_attribute_bits_survive() {
        let e = DirectoryEntry::decode(&short_slot(b"ODD        ", 0xC1, 0, 0));
        assert!(e.attributes.contains(Attributes::READ_ONLY));
        assert_eq!(e.attributes.bits(), 0xC1);
    }

    #[test]
    fn names_match_rules() {
        assert!(names_match("HELLO.TXT", "hello.txt"));
        assert!(!names_match("HELLO.TXT", "HELLO.TX"));
        assert!(!names_match("HELLO.TXT", "HELLO.TXX"));
    }
}
