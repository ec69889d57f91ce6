/// Test images.
///
/// `Synth` lays out a tiny volume by hand so tests can plant exact FAT values
/// and directory slots, including ones no formatter would ever write. Real
/// images come from the `fatfs` crate through [`fatfs_image`].

use std::io::{Cursor, Write};
use std::vec::Vec;

use crate::boot_sector::Bpb;
use crate::table::ClusterTable;
use crate::variant::{self, FatVariant};

pub const SECTOR: usize = 512;

// ─── Synthetic volume ──────────────────────────────────────────────────────────

/// Geometry:
///
/// | variant | reserved | FATs x sectors | root entries | clusters |
/// |---------|----------|----------------|--------------|----------|
/// | FAT12   | 1        | 2 x 1          | 16           | 60       |
/// | FAT16   | 1        | 2 x 17         | 16           | 4100     |
/// | FAT32   | 4        | 2 x 1          | (cluster 2)  | 64       |
pub struct Synth {
    variant:       FatVariant,
    img:           Vec<u8>,
    spc:           u32,
    reserved:      u32,
    fats:          u32,
    spf:           u32,
    root_entries:  u32,
    clusters:      u32,
}

impl Synth {
    pub fn new(variant: FatVariant) -> Self {
        Self::with_sectors_per_cluster(variant, 1)
    }

    pub fn with_sectors_per_cluster(variant: FatVariant, spc: u8) -> Self {
        let (reserved, spf, root_entries, clusters) = match variant {
            FatVariant::Fat12 => (1u32, 1u32, 16u32, 60u32),
            FatVariant::Fat16 => (1, 17, 16, 4100),
            FatVariant::Fat32 => (4, 1, 0, 64),
        };
        let fats = 2u32;
        let spc32 = u32::from(spc);
        let root_sectors = (root_entries * 32).div_ceil(SECTOR as u32);
        let total = reserved + fats * spf + root_sectors + clusters * spc32;

        let mut synth = Self {
            variant,
            img: vec![0u8; total as usize * SECTOR],
            spc: spc32,
            reserved,
            fats,
            spf,
            root_entries,
            clusters,
        };
        synth.write_boot_sector(total, spc);
        synth.set_fat(0, variant.entry_mask() & !0xFF | 0xF8);
        synth.set_fat(1, variant.entry_mask());
        if variant == FatVariant::Fat32 {
            synth.set_fat(2, variant.entry_mask());
        }
        synth
    }

    fn write_boot_sector(&mut self, total: u32, spc: u8) {
        let s = &mut self.img[..SECTOR];
        s[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        s[3..11].copy_from_slice(b"BOSFAT  ");
        s[11..13].copy_from_slice(&(SECTOR as u16).to_le_bytes());
        s[13] = spc;
        s[14..16].copy_from_slice(&(self.reserved as u16).to_le_bytes());
        s[16] = self.fats as u8;
        s[17..19].copy_from_slice(&(self.root_entries as u16).to_le_bytes());
        if total <= 0xFFFF {
            s[19..21].copy_from_slice(&(total as u16).to_le_bytes());
        } else {
            s[32..36].copy_from_slice(&total.to_le_bytes());
        }
        s[21] = 0xF8;
        s[24..26].copy_from_slice(&32u16.to_le_bytes());
        s[26..28].copy_from_slice(&2u16.to_le_bytes());

        match self.variant {
            FatVariant::Fat12 | FatVariant::Fat16 => {
                s[22..24].copy_from_slice(&(self.spf as u16).to_le_bytes());
                s[36] = 0x80;
                s[38] = 0x29;
                s[39..43].copy_from_slice(&0x1234_5678u32.to_le_bytes());
                s[43..54].copy_from_slice(b"SYNTHETIC  ");
                let sys: &[u8; 8] = if self.variant == FatVariant::Fat12 { b"FAT12   " } else { b"FAT16   " };
                s[54..62].copy_from_slice(sys);
            }
            FatVariant::Fat32 => {
                s[36..40].copy_from_slice(&self.spf.to_le_bytes());
                // flags 0, version 0.0
                s[44..48].copy_from_slice(&2u32.to_le_bytes());
                s[48..50].copy_from_slice(&1u16.to_le_bytes());
                s[50..52].copy_from_slice(&0u16.to_le_bytes());
                s[64] = 0x80;
                s[66] = 0x29;
                s[67..71].copy_from_slice(&0x1234_5678u32.to_le_bytes());
                s[71..82].copy_from_slice(b"SYNTHETIC  ");
                s[82..90].copy_from_slice(b"FAT32   ");
            }
        }
        s[510] = 0x55;
        s[511] = 0xAA;

        if self.variant == FatVariant::Fat32 {
            let info = &mut self.img[SECTOR..2 * SECTOR];
            info[0..4].copy_from_slice(&0x4161_5252u32.to_le_bytes());
            info[484..488].copy_from_slice(&0x6141_7272u32.to_le_bytes());
            info[488..492].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
            info[492..496].copy_from_slice(&3u32.to_le_bytes());
            info[508..512].copy_from_slice(&0xAA55_0000u32.to_le_bytes());
        }
    }

    pub fn bpb(&self) -> Bpb {
        let mut sec = [0u8; SECTOR];
        sec.copy_from_slice(&self.img[..SECTOR]);
        Bpb::decode(&sec)
    }

    pub fn table(&self) -> ClusterTable {
        let bpb = self.bpb();
        ClusterTable::new(
            self.variant,
            &bpb,
            self.spf,
            variant::root_dir_sectors(&bpb),
            0,
            self.clusters,
        )
    }

    pub fn bytes_per_cluster(&self) -> usize {
        self.spc as usize * SECTOR
    }

    /// Write `value` into every FAT copy.
    pub fn set_fat(&mut self, cluster: u32, value: u32) {
        for copy in 0..self.fats {
            let base = ((self.reserved + copy * self.spf) as usize) * SECTOR;
            let c = cluster as usize;
            match self.variant {
                FatVariant::Fat12 => {
                    let off = base + c + c / 2;
                    let v = (value & 0x0FFF) as u16;
                    let old = u16::from_le_bytes([self.img[off], self.img[off + 1]]);
                    let new = if c & 1 == 1 { (old & 0x000F) | (v << 4) } else { (old & 0xF000) | v };
                    self.img[off..off + 2].copy_from_slice(&new.to_le_bytes());
                }
                FatVariant::Fat16 => {
                    let off = base + c * 2;
                    self.img[off..off + 2].copy_from_slice(&(value as u16).to_le_bytes());
                }
                FatVariant::Fat32 => {
                    let off = base + c * 4;
                    self.img[off..off + 4].copy_from_slice(&value.to_le_bytes());
                }
            }
        }
    }

    /// Link `clusters` in order; the last one gets end-of-chain.
    pub fn link_chain(&mut self, clusters: &[u32]) {
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.set_fat(last, self.variant.entry_mask());
        }
    }

    pub fn write_cluster(&mut self, cluster: u32, data: &[u8]) {
        assert!(data.len() <= self.bytes_per_cluster());
        let off = self.table().cluster_offset(cluster) as usize;
        self.img[off..off + data.len()].copy_from_slice(data);
    }

    /// Link `chain` and spread `data` over it cluster by cluster.
    pub fn write_chain(&mut self, chain: &[u32], data: &[u8]) {
        self.link_chain(chain);
        for (&cluster, chunk) in chain.iter().zip(data.chunks(self.bytes_per_cluster())) {
            self.write_cluster(cluster, chunk);
        }
    }

    /// Root directory slots: the fixed region on FAT12/16, cluster 2 on FAT32.
    pub fn write_root_slots(&mut self, slots: &[[u8; 32]]) {
        if self.variant == FatVariant::Fat32 {
            self.write_dir_slots(&[2], slots);
            return;
        }
        assert!(slots.len() <= self.root_entries as usize);
        let base = ((self.reserved + self.fats * self.spf) as usize) * SECTOR;
        for (i, slot) in slots.iter().enumerate() {
            self.img[base + i * 32..base + (i + 1) * 32].copy_from_slice(slot);
        }
    }

    /// Link `chain` and lay `slots` out across it, contiguously over cluster
    /// boundaries.
    pub fn write_dir_slots(&mut self, chain: &[u32], slots: &[[u8; 32]]) {
        let flat: Vec<u8> = slots.iter().flatten().copied().collect();
        self.write_chain(chain, &flat);
    }

    pub fn build(self) -> Vec<u8> {
        self.img
    }
}

// ─── Directory slots ───────────────────────────────────────────────────────────

pub const ATTR_DIR:     u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;

/// Timestamps stamped on every short slot: 2021-06-15 13:45:30 modified,
/// 2020-01-02 03:04:06 created, 2021-06-16 accessed.
pub const MOD_TIME:    u16 = (13 << 11) | (45 << 5) | 15;
pub const MOD_DATE:    u16 = (41 << 9) | (6 << 5) | 15;
pub const CREATE_TIME: u16 = (3 << 11) | (4 << 5) | 3;
pub const CREATE_DATE: u16 = (40 << 9) | (1 << 5) | 2;
pub const ACCESS_DATE: u16 = (41 << 9) | (6 << 5) | 16;

pub fn short_slot(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut s = [0u8; 32];
    s[0..11].copy_from_slice(name);
    s[11] = attr;
    s[13] = 57;
    s[14..16].copy_from_slice(&CREATE_TIME.to_le_bytes());
    s[16..18].copy_from_slice(&CREATE_DATE.to_le_bytes());
    s[18..20].copy_from_slice(&ACCESS_DATE.to_le_bytes());
    s[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    s[22..24].copy_from_slice(&MOD_TIME.to_le_bytes());
    s[24..26].copy_from_slice(&MOD_DATE.to_le_bytes());
    s[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    s[28..32].copy_from_slice(&size.to_le_bytes());
    s
}

pub fn volume_label_slot(label: &[u8; 11]) -> [u8; 32] {
    short_slot(label, 0x08, 0, 0)
}

pub fn deleted(mut slot: [u8; 32]) -> [u8; 32] {
    slot[0] = 0xE5;
    slot
}

pub fn checksum(short: &[u8; 11]) -> u8 {
    short.iter().fold(0u8, |sum, &b| sum.rotate_right(1).wrapping_add(b))
}

/// Long-name slots in on-disk order (highest sequence first), as a formatter
/// would write them in front of the short slot.
pub fn lfn_slots(long: &str, short: &[u8; 11]) -> Vec<[u8; 32]> {
    let mut units: Vec<u16> = long.encode_utf16().collect();
    if units.len() % 13 != 0 {
        units.push(0x0000);
        while units.len() % 13 != 0 {
            units.push(0xFFFF);
        }
    }
    let sum = checksum(short);
    let count = units.len() / 13;
    let mut slots = Vec::with_capacity(count);
    for (i, chunk) in units.chunks(13).enumerate() {
        let mut s = [0u8; 32];
        s[0] = (i + 1) as u8 | if i + 1 == count { 0x40 } else { 0 };
        s[11] = 0x0F;
        s[13] = sum;
        let positions = (1..11).step_by(2).chain((14..26).step_by(2)).chain((28..32).step_by(2));
        for (pos, unit) in positions.zip(chunk) {
            s[pos..pos + 2].copy_from_slice(&unit.to_le_bytes());
        }
        slots.push(s);
    }
    slots.reverse();
    slots
}

// ─── fatfs images ──────────────────────────────────────────────────────────────

/// Format an image with `fatfs` and populate it. `dirs` are created in order,
/// so parents must come first; paths use `/`.
pub fn fatfs_image(fat_type: fatfs::FatType, dirs: &[&str], files: &[(&str, &[u8])]) -> Vec<u8> {
    let (size, cluster) = match fat_type {
        fatfs::FatType::Fat12 => (1_474_560, 512),
        fatfs::FatType::Fat16 => (16 * 1024 * 1024, 2048),
        fatfs::FatType::Fat32 => (40 * 1024 * 1024, 512),
    };
    let mut cursor = Cursor::new(vec![0u8; size]);
    fatfs::format_volume(
        &mut cursor,
        fatfs::FormatVolumeOptions::new().fat_type(fat_type).bytes_per_cluster(cluster),
    ).expect("format_volume failed");
    {
        let fs = fatfs::FileSystem::new(&mut cursor, fatfs::FsOptions::new())
            .expect("FileSystem::new failed");
        let root = fs.root_dir();
        for dir in dirs {
            root.create_dir(dir).expect("create_dir failed");
        }
        for (path, content) in files {
            let mut f = root.create_file(path).expect("create_file failed");
            f.truncate().unwrap();
            f.write_all(content).unwrap();
        }
    }
    cursor.into_inner()
}

/// Deterministic non-repeating-looking content.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
