use core::fmt;

use crate::boot_sector::Bpb;
use crate::table::FatEntry;

/// Cluster counts below this are FAT12.
pub const FAT12_CLUSTER_LIMIT: u32 = 4085;
/// Cluster counts below this (and at least `FAT12_CLUSTER_LIMIT`) are FAT16.
pub const FAT16_CLUSTER_LIMIT: u32 = 65525;

/// The concrete FAT flavour of a volume and the geometry constants that go
/// with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FatVariant {
    Fat12,
    Fat16,
    Fat32,
}

impl FatVariant {
    /// Significant bits per FAT entry.
    pub const fn entry_bits(self) -> u32 {
        match self {
            FatVariant::Fat12 => 12,
            FatVariant::Fat16 => 16,
            FatVariant::Fat32 => 28,
        }
    }

    pub const fn entry_mask(self) -> u32 {
        match self {
            FatVariant::Fat12 => 0x0FFF,
            FatVariant::Fat16 => 0xFFFF,
            FatVariant::Fat32 => 0x0FFF_FFFF,
        }
    }

    /// Entry values at or above this end a chain.
    pub const fn end_of_chain(self) -> u32 {
        match self {
            FatVariant::Fat12 => 0x0FF8,
            FatVariant::Fat16 => 0xFFF8,
            FatVariant::Fat32 => 0x0FFF_FFF8,
        }
    }

    pub const fn bad_cluster(self) -> u32 {
        match self {
            FatVariant::Fat12 => 0x0FF7,
            FatVariant::Fat16 => 0xFFF7,
            FatVariant::Fat32 => 0x0FFF_FFF7,
        }
    }

    /// Most data clusters an entry of this width can address; higher cluster
    /// numbers would collide with the bad and end-of-chain markers.
    pub const fn max_clusters(self) -> u32 {
        match self {
            FatVariant::Fat12 => 0x0FF5,
            FatVariant::Fat16 => 0xFFF5,
            FatVariant::Fat32 => 0x0FFF_FFF5,
        }
    }

    /// FAT12/16 keep the root directory in a fixed region between the FATs and
    /// the data area; FAT32 stores it as an ordinary cluster chain.
    pub const fn has_fixed_root(self) -> bool {
        !matches!(self, FatVariant::Fat32)
    }

    pub const fn name(self) -> &'static str {
        match self {
            FatVariant::Fat12 => "FAT12",
            FatVariant::Fat16 => "FAT16",
            FatVariant::Fat32 => "FAT32",
        }
    }

    /// Classify a raw (already masked) FAT entry.
    pub fn classify(self, raw: u32) -> FatEntry {
        match raw & self.entry_mask() {
            0 => FatEntry::Free,
            1 => FatEntry::Reserved,
            v if v >= self.end_of_chain() => FatEntry::EndOfChain,
            v if v == self.bad_cluster()  => FatEntry::Bad,
            v => FatEntry::Next(v),
        }
    }
}

impl fmt::Display for FatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sectors taken by the fixed FAT12/16 root directory, rounded up.
pub fn root_dir_sectors(bpb: &Bpb) -> u32 {
    let bps = u32::from(bpb.bytes_per_sector);
    if bps == 0 {
        return 0;
    }
    (u32::from(bpb.root_entry_count) * 32).div_ceil(bps)
}

/// Data clusters on the volume according to the BPB.
/// `sectors_per_fat` is passed in because FAT32 keeps it in the extended BPB.
pub fn data_clusters(bpb: &Bpb, sectors_per_fat: u32) -> u32 {
    let metadata = u32::from(bpb.reserved_sectors)
        + u32::from(bpb.fat_count) * sectors_per_fat
        + root_dir_sectors(bpb);
    let data_sectors = bpb.total_sectors().saturating_sub(metadata);
    match bpb.sectors_per_cluster {
        0 => 0,
        spc => data_sectors / u32::from(spc),
    }
}

/// Pick the FAT variant from the BPB.
///
/// A zero legacy sectors-per-FAT field means the field moved into the FAT32
/// extended BPB, so that is checked before anything divides by it. Otherwise
/// Microsoft's cluster-count rule applies.
pub fn resolve_variant(bpb: &Bpb) -> FatVariant {
    if bpb.sectors_per_fat_16 == 0 {
        return FatVariant::Fat32;
    }
    variant_for_clusters(data_clusters(bpb, u32::from(bpb.sectors_per_fat_16)))
}

pub fn variant_for_clusters(clusters: u32) -> FatVariant {
    if clusters < FAT12_CLUSTER_LIMIT {
        FatVariant::Fat12
    } else if clusters < FAT16_CLUSTER_LIMIT {
        FatVariant::Fat16
    } else {
        FatVariant::Fat32
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
