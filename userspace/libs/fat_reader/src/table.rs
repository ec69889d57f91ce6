/// File Allocation Table addressing.
///
/// One table type serves all three variants; the variant only changes how an
/// entry is located and unpacked:
///
/// | variant | entry offset        | read    | unpack                          |
/// |---------|---------------------|---------|---------------------------------|
/// | FAT12   | `cluster * 3 / 2`   | 2 bytes | odd: `>> 4`, even: `& 0xFFF`    |
/// | FAT16   | `cluster * 2`       | 2 bytes | as is                           |
/// | FAT32   | `cluster * 4`       | 4 bytes | `& 0x0FFF_FFFF` (top 4 reserved) |

use crate::block::BlockSource;
use crate::boot_sector::Bpb;
use crate::error::IoError;
use crate::le;
use crate::variant::FatVariant;

/// First cluster number that addresses the data region.
pub const FIRST_DATA_CLUSTER: u32 = 2;

/// A FAT entry after sentinel classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatEntry {
    /// Unallocated.
    Free,
    /// The reserved value 1; never part of a chain.
    Reserved,
    /// Link to the next cluster of the chain.
    Next(u32),
    /// Marked unusable; data after this point cannot be trusted.
    Bad,
    EndOfChain,
}

/// Byte address of `cluster` in the data region.
///
/// `root_dir_sectors` is zero on FAT32, where the root directory lives in the
/// data region instead of in front of it.
pub fn cluster_to_byte_address(bpb: &Bpb, sectors_per_fat: u32, root_dir_sectors: u32, cluster: u32) -> u64 {
    let first_data_sector = u64::from(bpb.reserved_sectors)
        + u64::from(bpb.fat_count) * u64::from(sectors_per_fat)
        + u64::from(root_dir_sectors);
    let index = u64::from(cluster.saturating_sub(FIRST_DATA_CLUSTER));
    let sector = index * u64::from(bpb.sectors_per_cluster) + first_data_sector;
    sector * u64::from(bpb.bytes_per_sector)
}

/// FAT lookups and data-region addressing for a mounted volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterTable {
    variant:             FatVariant,
    /// Byte address of the FAT copy that is read.
    fat_offset:          u64,
    /// Byte address of cluster 2.
    data_offset:         u64,
    bytes_per_cluster:   u32,
    cluster_count:       u32,
}

impl ClusterTable {
    /// `active_fat` picks which FAT copy to read (0 unless FAT32 mirroring is
    /// off). `cluster_count` is the number of data clusters on the volume.
    pub fn new(
        variant: FatVariant,
        bpb: &Bpb,
        sectors_per_fat: u32,
        root_dir_sectors: u32,
        active_fat: u8,
        cluster_count: u32,
    ) -> Self {
        let bps = u64::from(bpb.bytes_per_sector);
        let fat_sector = u64::from(bpb.reserved_sectors) + u64::from(active_fat) * u64::from(sectors_per_fat);
        Self {
            variant,
            fat_offset: fat_sector * bps,
            data_offset: cluster_to_byte_address(bpb, sectors_per_fat, root_dir_sectors, FIRST_DATA_CLUSTER),
            bytes_per_cluster: bpb.bytes_per_cluster(),
            cluster_count,
        }
    }

    pub fn variant(&self) -> FatVariant { self.variant }

    pub fn bytes_per_cluster(&self) -> u32 { self.bytes_per_cluster }

    /// Number of data clusters.
    pub fn cluster_count(&self) -> u32 { self.cluster_count }

    /// Highest valid data cluster number.
    pub fn max_cluster(&self) -> u32 {
        self.cluster_count.saturating_add(FIRST_DATA_CLUSTER - 1)
    }

    pub fn is_data_cluster(&self, cluster: u32) -> bool {
        (FIRST_DATA_CLUSTER..=self.max_cluster()).contains(&cluster)
    }

    /// Byte address of the FAT entry for `cluster`.
    pub fn entry_offset(&self, cluster: u32) -> u64 {
        let c = u64::from(cluster);
        let rel = match self.variant {
            FatVariant::Fat12 => c + c / 2,
            FatVariant::Fat16 => c * 2,
            FatVariant::Fat32 => c * 4,
        };
        self.fat_offset + rel
    }

    /// Raw entry value for `cluster`, masked to the variant's width.
    pub fn read_entry<D: BlockSource + ?Sized>(&self, disk: &mut D, cluster: u32) -> Result<u32, IoError> {
        let mut buf = [0u8; 4];
        let width = match self.variant {
            FatVariant::Fat12 | FatVariant::Fat16 => 2,
            FatVariant::Fat32 => 4,
        };
        disk.read_at(self.entry_offset(cluster), &mut buf[..width])?;
        let raw: u32 = le::field(&buf, 0);
        Ok(match self.variant {
            FatVariant::Fat12 if cluster & 1 == 1 => raw >> 4,
            FatVariant::Fat12 => raw & 0x0FFF,
            FatVariant::Fat16 => raw & 0xFFFF,
            FatVariant::Fat32 => raw & 0x0FFF_FFFF,
        })
    }

    /// What follows `cluster` in its chain.
    pub fn next_cluster<D: BlockSource + ?Sized>(&self, disk: &mut D, cluster: u32) -> Result<FatEntry, IoError> {
        let raw = self.read_entry(disk, cluster)?;
        Ok(self.variant.classify(raw))
    }

    /// Byte address of `cluster` in the data region.
    pub fn cluster_offset(&self, cluster: u32) -> u64 {
        let index = u64::from(cluster.saturating_sub(FIRST_DATA_CLUSTER));
        self.data_offset + index * u64::from(self.bytes_per_cluster)
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
