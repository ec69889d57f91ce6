/// Boot sector decoding: BPB, the variant-specific extended BPB and the FAT32
/// FSInfo sector.
///
/// Every multi-byte field is decoded on its own through [`le::field`] at its
/// fixed offset; nothing is cast from a packed struct.

use crate::block::BlockSource;
use crate::error::{Corruption, IoError, MountError};
use crate::le;

// ─── Constants ─────────────────────────────────────────────────────────────────

pub const BOOT_SECTOR_LEN: usize = 512;
/// The extended BPB starts right after the common BPB.
pub const EBPB_OFFSET: usize = 36;
pub const BOOT_SIGNATURE: u16 = 0xAA55;

pub const FSINFO_LEAD_SIGNATURE:   u32 = 0x4161_5252;
pub const FSINFO_STRUCT_SIGNATURE: u32 = 0x6141_7272;
pub const FSINFO_TRAIL_SIGNATURE:  u32 = 0xAA55_0000;
/// Counter value meaning "not known".
pub const FSINFO_UNKNOWN: u32 = 0xFFFF_FFFF;

// ─── BPB (BIOS Parameter Block) ───────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bpb {
    pub jump:               [u8; 3],
    pub oem_id:             [u8; 8],
    pub bytes_per_sector:   u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors:   u16,
    pub fat_count:          u8,
    /// Zero on FAT32.
    pub root_entry_count:   u16,
    /// Zero means "use `total_sectors_32`".
    pub total_sectors_16:   u16,
    pub media:              u8,
    /// Zero on FAT32; the real value lives in the extended BPB.
    pub sectors_per_fat_16: u16,
    pub sectors_per_track:  u16,
    pub heads:              u16,
    pub hidden_sectors:     u32,
    pub total_sectors_32:   u32,
    /// Word at offset 510, `0xAA55` on a valid boot sector.
    pub boot_signature:     u16,
}

impl Bpb {
    pub fn decode(sec: &[u8; BOOT_SECTOR_LEN]) -> Self {
        Self {
            jump:                le::bytes(sec, 0),
            oem_id:              le::bytes(sec, 3),
            bytes_per_sector:    le::field(sec, 11),
            sectors_per_cluster: le::field(sec, 13),
            reserved_sectors:    le::field(sec, 14),
            fat_count:           le::field(sec, 16),
            root_entry_count:    le::field(sec, 17),
            total_sectors_16:    le::field(sec, 19),
            media:               le::field(sec, 21),
            sectors_per_fat_16:  le::field(sec, 22),
            sectors_per_track:   le::field(sec, 24),
            heads:               le::field(sec, 26),
            hidden_sectors:      le::field(sec, 28),
            total_sectors_32:    le::field(sec, 32),
            boot_signature:      le::field(sec, 510),
        }
    }

    pub fn total_sectors(&self) -> u32 {
        match self.total_sectors_16 {
            0 => self.total_sectors_32,
            n => u32::from(n),
        }
    }

    /// `EB xx 90` (short jump) or `E9 xx xx` (near jump).
    pub fn has_jump(&self) -> bool {
        matches!(self.jump[0], 0xEB | 0xE9)
    }

    pub fn bytes_per_cluster(&self) -> u32 {
        u32::from(self.bytes_per_sector) * u32::from(self.sectors_per_cluster)
    }
}

// ─── Extended BPB ──────────────────────────────────────────────────────────────

/// FAT12/FAT16 extended BPB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacyEbpb {
    pub drive_number: u8,
    pub signature:    u8,
    pub volume_id:    u32,
    pub volume_label: [u8; 11],
    pub system_id:    [u8; 8],
}

impl LegacyEbpb {
    pub fn decode(sec: &[u8; BOOT_SECTOR_LEN]) -> Self {
        let o = EBPB_OFFSET;
        Self {
            drive_number: le::field(sec, o),
            // o + 1 reserved
            signature:    le::field(sec, o + 2),
            volume_id:    le::field(sec, o + 3),
            volume_label: le::bytes(sec, o + 7),
            system_id:    le::bytes(sec, o + 18),
        }
    }
}

/// FAT32 extended BPB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fat32Ebpb {
    pub sectors_per_fat:    u32,
    pub flags:              u16,
    pub version:            u16,
    pub root_cluster:       u32,
    pub fs_info_sector:     u16,
    pub backup_boot_sector: u16,
    pub drive_number:       u8,
    pub signature:          u8,
    pub volume_id:          u32,
    pub volume_label:       [u8; 11],
    pub system_id:          [u8; 8],
}

impl Fat32Ebpb {
    const MIRRORING_DISABLED: u16 = 0x0080;

    pub fn decode(sec: &[u8; BOOT_SECTOR_LEN]) -> Self {
        let o = EBPB_OFFSET;
        Self {
            sectors_per_fat:    le::field(sec, o),
            flags:              le::field(sec, o + 4),
            version:            le::field(sec, o + 6),
            root_cluster:       le::field(sec, o + 8),
            fs_info_sector:     le::field(sec, o + 12),
            backup_boot_sector: le::field(sec, o + 14),
            // o + 16 .. o + 28 reserved
            drive_number:       le::field(sec, o + 28),
            // o + 29 reserved
            signature:          le::field(sec, o + 30),
            volume_id:          le::field(sec, o + 31),
            volume_label:       le::bytes(sec, o + 35),
            system_id:          le::bytes(sec, o + 46),
        }
    }

    /// The single FAT in use when mirroring is switched off, else `None`
    /// (all copies are kept identical and the first one is authoritative).
    pub fn active_fat(&self) -> Option<u8> {
        if self.flags & Self::MIRRORING_DISABLED != 0 {
            Some((self.flags & 0x000F) as u8)
        } else {
            None
        }
    }

    /// `(major, minor)` filesystem version.
    pub fn version(&self) -> (u8, u8) {
        ((self.version >> 8) as u8, self.version as u8)
    }

    /// Sector of the FSInfo block, if the volume has one.
    pub fn fs_info_location(&self) -> Option<u16> {
        match self.fs_info_sector {
            0 | 0xFFFF => None,
            n => Some(n),
        }
    }
}

/// The extended BPB in whichever of its two shapes the volume uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtendedBpb {
    Legacy(LegacyEbpb),
    Fat32(Fat32Ebpb),
}

impl ExtendedBpb {
    pub fn drive_number(&self) -> u8 {
        match self {
            ExtendedBpb::Legacy(e) => e.drive_number,
            ExtendedBpb::Fat32(e)  => e.drive_number,
        }
    }

    pub fn signature(&self) -> u8 {
        match self {
            ExtendedBpb::Legacy(e) => e.signature,
            ExtendedBpb::Fat32(e)  => e.signature,
        }
    }

    /// `0x28` carries only the volume id; `0x29` adds label and system id.
    pub fn has_extended_signature(&self) -> bool {
        matches!(self.signature(), 0x28 | 0x29)
    }

    pub fn volume_id(&self) -> Option<u32> {
        if !self.has_extended_signature() {
            return None;
        }
        Some(match self {
            ExtendedBpb::Legacy(e) => e.volume_id,
            ExtendedBpb::Fat32(e)  => e.volume_id,
        })
    }

    /// Raw 11-byte label; only present with signature `0x29`.
    pub fn volume_label(&self) -> Option<&[u8; 11]> {
        if self.signature() != 0x29 {
            return None;
        }
        Some(match self {
            ExtendedBpb::Legacy(e) => &e.volume_label,
            ExtendedBpb::Fat32(e)  => &e.volume_label,
        })
    }

    /// Informational type string such as `"FAT12   "`; never used for detection.
    pub fn system_id(&self) -> Option<&[u8; 8]> {
        if self.signature() != 0x29 {
            return None;
        }
        Some(match self {
            ExtendedBpb::Legacy(e) => &e.system_id,
            ExtendedBpb::Fat32(e)  => &e.system_id,
        })
    }

    pub fn as_fat32(&self) -> Option<&Fat32Ebpb> {
        match self {
            ExtendedBpb::Fat32(e) => Some(e),
            ExtendedBpb::Legacy(_) => None,
        }
    }
}

// ─── FSInfo ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FsInfo {
    pub lead_signature:   u32,
    pub struct_signature: u32,
    pub free_count:       u32,
    pub next_free:        u32,
    pub trail_signature:  u32,
}

impl FsInfo {
    pub fn decode(sec: &[u8; BOOT_SECTOR_LEN]) -> Self {
        Self {
            lead_signature:   le::field(sec, 0),
            struct_signature: le::field(sec, 484),
            free_count:       le::field(sec, 488),
            next_free:        le::field(sec, 492),
            trail_signature:  le::field(sec, 508),
        }
    }

    pub fn verify(&self) -> Result<(), Corruption> {
        if self.lead_signature == FSINFO_LEAD_SIGNATURE
            && self.struct_signature == FSINFO_STRUCT_SIGNATURE
            && self.trail_signature == FSINFO_TRAIL_SIGNATURE
        {
            Ok(())
        } else {
            Err(Corruption::FsInfoSignature)
        }
    }

    /// Last known free cluster count.
    pub fn free_clusters(&self) -> Option<u32> {
        (self.free_count != FSINFO_UNKNOWN).then_some(self.free_count)
    }

    /// Where an allocator should start looking for a free cluster.
    pub fn next_free_hint(&self) -> Option<u32> {
        (self.next_free != FSINFO_UNKNOWN).then_some(self.next_free)
    }
}

// ─── Boot sector ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootSector {
    pub bpb:     Bpb,
    pub ebpb:    ExtendedBpb,
    pub fs_info: Option<FsInfo>,
}

impl BootSector {
    /// Reject sectors that are not FAT boot sectors at all.
    pub fn check_signatures(&self, strict_boot_signature: bool) -> Result<(), MountError> {
        if !self.bpb.has_jump() {
            return Err(MountError::MissingJump);
        }
        if strict_boot_signature && self.bpb.boot_signature != BOOT_SIGNATURE {
            return Err(MountError::MissingBootSignature);
        }
        Ok(())
    }
}

/// Read the BPB, the extended BPB and, on FAT32, FSInfo.
///
/// The EBPB shape is picked structurally: a zero legacy sectors-per-FAT field
/// only happens on FAT32, and FSInfo can only be located once the FAT32 shape
/// has been read.
pub fn parse_boot_sector<D: BlockSource + ?Sized>(disk: &mut D) -> Result<BootSector, IoError> {
    let mut sec = [0u8; BOOT_SECTOR_LEN];
    disk.read_at(0, &mut sec)?;

    let bpb = Bpb::decode(&sec);
    let ebpb = if bpb.sectors_per_fat_16 == 0 {
        ExtendedBpb::Fat32(Fat32Ebpb::decode(&sec))
    } else {
        ExtendedBpb::Legacy(LegacyEbpb::decode(&sec))
    };

    let fs_info = match ebpb.as_fat32().and_then(Fat32Ebpb::fs_info_location) {
        Some(sector) => {
            let offset = u64::from(sector) * u64::from(bpb.bytes_per_sector);
            let mut info = [0u8; BOOT_SECTOR_LEN];
            disk.read_at(offset, &mut info)?;
            Some(FsInfo::decode(&info))
        }
        None => None,
    };

    Ok(BootSector { bpb, ebpb, fs_info })
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
