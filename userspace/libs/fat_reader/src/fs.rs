/// Mounted volume.
///
/// Mount reads the boot sector once, validates the geometry and fixes the
/// variant and cluster table for the lifetime of the value. Every later
/// operation borrows the block source mutably for its whole duration, so a
/// directory scan and a file read can never interleave on one source.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::block::BlockSource;
use crate::boot_sector::{self, BootSector, ExtendedBpb};
use crate::chain::{Chain, ChainWalker};
use crate::dir::{Attributes, DirectoryDecoder, DirectoryEntry, ScanState};
use crate::error::{Completeness, FsError, MountError};
use crate::file::{FileContents, FileReader};
use crate::table::ClusterTable;
use crate::variant::{self, FatVariant};

// ─── Options ───────────────────────────────────────────────────────────────────

/// Mount-time knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountOptions {
    max_chain_clusters:    Option<u32>,
    strict_boot_signature: bool,
}

impl MountOptions {
    pub fn new() -> Self {
        Self { max_chain_clusters: None, strict_boot_signature: true }
    }

    /// Stop any chain after `n` clusters. Chains are always bounded by the
    /// volume's cluster count; this can only lower that bound.
    pub fn max_chain_clusters(mut self, n: u32) -> Self {
        self.max_chain_clusters = Some(n);
        self
    }

    /// Whether a missing `0xAA55` at offset 510 fails the mount (default
    /// `true`). Some old formatters never wrote it.
    pub fn strict_boot_signature(mut self, strict: bool) -> Self {
        self.strict_boot_signature = strict;
        self
    }
}

impl Default for MountOptions {
    fn default() -> Self { Self::new() }
}

// ─── Public types ──────────────────────────────────────────────────────────────

/// Which directory to list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirLocator {
    Root,
    /// A directory whose entries start at this cluster.
    Cluster(u32),
}

impl DirLocator {
    /// `..` of a first-level directory stores cluster 0 for the root.
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        match entry.first_cluster {
            0 => DirLocator::Root,
            c => DirLocator::Cluster(c),
        }
    }
}

/// One scan of a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub entries:      Vec<DirectoryEntry>,
    pub completeness: Completeness,
}

impl Listing {
    /// First entry whose long or short name matches, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.matches(name))
    }

    pub fn iter(&self) -> core::slice::Iter<'_, DirectoryEntry> { self.entries.iter() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RootDir {
    /// FAT12/16: fixed region between the FATs and the data area.
    Fixed { offset: u64, len: u32 },
    /// FAT32: ordinary chain.
    Chain(u32),
}

pub struct FileSystem<D> {
    disk:        D,
    boot:        BootSector,
    variant:     FatVariant,
    table:       ClusterTable,
    root:        RootDir,
    chain_limit: u32,
}

// ─── Mount ─────────────────────────────────────────────────────────────────────

impl<D: BlockSource> FileSystem<D> {
    pub fn mount(disk: D) -> Result<Self, MountError> {
        Self::mount_with(disk, MountOptions::new())
    }

    pub fn mount_with(mut disk: D, options: MountOptions) -> Result<Self, MountError> {
        let boot = boot_sector::parse_boot_sector(&mut disk)?;
        boot.check_signatures(options.strict_boot_signature)?;
        let bpb = &boot.bpb;

        let bps = bpb.bytes_per_sector;
        if !bps.is_power_of_two() || !(512..=4096).contains(&bps) {
            return Err(MountError::InvalidGeometry("bytes per sector must be a power of two in 512..=4096"));
        }
        if !bpb.sectors_per_cluster.is_power_of_two() {
            return Err(MountError::InvalidGeometry("sectors per cluster must be a non-zero power of two"));
        }
        if bpb.fat_count == 0 {
            return Err(MountError::InvalidGeometry("no FAT copies"));
        }
        if bpb.reserved_sectors == 0 {
            return Err(MountError::InvalidGeometry("no reserved sectors for the boot sector"));
        }

        let variant = variant::resolve_variant(bpb);
        let sectors_per_fat = match &boot.ebpb {
            ExtendedBpb::Fat32(e) => e.sectors_per_fat,
            ExtendedBpb::Legacy(_) if variant == FatVariant::Fat32 => {
                return Err(MountError::InvalidGeometry("FAT32 cluster count with a FAT12/16 boot sector"));
            }
            ExtendedBpb::Legacy(_) => u32::from(bpb.sectors_per_fat_16),
        };
        if sectors_per_fat == 0 {
            return Err(MountError::InvalidGeometry("zero sectors per FAT"));
        }
        if variant.has_fixed_root() && bpb.root_entry_count == 0 {
            return Err(MountError::InvalidGeometry("FAT12/16 volume without root directory entries"));
        }

        let root_dir_sectors = variant::root_dir_sectors(bpb);
        let metadata = u64::from(bpb.reserved_sectors)
            + u64::from(bpb.fat_count) * u64::from(sectors_per_fat)
            + u64::from(root_dir_sectors);
        if metadata >= u64::from(bpb.total_sectors()) {
            return Err(MountError::InvalidGeometry("metadata region does not fit in the volume"));
        }
        let cluster_count = variant::data_clusters(bpb, sectors_per_fat);
        if cluster_count == 0 {
            return Err(MountError::InvalidGeometry("no data clusters"));
        }
        if cluster_count > variant.max_clusters() {
            return Err(MountError::InvalidGeometry("more data clusters than the FAT can address"));
        }

        let active_fat = boot.ebpb.as_fat32().and_then(|e| e.active_fat()).unwrap_or(0);
        if active_fat >= bpb.fat_count {
            return Err(MountError::InvalidGeometry("active FAT index beyond FAT count"));
        }
        let table = ClusterTable::new(variant, bpb, sectors_per_fat, root_dir_sectors, active_fat, cluster_count);

        let root = match boot.ebpb.as_fat32() {
            Some(e) => {
                if !table.is_data_cluster(e.root_cluster) {
                    return Err(MountError::InvalidGeometry("root cluster outside the data region"));
                }
                RootDir::Chain(e.root_cluster)
            }
            None => {
                let first_root_sector = u64::from(bpb.reserved_sectors)
                    + u64::from(bpb.fat_count) * u64::from(sectors_per_fat);
                RootDir::Fixed {
                    offset: first_root_sector * u64::from(bps),
                    len:    u32::from(bpb.root_entry_count) * 32,
                }
            }
        };

        if let Some(Err(c)) = boot.fs_info.as_ref().map(boot_sector::FsInfo::verify) {
            log::warn!("fat: {c}; ignoring FSInfo hints");
        }

        let chain_limit = options.max_chain_clusters.map_or(cluster_count, |n| n.min(cluster_count));

        log::info!(
            "fat: mounted {variant} volume, {cluster_count} clusters of {} bytes, {} FAT(s) of {sectors_per_fat} sectors",
            table.bytes_per_cluster(),
            bpb.fat_count,
        );
        if active_fat != 0 {
            log::info!("fat: FAT mirroring disabled, reading FAT #{active_fat}");
        }

        Ok(Self { disk, boot, variant, table, root, chain_limit })
    }
}

// ─── Volume information ────────────────────────────────────────────────────────

impl<D> FileSystem<D> {
    pub fn boot_sector(&self) -> &BootSector { &self.boot }

    pub fn variant(&self) -> FatVariant { self.variant }

    pub fn cluster_table(&self) -> &ClusterTable { &self.table }

    pub fn cluster_count(&self) -> u32 { self.table.cluster_count() }

    pub fn bytes_per_cluster(&self) -> u32 { self.table.bytes_per_cluster() }

    /// Longest chain any operation will follow.
    pub fn chain_limit(&self) -> u32 { self.chain_limit }

    pub fn root(&self) -> DirLocator { DirLocator::Root }

    /// Boot sector label with padding removed; `None` without an extended
    /// boot signature or when blank.
    pub fn volume_label(&self) -> Option<String> {
        let raw = self.boot.ebpb.volume_label()?;
        let end = raw.iter().rposition(|&b| b != b' ' && b != 0).map_or(0, |i| i + 1);
        (end > 0).then(|| raw[..end].iter().map(|&b| char::from(b)).collect())
    }

    pub fn volume_id(&self) -> Option<u32> { self.boot.ebpb.volume_id() }

    /// FSInfo free-cluster count, when FSInfo is intact and the count is
    /// plausible for this volume.
    pub fn free_cluster_hint(&self) -> Option<u32> {
        self.valid_fs_info()?.free_clusters().filter(|&n| n <= self.cluster_count())
    }

    /// FSInfo next-free-cluster hint, when FSInfo is intact and the hint names
    /// a data cluster.
    pub fn next_free_hint(&self) -> Option<u32> {
        self.valid_fs_info()?.next_free_hint().filter(|&c| self.table.is_data_cluster(c))
    }

    fn valid_fs_info(&self) -> Option<&boot_sector::FsInfo> {
        self.boot.fs_info.as_ref().filter(|info| info.verify().is_ok())
    }

    /// Where `entry` lists from. Both spellings of the FAT32 root (cluster 0
    /// in `..`, or the root cluster itself) become [`DirLocator::Root`].
    pub fn locate(&self, entry: &DirectoryEntry) -> Result<DirLocator, FsError> {
        if !entry.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok(match (DirLocator::from_entry(entry), self.root) {
            (DirLocator::Cluster(c), RootDir::Chain(root)) if c == root => DirLocator::Root,
            (loc, _) => loc,
        })
    }

    /// Stand-in entry for `/`.
    pub fn root_entry(&self) -> DirectoryEntry {
        let first_cluster = match self.root {
            RootDir::Chain(c) => c,
            RootDir::Fixed { .. } => 0,
        };
        DirectoryEntry {
            short_name:          [b' '; 11],
            attributes:          Attributes::DIRECTORY,
            nt_reserved:         0,
            creation_hundredths: 0,
            created:             Default::default(),
            accessed:            Default::default(),
            modified:            Default::default(),
            first_cluster,
            size:                0,
            long_name:           Some(String::from("/")),
        }
    }

    pub fn into_inner(self) -> D { self.disk }
}

// ─── Traversal ─────────────────────────────────────────────────────────────────

impl<D: BlockSource> FileSystem<D> {
    /// Decode a directory. Corruption in the chain ends the scan early and is
    /// reported through [`Listing::completeness`]; I/O errors fail the call.
    pub fn list_directory(&mut self, dir: DirLocator) -> Result<Listing, FsError> {
        match (dir, self.root) {
            (DirLocator::Root, RootDir::Fixed { offset, len }) => {
                let mut region = vec![0u8; len as usize];
                self.disk.read_at(offset, &mut region)?;
                let mut decoder = DirectoryDecoder::new();
                decoder.feed(&region);
                Ok(Listing { entries: decoder.finish(), completeness: Completeness::Complete })
            }
            (DirLocator::Root, RootDir::Chain(start)) | (DirLocator::Cluster(start), _) => self.list_chain(start),
        }
    }

    fn list_chain(&mut self, start: u32) -> Result<Listing, FsError> {
        let mut decoder = DirectoryDecoder::new();
        let mut walker = ChainWalker::new(start, self.chain_limit);
        let mut cluster = vec![0u8; self.table.bytes_per_cluster() as usize];
        let mut completeness = Completeness::Complete;

        while let Some(step) = walker.next_extent(&mut self.disk, &self.table) {
            match step {
                Ok(extent) => {
                    self.disk.read_at(extent.offset, &mut cluster)?;
                    if decoder.feed(&cluster) == ScanState::Terminated {
                        break;
                    }
                }
                Err(FsError::Corrupt(c)) => {
                    completeness = Completeness::Partial(c);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Listing { entries: decoder.finish(), completeness })
    }

    /// Lazy iterator over the extents of a chain.
    pub fn read_chain(&mut self, start: u32) -> Chain<'_, D> {
        Chain::new(&mut self.disk, &self.table, start, self.chain_limit)
    }

    /// Lazy reader over a file's contents.
    pub fn read_file(&mut self, entry: &DirectoryEntry) -> Result<FileReader<'_, D>, FsError> {
        if entry.is_dir() {
            return Err(FsError::IsADirectory);
        }
        Ok(FileReader::new(&mut self.disk, &self.table, entry.first_cluster, entry.size, self.chain_limit))
    }

    /// Resolve a `/`-separated path from the root. Components match long or
    /// short names, ignoring ASCII case; `.` and `..` resolve through the
    /// directory's own dot entries. The root has none, so both stay at the
    /// root there, and any directory that locates the root yields the root
    /// entry.
    pub fn lookup(&mut self, path: &str) -> Result<DirectoryEntry, FsError> {
        let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
        let mut current = self.root_entry();
        let mut dir = DirLocator::Root;

        while let Some(component) = components.next() {
            if dir == DirLocator::Root && matches!(component, "." | "..") {
                continue;
            }
            let listing = self.list_directory(dir)?;
            let entry = match listing.find(component) {
                Some(e) => e.clone(),
                None => return Err(miss(&listing)),
            };
            if entry.is_dir() {
                dir = self.locate(&entry)?;
                if dir == DirLocator::Root {
                    current = self.root_entry();
                    continue;
                }
            } else if components.peek().is_some() {
                return Err(FsError::NotADirectory);
            }
            current = entry;
        }
        Ok(current)
    }

    /// Read the whole file at `path`.
    pub fn read_path(&mut self, path: &str) -> Result<FileContents, FsError> {
        let entry = self.lookup(path)?;
        self.read_file(&entry)?.read_to_end()
    }

    /// List the directory at `path`.
    pub fn list_path(&mut self, path: &str) -> Result<Listing, FsError> {
        let entry = self.lookup(path)?;
        let dir = self.locate(&entry)?;
        self.list_directory(dir)
    }
}

/// A name missing from an incomplete listing may just be past the damage.
pub(crate) fn miss(listing: &Listing) -> FsError {
    match listing.completeness {
        Completeness::Partial(c) => FsError::Corrupt(c),
        Completeness::Complete => FsError::NotFound,
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
