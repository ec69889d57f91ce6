// Library crate root.
// No_std when neither testing nor built with the `std` feature, so the driver
// can be linked into bootstrap harnesses that only provide `alloc`.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Read-only FAT12/FAT16/FAT32 driver.
//!
//! Decodes the boot sector, picks the FAT variant, follows cluster chains and
//! rebuilds directory listings (long filenames included) and file contents from
//! any randomly addressable [`BlockSource`]. Nothing is ever written back.
//!
//! All disk I/O goes through `BlockSource`, so the whole driver is
//! unit-testable against an in-memory image.

extern crate alloc;

pub mod block;
pub mod boot_sector;
pub mod chain;
pub mod dir;
pub mod error;
pub mod file;
pub mod fs;
pub mod le;
pub mod lfn;
pub mod session;
pub mod table;
pub mod time;
pub mod variant;

#[cfg(test)]
mod test_util;

pub use block::{BlockSource, MemSource};
#[cfg(feature = "std")]
pub use block::{IoSource, open};
pub use boot_sector::{BootSector, Bpb, ExtendedBpb, FsInfo};
pub use chain::{Chain, Extent};
pub use dir::{Attributes, DirectoryDecoder, DirectoryEntry, decode_directory};
pub use error::{Completeness, Corruption, FsError, IoError, IoErrorKind, MountError};
pub use file::{FileContents, FileReader};
pub use fs::{DirLocator, FileSystem, Listing, MountOptions};
pub use session::Session;
pub use table::{ClusterTable, FatEntry};
pub use time::{FatDate, FatDateTime, FatTime};
pub use variant::{FatVariant, resolve_variant};
