use core::fmt;

// ─── I/O ───────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoErrorKind {
    /// Fewer bytes were available than requested.
    ShortRead,
    /// The seek target lies outside the source.
    SeekOutOfRange,
    /// The underlying device reported a failure.
    Device,
}

/// A failed seek or read on the block source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoError {
    /// Byte offset the operation was aimed at.
    pub offset: u64,
    pub kind:   IoErrorKind,
}

impl IoError {
    pub const fn new(offset: u64, kind: IoErrorKind) -> Self {
        Self { offset, kind }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            IoErrorKind::ShortRead      => "short read",
            IoErrorKind::SeekOutOfRange => "seek out of range",
            IoErrorKind::Device         => "device error",
        };
        write!(f, "{what} at byte {:#x}", self.offset)
    }
}

// ─── Mount ─────────────────────────────────────────────────────────────────────

/// Mounting failed; no filesystem was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountError {
    Io(IoError),
    /// The boot sector does not start with a short or near jump.
    MissingJump,
    /// Bytes 510..512 are not `0x55 0xAA`.
    MissingBootSignature,
    InvalidGeometry(&'static str),
}

impl From<IoError> for MountError {
    fn from(e: IoError) -> Self { MountError::Io(e) }
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountError::Io(e)                => write!(f, "cannot read boot sector: {e}"),
            MountError::MissingJump          => f.write_str("boot sector has no jump instruction"),
            MountError::MissingBootSignature => f.write_str("boot sector signature 0xAA55 missing"),
            MountError::InvalidGeometry(why) => write!(f, "invalid volume geometry: {why}"),
        }
    }
}

// ─── Corruption ────────────────────────────────────────────────────────────────

/// On-disk inconsistency found while walking the volume.
///
/// Directory scans and file reads report these alongside the data decoded up
/// to that point instead of failing outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corruption {
    /// The FAT marks the link after `after` as a bad cluster.
    BadCluster { after: u32 },
    /// `cluster` appears twice in the same chain.
    Cycle { cluster: u32 },
    /// The chain is longer than the volume has clusters (or the configured cap).
    ChainTooLong { limit: u32 },
    /// `from` links to a free, reserved or out-of-range value.
    InvalidLink { from: u32, to: u32 },
    /// A chain was asked to start at a non-data cluster.
    InvalidStart { cluster: u32 },
    /// The chain ended while `missing` bytes of the file were still unread.
    Truncated { missing: u64 },
    /// FSInfo lead, struct or trail signature does not match.
    FsInfoSignature,
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Corruption::BadCluster { after }      => write!(f, "bad cluster after cluster {after}"),
            Corruption::Cycle { cluster }         => write!(f, "cluster chain loops back to cluster {cluster}"),
            Corruption::ChainTooLong { limit }    => write!(f, "cluster chain exceeds {limit} clusters"),
            Corruption::InvalidLink { from, to }  => write!(f, "cluster {from} links to invalid value {to:#x}"),
            Corruption::InvalidStart { cluster }  => write!(f, "chain starts at invalid cluster {cluster}"),
            Corruption::Truncated { missing }     => write!(f, "cluster chain ends {missing} bytes short"),
            Corruption::FsInfoSignature           => f.write_str("FSInfo signature mismatch"),
        }
    }
}

/// Whether a listing or file read covered everything it was asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    /// Stopped early at the given corruption; the data is best-effort.
    Partial(Corruption),
}

impl Completeness {
    pub fn is_complete(&self) -> bool { matches!(self, Completeness::Complete) }
}

// ─── Operation errors ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsError {
    Io(IoError),
    Corrupt(Corruption),
    NotFound,
    NotADirectory,
    IsADirectory,
}

impl From<IoError> for FsError {
    fn from(e: IoError) -> Self { FsError::Io(e) }
}

impl From<Corruption> for FsError {
    fn from(c: Corruption) -> Self { FsError::Corrupt(c) }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::Io(e)         => write!(f, "I/O error: {e}"),
            FsError::Corrupt(c)    => write!(f, "corrupt volume: {c}"),
            FsError::NotFound      => f.write_str("not found"),
            FsError::NotADirectory => f.write_str("not a directory"),
            FsError::IsADirectory  => f.write_str("is a directory"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IoError {}

#[cfg(feature = "std")]
impl std::error::Error for Corruption {}

#[cfg(feature = "std")]
impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MountError::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Io(e)      => Some(e),
            FsError::Corrupt(c) => Some(c),
            _ => None,
        }
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
