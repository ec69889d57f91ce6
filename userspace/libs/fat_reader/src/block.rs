/// Block source abstraction.
///
/// The driver only ever needs "go to byte N" and "give me exactly these many
/// bytes". The cursor is shared mutable state, so every region read in this
/// crate seeks explicitly first and never trusts where the last read left it.

use crate::error::{IoError, IoErrorKind};

// ─── Trait ─────────────────────────────────────────────────────────────────────

pub trait BlockSource {
    /// Move the read cursor to absolute byte `offset`.
    fn seek(&mut self, offset: u64) -> Result<(), IoError>;
    /// Fill `buf` completely from the cursor, advancing it.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), IoError>;

    /// Seek then read; the only way the driver touches the disk.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        self.seek(offset)?;
        self.read_exact(buf)
    }
}

impl<S: BlockSource + ?Sized> BlockSource for &mut S {
    fn seek(&mut self, offset: u64) -> Result<(), IoError> { (**self).seek(offset) }
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), IoError> { (**self).read_exact(buf) }
}

// ─── In-memory image ───────────────────────────────────────────────────────────

/// A volume image held in memory (a `Vec<u8>`, a borrowed slice, a mapped
/// buffer handed over by a bootloader).
pub struct MemSource<B> {
    data: B,
    pos:  u64,
}

impl<B: AsRef<[u8]>> MemSource<B> {
    pub fn new(data: B) -> Self { Self { data, pos: 0 } }

    pub fn len(&self) -> u64 { self.data.as_ref().len() as u64 }

    pub fn is_empty(&self) -> bool { self.data.as_ref().is_empty() }

    pub fn into_inner(self) -> B { self.data }
}

impl<B: AsRef<[u8]>> BlockSource for MemSource<B> {
    fn seek(&mut self, offset: u64) -> Result<(), IoError> {
        if offset > self.len() {
            return Err(IoError::new(offset, IoErrorKind::SeekOutOfRange));
        }
        self.pos = offset;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), IoError> {
        let data = self.data.as_ref();
        let start = self.pos as usize;
        let end = start.checked_add(buf.len())
            .filter(|&end| end <= data.len())
            .ok_or(IoError::new(self.pos, IoErrorKind::ShortRead))?;
        buf.copy_from_slice(&data[start..end]);
        self.pos = end as u64;
        Ok(())
    }
}

// ─── std adapters ──────────────────────────────────────────────────────────────

#[cfg(feature = "std")]
pub use self::io_source::{IoSource, open};

#[cfg(feature = "std")]
mod io_source {
    use std::io::{ErrorKind, Read, Seek, SeekFrom};
    use std::path::Path;

    use super::BlockSource;
    use crate::error::{IoError, IoErrorKind};

    /// Block source over anything `Read + Seek`: an image file, a raw device
    /// node, a `Cursor`.
    pub struct IoSource<T> {
        inner: T,
        pos:   u64,
    }

    impl<T> IoSource<T> {
        pub fn new(inner: T) -> Self { Self { inner, pos: 0 } }

        pub fn into_inner(self) -> T { self.inner }
    }

    /// Open a disk image or device read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<IoSource<std::fs::File>, IoError> {
        let path = path.as_ref();
        match std::fs::File::open(path) {
            Ok(file) => Ok(IoSource::new(file)),
            Err(e) => {
                log::warn!("open {}: {e}", path.display());
                Err(IoError::new(0, IoErrorKind::Device))
            }
        }
    }

    impl<T: Read + Seek> BlockSource for IoSource<T> {
        fn seek(&mut self, offset: u64) -> Result<(), IoError> {
            match self.inner.seek(SeekFrom::Start(offset)) {
                Ok(_) => { self.pos = offset; Ok(()) }
                Err(e) => {
                    log::debug!("seek to {offset:#x} failed: {e}");
                    Err(IoError::new(offset, IoErrorKind::SeekOutOfRange))
                }
            }
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), IoError> {
            let at = self.pos;
            match self.inner.read_exact(buf) {
                Ok(()) => { self.pos += buf.len() as u64; Ok(()) }
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    Err(IoError::new(at, IoErrorKind::ShortRead))
                }
                Err(e) => {
                    log::warn!("read of {} bytes at {at:#x} failed: {e}", buf.len());
                    Err(IoError::new(at, IoErrorKind::Device))
                }
            }
        }
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
