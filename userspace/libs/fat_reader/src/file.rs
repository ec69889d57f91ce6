/// File content over a cluster chain, bounded by the directory entry's size.

use alloc::vec;
use alloc::vec::Vec;

use crate::block::BlockSource;
use crate::chain::ChainWalker;
use crate::error::{Completeness, Corruption, FsError};
use crate::table::ClusterTable;

/// Whatever could be read, and whether that was all of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContents {
    pub data:         Vec<u8>,
    pub completeness: Completeness,
}

/// Yields the file one cluster at a time, the last chunk cut to the file size.
///
/// Errors end the iteration. A chain that stops before the size is covered
/// yields [`Corruption::Truncated`] and never any padding.
pub struct FileReader<'a, D: ?Sized> {
    disk:      &'a mut D,
    table:     &'a ClusterTable,
    walker:    ChainWalker,
    remaining: u64,
}

impl<'a, D: BlockSource + ?Sized> FileReader<'a, D> {
    pub fn new(disk: &'a mut D, table: &'a ClusterTable, first_cluster: u32, size: u32, limit: u32) -> Self {
        Self {
            disk,
            table,
            walker: ChainWalker::new(first_cluster, limit),
            remaining: u64::from(size),
        }
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> u64 { self.remaining }

    /// Drain the reader. Corruption gives a partial result with the bytes read
    /// up to that point; I/O errors are returned as is.
    pub fn read_to_end(mut self) -> Result<FileContents, FsError> {
        let mut data = Vec::with_capacity(self.remaining.min(1 << 20) as usize);
        let mut completeness = Completeness::Complete;
        for chunk in self.by_ref() {
            match chunk {
                Ok(bytes) => data.extend_from_slice(&bytes),
                Err(FsError::Corrupt(c)) => {
                    completeness = Completeness::Partial(c);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(FileContents { data, completeness })
    }

    fn stop(&mut self, err: FsError) -> Option<Result<Vec<u8>, FsError>> {
        self.remaining = 0;
        Some(Err(err))
    }
}

impl<D: BlockSource + ?Sized> Iterator for FileReader<'_, D> {
    type Item = Result<Vec<u8>, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let extent = match self.walker.next_extent(&mut *self.disk, self.table) {
            Some(Ok(extent)) => extent,
            Some(Err(e)) => return self.stop(e),
            None => {
                let missing = self.remaining;
                log::warn!("file chain ends {missing} bytes before the recorded size");
                return self.stop(Corruption::Truncated { missing }.into());
            }
        };

        let take = self.remaining.min(u64::from(extent.len)) as usize;
        let mut buf = vec![0u8; take];
        if let Err(e) = self.disk.read_at(extent.offset, &mut buf) {
            return self.stop(e.into());
        }
        self.remaining -= take as u64;
        Some(Ok(buf))
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
