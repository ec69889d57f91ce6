/// Cluster chain walking.
///
/// A chain is followed one FAT lookup at a time. The walker keeps every
/// cluster it has handed out, so a chain that loops back on itself stops with
/// [`Corruption::Cycle`] instead of spinning, and it refuses to go past the
/// number of clusters the volume actually has.

use alloc::collections::BTreeSet;

use crate::block::BlockSource;
use crate::error::{Corruption, FsError};
use crate::table::{ClusterTable, FatEntry};

/// One cluster of a chain, located in the data region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub cluster: u32,
    /// Absolute byte address of the cluster.
    pub offset:  u64,
    /// Cluster size in bytes.
    pub len:     u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Start(u32),
    After(u32),
    Done,
}

/// Chain state that does not hold on to the disk, so the caller can read the
/// data of each extent between steps.
#[derive(Debug)]
pub struct ChainWalker {
    step:    Step,
    visited: BTreeSet<u32>,
    limit:   u32,
}

impl ChainWalker {
    /// `limit` caps the number of clusters handed out.
    pub fn new(start: u32, limit: u32) -> Self {
        Self { step: Step::Start(start), visited: BTreeSet::new(), limit }
    }

    /// Clusters handed out so far.
    pub fn len(&self) -> usize { self.visited.len() }

    pub fn is_empty(&self) -> bool { self.visited.is_empty() }

    pub fn is_done(&self) -> bool { self.step == Step::Done }

    /// Advance by one cluster. `None` once the chain has ended, or after an
    /// error has been reported.
    pub fn next_extent<D: BlockSource + ?Sized>(
        &mut self,
        disk: &mut D,
        table: &ClusterTable,
    ) -> Option<Result<Extent, FsError>> {
        let cluster = match self.step {
            Step::Done => return None,
            Step::Start(c) => {
                if !table.is_data_cluster(c) {
                    return self.fail(Corruption::InvalidStart { cluster: c });
                }
                c
            }
            Step::After(prev) => match table.next_cluster(disk, prev) {
                Err(e) => {
                    self.step = Step::Done;
                    return Some(Err(e.into()));
                }
                Ok(FatEntry::EndOfChain) => {
                    log::trace!("chain ends after cluster {prev}");
                    self.step = Step::Done;
                    return None;
                }
                Ok(FatEntry::Bad) => return self.fail(Corruption::BadCluster { after: prev }),
                Ok(FatEntry::Free) => return self.fail(Corruption::InvalidLink { from: prev, to: 0 }),
                Ok(FatEntry::Reserved) => return self.fail(Corruption::InvalidLink { from: prev, to: 1 }),
                Ok(FatEntry::Next(n)) if !table.is_data_cluster(n) => {
                    return self.fail(Corruption::InvalidLink { from: prev, to: n });
                }
                Ok(FatEntry::Next(n)) => n,
            },
        };

        if self.visited.contains(&cluster) {
            return self.fail(Corruption::Cycle { cluster });
        }
        if self.visited.len() >= self.limit as usize {
            return self.fail(Corruption::ChainTooLong { limit: self.limit });
        }
        self.visited.insert(cluster);
        self.step = Step::After(cluster);
        log::trace!("chain -> cluster {cluster}");

        Some(Ok(Extent {
            cluster,
            offset: table.cluster_offset(cluster),
            len: table.bytes_per_cluster(),
        }))
    }

    fn fail(&mut self, corruption: Corruption) -> Option<Result<Extent, FsError>> {
        log::warn!("cluster chain: {corruption}");
        self.step = Step::Done;
        Some(Err(FsError::Corrupt(corruption)))
    }
}

/// Iterator over the extents of a chain.
///
/// Restarting means building a new `Chain` from the first cluster; there is no
/// way to resume halfway.
pub struct Chain<'a, D: ?Sized> {
    disk:   &'a mut D,
    table:  &'a ClusterTable,
    walker: ChainWalker,
}

impl<'a, D: BlockSource + ?Sized> Chain<'a, D> {
    pub fn new(disk: &'a mut D, table: &'a ClusterTable, start: u32, limit: u32) -> Self {
        Self { disk, table, walker: ChainWalker::new(start, limit) }
    }
}

impl<D: BlockSource + ?Sized> Iterator for Chain<'_, D> {
    type Item = Result<Extent, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next_extent(&mut *self.disk, self.table)
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
