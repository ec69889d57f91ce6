/// Interactive-style navigation over a mounted volume.
///
/// Holds the filesystem, the current directory and its last listing. Every
/// successful scan replaces the listing outright; a failed operation leaves
/// all three untouched.

use alloc::string::String;
use alloc::vec::Vec;

use crate::block::BlockSource;
use crate::dir::DirectoryEntry;
use crate::error::FsError;
use crate::file::{FileContents, FileReader};
use crate::fs::{self, DirLocator, FileSystem, Listing};

pub struct Session<D> {
    fs:      FileSystem<D>,
    cwd:     DirLocator,
    /// Display names from the root down to `cwd`.
    path:    Vec<String>,
    listing: Listing,
}

impl<D: BlockSource> Session<D> {
    /// Start at the root; fails only if the root cannot be read at all.
    pub fn new(mut fs: FileSystem<D>) -> Result<Self, FsError> {
        let listing = fs.list_directory(DirLocator::Root)?;
        Ok(Self { fs, cwd: DirLocator::Root, path: Vec::new(), listing })
    }

    /// Rescan the current directory.
    pub fn refresh(&mut self) -> Result<&Listing, FsError> {
        self.listing = self.fs.list_directory(self.cwd)?;
        Ok(&self.listing)
    }

    /// Entry called `name` in the current listing. A miss in a partial
    /// listing reports the corruption that cut it short.
    pub fn find(&self, name: &str) -> Result<&DirectoryEntry, FsError> {
        self.listing.find(name).ok_or_else(|| fs::miss(&self.listing))
    }

    /// Enter a subdirectory, `.` or `..`.
    pub fn change_dir(&mut self, name: &str) -> Result<(), FsError> {
        if name == "." {
            self.refresh()?;
            return Ok(());
        }
        // The root has no dot entries of its own.
        if name == ".." && self.cwd == DirLocator::Root {
            return Ok(());
        }

        let entry = self.find(name)?.clone();
        let target = self.fs.locate(&entry)?;
        let listing = self.fs.list_directory(target)?;
        log::debug!("session: {} -> {:?}", entry.display_name(), target);

        if target == DirLocator::Root {
            self.path.clear();
        } else if name == ".." {
            self.path.pop();
        } else if !entry.is_dot() {
            self.path.push(entry.display_name());
        }
        self.cwd = target;
        self.listing = listing;
        Ok(())
    }

    /// Read a file from the current directory in full.
    pub fn read(&mut self, name: &str) -> Result<FileContents, FsError> {
        self.open(name)?.read_to_end()
    }

    /// Lazy reader over a file in the current directory.
    pub fn open(&mut self, name: &str) -> Result<FileReader<'_, D>, FsError> {
        let entry = self.find(name)?.clone();
        self.fs.read_file(&entry)
    }
}

impl<D> Session<D> {
    pub fn filesystem(&self) -> &FileSystem<D> { &self.fs }

    pub fn listing(&self) -> &Listing { &self.listing }

    pub fn cwd(&self) -> DirLocator { self.cwd }

    /// `/`-joined path of the current directory, `/` at the root.
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            return String::from("/");
        }
        let mut out = String::new();
        for part in &self.path {
            out.push('/');
            out.push_str(part);
        }
        out
    }

    pub fn into_inner(self) -> FileSystem<D> { self.fs }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
