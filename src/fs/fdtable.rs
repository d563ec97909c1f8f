//! Per-process File Descriptor Table
//!
//! Maps [`Fid`]s to open file-system handles. Each process owns exactly one
//! table; only the owning process's kernel thread touches it, and it does so
//! while holding the [`super::FsGuard`].
//!
//! # Allocation
//! - Ids come from a per-table counter starting at [`Fid::FIRST_FILE`]
//! - A counter never hands out an id twice, so ids are unique among open
//!   entries by construction
//! - A full table (or an exhausted counter) refuses the insert and hands the
//!   backing handle back so the caller can close it

use alloc::collections::BTreeMap;

use crate::process::Pid;

use super::Fid;

/// One open file of a process.
#[derive(Debug)]
pub struct OpenFile<H> {
    pub fid: Fid,
    pub backing: H,
    pub owner: Pid,
}

/// Open files of one process, keyed by id.
#[derive(Debug)]
pub struct FileDescriptorTable<H> {
    owner: Pid,
    entries: BTreeMap<Fid, OpenFile<H>>,
    next: i32,
    capacity: usize,
}

impl<H> FileDescriptorTable<H> {
    /// Empty table for `owner` holding at most `capacity` files.
    pub fn new(owner: Pid, capacity: usize) -> Self {
        Self {
            owner,
            entries: BTreeMap::new(),
            next: Fid::FIRST_FILE.as_i32(),
            capacity,
        }
    }

    /// Register an open file and return its new id.
    ///
    /// Returns the handle back in `Err` when no id can be allocated.
    pub fn insert(&mut self, backing: H) -> Result<Fid, H> {
        if self.entries.len() >= self.capacity {
            return Err(backing);
        }
        let Some(after) = self.next.checked_add(1) else {
            return Err(backing);
        };
        let fid = Fid::new(self.next);
        self.next = after;

        log::debug!("pid {}: fid {} allocated", self.owner, fid);
        self.entries.insert(
            fid,
            OpenFile {
                fid,
                backing,
                owner: self.owner,
            },
        );
        Ok(fid)
    }

    pub fn get(&self, fid: Fid) -> Option<&OpenFile<H>> {
        self.entries.get(&fid)
    }

    pub fn get_mut(&mut self, fid: Fid) -> Option<&mut OpenFile<H>> {
        self.entries.get_mut(&fid)
    }

    pub fn contains(&self, fid: Fid) -> bool {
        self.entries.contains_key(&fid)
    }

    /// Remove an entry, handing it to the caller to close.
    pub fn remove(&mut self, fid: Fid) -> Option<OpenFile<H>> {
        let entry = self.entries.remove(&fid);
        if entry.is_some() {
            log::debug!("pid {}: fid {} released", self.owner, fid);
        }
        entry
    }

    /// Remove the lowest-numbered entry. Used to drain the table on exit.
    pub fn pop_first(&mut self) -> Option<OpenFile<H>> {
        self.entries.pop_first().map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids currently open, ascending.
    pub fn fids(&self) -> impl Iterator<Item = Fid> + '_ {
        self.entries.keys().copied()
    }
}
