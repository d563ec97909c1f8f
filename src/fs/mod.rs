//! File-system seam, access guard and per-process descriptor tables
//!
//! The file system itself lives elsewhere and is not safe for concurrent
//! use. Every call into it goes through [`FsGuard`], one lock for the whole
//! kernel.

mod fdtable;
mod guard;

pub use fdtable::{FileDescriptorTable, OpenFile};
pub use guard::{FsGuard, FsLock};

use core::fmt;

/// Process-local file handle as seen by user code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Fid(i32);

impl Fid {
    /// Console input pseudo-handle.
    pub const STDIN: Self = Self(0);
    /// Console output pseudo-handle.
    pub const STDOUT: Self = Self(1);
    /// First id handed out for a real file.
    pub const FIRST_FILE: Self = Self(2);

    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Reinterpret an argument word as a handle.
    #[inline]
    pub const fn from_word(word: u32) -> Self {
        Self(word as i32)
    }

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Fid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fid({})", self.0)
    }
}

impl fmt::Display for Fid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kernel file system, as seen from the syscall layer.
///
/// Callers always hold the [`FsGuard`]; implementations need no locking of
/// their own.
pub trait FileSystem {
    /// An open file. Dropping it without [`FileSystem::close`] leaks it.
    type File;

    /// Create `name` with `initial_size` bytes. False on collision or when
    /// storage is exhausted.
    fn create(&mut self, name: &str, initial_size: u32) -> bool;

    fn open(&mut self, name: &str) -> Option<Self::File>;

    /// Delete `name`. Whether open handles stay usable is up to the
    /// implementation.
    fn remove(&mut self, name: &str) -> bool;

    /// Read at the file position, advancing it. Returns bytes read.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> usize;

    /// Write at the file position, advancing it. Returns bytes written.
    fn write(&mut self, file: &mut Self::File, buf: &[u8]) -> usize;

    fn seek(&mut self, file: &mut Self::File, position: u32);

    fn tell(&mut self, file: &Self::File) -> u32;

    /// File length in bytes.
    fn length(&mut self, file: &Self::File) -> u32;

    fn close(&mut self, file: Self::File);
}
