//! Processes and their lifecycle collaborators
//!
//! The scheduler creates processes and threads; this layer keeps, per
//! process, what the syscall boundary needs: its address space, its open
//! files, and the children it may still wait for.

mod lifecycle;

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::string::String;
use core::fmt;

use crate::config::Config;
use crate::fs::FileDescriptorTable;
use crate::mm::UserMemory;

/// Process identifier, as returned by `exec` and consumed by `wait`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pid(i32);

impl Pid {
    /// Returned by `exec` when no process could be started.
    pub const ERROR: Self = Self(-1);

    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn from_word(word: u32) -> Self {
        Self(word as i32)
    }

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process creation and reaping, provided by the scheduler.
pub trait ProcessHost {
    /// Start a child of `parent` running `command_line`.
    ///
    /// Returns once the child's image has loaded or failed to. Called with
    /// the file-system guard held on the parent's behalf, so an
    /// implementation must load the image without taking that guard again.
    fn spawn(&self, parent: Pid, command_line: &str) -> Option<Pid>;

    /// Block until `child` has exited and return its status; `None` if the
    /// host knows no such process.
    fn await_exit(&self, child: Pid) -> Option<i32>;

    /// Publish `pid`'s exit status and wake anyone waiting for it.
    fn record_exit(&self, pid: Pid, status: i32);
}

/// Machine-level devices the syscall layer talks to directly.
pub trait Machine {
    /// Next byte of console input, blocking until one arrives.
    fn console_read_byte(&self) -> u8;

    fn console_write(&self, bytes: &[u8]);

    /// Power the machine down. Does not return on real hardware.
    fn power_off(&self);
}

/// Syscall-boundary state of one user process.
pub struct Process<H> {
    pid: Pid,
    name: String,
    memory: Box<dyn UserMemory + Send>,
    files: FileDescriptorTable<H>,
    children: BTreeSet<Pid>,
    exit_status: Option<i32>,
}

impl<H> Process<H> {
    /// Wrap a freshly created process.
    ///
    /// `name` is the program name, the first word of the command line.
    pub fn new(pid: Pid, name: &str, memory: Box<dyn UserMemory + Send>, config: &Config) -> Self {
        Self {
            pid,
            name: String::from(name),
            memory,
            files: FileDescriptorTable::new(pid, config.max_open_files),
            children: BTreeSet::new(),
            exit_status: None,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory(&self) -> &(dyn UserMemory + Send) {
        &*self.memory
    }

    pub fn memory_mut(&mut self) -> &mut (dyn UserMemory + Send) {
        &mut *self.memory
    }

    pub fn files(&self) -> &FileDescriptorTable<H> {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut FileDescriptorTable<H> {
        &mut self.files
    }

    /// Descriptor table and address space at once, for copies between an
    /// open file and user memory.
    pub fn files_and_memory_mut(
        &mut self,
    ) -> (&mut FileDescriptorTable<H>, &mut (dyn UserMemory + Send)) {
        (&mut self.files, &mut *self.memory)
    }

    /// Children not yet waited for.
    pub fn children(&self) -> impl Iterator<Item = Pid> + '_ {
        self.children.iter().copied()
    }

    /// Status recorded by the exit path; `None` while running.
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }

    pub fn has_exited(&self) -> bool {
        self.exit_status.is_some()
    }

    pub(crate) fn adopt(&mut self, child: Pid) {
        self.children.insert(child);
    }

    /// Claim `child` for a wait. False if it is not a waitable child.
    pub(crate) fn claim_child(&mut self, child: Pid) -> bool {
        self.children.remove(&child)
    }
}

impl<H> fmt::Debug for Process<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("open_files", &self.files.len())
            .field("children", &self.children)
            .field("exit_status", &self.exit_status)
            .finish()
    }
}

/// Program name of a command line: its first space-separated word.
pub fn program_name(command_line: &str) -> &str {
    command_line.split(' ').find(|w| !w.is_empty()).unwrap_or("")
}
