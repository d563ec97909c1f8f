//! Kernel-side limits for the syscall boundary.
//!
//! Values are fixed at kernel start and handed to [`crate::Kernel::new`].

/// Compile-time defaults.
pub mod defaults {
    use crate::mm::PAGE_SIZE;

    /// First kernel-reserved virtual address. User memory lies below it.
    pub const USER_TOP: usize = 0xC000_0000;
    /// Open files a single process may hold at once.
    pub const MAX_OPEN_FILES: usize = 128;
    /// Longest user string copied in, NUL included.
    pub const MAX_STRING_LEN: usize = PAGE_SIZE;
    /// Largest slice passed to the console per write.
    pub const CONSOLE_CHUNK: usize = 256;
}

/// Syscall boundary configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// First address user ranges may not reach.
    pub user_top: usize,
    /// Per-process descriptor table capacity.
    pub max_open_files: usize,
    /// Bound on file names and command lines, NUL included.
    pub max_string_len: usize,
    /// Console write granularity for standard output.
    pub console_chunk: usize,
    /// Print `"<name>: exit(<status>)"` when a process terminates.
    pub report_exits: bool,
    /// Treat `write` to a handle the caller does not hold as a protocol
    /// violation instead of returning -1.
    pub kill_on_unknown_write: bool,
}

impl Config {
    /// Default configuration, usable in `const` context.
    pub const fn new() -> Self {
        Self {
            user_top: defaults::USER_TOP,
            max_open_files: defaults::MAX_OPEN_FILES,
            max_string_len: defaults::MAX_STRING_LEN,
            console_chunk: defaults::CONSOLE_CHUNK,
            report_exits: true,
            kill_on_unknown_write: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
