//! Protocol violations
//!
//! A violation means the caller broke the kernel/process contract. The
//! dispatcher answers every one of them by terminating the caller with
//! [`ABNORMAL_EXIT`]; recoverable failures never use this type.

use crate::fs::Fid;
use crate::mm::VirtAddr;

/// Exit status recorded for a process killed by the kernel.
pub const ABNORMAL_EXIT: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A range that is not fully mapped user memory with the needed rights.
    BadAddress { addr: VirtAddr, len: usize },
    /// No NUL within the string length bound.
    UnterminatedString(VirtAddr),
    /// Syscall number outside the fixed set.
    UnknownSyscall(u32),
    /// A handle the caller does not have open.
    UnknownHandle(Fid),
    /// Null name passed where the call requires one.
    NullName,
}

impl core::fmt::Display for Violation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BadAddress { addr, len } => {
                write!(f, "bad user range {} (+{} bytes)", addr, len)
            }
            Self::UnterminatedString(addr) => write!(f, "unterminated string at {}", addr),
            Self::UnknownSyscall(num) => write!(f, "unknown syscall {}", num),
            Self::UnknownHandle(fid) => write!(f, "unknown file handle {}", fid),
            Self::NullName => write!(f, "null name"),
        }
    }
}
