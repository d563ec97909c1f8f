//! System Call Interface
//!
//! The trap-to-handler path for user programs.
//!
//! # Security Model
//! - Whitelist approach: only the thirteen numbered calls exist
//! - All pointer arguments are validated against the caller's page map
//!   before use
//! - A contract violation terminates the caller, never the kernel
//! - Recoverable failures (missing file, full table) are plain return
//!   values
//!
//! # Syscalls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmd_line) -> pid
//! - 3: wait(pid) -> status
//! - 4: create(name, initial_size) -> bool
//! - 5: remove(name) -> bool
//! - 6: open(name) -> fid
//! - 7: filesize(fid) -> size
//! - 8: read(fid, buf, size) -> count
//! - 9: write(fid, buf, size) -> count
//! - 10: seek(fid, position)
//! - 11: tell(fid) -> position
//! - 12: close(fid)

mod args;
mod error;
mod file;
mod handler;
mod numbers;
mod validate;

pub use args::Request;
pub use error::{Violation, ABNORMAL_EXIT};
pub use handler::Completion;
pub use numbers::SyscallNumber;
pub use validate::{Access, UserRange, UserString, Validator};
