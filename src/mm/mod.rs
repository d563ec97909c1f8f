//! Memory view for the syscall boundary
//!
//! Provides:
//! - The user virtual address type
//! - Page permission flags
//! - The [`UserMemory`] seam to the paging subsystem, plus a software page map
//!
//! Page faults and demand paging belong to the VM subsystem; nothing here
//! relies on them.

mod address;
mod space;

pub use address::{VirtAddr, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE};
pub use space::{PageFlags, PageMap, UserMemory};
