//! PantherOS user-program boundary
//!
//! The layer between a trapping user process and the kernel services it asks
//! for: argument validation, syscall dispatch, per-process file tables and
//! the process lifecycle calls.
//!
//! # Layout
//! - [`mm`]: user address-space view consulted by the validator
//! - [`syscall`]: numbers, validator, typed decoder, dispatcher
//! - [`fs`]: file-system seam, access guard, descriptor tables
//! - [`process`]: processes, lifecycle collaborators, halt/exec/wait/exit
//! - [`trap`]: the trap record handed over by the entry glue
//!
//! # Trust Model
//! - Every user pointer is checked against the caller's page map before use
//! - A process that breaks the contract is terminated, never the kernel
//! - All file-system access is serialized by one scope-bound guard

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod fs;
pub mod kernel;
pub mod mm;
pub mod process;
pub mod syscall;
pub mod trap;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use kernel::Kernel;
pub use trap::{TrapFrame, TrapOutcome};
