//! Syscall Trap Record
//!
//! The entry stub saves the user context and hands the kernel a
//! [`TrapFrame`]. Only two fields matter to the syscall layer: the user stack
//! pointer, where the caller pushed the syscall number and its argument
//! words, and the result register.
//!
//! # Stack Layout at Trap Time
//! ```text
//! esp + 12  -> argument word 2
//! esp +  8  -> argument word 1
//! esp +  4  -> argument word 0
//! esp       -> syscall number
//! ```

/// Saved user state for one syscall trap.
///
/// Owned by the entry glue; the dispatcher borrows it for the duration of
/// one trap.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    /// User stack pointer at the time of the trap.
    pub esp: u32,
    /// Return value register, written back to the user on resume.
    pub eax: u32,
}

impl TrapFrame {
    /// Frame for a trap taken with the user stack at `esp`.
    pub const fn new(esp: u32) -> Self {
        Self { esp, eax: 0 }
    }

    /// Result slot reinterpreted as the signed value user code sees.
    #[inline]
    pub const fn result(&self) -> i32 {
        self.eax as i32
    }
}

/// What the entry glue does once the kernel is done with a trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    /// Return to the instruction after the trap.
    Resume,
    /// The process is gone; schedule something else. Carries its status.
    Exited(i32),
    /// The machine was powered down.
    Halted,
}
