//! System Call Dispatcher
//!
//! Per trap:
//! ```text
//! TrapReceived -> ArgsValidated -> HandlerSelected -> HandlerExecuted -> ResultWritten
//! ```
//! Any [`Violation`] along the way short-circuits to the exit path with
//! [`ABNORMAL_EXIT`].
//!
//! # Security Considerations
//! - The four stack words are validated before any is read; a process can
//!   point its stack anywhere
//! - Unknown syscall numbers terminate the caller
//! - Handlers only ever see typed, validated [`Request`]s

use crate::fs::FileSystem;
use crate::kernel::Kernel;
use crate::mm::VirtAddr;
use crate::process::{Machine, Process, ProcessHost};
use crate::trap::{TrapFrame, TrapOutcome};

use super::args::Request;
use super::error::{Violation, ABNORMAL_EXIT};
use super::numbers::SyscallNumber;
use super::validate::Access;

/// Syscall number plus three argument words.
const FRAME_WORDS: usize = 4;

/// How a handler finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Store this in the result slot and resume.
    Value(u32),
    /// Resume with the result slot untouched.
    NoValue,
    /// The process asked to exit with this status.
    Exit(i32),
    /// The machine has been powered off.
    Halt,
}

impl Completion {
    fn int(value: i32) -> Self {
        Self::Value(value as u32)
    }

    fn bool(value: bool) -> Self {
        Self::Value(value as u32)
    }
}

impl<F, H, M> Kernel<F, H, M>
where
    F: FileSystem,
    H: ProcessHost,
    M: Machine,
{
    /// Handle one syscall trap raised by `process`.
    ///
    /// Called by the trap-entry glue on the process's kernel thread.
    pub fn handle_trap(&self, process: &mut Process<F::File>, frame: &mut TrapFrame) -> TrapOutcome {
        match self.dispatch(process, frame.esp) {
            Ok(Completion::Value(value)) => {
                frame.eax = value;
                TrapOutcome::Resume
            }
            Ok(Completion::NoValue) => TrapOutcome::Resume,
            Ok(Completion::Exit(status)) => self.exit(process, status),
            Ok(Completion::Halt) => TrapOutcome::Halted,
            Err(violation) => {
                log::warn!(
                    "pid {} ({}): {}, terminating",
                    process.pid(),
                    process.name(),
                    violation
                );
                self.exit(process, ABNORMAL_EXIT)
            }
        }
    }

    /// Validate the stack frame, decode and run the call.
    pub fn dispatch(&self, process: &mut Process<F::File>, esp: u32) -> Result<Completion, Violation> {
        let mem = process.memory();
        let esp = VirtAddr::from_word(esp);
        let frame = self.validator.check(mem, esp, FRAME_WORDS * 4, Access::Read)?;

        let mut words = [0u32; FRAME_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self
                .validator
                .read_word(mem, VirtAddr::new(frame.addr().as_usize() + 4 * i))?;
        }

        let number = SyscallNumber::try_from(words[0])?;
        log::trace!(
            "pid {}: {}{:x?}",
            process.pid(),
            number.name(),
            &words[1..=number.arity()]
        );

        let request = Request::decode(number, [words[1], words[2], words[3]], &self.validator, mem)?;
        self.execute(process, request)
    }

    /// Run a decoded request. The match is the dispatch table: one arm per
    /// syscall number.
    pub fn execute(&self, process: &mut Process<F::File>, request: Request) -> Result<Completion, Violation> {
        Ok(match request {
            Request::Halt => {
                self.halt();
                Completion::Halt
            }
            Request::Exit { status } => Completion::Exit(status),
            Request::Exec { command_line } => {
                Completion::int(self.exec(process, &command_line).as_i32())
            }
            Request::Wait { pid } => Completion::int(self.wait(process, pid)),
            Request::Create { name, initial_size } => {
                Completion::bool(self.create(process, &name, initial_size))
            }
            Request::Remove { name } => Completion::bool(self.remove(process, &name)),
            Request::Open { name } => Completion::int(self.open(process, name.as_ref())),
            Request::Filesize { fid } => Completion::int(self.filesize(process, fid)),
            Request::Read { fid, buffer } => Completion::int(self.read(process, fid, buffer)?),
            Request::Write { fid, buffer } => Completion::int(self.write(process, fid, buffer)?),
            Request::Seek { fid, position } => {
                self.seek(process, fid, position)?;
                Completion::NoValue
            }
            Request::Tell { fid } => Completion::Value(self.tell(process, fid)?),
            Request::Close { fid } => {
                self.close(process, fid)?;
                Completion::NoValue
            }
        })
    }
}
