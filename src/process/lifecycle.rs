//! Process Lifecycle
//!
//! `halt`, `exec`, `wait` and the exit path.
//!
//! # Ordering
//! [`Kernel::exit`] is the only way a process leaves the boundary, whether
//! it asked to or was killed. It releases the guard, drains the descriptor
//! table and only then publishes the exit status, so a parent woken from
//! `wait` never sees a half-cleaned child.

use alloc::format;

use crate::fs::FileSystem;
use crate::kernel::Kernel;
use crate::syscall::{UserString, ABNORMAL_EXIT};
use crate::trap::TrapOutcome;

use super::{Machine, Pid, Process, ProcessHost};

impl<F, H, M> Kernel<F, H, M>
where
    F: FileSystem,
    H: ProcessHost,
    M: Machine,
{
    /// Power the machine down.
    pub fn halt(&self) {
        log::info!("halt requested, powering off");
        self.machine.power_off();
    }

    /// Start a child running `command_line`. [`Pid::ERROR`] if it could
    /// not be started.
    pub fn exec(&self, process: &mut Process<F::File>, command_line: &UserString) -> Pid {
        let Some(command_line) = command_line.to_str() else {
            return Pid::ERROR;
        };

        let parent = process.pid();
        // Loading the image reads the file system.
        let child = {
            let _fs = self.fs.lock(parent);
            self.host.spawn(parent, command_line)
        };

        match child {
            Some(child) => {
                log::debug!("pid {}: exec {:?} -> pid {}", parent, command_line, child);
                process.adopt(child);
                child
            }
            None => {
                log::debug!("pid {}: exec {:?} failed", parent, command_line);
                Pid::ERROR
            }
        }
    }

    /// Wait for a direct child to exit and return its status.
    ///
    /// -1 at once for anything that is not a child still waitable by the
    /// caller. May block the calling thread indefinitely otherwise.
    pub fn wait(&self, process: &mut Process<F::File>, child: Pid) -> i32 {
        debug_assert!(
            !self.fs.is_held_by(process.pid()),
            "wait with the file-system guard held"
        );
        if !process.claim_child(child) {
            return -1;
        }
        self.host.await_exit(child).unwrap_or(-1)
    }

    /// Terminate `process` with `status`, releasing everything it holds.
    pub fn exit(&self, process: &mut Process<F::File>, status: i32) -> TrapOutcome {
        let pid = process.pid();
        if process.has_exited() {
            log::warn!("pid {}: exit after exit, ignored", pid);
            return TrapOutcome::Exited(process.exit_status.unwrap_or(status));
        }

        if self.fs.release_if_held(pid) {
            log::warn!("pid {}: released file-system guard on exit", pid);
        }

        let closed = {
            let mut fs = self.fs.lock(pid);
            let mut closed = 0usize;
            while let Some(entry) = process.files.pop_first() {
                fs.close(entry.backing);
                closed += 1;
            }
            closed
        };

        if self.config.report_exits {
            let line = format!("{}: exit({})\n", process.name(), status);
            self.machine.console_write(line.as_bytes());
        }

        process.exit_status = Some(status);
        self.host.record_exit(pid, status);
        log::info!("pid {} exited with {} ({} files closed)", pid, status, closed);
        TrapOutcome::Exited(status)
    }

    /// Kill `process` for a fault raised outside the syscall path, such as
    /// a user page fault.
    pub fn terminate(&self, process: &mut Process<F::File>) -> TrapOutcome {
        self.exit(process, ABNORMAL_EXIT)
    }
}
