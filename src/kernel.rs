//! Kernel-wide syscall state
//!
//! One [`Kernel`] exists per boot. It is shared by every kernel thread
//! handling a trap; all per-process state stays in [`Process`].
//!
//! [`Process`]: crate::process::Process

use crate::config::Config;
use crate::fs::{FileSystem, FsGuard};
use crate::process::{Machine, ProcessHost};
use crate::syscall::Validator;

/// Shared state of the syscall boundary.
pub struct Kernel<F, H, M> {
    pub(crate) config: Config,
    pub(crate) validator: Validator,
    pub(crate) fs: FsGuard<F>,
    pub(crate) host: H,
    pub(crate) machine: M,
}

impl<F, H, M> Kernel<F, H, M>
where
    F: FileSystem,
    H: ProcessHost,
    M: Machine,
{
    /// Set up the boundary. Called once at kernel start.
    pub fn new(config: Config, fs: F, host: H, machine: M) -> Self {
        log::info!(
            "syscall boundary up: user_top={:#x} max_open_files={}",
            config.user_top,
            config.max_open_files
        );
        Self {
            validator: Validator::new(&config),
            config,
            fs: FsGuard::new(fs),
            host,
            machine,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The file-system access guard.
    pub fn fs(&self) -> &FsGuard<F> {
        &self.fs
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }
}
