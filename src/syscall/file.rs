//! File syscalls
//!
//! Every path that touches the file system or a descriptor-table entry holds
//! the [`FsGuard`](crate::fs::FsGuard) for its whole duration. The console
//! pseudo-handles bypass it.
//!
//! Data crosses the boundary through a kernel bounce buffer of at most one
//! page, so the file system never sees user addresses.

use alloc::vec;

use crate::fs::{Fid, FileSystem};
use crate::kernel::Kernel;
use crate::mm::PAGE_SIZE;
use crate::process::{Machine, Process, ProcessHost};

use super::error::Violation;
use super::validate::{Access, UserRange, UserString};

/// A byte count as a syscall result, saturated so it never reads as -1.
fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl<F, H, M> Kernel<F, H, M>
where
    F: FileSystem,
    H: ProcessHost,
    M: Machine,
{
    /// `create`: false if the file system refuses the name.
    pub fn create(&self, process: &Process<F::File>, name: &UserString, initial_size: u32) -> bool {
        let Some(name) = name.to_str() else {
            return false;
        };
        self.fs.lock(process.pid()).create(name, initial_size)
    }

    /// `remove`: open handles to the file are left alone.
    pub fn remove(&self, process: &Process<F::File>, name: &UserString) -> bool {
        let Some(name) = name.to_str() else {
            return false;
        };
        self.fs.lock(process.pid()).remove(name)
    }

    /// `open`: a new fid, or -1 for a null or unknown name or a full table.
    pub fn open(&self, process: &mut Process<F::File>, name: Option<&UserString>) -> i32 {
        let Some(name) = name.and_then(UserString::to_str) else {
            return -1;
        };

        let pid = process.pid();
        let mut fs = self.fs.lock(pid);
        let Some(file) = fs.open(name) else {
            return -1;
        };

        match process.files_mut().insert(file) {
            Ok(fid) => fid.as_i32(),
            Err(file) => {
                log::warn!("pid {}: descriptor table full, closing {:?}", pid, name);
                fs.close(file);
                -1
            }
        }
    }

    /// `filesize`: -1 for an unknown fid.
    pub fn filesize(&self, process: &Process<F::File>, fid: Fid) -> i32 {
        let mut fs = self.fs.lock(process.pid());
        match process.files().get(fid) {
            Some(entry) => i32::try_from(fs.length(&entry.backing)).unwrap_or(i32::MAX),
            None => -1,
        }
    }

    /// `read`: console input for [`Fid::STDIN`], -1 for [`Fid::STDOUT`].
    pub fn read(&self, process: &mut Process<F::File>, fid: Fid, buffer: UserRange) -> Result<i32, Violation> {
        debug_assert_eq!(buffer.access(), Access::Write);
        if fid == Fid::STDIN {
            let memory = process.memory_mut();
            for i in 0..buffer.len() {
                let byte = self.machine.console_read_byte();
                memory.write(buffer.slice(i, 1).addr(), &[byte]);
            }
            return Ok(count(buffer.len()));
        }
        if fid == Fid::STDOUT {
            return Ok(-1);
        }

        let mut fs = self.fs.lock(process.pid());
        let (files, memory) = process.files_and_memory_mut();
        let entry = files.get_mut(fid).ok_or(Violation::UnknownHandle(fid))?;

        let mut bounce = vec![0u8; buffer.len().min(PAGE_SIZE)];
        let mut done = 0;
        while done < buffer.len() {
            let want = (buffer.len() - done).min(PAGE_SIZE);
            let got = fs.read(&mut entry.backing, &mut bounce[..want]).min(want);
            memory.write(buffer.slice(done, got).addr(), &bounce[..got]);
            done += got;
            if got < want {
                break;
            }
        }
        Ok(count(done))
    }

    /// `write`: console output for [`Fid::STDOUT`], -1 for [`Fid::STDIN`].
    ///
    /// An fid the caller does not hold gives -1, or terminates the caller
    /// when `kill_on_unknown_write` is set.
    pub fn write(&self, process: &mut Process<F::File>, fid: Fid, buffer: UserRange) -> Result<i32, Violation> {
        debug_assert_eq!(buffer.access(), Access::Read);
        if fid == Fid::STDIN {
            return Ok(-1);
        }
        if fid == Fid::STDOUT {
            let chunk = self.config.console_chunk.max(1);
            let mut bounce = vec![0u8; buffer.len().min(chunk)];
            let mut done = 0;
            while done < buffer.len() {
                let n = (buffer.len() - done).min(chunk);
                process.memory().read(buffer.slice(done, n).addr(), &mut bounce[..n]);
                self.machine.console_write(&bounce[..n]);
                done += n;
            }
            return Ok(count(buffer.len()));
        }

        let mut fs = self.fs.lock(process.pid());
        let (files, memory) = process.files_and_memory_mut();
        let Some(entry) = files.get_mut(fid) else {
            if self.config.kill_on_unknown_write {
                return Err(Violation::UnknownHandle(fid));
            }
            return Ok(-1);
        };

        let mut bounce = vec![0u8; buffer.len().min(PAGE_SIZE)];
        let mut done = 0;
        while done < buffer.len() {
            let n = (buffer.len() - done).min(PAGE_SIZE);
            memory.read(buffer.slice(done, n).addr(), &mut bounce[..n]);
            let put = fs.write(&mut entry.backing, &bounce[..n]).min(n);
            done += put;
            if put < n {
                break;
            }
        }
        Ok(count(done))
    }

    pub fn seek(&self, process: &mut Process<F::File>, fid: Fid, position: u32) -> Result<(), Violation> {
        let mut fs = self.fs.lock(process.pid());
        let entry = process
            .files_mut()
            .get_mut(fid)
            .ok_or(Violation::UnknownHandle(fid))?;
        fs.seek(&mut entry.backing, position);
        Ok(())
    }

    pub fn tell(&self, process: &Process<F::File>, fid: Fid) -> Result<u32, Violation> {
        let mut fs = self.fs.lock(process.pid());
        let entry = process.files().get(fid).ok_or(Violation::UnknownHandle(fid))?;
        Ok(fs.tell(&entry.backing))
    }

    /// `close`: a second close of the same fid is a violation.
    pub fn close(&self, process: &mut Process<F::File>, fid: Fid) -> Result<(), Violation> {
        let mut fs = self.fs.lock(process.pid());
        let entry = process
            .files_mut()
            .remove(fid)
            .ok_or(Violation::UnknownHandle(fid))?;
        fs.close(entry.backing);
        Ok(())
    }
}
