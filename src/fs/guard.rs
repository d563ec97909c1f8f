//! Filesystem Access Guard
//!
//! A single `spin::Mutex` around the file system, plus a record of which
//! process holds it. Acquisition is scope-bound: the [`FsLock`] releases on
//! every path out of the critical section, early returns and `?` included.
//!
//! The holder record lets the exit path detect a lock its own process
//! still owns (a leaked guard) and force it open before the process goes
//! away.

use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicI32, Ordering};

use spin::{Mutex, MutexGuard};

use crate::process::Pid;

/// No process holds the guard.
const NO_HOLDER: i32 = i32::MIN;

/// The kernel-wide file-system lock.
pub struct FsGuard<F> {
    fs: Mutex<F>,
    holder: AtomicI32,
}

impl<F> FsGuard<F> {
    /// Wrap the file system. Done once at kernel start.
    pub const fn new(fs: F) -> Self {
        Self {
            fs: Mutex::new(fs),
            holder: AtomicI32::new(NO_HOLDER),
        }
    }

    /// Acquire on behalf of `pid`, spinning until free.
    pub fn lock(&self, pid: Pid) -> FsLock<'_, F> {
        let inner = self.fs.lock();
        self.holder.store(pid.as_i32(), Ordering::Release);
        FsLock {
            inner,
            holder: &self.holder,
        }
    }

    /// Whether `pid` currently holds the guard.
    pub fn is_held_by(&self, pid: Pid) -> bool {
        self.holder.load(Ordering::Acquire) == pid.as_i32()
    }

    pub fn is_locked(&self) -> bool {
        self.fs.is_locked()
    }

    /// Release the guard if `pid` holds it. Returns whether it did.
    ///
    /// Only the exit path of `pid` itself may call this, when no `FsLock`
    /// of that process is still reachable.
    pub fn release_if_held(&self, pid: Pid) -> bool {
        if self
            .holder
            .compare_exchange(pid.as_i32(), NO_HOLDER, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        // SAFETY:
        // - The holder record said `pid` owns the lock, and only `pid`'s own
        //   exit path gets here, so no other thread is inside the section
        // - Any `FsLock` of `pid` was leaked; none will be dropped later
        unsafe { self.fs.force_unlock() };
        true
    }

    /// Consume the guard and return the file system.
    pub fn into_inner(self) -> F {
        self.fs.into_inner()
    }
}

/// Held file-system lock. Derefs to the file system.
pub struct FsLock<'a, F> {
    inner: MutexGuard<'a, F>,
    holder: &'a AtomicI32,
}

impl<F> Deref for FsLock<'_, F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.inner
    }
}

impl<F> DerefMut for FsLock<'_, F> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.inner
    }
}

impl<F> Drop for FsLock<'_, F> {
    fn drop(&mut self) {
        // Runs before `inner` unlocks the mutex.
        self.holder.store(NO_HOLDER, Ordering::Release);
    }
}
