//! User Memory Validation
//!
//! Checks every address a process hands the kernel before anything is
//! copied across the boundary.
//!
//! # Policy
//! - A zero-length range is trivially valid, whatever its address
//! - Otherwise the null address is rejected
//! - `addr + len` must not overflow and must stay at or below `user_top`
//! - Every touched page must be present and user-accessible, and writable
//!   when the kernel is going to store into it
//!
//! Checks walk the page map only. They never touch the bytes, so a bad
//! argument word cannot fault the kernel.

use alloc::vec::Vec;

use crate::config::Config;
use crate::mm::{PageFlags, UserMemory, VirtAddr, PAGE_SIZE};

use super::error::Violation;

/// Direction of a kernel access to user memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The kernel reads from the range (user → kernel).
    Read,
    /// The kernel writes into the range (kernel → user).
    Write,
}

impl Access {
    const fn required(self) -> PageFlags {
        match self {
            Self::Read => PageFlags::USER_RO,
            Self::Write => PageFlags::USER_RW,
        }
    }
}

/// A user range that passed validation.
///
/// Only [`Validator::check`] constructs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRange {
    addr: VirtAddr,
    len: usize,
    access: Access,
}

impl UserRange {
    #[inline]
    pub const fn addr(&self) -> VirtAddr {
        self.addr
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn access(&self) -> Access {
        self.access
    }

    /// Sub-range `[offset, offset + len)`; both already inside `self`.
    pub(crate) fn slice(&self, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= self.len);
        Self {
            addr: VirtAddr::new(self.addr.as_usize() + offset),
            len,
            access: self.access,
        }
    }
}

/// NUL-terminated string copied out of user memory, NUL excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserString(Vec<u8>);

impl UserString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The string as UTF-8, if it is.
    pub fn to_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.0).ok()
    }
}

/// Validator bound to the kernel's user/kernel split.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    user_top: usize,
    max_string_len: usize,
}

impl Validator {
    pub const fn new(config: &Config) -> Self {
        Self {
            user_top: config.user_top,
            max_string_len: config.max_string_len,
        }
    }

    /// True iff `[addr, addr + len)` is user memory the kernel may access
    /// as `access`.
    pub fn validate<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
        len: usize,
        access: Access,
    ) -> bool {
        self.check(mem, addr, len, access).is_ok()
    }

    /// Validate a range and hand back proof of it.
    ///
    /// # Security Checks
    /// 1. Zero length short-circuits to success
    /// 2. Null is rejected
    /// 3. End doesn't overflow and doesn't cross `user_top`
    /// 4. Every page is mapped with the rights `access` needs
    pub fn check<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
        len: usize,
        access: Access,
    ) -> Result<UserRange, Violation> {
        let range = UserRange { addr, len, access };
        if len == 0 {
            return Ok(range);
        }

        let bad = Violation::BadAddress { addr, len };
        if addr.is_null() {
            return Err(bad);
        }

        let end = addr.checked_add(len).ok_or(bad)?;
        if end.as_usize() > self.user_top {
            return Err(bad);
        }

        let required = access.required();
        let mut page = addr.align_down().as_usize();
        while page < end.as_usize() {
            match mem.page_flags(VirtAddr::new(page)) {
                Some(flags) if flags.contains(required) => {}
                _ => return Err(bad),
            }
            page += PAGE_SIZE;
        }

        Ok(range)
    }

    /// Read one 32-bit little-endian word from user memory.
    pub fn read_word<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
    ) -> Result<u32, Violation> {
        let range = self.check(mem, addr, 4, Access::Read)?;
        let mut word = [0u8; 4];
        mem.read(range.addr(), &mut word);
        Ok(u32::from_le_bytes(word))
    }

    /// Copy a NUL-terminated string in, validating one page at a time.
    ///
    /// Fails if any byte before the NUL is not readable user memory, or
    /// if no NUL appears within `max_string_len` bytes.
    pub fn read_str<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
    ) -> Result<UserString, Violation> {
        if addr.is_null() {
            return Err(Violation::BadAddress { addr, len: 1 });
        }

        let mut bytes = Vec::new();
        let mut cursor = addr;
        let mut budget = self.max_string_len;
        while budget > 0 {
            let n = cursor.bytes_to_page_end().min(budget);
            let chunk = self.check(mem, cursor, 1, Access::Read).map(|_| {
                let mut buf = alloc::vec![0u8; n];
                mem.read(cursor, &mut buf);
                buf
            })?;

            // Checking one byte proved the whole page; clip to `user_top`.
            let usable = n.min(self.user_top - cursor.as_usize());
            if let Some(nul) = chunk[..usable].iter().position(|&b| b == 0) {
                bytes.extend_from_slice(&chunk[..nul]);
                return Ok(UserString(bytes));
            }
            bytes.extend_from_slice(&chunk[..usable]);

            budget -= n;
            cursor = match cursor.checked_add(n) {
                Some(next) => next,
                None => break,
            };
        }

        Err(Violation::UnterminatedString(addr))
    }
}
