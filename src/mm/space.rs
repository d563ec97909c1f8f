//! User Address Space View
//!
//! The paging subsystem owns the real page tables. The syscall layer only
//! needs to ask "is this page mapped, and with which rights" and to copy bytes
//! once a range has been checked; [`UserMemory`] is that seam.
//!
//! [`PageMap`] is a software page map implementing it, used by hosted
//! builds where user memory is not directly addressable.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;

use bitflags::bitflags;

use super::address::{VirtAddr, PAGE_SIZE};

bitflags! {
    /// Permission bits of a user page as reported by the page tables.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PageFlags: u32 {
        /// Page is mapped.
        const PRESENT = 1 << 0;
        /// Page may be written.
        const WRITABLE = 1 << 1;
        /// Page is reachable from user mode.
        const USER = 1 << 2;

        /// Read-only user page (code, rodata).
        const USER_RO = Self::PRESENT.bits() | Self::USER.bits();
        /// Read/write user page (data, stack).
        const USER_RW = Self::USER_RO.bits() | Self::WRITABLE.bits();
    }
}

/// One process's address space as seen from the syscall boundary.
///
/// `read` and `write` are only called on ranges the validator accepted;
/// implementations may assume every touched page is mapped.
pub trait UserMemory {
    /// Flags of the page starting at `page`, or `None` if unmapped.
    ///
    /// Must not fault or fill the page in.
    fn page_flags(&self, page: VirtAddr) -> Option<PageFlags>;

    /// Copy `dst.len()` bytes starting at `addr` into `dst`.
    fn read(&self, addr: VirtAddr, dst: &mut [u8]);

    /// Copy `src` into user memory starting at `addr`.
    fn write(&mut self, addr: VirtAddr, src: &[u8]);
}

struct Page {
    flags: PageFlags,
    bytes: Box<[u8; PAGE_SIZE]>,
}

/// Sparse page map backed by kernel heap pages.
#[derive(Default)]
pub struct PageMap {
    pages: BTreeMap<usize, Page>,
}

impl PageMap {
    /// Create an empty address space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a zero-filled page at `page` (aligned down) with `flags`.
    ///
    /// Remapping an existing page keeps its contents and replaces its flags.
    pub fn map(&mut self, page: VirtAddr, flags: PageFlags) {
        let vpn = page.page_number();
        self.pages
            .entry(vpn)
            .and_modify(|p| p.flags = flags)
            .or_insert_with(|| Page {
                flags,
                bytes: Box::new([0; PAGE_SIZE]),
            });
    }

    /// Map every page overlapping `[start, start + len)`.
    pub fn map_range(&mut self, start: VirtAddr, len: usize, flags: PageFlags) {
        if len == 0 {
            return;
        }
        let first = start.page_number();
        let last = (start.as_usize() + (len - 1)) / PAGE_SIZE;
        for vpn in first..=last {
            self.map(VirtAddr::new(vpn * PAGE_SIZE), flags);
        }
    }

    /// Drop the page containing `page`.
    pub fn unmap(&mut self, page: VirtAddr) {
        self.pages.remove(&page.page_number());
    }

    /// Number of mapped pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Walk `[addr, addr + len)` page by page, calling `f` with the page,
    /// the offset inside it and the offset into the caller's buffer.
    fn for_each_chunk(
        addr: VirtAddr,
        len: usize,
        mut f: impl FnMut(usize, core::ops::Range<usize>, core::ops::Range<usize>),
    ) {
        let mut done = 0;
        let mut cursor = addr;
        while done < len {
            let in_page = cursor.page_offset();
            let n = cursor.bytes_to_page_end().min(len - done);
            f(cursor.page_number(), in_page..in_page + n, done..done + n);
            done += n;
            cursor = VirtAddr::new(cursor.as_usize().wrapping_add(n));
        }
    }
}

impl UserMemory for PageMap {
    fn page_flags(&self, page: VirtAddr) -> Option<PageFlags> {
        self.pages.get(&page.page_number()).map(|p| p.flags)
    }

    fn read(&self, addr: VirtAddr, dst: &mut [u8]) {
        Self::for_each_chunk(addr, dst.len(), |vpn, page_range, buf_range| {
            match self.pages.get(&vpn) {
                Some(page) => dst[buf_range].copy_from_slice(&page.bytes[page_range]),
                None => dst[buf_range].fill(0),
            }
        });
    }

    fn write(&mut self, addr: VirtAddr, src: &[u8]) {
        let pages = &mut self.pages;
        Self::for_each_chunk(addr, src.len(), |vpn, page_range, buf_range| {
            if let Some(page) = pages.get_mut(&vpn) {
                page.bytes[page_range].copy_from_slice(&src[buf_range]);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_across_pages() {
        let mut map = PageMap::new();
        let base = VirtAddr::new(0x1000_0000);
        map.map_range(base, 2 * PAGE_SIZE, PageFlags::USER_RW);
        assert_eq!(map.len(), 2);

        let at = VirtAddr::new(base.as_usize() + PAGE_SIZE - 3);
        map.write(at, b"across");
        let mut out = [0u8; 6];
        map.read(at, &mut out);
        assert_eq!(&out, b"across");
    }

    #[test]
    fn test_unmapped_page_has_no_flags() {
        let mut map = PageMap::new();
        map.map(VirtAddr::new(0x2000), PageFlags::USER_RO);
        assert_eq!(map.page_flags(VirtAddr::new(0x2000)), Some(PageFlags::USER_RO));
        assert_eq!(map.page_flags(VirtAddr::new(0x3000)), None);
        map.unmap(VirtAddr::new(0x2fff));
        assert!(map.is_empty());
    }

    #[test]
    fn test_remap_keeps_contents() {
        let mut map = PageMap::new();
        let page = VirtAddr::new(0x4000);
        map.map(page, PageFlags::USER_RW);
        map.write(page, b"keep");
        map.map(page, PageFlags::USER_RO);
        let mut out = [0u8; 4];
        map.read(page, &mut out);
        assert_eq!(&out, b"keep");
        assert!(!map.page_flags(page).unwrap().contains(PageFlags::WRITABLE));
    }
}
