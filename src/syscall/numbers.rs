//! System call numbers
//!
//! The number space is dense and fixed, so decoding is a bounds-checked
//! index into [`SyscallNumber::ALL`].

use super::error::Violation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum SyscallNumber {
    Halt = 0,
    Exit = 1,
    Exec = 2,
    Wait = 3,
    Create = 4,
    Remove = 5,
    Open = 6,
    Filesize = 7,
    Read = 8,
    Write = 9,
    Seek = 10,
    Tell = 11,
    Close = 12,
}

impl SyscallNumber {
    /// Every syscall, indexed by its number.
    pub const ALL: [Self; 13] = [
        Self::Halt,
        Self::Exit,
        Self::Exec,
        Self::Wait,
        Self::Create,
        Self::Remove,
        Self::Open,
        Self::Filesize,
        Self::Read,
        Self::Write,
        Self::Seek,
        Self::Tell,
        Self::Close,
    ];

    /// Raw number as pushed by user code.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// How many of the three argument words this call uses.
    pub const fn arity(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit
            | Self::Exec
            | Self::Wait
            | Self::Remove
            | Self::Open
            | Self::Filesize
            | Self::Tell
            | Self::Close => 1,
            Self::Create | Self::Seek => 2,
            Self::Read | Self::Write => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Halt => "halt",
            Self::Exit => "exit",
            Self::Exec => "exec",
            Self::Wait => "wait",
            Self::Create => "create",
            Self::Remove => "remove",
            Self::Open => "open",
            Self::Filesize => "filesize",
            Self::Read => "read",
            Self::Write => "write",
            Self::Seek => "seek",
            Self::Tell => "tell",
            Self::Close => "close",
        }
    }
}

impl TryFrom<u32> for SyscallNumber {
    type Error = Violation;

    fn try_from(num: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(num as usize)
            .copied()
            .ok_or(Violation::UnknownSyscall(num))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_number() {
        for (i, call) in SyscallNumber::ALL.iter().enumerate() {
            assert_eq!(call.as_u32() as usize, i);
            assert_eq!(SyscallNumber::try_from(i as u32), Ok(*call));
        }
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert_eq!(
            SyscallNumber::try_from(13),
            Err(Violation::UnknownSyscall(13))
        );
        assert!(SyscallNumber::try_from(u32::MAX).is_err());
    }
}
