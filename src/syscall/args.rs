//! Typed Syscall Arguments
//!
//! Turns the three raw argument words into the parameters of one specific
//! call. Pointer policy lives here and nowhere else:
//!
//! | Call                      | Pointer argument | Null            |
//! |---------------------------|------------------|-----------------|
//! | `exec`, `create`, `remove`| string           | violation       |
//! | `open`                    | string           | `name: None`    |
//! | `read`                    | buffer, writable | per range rules |
//! | `write`                   | buffer, readable | per range rules |
//!
//! Buffers are validated for every handle, pseudo-handles included, so a
//! caller can never learn anything from the kernel about memory it cannot
//! access.

use crate::fs::Fid;
use crate::mm::{UserMemory, VirtAddr};
use crate::process::Pid;

use super::error::Violation;
use super::numbers::SyscallNumber;
use super::validate::{Access, UserRange, UserString, Validator};

/// A decoded, validated syscall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Halt,
    Exit { status: i32 },
    Exec { command_line: UserString },
    Wait { pid: Pid },
    Create { name: UserString, initial_size: u32 },
    Remove { name: UserString },
    Open { name: Option<UserString> },
    Filesize { fid: Fid },
    Read { fid: Fid, buffer: UserRange },
    Write { fid: Fid, buffer: UserRange },
    Seek { fid: Fid, position: u32 },
    Tell { fid: Fid },
    Close { fid: Fid },
}

impl Request {
    /// Decode `words` as the arguments of `number`.
    pub fn decode<M: UserMemory + ?Sized>(
        number: SyscallNumber,
        words: [u32; 3],
        validator: &Validator,
        mem: &M,
    ) -> Result<Self, Violation> {
        let [a0, a1, a2] = words;
        let name = |word: u32| required_str(validator, mem, word);
        let buffer = |word: u32, len: u32, access: Access| {
            validator.check(mem, VirtAddr::from_word(word), len as usize, access)
        };

        Ok(match number {
            SyscallNumber::Halt => Self::Halt,
            SyscallNumber::Exit => Self::Exit { status: a0 as i32 },
            SyscallNumber::Exec => Self::Exec {
                command_line: name(a0)?,
            },
            SyscallNumber::Wait => Self::Wait {
                pid: Pid::from_word(a0),
            },
            SyscallNumber::Create => Self::Create {
                name: name(a0)?,
                initial_size: a1,
            },
            SyscallNumber::Remove => Self::Remove { name: name(a0)? },
            SyscallNumber::Open => Self::Open {
                name: match a0 {
                    0 => None,
                    _ => Some(name(a0)?),
                },
            },
            SyscallNumber::Filesize => Self::Filesize {
                fid: Fid::from_word(a0),
            },
            SyscallNumber::Read => Self::Read {
                fid: Fid::from_word(a0),
                buffer: buffer(a1, a2, Access::Write)?,
            },
            SyscallNumber::Write => Self::Write {
                fid: Fid::from_word(a0),
                buffer: buffer(a1, a2, Access::Read)?,
            },
            SyscallNumber::Seek => Self::Seek {
                fid: Fid::from_word(a0),
                position: a1,
            },
            SyscallNumber::Tell => Self::Tell {
                fid: Fid::from_word(a0),
            },
            SyscallNumber::Close => Self::Close {
                fid: Fid::from_word(a0),
            },
        })
    }

    pub fn number(&self) -> SyscallNumber {
        match self {
            Self::Halt => SyscallNumber::Halt,
            Self::Exit { .. } => SyscallNumber::Exit,
            Self::Exec { .. } => SyscallNumber::Exec,
            Self::Wait { .. } => SyscallNumber::Wait,
            Self::Create { .. } => SyscallNumber::Create,
            Self::Remove { .. } => SyscallNumber::Remove,
            Self::Open { .. } => SyscallNumber::Open,
            Self::Filesize { .. } => SyscallNumber::Filesize,
            Self::Read { .. } => SyscallNumber::Read,
            Self::Write { .. } => SyscallNumber::Write,
            Self::Seek { .. } => SyscallNumber::Seek,
            Self::Tell { .. } => SyscallNumber::Tell,
            Self::Close { .. } => SyscallNumber::Close,
        }
    }
}

fn required_str<M: UserMemory + ?Sized>(
    validator: &Validator,
    mem: &M,
    word: u32,
) -> Result<UserString, Violation> {
    if word == 0 {
        return Err(Violation::NullName);
    }
    validator.read_str(mem, VirtAddr::from_word(word))
}
