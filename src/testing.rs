//! Collaborator doubles for unit tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::string::String;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, Weak};
use std::vec::Vec;

use crate::config::Config;
use crate::fs::FileSystem;
use crate::kernel::Kernel;
use crate::mm::{PageFlags, PageMap, VirtAddr, PAGE_SIZE};
use crate::process::{program_name, Machine, Pid, Process, ProcessHost};
use crate::syscall::SyscallNumber;
use crate::trap::{TrapFrame, TrapOutcome};

/// Start of the writable data area of every test process.
pub const DATA_BASE: usize = 0x0804_8000;
/// Pages in the data area.
pub const DATA_PAGES: usize = 4;
/// A read-only page below the data area.
pub const RODATA_BASE: usize = 0x0804_0000;

/// Address `offset` bytes into the data area, as an argument word.
pub fn buffer(offset: usize) -> u32 {
    (DATA_BASE + offset) as u32
}

/// Open file of [`MemFs`].
#[derive(Debug)]
pub struct MemFile {
    inode: usize,
    pos: usize,
}

/// In-memory file system. Names are unlinked on remove; open files keep
/// their inode.
#[derive(Debug, Default)]
pub struct MemFs {
    names: BTreeMap<String, usize>,
    inodes: Vec<Vec<u8>>,
    opens: usize,
    closes: usize,
    /// Creates beyond this many files fail, as if the disk were full.
    max_files: Option<usize>,
}

impl MemFs {
    /// Longest accepted file name.
    pub const NAME_MAX: usize = 14;

    pub fn with_max_files(max: usize) -> Self {
        Self {
            max_files: Some(max),
            ..Self::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens
    }

    pub fn closes(&self) -> usize {
        self.closes
    }

    /// Handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.opens - self.closes
    }

    pub fn exists(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn contents(&self, name: &str) -> Option<&[u8]> {
        self.names.get(name).map(|&i| self.inodes[i].as_slice())
    }
}

impl FileSystem for MemFs {
    type File = MemFile;

    fn create(&mut self, name: &str, initial_size: u32) -> bool {
        if name.is_empty() || name.len() > Self::NAME_MAX || self.names.contains_key(name) {
            return false;
        }
        if self.max_files.is_some_and(|max| self.names.len() >= max) {
            return false;
        }
        self.inodes.push(vec![0; initial_size as usize]);
        self.names.insert(name.into(), self.inodes.len() - 1);
        true
    }

    fn open(&mut self, name: &str) -> Option<MemFile> {
        let inode = *self.names.get(name)?;
        self.opens += 1;
        Some(MemFile { inode, pos: 0 })
    }

    fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name).is_some()
    }

    fn read(&mut self, file: &mut MemFile, buf: &mut [u8]) -> usize {
        let data = &self.inodes[file.inode];
        let start = file.pos.min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        file.pos += n;
        n
    }

    fn write(&mut self, file: &mut MemFile, buf: &[u8]) -> usize {
        let data = &mut self.inodes[file.inode];
        let end = file.pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[file.pos..end].copy_from_slice(buf);
        file.pos = end;
        buf.len()
    }

    fn seek(&mut self, file: &mut MemFile, position: u32) {
        file.pos = position as usize;
    }

    fn tell(&mut self, file: &MemFile) -> u32 {
        file.pos as u32
    }

    fn length(&mut self, file: &MemFile) -> u32 {
        self.inodes[file.inode].len() as u32
    }

    fn close(&mut self, _file: MemFile) {
        self.closes += 1;
    }
}

/// Kernel state as seen from inside `record_exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSnapshot {
    pub status: i32,
    pub guard_locked: bool,
    /// File-system handles still open; `None` if the guard was taken.
    pub open_handles: Option<usize>,
}

#[derive(Debug, Default)]
struct HostState {
    next_pid: i32,
    statuses: BTreeMap<Pid, Option<i32>>,
    spawned: Vec<(Pid, String)>,
    spawn_held_guard: Vec<bool>,
    exits: BTreeMap<Pid, ExitSnapshot>,
}

/// Process host whose `await_exit` blocks on a condition variable.
#[derive(Debug, Default)]
pub struct SimHost {
    state: Mutex<HostState>,
    exited: Condvar,
    await_calls: AtomicUsize,
    /// The kernel this host serves, for observing the guard.
    kernel: OnceLock<Weak<TestKernel>>,
    /// Program names whose image "fails to load".
    pub missing: BTreeSet<String>,
}

impl SimHost {
    fn attach(&self, kernel: &Arc<TestKernel>) {
        let _ = self.kernel.set(Arc::downgrade(kernel));
    }

    fn kernel(&self) -> Option<Arc<TestKernel>> {
        self.kernel.get().and_then(Weak::upgrade)
    }

    /// Per successful spawn, whether the parent held the guard during it.
    pub fn spawn_held_guard(&self) -> Vec<bool> {
        self.state.lock().unwrap().spawn_held_guard.clone()
    }

    /// What the kernel looked like when `pid`'s exit was published.
    pub fn exit_snapshot(&self, pid: Pid) -> Option<ExitSnapshot> {
        self.state.lock().unwrap().exits.get(&pid).copied()
    }

    pub fn status_of(&self, pid: Pid) -> Option<i32> {
        self.state.lock().unwrap().statuses.get(&pid).copied().flatten()
    }

    /// `(parent, command line)` of every successful spawn.
    pub fn spawned(&self) -> Vec<(Pid, String)> {
        self.state.lock().unwrap().spawned.clone()
    }

    pub fn await_calls(&self) -> usize {
        self.await_calls.load(Ordering::SeqCst)
    }
}

impl ProcessHost for SimHost {
    fn spawn(&self, parent: Pid, command_line: &str) -> Option<Pid> {
        if self.missing.contains(program_name(command_line)) {
            return None;
        }
        let held = self
            .kernel()
            .is_some_and(|kernel| kernel.fs().is_held_by(parent));
        let mut state = self.state.lock().unwrap();
        state.spawn_held_guard.push(held);
        state.next_pid += 1;
        let pid = Pid::new(100 + state.next_pid);
        state.statuses.insert(pid, None);
        state.spawned.push((parent, command_line.into()));
        Some(pid)
    }

    fn await_exit(&self, child: Pid) -> Option<i32> {
        self.await_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        loop {
            let status = *state.statuses.get(&child)?;
            if status.is_some() {
                return status;
            }
            state = self.exited.wait(state).unwrap();
        }
    }

    fn record_exit(&self, pid: Pid, status: i32) {
        // Only meaningful when no other process is using the file system.
        let (guard_locked, open_handles) = match self.kernel() {
            Some(kernel) if kernel.fs().is_locked() => (true, None),
            Some(kernel) => (false, Some(kernel.fs().lock(pid).open_handles())),
            None => (false, None),
        };
        let mut state = self.state.lock().unwrap();
        state.exits.insert(
            pid,
            ExitSnapshot {
                status,
                guard_locked,
                open_handles,
            },
        );
        state.statuses.insert(pid, Some(status));
        drop(state);
        self.exited.notify_all();
    }
}

/// Scripted console and power switch.
#[derive(Debug, Default)]
pub struct SimMachine {
    input: Mutex<VecDeque<u8>>,
    output: Mutex<Vec<u8>>,
    writes: AtomicUsize,
    powered_off: AtomicBool,
}

impl SimMachine {
    pub fn with_input(input: &[u8]) -> Self {
        Self {
            input: Mutex::new(input.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn output(&self) -> Vec<u8> {
        self.output.lock().unwrap().clone()
    }

    /// Number of `console_write` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn powered_off(&self) -> bool {
        self.powered_off.load(Ordering::SeqCst)
    }
}

impl Machine for SimMachine {
    fn console_read_byte(&self) -> u8 {
        self.input.lock().unwrap().pop_front().unwrap_or(0)
    }

    fn console_write(&self, bytes: &[u8]) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.output.lock().unwrap().extend_from_slice(bytes);
    }

    fn power_off(&self) {
        self.powered_off.store(true, Ordering::SeqCst);
    }
}

pub type TestKernel = Kernel<MemFs, SimHost, SimMachine>;
pub type TestProcess = Process<MemFile>;

#[derive(Default)]
pub struct Setup {
    pub config: Config,
    pub fs: MemFs,
    pub host: SimHost,
    pub input: Vec<u8>,
}

/// A kernel plus helpers to build processes and issue traps.
pub struct Harness {
    pub kernel: Arc<TestKernel>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(Setup::default())
    }

    pub fn with(setup: Setup) -> Self {
        let kernel = Arc::new(Kernel::new(
            setup.config,
            setup.fs,
            setup.host,
            SimMachine::with_input(&setup.input),
        ));
        kernel.host().attach(&kernel);
        Self { kernel }
    }

    fn stack_top(&self) -> usize {
        self.kernel.config().user_top
    }

    /// A process with a data area, a read-only page and one stack page.
    pub fn process(&self, pid: i32, name: &str) -> TestProcess {
        let mut map = PageMap::new();
        map.map_range(VirtAddr::new(DATA_BASE), DATA_PAGES * PAGE_SIZE, PageFlags::USER_RW);
        map.map(VirtAddr::new(RODATA_BASE), PageFlags::USER_RO);
        map.map(VirtAddr::new(self.stack_top() - PAGE_SIZE), PageFlags::USER_RW);
        Process::new(Pid::new(pid), name, Box::new(map), self.kernel.config())
    }

    /// Store `s` and a NUL at `offset` in the data area.
    pub fn put_str(&self, p: &mut TestProcess, offset: usize, s: &str) -> u32 {
        let addr = buffer(offset);
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        p.memory_mut().write(VirtAddr::from_word(addr), &bytes);
        addr
    }

    pub fn put_bytes(&self, p: &mut TestProcess, offset: usize, bytes: &[u8]) -> u32 {
        let addr = buffer(offset);
        p.memory_mut().write(VirtAddr::from_word(addr), bytes);
        addr
    }

    pub fn get_bytes(&self, p: &TestProcess, addr: u32, len: usize) -> Vec<u8> {
        let mut out = vec![0; len];
        p.memory().read(VirtAddr::from_word(addr), &mut out);
        out
    }

    /// Lay `words` out at `esp` and trap. Returns the outcome and frame.
    pub fn trap_at(&self, p: &mut TestProcess, esp: u32, words: &[u32]) -> (TrapOutcome, TrapFrame) {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        p.memory_mut().write(VirtAddr::from_word(esp), &bytes);
        let mut frame = TrapFrame::new(esp);
        let outcome = self.kernel.handle_trap(p, &mut frame);
        (outcome, frame)
    }

    /// Issue one syscall from a well-formed stack.
    pub fn call(&self, p: &mut TestProcess, number: SyscallNumber, args: [u32; 3]) -> (TrapOutcome, i32) {
        let esp = (self.stack_top() - 64) as u32;
        let (outcome, frame) =
            self.trap_at(p, esp, &[number.as_u32(), args[0], args[1], args[2]]);
        (outcome, frame.result())
    }

    pub fn host_status(&self, pid: Pid) -> Option<i32> {
        self.kernel.host().status_of(pid)
    }

    pub fn console_output(&self) -> String {
        String::from_utf8_lossy(&self.kernel.machine().output()).into_owned()
    }
}
