//! Process control and remote DLL injection (C7). Grounded on
//! `original_source/clink/process/src/process.cpp`: thread enumeration via
//! `TH32CS_SNAPTHREAD` for pause/unpause, a remote thread running
//! `LoadLibraryA` for injection, `WaitForSingleObject` for the join.

use crate::vm::{Access, VirtualMemory};
use crate::{Result, WinProcError};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Unknown,
    X86,
    X64,
    Arm64,
}

#[derive(Debug, Clone, Copy)]
pub struct RemoteResult {
    pub ok: bool,
    pub exit_code: u32,
}

pub struct Process {
    pid: i32,
}

impl Process {
    /// `pid < 0` targets the current process.
    pub fn new(pid: i32) -> Self {
        Self { pid }
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    #[cfg(windows)]
    pub fn get_arch(&self) -> Arch {
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Threading::{
            IsWow64Process, OpenProcess, PROCESS_QUERY_INFORMATION,
        };
        let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION, 0, self.pid as u32) };
        if handle == 0 {
            return Arch::Unknown;
        }
        let mut is_wow64 = 0;
        let ok = unsafe { IsWow64Process(handle, &mut is_wow64) };
        unsafe { CloseHandle(handle) };
        if ok == 0 {
            return Arch::Unknown;
        }
        if is_wow64 != 0 { Arch::X86 } else { Arch::X64 }
    }

    #[cfg(not(windows))]
    pub fn get_arch(&self) -> Arch {
        Arch::Unknown
    }

    /// Suspends (`suspend=true`) or resumes every thread owned by this
    /// process, via a `TH32CS_SNAPTHREAD` enumeration. Required only while
    /// installing hooks into another process.
    #[cfg(windows)]
    fn pause_impl(&self, suspend: bool) -> Result<()> {
        use windows_sys::Win32::Foundation::{CloseHandle, INVALID_HANDLE_VALUE};
        use windows_sys::Win32::System::Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, Thread32First, Thread32Next, TH32CS_SNAPTHREAD, THREADENTRY32,
        };
        use windows_sys::Win32::System::Threading::{
            OpenThread, ResumeThread, SuspendThread, THREAD_ALL_ACCESS,
        };

        let snap = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, self.pid as u32) };
        if snap == INVALID_HANDLE_VALUE {
            return Err(WinProcError::Win32(unsafe {
                windows_sys::Win32::Foundation::GetLastError()
            }));
        }
        let mut entry: THREADENTRY32 = unsafe { std::mem::zeroed() };
        entry.dwSize = std::mem::size_of::<THREADENTRY32>() as u32;
        let mut ok = unsafe { Thread32First(snap, &mut entry) };
        while ok != 0 {
            if entry.th32OwnerProcessID == self.pid as u32 {
                let thread = unsafe { OpenThread(THREAD_ALL_ACCESS, 0, entry.th32ThreadID) };
                if thread != 0 {
                    if suspend {
                        unsafe { SuspendThread(thread) };
                    } else {
                        unsafe { ResumeThread(thread) };
                    }
                    unsafe { CloseHandle(thread) };
                }
            }
            ok = unsafe { Thread32Next(snap, &mut entry) };
        }
        unsafe { CloseHandle(snap) };
        Ok(())
    }

    #[cfg(not(windows))]
    fn pause_impl(&self, _suspend: bool) -> Result<()> {
        Err(WinProcError::Unsupported)
    }

    pub fn pause(&self) -> Result<()> {
        self.pause_impl(true)
    }

    pub fn unpause(&self) -> Result<()> {
        self.pause_impl(false)
    }

    /// Injects `dll_path` into this process: writes the path into a fresh
    /// remote allocation, then runs `LoadLibraryA` on it via a remote
    /// thread. `kernel32`'s `LoadLibraryA` address is resolved directly
    /// (not through `GetProcAddress` on a potentially-hooked module) since
    /// kernel32 loads at the same address in every process on a given
    /// Windows session.
    pub fn inject_module(&self, dll_path: &str) -> Result<RemoteResult> {
        let target_arch = self.get_arch();
        let our_arch = Process::new(-1).get_arch();
        if (target_arch as i32) < (our_arch as i32) {
            warn!(target = "winproc.process", pid = self.pid, "inject_arch_mismatch");
            return Err(WinProcError::Unsupported);
        }

        let vm = VirtualMemory::open(self.pid)?;
        let mut bytes = dll_path.as_bytes().to_vec();
        bytes.push(0);
        let region = vm.alloc(1, Access::RW)?;
        vm.write(region.base, &bytes)?;

        let load_library = self.resolve_load_library_a()?;
        let result = self.remote_call(load_library, region.base);
        let _ = vm.free(region);
        debug!(target = "winproc.process", pid = self.pid, "inject_module_complete");
        result
    }

    #[cfg(windows)]
    fn resolve_load_library_a(&self) -> Result<usize> {
        use windows_sys::core::PCSTR;
        use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleA, GetProcAddress};
        let name = b"kernel32.dll\0";
        let module = unsafe { GetModuleHandleA(name.as_ptr() as PCSTR) };
        if module == 0 {
            return Err(WinProcError::ModuleNotFound("kernel32.dll".into()));
        }
        let func_name = b"LoadLibraryA\0";
        let addr = unsafe { GetProcAddress(module, func_name.as_ptr() as PCSTR) };
        addr.map(|f| f as usize).ok_or_else(|| WinProcError::ImportNotFound {
            library: "kernel32.dll".into(),
            name: "LoadLibraryA".into(),
        })
    }

    #[cfg(not(windows))]
    fn resolve_load_library_a(&self) -> Result<usize> {
        Err(WinProcError::Unsupported)
    }

    /// Runs `function(param)` on a thread created inside this process,
    /// pausing every other thread for the duration.
    #[cfg(windows)]
    pub fn remote_call(&self, function: usize, param: usize) -> Result<RemoteResult> {
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Threading::{
            CreateRemoteThread, GetExitCodeThread, OpenProcess, WaitForSingleObject,
            INFINITE, PROCESS_CREATE_THREAD, PROCESS_QUERY_INFORMATION,
        };

        let process_handle = unsafe {
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_CREATE_THREAD, 0, self.pid as u32)
        };
        if process_handle == 0 {
            return Err(WinProcError::Win32(unsafe {
                windows_sys::Win32::Foundation::GetLastError()
            }));
        }

        self.pause()?;

        let mut thread_id = 0u32;
        let thread = unsafe {
            CreateRemoteThread(
                process_handle,
                std::ptr::null(),
                0,
                Some(std::mem::transmute::<usize, unsafe extern "system" fn(*mut core::ffi::c_void) -> u32>(function)),
                param as *mut core::ffi::c_void,
                0,
                &mut thread_id,
            )
        };

        if thread == 0 {
            self.unpause()?;
            unsafe { CloseHandle(process_handle) };
            return Ok(RemoteResult { ok: false, exit_code: 0 });
        }

        unsafe { WaitForSingleObject(thread, INFINITE) };
        let mut exit_code = 0u32;
        unsafe { GetExitCodeThread(thread, &mut exit_code) };

        self.unpause()?;
        unsafe {
            CloseHandle(thread);
            CloseHandle(process_handle);
        }

        Ok(RemoteResult { ok: true, exit_code })
    }

    #[cfg(not(windows))]
    pub fn remote_call(&self, _function: usize, _param: usize) -> Result<RemoteResult> {
        Err(WinProcError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_has_a_pid() {
        let p = Process::new(-1);
        assert_eq!(p.pid(), -1);
    }

    #[cfg(not(windows))]
    #[test]
    fn non_windows_arch_is_unknown() {
        assert_eq!(Process::new(-1).get_arch(), Arch::Unknown);
    }
}
