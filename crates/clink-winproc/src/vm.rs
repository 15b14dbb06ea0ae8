//! Process virtual memory access (C5). Grounded on
//! `original_source/clink/process/src/vm.cpp`: an access-rights bitflag
//! abstraction over `VirtualAllocEx`/`VirtualProtectEx`/`ReadProcessMemory`,
//! generalized to return `Result` instead of raw bools.

use crate::{Result, WinProcError};
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Access: u32 {
        const READ    = 1 << 0;
        const WRITE   = 1 << 1;
        const EXECUTE = 1 << 2;
        const COW     = 1 << 3;
        const RW      = Self::READ.bits() | Self::WRITE.bits();
        const RX      = Self::READ.bits() | Self::EXECUTE.bits();
        const RWX     = Self::READ.bits() | Self::WRITE.bits() | Self::EXECUTE.bits();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub base: usize,
    pub page_count: u32,
}

/// A handle to a process's address space, either the current process
/// (`pid < 0`) or another process opened for VM access.
pub struct VirtualMemory {
    #[cfg(windows)]
    handle: windows_sys::Win32::Foundation::HANDLE,
    #[cfg(not(windows))]
    _pid: i32,
}

impl VirtualMemory {
    #[cfg(windows)]
    pub fn open(pid: i32) -> Result<Self> {
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Threading::{
            GetCurrentProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
            PROCESS_VM_READ, PROCESS_VM_WRITE,
        };
        let handle = if pid > 0 {
            let h = unsafe {
                OpenProcess(
                    PROCESS_QUERY_INFORMATION | PROCESS_VM_OPERATION | PROCESS_VM_WRITE | PROCESS_VM_READ,
                    0,
                    pid as u32,
                )
            };
            if h == 0 {
                return Err(WinProcError::Win32(unsafe {
                    windows_sys::Win32::Foundation::GetLastError()
                }));
            }
            h
        } else {
            unsafe { GetCurrentProcess() }
        };
        let _ = CloseHandle; // silence unused-import on some feature sets
        Ok(Self { handle })
    }

    #[cfg(not(windows))]
    pub fn open(pid: i32) -> Result<Self> {
        Ok(Self { _pid: pid })
    }

    pub fn get_page_size() -> usize {
        #[cfg(windows)]
        {
            use windows_sys::Win32::System::SystemInformation::GetSystemInfo;
            use windows_sys::Win32::System::SystemInformation::SYSTEM_INFO;
            let mut info: SYSTEM_INFO = unsafe { std::mem::zeroed() };
            unsafe { GetSystemInfo(&mut info) };
            info.dwPageSize as usize
        }
        #[cfg(not(windows))]
        {
            4096
        }
    }

    #[cfg(windows)]
    pub fn read(&self, src: usize, buf: &mut [u8]) -> Result<()> {
        use windows_sys::Win32::System::Diagnostics::Debug::ReadProcessMemory;
        let ok = unsafe {
            ReadProcessMemory(
                self.handle,
                src as *const core::ffi::c_void,
                buf.as_mut_ptr() as *mut core::ffi::c_void,
                buf.len(),
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(WinProcError::Win32(unsafe {
                windows_sys::Win32::Foundation::GetLastError()
            }));
        }
        Ok(())
    }

    #[cfg(not(windows))]
    pub fn read(&self, _src: usize, _buf: &mut [u8]) -> Result<()> {
        Err(WinProcError::Unsupported)
    }

    #[cfg(windows)]
    pub fn write(&self, dest: usize, buf: &[u8]) -> Result<()> {
        use windows_sys::Win32::System::Diagnostics::Debug::WriteProcessMemory;
        let ok = unsafe {
            WriteProcessMemory(
                self.handle,
                dest as *const core::ffi::c_void,
                buf.as_ptr() as *const core::ffi::c_void,
                buf.len(),
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(WinProcError::Win32(unsafe {
                windows_sys::Win32::Foundation::GetLastError()
            }));
        }
        Ok(())
    }

    #[cfg(not(windows))]
    pub fn write(&self, _dest: usize, _buf: &[u8]) -> Result<()> {
        Err(WinProcError::Unsupported)
    }

    #[cfg(windows)]
    pub fn alloc(&self, page_count: u32, access: Access) -> Result<Region> {
        use windows_sys::Win32::System::Memory::{
            VirtualAllocEx, MEM_COMMIT, MEM_RESERVE, PAGE_EXECUTE_READWRITE, PAGE_NOACCESS,
            PAGE_READONLY, PAGE_READWRITE, PAGE_WRITECOPY,
        };
        let protect = to_ms_flags(access, PAGE_NOACCESS, PAGE_READONLY, PAGE_READWRITE, PAGE_WRITECOPY, PAGE_EXECUTE_READWRITE);
        let size = page_count as usize * Self::get_page_size();
        let base = unsafe {
            VirtualAllocEx(
                self.handle,
                std::ptr::null(),
                size,
                MEM_COMMIT | MEM_RESERVE,
                protect,
            )
        };
        if base.is_null() {
            return Err(WinProcError::Win32(unsafe {
                windows_sys::Win32::Foundation::GetLastError()
            }));
        }
        Ok(Region { base: base as usize, page_count })
    }

    #[cfg(not(windows))]
    pub fn alloc(&self, _page_count: u32, _access: Access) -> Result<Region> {
        Err(WinProcError::Unsupported)
    }

    #[cfg(windows)]
    pub fn free(&self, region: Region) -> Result<()> {
        use windows_sys::Win32::System::Memory::{VirtualFreeEx, MEM_RELEASE};
        let ok = unsafe {
            VirtualFreeEx(self.handle, region.base as *mut core::ffi::c_void, 0, MEM_RELEASE)
        };
        if ok == 0 {
            return Err(WinProcError::Win32(unsafe {
                windows_sys::Win32::Foundation::GetLastError()
            }));
        }
        Ok(())
    }

    #[cfg(not(windows))]
    pub fn free(&self, _region: Region) -> Result<()> {
        Err(WinProcError::Unsupported)
    }

    #[cfg(windows)]
    pub fn set_access(&self, region: Region, access: Access) -> Result<u32> {
        use windows_sys::Win32::System::Memory::{
            VirtualProtectEx, PAGE_EXECUTE_READWRITE, PAGE_NOACCESS, PAGE_READONLY,
            PAGE_READWRITE, PAGE_WRITECOPY,
        };
        let protect = to_ms_flags(access, PAGE_NOACCESS, PAGE_READONLY, PAGE_READWRITE, PAGE_WRITECOPY, PAGE_EXECUTE_READWRITE);
        let mut old = 0u32;
        let ok = unsafe {
            VirtualProtectEx(
                self.handle,
                region.base as *mut core::ffi::c_void,
                region.page_count as usize * Self::get_page_size(),
                protect,
                &mut old,
            )
        };
        if ok == 0 {
            return Err(WinProcError::Win32(unsafe {
                windows_sys::Win32::Foundation::GetLastError()
            }));
        }
        Ok(old)
    }

    #[cfg(not(windows))]
    pub fn set_access(&self, _region: Region, _access: Access) -> Result<u32> {
        Err(WinProcError::Unsupported)
    }
}

#[cfg(windows)]
fn to_ms_flags(access: Access, none: u32, read: u32, readwrite: u32, cow: u32, exec_rw: u32) -> u32 {
    let mut ret = none;
    if access.contains(Access::COW) {
        ret = cow;
    } else if access.contains(Access::WRITE) {
        ret = readwrite;
    } else if access.contains(Access::READ) {
        ret = read;
    }
    if access.contains(Access::EXECUTE) {
        ret = exec_rw;
    }
    ret
}

#[cfg(windows)]
impl Drop for VirtualMemory {
    fn drop(&mut self) {
        use windows_sys::Win32::Foundation::CloseHandle;
        unsafe { CloseHandle(self.handle) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_flag_combinations() {
        assert_eq!(Access::RW, Access::READ | Access::WRITE);
        assert_eq!(Access::RX, Access::READ | Access::EXECUTE);
        assert!(Access::RWX.contains(Access::READ));
        assert!(Access::RWX.contains(Access::WRITE));
        assert!(Access::RWX.contains(Access::EXECUTE));
    }

    #[cfg(not(windows))]
    #[test]
    fn non_windows_reports_unsupported() {
        let vm = VirtualMemory::open(-1).unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(vm.read(0, &mut buf), Err(WinProcError::Unsupported)));
    }
}
