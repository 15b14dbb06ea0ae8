//! Console mode save/restore, following `core-terminal`'s RAII guard shape.

use crate::{Result, TerminalError};
use tracing::debug;

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
}

/// Saves the console's input mode on construction and restores it on drop,
/// clearing `ENABLE_PROCESSED_INPUT` in between so Ctrl-C reaches the editor
/// as a raw byte (spec §5: "cleared during editing so Ctrl-C reaches us").
pub struct ConsoleModeGuard {
    #[cfg(windows)]
    handle: windows_sys::Win32::Foundation::HANDLE,
    saved_mode: u32,
    active: bool,
}

impl ConsoleModeGuard {
    #[cfg(windows)]
    pub fn enter_stdin() -> Result<Self> {
        use windows_sys::Win32::System::Console::{GetConsoleMode, GetStdHandle, SetConsoleMode, STD_INPUT_HANDLE, ENABLE_PROCESSED_INPUT};
        let handle = unsafe { GetStdHandle(STD_INPUT_HANDLE) };
        let mut saved_mode = 0u32;
        if unsafe { GetConsoleMode(handle, &mut saved_mode) } == 0 {
            return Err(TerminalError::Win32(unsafe { windows_sys::Win32::Foundation::GetLastError() }));
        }
        let editing_mode = saved_mode & !ENABLE_PROCESSED_INPUT;
        if unsafe { SetConsoleMode(handle, editing_mode) } == 0 {
            return Err(TerminalError::Win32(unsafe { windows_sys::Win32::Foundation::GetLastError() }));
        }
        debug!(target = "terminal.mode", saved_mode, "console_mode_entered");
        Ok(Self { handle, saved_mode, active: true })
    }

    #[cfg(not(windows))]
    pub fn enter_stdin() -> Result<Self> {
        Ok(Self { saved_mode: 0, active: true })
    }

    #[cfg(windows)]
    pub fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        use windows_sys::Win32::System::Console::SetConsoleMode;
        if unsafe { SetConsoleMode(self.handle, self.saved_mode) } == 0 {
            return Err(TerminalError::Win32(unsafe { windows_sys::Win32::Foundation::GetLastError() }));
        }
        self.active = false;
        Ok(())
    }

    #[cfg(not(windows))]
    pub fn leave(&mut self) -> Result<()> {
        self.active = false;
        Ok(())
    }
}

impl Drop for ConsoleModeGuard {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn guard_is_idempotent_on_non_windows() {
        let mut guard = ConsoleModeGuard::enter_stdin().unwrap();
        guard.leave().unwrap();
        guard.leave().unwrap();
    }
}
