//! Windows process interop (C5, C6, C7): virtual memory access, PE import
//! table parsing, transactional IAT/detour hooking, and remote DLL
//! injection with thread suspension.
//!
//! Everything here is gated on `cfg(windows)`; on other targets the public
//! surface still type-checks (so the workspace can be read and tested on
//! any host) but every entry point returns [`WinProcError::Unsupported`].

pub mod hook;
pub mod pe;
pub mod process;
pub mod vm;

pub use hook::{HookSetter, HookType};
pub use pe::{ImportEntry, PeImage};
pub use process::{Arch, Process, RemoteResult};
pub use vm::{Access, Region, VirtualMemory};

#[derive(Debug, thiserror::Error)]
pub enum WinProcError {
    #[error("operation unsupported on this target")]
    Unsupported,
    #[error("win32 call failed: {0}")]
    Win32(u32),
    #[error("module {0} not found in process")]
    ModuleNotFound(String),
    #[error("import {name} not found in module {library}")]
    ImportNotFound { library: String, name: String },
    #[error("hook transaction exceeds the {0}-operation cap")]
    TransactionFull(usize),
    #[error("PE image malformed: {0}")]
    MalformedImage(&'static str),
}

pub type Result<T> = std::result::Result<T, WinProcError>;
