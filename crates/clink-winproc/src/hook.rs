//! Transactional IAT/detour hook façade (C6). Buffers attach/detach
//! operations and applies them all-or-nothing; a dropped, uncommitted
//! transaction rolls back anything already buffered.
//!
//! Grounded on the hook-setter duplication in `original_source` (one
//! implementation buffers a fixed array of pending operations, the other a
//! growable vector); the bounded 5-operation variant was chosen (see
//! `DESIGN.md`) since Clink itself never hooks more than three functions
//! plus the one-shot trap in a single transaction.

use crate::vm::{Access, VirtualMemory};
use crate::{Result, WinProcError};
use tracing::trace;

pub const MAX_OPERATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    /// Rewrite one import-address-table slot.
    Iat,
    /// Patch a short jump at the start of the target function.
    Detour,
}

struct PendingOp {
    kind: HookType,
    target_address: usize,
    replacement: usize,
    original_bytes: Vec<u8>,
}

/// Buffers up to [`MAX_OPERATIONS`] hook installs/removals and applies them
/// together in [`Self::commit`].
#[derive(Default)]
pub struct HookSetter {
    pending: Vec<PendingOp>,
    committed: Vec<PendingOp>,
}

impl HookSetter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers an install at `target_address` (already resolved — e.g. an
    /// IAT slot address or a function entry point). `original_bytes` is
    /// the bytes the patch will overwrite, captured up front so `commit`
    /// and rollback are symmetric.
    pub fn attach(
        &mut self,
        kind: HookType,
        target_address: usize,
        replacement: usize,
        original_bytes: Vec<u8>,
    ) -> Result<()> {
        if self.pending.len() >= MAX_OPERATIONS {
            return Err(WinProcError::TransactionFull(MAX_OPERATIONS));
        }
        self.pending.push(PendingOp { kind, target_address, replacement, original_bytes });
        Ok(())
    }

    /// Buffers a removal: restores `original_bytes` at `target_address`.
    pub fn detach(&mut self, target_address: usize, original_bytes: Vec<u8>) -> Result<()> {
        if self.pending.len() >= MAX_OPERATIONS {
            return Err(WinProcError::TransactionFull(MAX_OPERATIONS));
        }
        self.pending.push(PendingOp {
            kind: HookType::Detour,
            target_address,
            replacement: 0,
            original_bytes,
        });
        Ok(())
    }

    /// Applies every buffered operation against `vm`, restoring page
    /// protections afterwards. On any failure, already-applied operations
    /// in this call are rolled back and the error is returned.
    pub fn commit(&mut self, vm: &VirtualMemory) -> Result<()> {
        let mut applied = Vec::new();
        for op in self.pending.drain(..) {
            match write_patch(vm, &op) {
                Ok(()) => applied.push(op),
                Err(e) => {
                    for done in applied.into_iter().rev() {
                        let _ = restore_patch(vm, &done);
                    }
                    return Err(e);
                }
            }
        }
        trace!(target = "winproc.hook", count = applied.len(), "hook_transaction_committed");
        self.committed.extend(applied);
        Ok(())
    }

    /// Resolves a thin jump stub (`JMP [RIP+disp32]` on x64 or `JMP
    /// disp32` on x86) by following it once; returns `address` unchanged
    /// if it isn't recognised as a jump stub.
    pub fn resolve_jump_stub(vm: &VirtualMemory, address: usize) -> usize {
        let mut head = [0u8; 8];
        if vm.read(address, &mut head).is_err() {
            return address;
        }
        if head[0] == 0xFF && head[1] == 0x25 {
            // x64: FF 25 disp32 -- JMP [RIP+disp32]
            let disp = i32::from_le_bytes([head[2], head[3], head[4], head[5]]) as isize;
            let ptr_addr = (address as isize + 6 + disp) as usize;
            let mut target = [0u8; 8];
            if vm.read(ptr_addr, &mut target).is_ok() {
                return usize::from_le_bytes(target);
            }
        } else if head[0] == 0xE9 {
            // x86/x64: E9 disp32 -- JMP disp32 (relative, near)
            let disp = i32::from_le_bytes([head[1], head[2], head[3], head[4]]) as isize;
            return (address as isize + 5 + disp) as usize;
        }
        address
    }
}

impl Drop for HookSetter {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            trace!(
                target = "winproc.hook",
                count = self.pending.len(),
                "uncommitted_hook_transaction_discarded"
            );
        }
    }
}

fn write_patch(vm: &VirtualMemory, op: &PendingOp) -> Result<()> {
    let region = crate::vm::Region { base: op.target_address, page_count: 1 };
    let old_access = vm.set_access(region, Access::RWX)?;
    let bytes = match op.kind {
        HookType::Iat => op.replacement.to_le_bytes().to_vec(),
        HookType::Detour => build_detour_stub(op.replacement),
    };
    let result = vm.write(op.target_address, &bytes);
    let _ = vm.set_access(region, Access::from_bits_truncate(old_access));
    result
}

fn restore_patch(vm: &VirtualMemory, op: &PendingOp) -> Result<()> {
    let region = crate::vm::Region { base: op.target_address, page_count: 1 };
    let old_access = vm.set_access(region, Access::RWX)?;
    let result = vm.write(op.target_address, &op.original_bytes);
    let _ = vm.set_access(region, Access::from_bits_truncate(old_access));
    result
}

#[cfg(target_pointer_width = "64")]
fn build_detour_stub(replacement: usize) -> Vec<u8> {
    // mov rax, replacement ; jmp rax
    let mut stub = vec![0x48, 0xB8];
    stub.extend_from_slice(&(replacement as u64).to_le_bytes());
    stub.extend_from_slice(&[0xFF, 0xE0]);
    stub
}

#[cfg(not(target_pointer_width = "64"))]
fn build_detour_stub(replacement: usize) -> Vec<u8> {
    // mov eax, replacement ; jmp eax
    let mut stub = vec![0xB8];
    stub.extend_from_slice(&(replacement as u32).to_le_bytes());
    stub.extend_from_slice(&[0xFF, 0xE0]);
    stub
}
