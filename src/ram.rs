use serde::{Deserialize, Serialize};

pub const PROTECTED_RAM_SIZE: usize = 0x3000;

/// Battery-backed working RAM behind the write-protection trap.
///
/// The protection flags are owned by the I/O controller and arrive here as
/// read-only inputs on every write. The trap fires when *all* masked offset
/// bits are set, so it guards a power-of-two-aligned tail of the region --
/// discrete-logic address decoding, not a general ACL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtectedRam {
    data: Vec<u8>,
    violations: u32,
}

impl ProtectedRam {
    pub fn new() -> Self {
        Self {
            data: vec![0; PROTECTED_RAM_SIZE],
            violations: 0,
        }
    }

    pub fn read(&self, offset: u16) -> u8 {
        self.data[offset as usize]
    }

    /// Commit `value` unless the offset falls in the protected tail while
    /// protection is switched on. A trapped write is dropped on the floor;
    /// the game notices nothing.
    pub fn write(&mut self, offset: u16, value: u8, protect_active: bool, protect_mask: u16) {
        if !protect_active || (offset & protect_mask) != protect_mask {
            self.data[offset as usize] = value;
        } else {
            self.violations = self.violations.wrapping_add(1);
            tracing::warn!(
                "[RAM] memory protection violation at {:#06x} (mask={:#06x})",
                offset,
                protect_mask
            );
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Discarded writes since power-up, for diagnostics only.
    pub fn violations(&self) -> u32 {
        self.violations
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Default for ProtectedRam {
    fn default() -> Self {
        Self::new()
    }
}
