use tracing::warn;

pub const BADVADDR: usize = 8;
pub const SR: usize = 12;
pub const CAUSE: usize = 13;
pub const EPC: usize = 14;

/// The system control coprocessor. All 32 registers are backed by one
/// indexed array; only sr, cause, epc and badvaddr carry semantics, the
/// rest are inert storage.
#[derive(Default)]
pub struct Cop0 {
    r: [u32; 32],
}

impl Cop0 {
    /// Cop0 reg12: status register
    pub fn sr(&self) -> u32 {
        self.r[SR]
    }

    pub fn set_sr(&mut self, value: u32) {
        self.r[SR] = value;
    }

    /// Cop0 reg13: exception cause
    pub fn cause(&self) -> u32 {
        self.r[CAUSE]
    }

    pub fn set_cause(&mut self, value: u32) {
        self.r[CAUSE] = value;
    }

    /// Cop0 reg14: exception program counter
    pub fn epc(&self) -> u32 {
        self.r[EPC]
    }

    pub fn set_epc(&mut self, value: u32) {
        self.r[EPC] = value;
    }

    /// Cop0 reg8: bad virtual address
    pub fn badvaddr(&self) -> u32 {
        self.r[BADVADDR]
    }

    pub fn set_badvaddr(&mut self, value: u32) {
        self.r[BADVADDR] = value;
    }

    /// Boot exception vector select, sr bit 22.
    pub fn bev(&self) -> bool {
        self.r[SR] >> 22 & 1 == 1
    }

    /// Cache isolation, sr bit 16. Stores are suppressed while set.
    pub fn cache_isolated(&self) -> bool {
        self.r[SR] & 0x10000 != 0
    }

    /// MFC0 source value. Unrecognised registers read back their inert
    /// storage; that is a soft anomaly, not a fault.
    pub fn read(&self, reg: usize) -> u32 {
        match reg {
            BADVADDR | SR | CAUSE | EPC => self.r[reg],
            _ => {
                warn!("read from inert cop0 r{reg}");
                self.r[reg]
            }
        }
    }

    /// MTC0 destination. Takes effect immediately, no delay slot.
    pub fn write(&mut self, reg: usize, value: u32) {
        match reg {
            SR => self.r[SR] = value,
            // Only the software interrupt bits are writable
            CAUSE => self.r[CAUSE] = (self.r[CAUSE] & !0x300) | (value & 0x300),
            BADVADDR | EPC => warn!("write to read-only cop0 r{reg} <- {value:#x}"),
            _ => {
                warn!("write to inert cop0 r{reg} <- {value:#x}");
                self.r[reg] = value;
            }
        }
    }

    /// Push the interrupt-enable/mode bits one slot down the privilege
    /// stack. The stack is exactly 6 bits wide.
    pub fn push_mode(&mut self) {
        let mode = self.r[SR] & 0x3F;
        self.r[SR] = (self.r[SR] & !0x3F) | (mode << 2 & 0x3F);
    }

    /// RFE: pop the privilege stack. The top slot keeps its value.
    pub fn pop_mode(&mut self) {
        let mode = self.r[SR] & 0x3F;
        self.r[SR] = (self.r[SR] & !0xF) | (mode >> 2);
    }
}
