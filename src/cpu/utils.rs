use thiserror::Error;

bitfield::bitfield! {
    /// One 32-bit instruction word. Decoded fresh on every fetch, no state
    /// survives past the current step.
    #[derive(Copy, Clone)]
    pub struct Instruction(u32);
    /// Primary opcode, bits 31-26
    pub u8, pri, _ : 31, 26;
    /// Function code for SPECIAL instructions, bits 5-0
    pub u8, sec, _ : 5, 0;
    rs_raw, _ : 25, 21;
    rt_raw, _ : 20, 16;
    rd_raw, _ : 15, 11;
    /// Shift amount
    pub imm5, _ : 10, 6;
    /// Zero-extended 16-bit immediate
    pub imm16, _ : 15, 0;
    i16, imm16_se_raw, _ : 15, 0;
    /// 26-bit jump target field
    pub imm26, _ : 25, 0;
    /// REGIMM branch condition bit (0 = less-than, 1 = greater-equal)
    pub bcond, _ : 16;
    /// REGIMM link bit (BLTZAL/BGEZAL)
    pub blink, _ : 20;
}

impl Instruction {
    pub fn rs(&self) -> usize {
        self.rs_raw() as usize
    }

    pub fn rt(&self) -> usize {
        self.rt_raw() as usize
    }

    pub fn rd(&self) -> usize {
        self.rd_raw() as usize
    }

    /// Sign-extended 16-bit immediate
    pub fn imm16_se(&self) -> u32 {
        self.imm16_se_raw() as u32
    }
}

/// Architectural exceptions. These are recoverable by the guest: they
/// redirect execution to the guest's own exception vector and never abort
/// the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    LoadAddressError(u32),
    StoreAddressError(u32),
    Syscall,
    Break,
    CoprocessorError,
    Overflow,
}

impl Exception {
    pub fn code(&self) -> u32 {
        match self {
            Exception::LoadAddressError(_) => 0x4,
            Exception::StoreAddressError(_) => 0x5,
            Exception::Syscall => 0x8,
            Exception::Break => 0x9,
            Exception::CoprocessorError => 0xB,
            Exception::Overflow => 0xC,
        }
    }
}

/// Unrecoverable faults, surfaced to the host so it can halt the emulated
/// session instead of the whole process.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    #[error("illegal instruction {word:#010x} at {addr:#010x}")]
    IllegalInstruction { word: u32, addr: u32 },
    #[error("unimplemented GTE command {word:#010x} at {addr:#010x}")]
    UnimplementedGte { word: u32, addr: u32 },
}

/// Outcome of dispatching one instruction.
pub enum Fault {
    /// Handled through the guest exception vector.
    Guest(Exception),
    /// Surfaced out of the step loop.
    Fatal(FatalError),
}

impl From<Exception> for Fault {
    fn from(e: Exception) -> Self {
        Fault::Guest(e)
    }
}
