use super::cop0::Cop0;

/// Reset vector in the BIOS segment.
pub const RESET_PC: u32 = 0xBFC00000;

/// The architectural register file plus the pipeline bookkeeping the step
/// loop needs. Plain data: all behavior lives in the CPU core.
pub struct Regs {
    gpr: [u32; 32],

    /// Upper 32 bits of product or division remainder
    pub hi: u32,

    /// Lower 32 bits of product or division quotient
    pub lo: u32,

    pub cop0: Cop0,

    /// Program counter
    pub pc: u32,

    /// PC + 4, kept in lockstep with pc
    pub next_pc: u32,

    /// PC at the start of the current instruction, used for epc
    pub backup_pc: u32,

    /// Target of a branch waiting on its delay slot
    pub jump_pc: u32,

    /// Return address waiting to be written when a linking branch resolves
    pub link: Option<(usize, u32)>,

    /// Register targeted by an in-flight load
    pub ld_target: usize,

    /// Value an in-flight load will deliver
    pub ld_value: u32,

    /// GPR written by the current instruction, cleared every step.
    /// Load cancellation is checked against this, not the decoded rt field.
    pub written: Option<usize>,

    /// Instructions retired
    pub count: u64,

    /// Cycles elapsed (one per instruction until real timing exists)
    pub cycles: u64,
}

impl Default for Regs {
    fn default() -> Self {
        Self {
            gpr: [0; 32],
            hi: 0,
            lo: 0,
            cop0: Cop0::default(),
            pc: RESET_PC,
            next_pc: RESET_PC.wrapping_add(4),
            backup_pc: RESET_PC,
            jump_pc: 0,
            link: None,
            ld_target: 0,
            ld_value: 0,
            written: None,
            count: 0,
            cycles: 0,
        }
    }
}

impl Regs {
    pub fn get(&self, reg: usize) -> u32 {
        self.gpr[reg]
    }

    /// Writes to r0 are discarded, not merely zeroed afterwards.
    pub fn set(&mut self, reg: usize, value: u32) {
        if reg == 0 {
            return;
        }
        self.gpr[reg] = value;
        self.written = Some(reg);
    }

    /// Deliver a retired load. Bypasses write tracking so it cannot cancel
    /// itself.
    pub fn commit_load(&mut self) {
        if self.ld_target != 0 {
            self.gpr[self.ld_target] = self.ld_value;
        }
        self.ld_target = 0;
    }

    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(4);
        self.next_pc = self.next_pc.wrapping_add(4);
    }

    /// Read-only view of all 32 general purpose registers.
    pub fn gpr(&self) -> &[u32; 32] {
        &self.gpr
    }
}
