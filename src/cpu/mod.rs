pub mod cop0;
pub mod disasm;
mod instrs;
pub mod regs;
pub mod utils;

use tracing::{trace, warn};

use crate::memory::Bus;
use regs::Regs;
use utils::{Exception, FatalError, Fault, Instruction};

/// The R3000A execution core. Owns the register file and the instruction
/// currently in the execute stage; the bus is borrowed per step.
pub struct Cpu {
    pub regs: Regs,

    /// Instruction fetched at the end of the previous step
    instr: Instruction,

    /// A load was armed by the current instruction
    load_delay: bool,

    /// The instruction now executing sits in a load delay slot
    in_load_delay_slot: bool,

    /// The pending load retires at the start of the next step
    commit_load: bool,

    /// A branch was taken by the current instruction
    branch_delay: bool,

    /// The instruction now executing sits in the branch delay slot
    in_branch_delay_slot: bool,

    /// PC was redirected this step, suppress the normal advance
    branching: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            regs: Regs::default(),
            instr: Instruction(0),
            load_delay: false,
            in_load_delay_slot: false,
            commit_load: false,
            branch_delay: false,
            in_branch_delay_slot: false,
            branching: false,
        }
    }
}

impl Cpu {
    /// Zero the register file and restart from the BIOS entry vector. The
    /// next fetch delivers the first instruction.
    pub fn reset(&mut self) {
        self.regs = Regs::default();
        self.instr = Instruction(0);
        self.load_delay = false;
        self.in_load_delay_slot = false;
        self.commit_load = false;
        self.branch_delay = false;
        self.in_branch_delay_slot = false;
        self.branching = false;
    }

    /// Prime the execute stage from the current pc. Called after reset and
    /// at the end of every step.
    pub fn fetch(&mut self, bus: &Bus) {
        // A misaligned pc is caught at the start of the next step, before
        // this word would execute.
        let word = bus.read::<u32>(self.regs.pc).unwrap_or(0);
        self.instr = Instruction(word);
    }

    /// The decoded instruction currently in the execute stage.
    pub fn instr(&self) -> Instruction {
        self.instr
    }

    /// Execute exactly one instruction. Architectural exceptions are
    /// resolved internally through the guest vector; only host-fatal
    /// conditions surface as errors.
    pub fn step(&mut self, bus: &mut Bus) -> Result<(), FatalError> {
        self.branching = false;
        self.regs.written = None;
        self.regs.backup_pc = self.regs.pc;

        // A load whose delay slot has passed becomes visible now
        if self.commit_load {
            self.regs.commit_load();
            self.commit_load = false;
        }

        if self.regs.pc % 4 != 0 {
            warn!("misaligned pc {:#010x}", self.regs.pc);
            self.handle_exception(Exception::LoadAddressError(self.regs.pc));
            self.fetch(bus);
            return Ok(());
        }

        let instr = self.instr;
        if tracing::enabled!(tracing::Level::TRACE) {
            trace!("{:08x}: {}", self.regs.pc, disasm::disassemble(instr.0));
        }

        match self.execute(instr, bus) {
            Ok(()) => (),
            Err(Fault::Guest(exception)) => self.handle_exception(exception),
            Err(Fault::Fatal(fatal)) => return Err(fatal),
        }

        self.regs.count += 1;
        self.regs.cycles += 1;

        // Canonical ordering: loads resolve before branches
        self.handle_load_delay();
        self.handle_branch_delay();

        if !self.branching {
            self.regs.advance_pc();
        }

        self.fetch(bus);
        Ok(())
    }

    /// Two-level dispatch: the 6-bit primary opcode, with SPECIAL routed
    /// through the 6-bit function code.
    fn execute(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Fault> {
        let res = match instr.pri() {
            0x00 => match instr.sec() {
                0x00 => self.sll(instr),
                0x02 => self.srl(instr),
                0x03 => self.sra(instr),
                0x04 => self.sllv(instr),
                0x06 => self.srlv(instr),
                0x07 => self.srav(instr),
                0x08 => self.jr(instr),
                0x09 => self.jalr(instr),
                0x0C => self.syscall(),
                0x0D => self.breakk(),
                0x10 => self.mfhi(instr),
                0x11 => self.mthi(instr),
                0x12 => self.mflo(instr),
                0x13 => self.mtlo(instr),
                0x18 => self.mult(instr),
                0x19 => self.multu(instr),
                0x1A => self.div(instr),
                0x1B => self.divu(instr),
                0x20 => self.add(instr),
                0x21 => self.addu(instr),
                0x22 => self.sub(instr),
                0x23 => self.subu(instr),
                0x24 => self.and(instr),
                0x25 => self.or(instr),
                0x26 => self.xor(instr),
                0x27 => self.nor(instr),
                0x2A => self.slt(instr),
                0x2B => self.sltu(instr),
                _ => return Err(self.illegal(instr)),
            },
            0x01 => self.bxxx(instr),
            0x02 => self.j(instr),
            0x03 => self.jal(instr),
            0x04 => self.beq(instr),
            0x05 => self.bne(instr),
            0x06 => self.blez(instr),
            0x07 => self.bgtz(instr),
            0x08 => self.addi(instr),
            0x09 => self.addiu(instr),
            0x0A => self.slti(instr),
            0x0B => self.sltiu(instr),
            0x0C => self.andi(instr),
            0x0D => self.ori(instr),
            0x0E => self.xori(instr),
            0x0F => self.lui(instr),
            0x10 => self.cop0_op(instr),
            0x11 | 0x13 => Err(Exception::CoprocessorError),
            0x12 => return Err(self.gte(instr)),
            0x20 => self.lb(instr, bus),
            0x21 => self.lh(instr, bus),
            0x22 => self.lwl(instr, bus),
            0x23 => self.lw(instr, bus),
            0x24 => self.lbu(instr, bus),
            0x25 => self.lhu(instr, bus),
            0x26 => self.lwr(instr, bus),
            0x28 => self.sb(instr, bus),
            0x29 => self.sh(instr, bus),
            0x2A => self.swl(instr, bus),
            0x2B => self.sw(instr, bus),
            0x2E => self.swr(instr, bus),
            0x30 | 0x31 | 0x33 | 0x38 | 0x39 | 0x3B => Err(Exception::CoprocessorError),
            0x32 | 0x3A => return Err(self.gte(instr)),
            _ => return Err(self.illegal(instr)),
        };

        res.map_err(Fault::Guest)
    }

    fn illegal(&self, instr: Instruction) -> Fault {
        Fault::Fatal(FatalError::IllegalInstruction {
            word: instr.0,
            addr: self.regs.backup_pc,
        })
    }

    /// The GTE is deliberately unimplemented. Failing loudly is the point:
    /// silently computing wrong geometry would be far harder to debug.
    fn gte(&self, instr: Instruction) -> Fault {
        Fault::Fatal(FatalError::UnimplementedGte {
            word: instr.0,
            addr: self.regs.backup_pc,
        })
    }

    /// COP0 umbrella, dispatched on the rs sub-field. Unknown sub-opcodes
    /// are soft anomalies: the BIOS pokes at them during self-test.
    fn cop0_op(&mut self, instr: Instruction) -> Result<(), Exception> {
        match instr.rs() {
            // MFC0: reads go through the load delay slot
            0x00 => {
                let data = self.regs.cop0.read(instr.rd());
                self.take_delayed_load(instr.rt(), data);
                Ok(())
            }
            // MTC0: takes effect immediately
            0x04 => {
                let data = self.regs.get(instr.rt());
                self.regs.cop0.write(instr.rd(), data);
                Ok(())
            }
            // RFE
            0x10 => {
                if instr.sec() == 0x10 {
                    self.regs.cop0.pop_mode();
                } else {
                    warn!("unknown cop0 function {:#04x}", instr.sec());
                }
                Ok(())
            }
            _ => {
                warn!("unknown cop0 sub-opcode {:#04x}", instr.rs());
                Ok(())
            }
        }
    }

    /// Arm the load delay machinery. A load issued while another sits in
    /// its delay slot retires the earlier one on the spot, so back-to-back
    /// load chains never lose values; targeting the same register instead
    /// cancels the stale load.
    fn take_delayed_load(&mut self, rt: usize, value: u32) {
        if self.in_load_delay_slot {
            if self.regs.ld_target == rt {
                self.regs.ld_target = 0;
            } else {
                self.regs.commit_load();
            }
            self.in_load_delay_slot = false;
        }
        self.regs.ld_target = rt;
        self.regs.ld_value = value;
        self.load_delay = true;
    }

    /// Record a taken branch; pc is redirected only after the delay slot.
    fn take_branch(&mut self, target: u32) {
        if self.in_branch_delay_slot {
            // Architecturally undefined; keep the first branch
            warn!("branch inside a branch delay slot at {:#010x}", self.regs.pc);
            return;
        }
        self.regs.jump_pc = target;
        self.branch_delay = true;
    }

    fn handle_load_delay(&mut self) {
        if self.in_load_delay_slot {
            // The delay slot instruction has executed. If it overwrote the
            // target, its value wins and the load is dropped.
            if self.regs.written == Some(self.regs.ld_target) {
                self.regs.ld_target = 0;
            } else {
                self.commit_load = true;
            }
            self.in_load_delay_slot = false;
        }
        if self.load_delay {
            self.in_load_delay_slot = true;
            self.load_delay = false;
        }
    }

    fn handle_branch_delay(&mut self) {
        if self.in_branch_delay_slot {
            self.regs.pc = self.regs.jump_pc;
            self.regs.next_pc = self.regs.jump_pc.wrapping_add(4);
            self.regs.jump_pc = 0;
            if let Some((reg, addr)) = self.regs.link.take() {
                self.regs.set(reg, addr);
            }
            self.in_branch_delay_slot = false;
            self.branching = true;
        }
        if self.branch_delay {
            self.in_branch_delay_slot = true;
            self.branch_delay = false;
        }
    }

    /// Redirect the guest to its exception vector with sr/cause/epc
    /// bookkeeping. The host never aborts for these.
    fn handle_exception(&mut self, cause: Exception) {
        trace!("exception {cause:?} at {:#010x}", self.regs.backup_pc);

        let backup_pc = self.regs.backup_pc;
        let cop0 = &mut self.regs.cop0;

        cop0.push_mode();

        let mut cause_bits = cause.code() << 2;

        // A fault inside a branch delay slot must resume at the branch,
        // not the slot.
        if self.in_branch_delay_slot {
            cop0.set_epc(backup_pc.wrapping_sub(4));
            cause_bits |= 1 << 31;
        } else {
            cop0.set_epc(backup_pc);
        }
        cop0.set_cause(cause_bits);

        match cause {
            Exception::LoadAddressError(addr) | Exception::StoreAddressError(addr) => {
                cop0.set_badvaddr(addr)
            }
            _ => (),
        }

        let vector = match cop0.bev() {
            true => 0xBFC00180,
            false => 0x80000080,
        };
        self.regs.pc = vector;
        self.regs.next_pc = vector.wrapping_add(4);

        // The pending branch, if any, re-runs from epc
        self.branch_delay = false;
        self.in_branch_delay_slot = false;
        self.regs.jump_pc = 0;
        self.regs.link = None;

        self.branching = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: usize = 8;
    const T1: usize = 9;
    const T2: usize = 10;
    const T3: usize = 11;

    fn itype(op: u32, rs: usize, rt: usize, imm: u16) -> u32 {
        op << 26 | (rs as u32) << 21 | (rt as u32) << 16 | imm as u32
    }

    fn rtype(funct: u32, rs: usize, rt: usize, rd: usize) -> u32 {
        (rs as u32) << 21 | (rt as u32) << 16 | (rd as u32) << 11 | funct
    }

    /// Boot a CPU over a synthetic BIOS image built from the given words.
    fn setup(words: &[u32]) -> (Cpu, Bus) {
        let image: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let mut bus = Bus::default();
        bus.load_bios(&image).unwrap();
        let mut cpu = Cpu::default();
        cpu.fetch(&bus);
        (cpu, bus)
    }

    fn run(cpu: &mut Cpu, bus: &mut Bus, steps: usize) {
        for _ in 0..steps {
            cpu.step(bus).unwrap();
        }
    }

    #[test]
    fn register_zero_ignores_writes() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, 0, 42),            // addiu $zero, $zero, 42
            itype(0x23, 0, 0, 0x100),         // lw $zero, 0x100($zero)
            rtype(0x25, 0, 0, 0),             // or $zero, $zero, $zero
        ]);
        for _ in 0..5 {
            cpu.step(&mut bus).unwrap();
            assert_eq!(cpu.regs.get(0), 0);
        }
    }

    #[test]
    fn load_value_arrives_after_the_second_step() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, T1, 0x1234),       // addiu $t1, $zero, 0x1234
            itype(0x2B, 0, T1, 0x100),        // sw $t1, 0x100($zero)
            itype(0x23, 0, T0, 0x100),        // lw $t0, 0x100($zero)
            itype(0x09, 0, T2, 1),            // addiu $t2, $zero, 1
            itype(0x09, 0, T3, 2),            // addiu $t3, $zero, 2
        ]);

        run(&mut cpu, &mut bus, 3);
        assert_eq!(cpu.regs.get(T0), 0, "load visible too early");

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.get(T0), 0, "delay slot saw the loaded value");

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.get(T0), 0x1234);
        assert_eq!(cpu.regs.get(T3), 2);
    }

    #[test]
    fn load_is_cancelled_by_a_write_in_the_delay_slot() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, T1, 0x1234),       // addiu $t1, $zero, 0x1234
            itype(0x2B, 0, T1, 0x100),        // sw $t1, 0x100($zero)
            itype(0x23, 0, T0, 0x100),        // lw $t0, 0x100($zero)
            itype(0x09, 0, T0, 7),            // addiu $t0, $zero, 7
        ]);

        run(&mut cpu, &mut bus, 4);
        assert_eq!(cpu.regs.get(T0), 7);
        // The stale load never resurfaces
        run(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.regs.get(T0), 7);
    }

    #[test]
    fn back_to_back_loads_both_retire() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, T1, 0x11),         // addiu $t1, $zero, 0x11
            itype(0x2B, 0, T1, 0x100),        // sw $t1, 0x100($zero)
            itype(0x09, 0, T1, 0x22),         // addiu $t1, $zero, 0x22
            itype(0x2B, 0, T1, 0x104),        // sw $t1, 0x104($zero)
            itype(0x23, 0, T2, 0x100),        // lw $t2, 0x100($zero)
            itype(0x23, 0, T3, 0x104),        // lw $t3, 0x104($zero)
            0,
            0,
        ]);

        run(&mut cpu, &mut bus, 8);
        assert_eq!(cpu.regs.get(T2), 0x11);
        assert_eq!(cpu.regs.get(T3), 0x22);
    }

    #[test]
    fn branch_redirects_only_after_the_delay_slot() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x04, 0, 0, 3),             // beq $zero, $zero, +3
            itype(0x09, 0, T1, 9),            // addiu $t1, $zero, 9   (delay slot)
            itype(0x09, 0, T2, 7),            // addiu $t2, $zero, 7   (skipped)
            0,
            itype(0x09, 0, T3, 5),            // addiu $t3, $zero, 5   (target)
        ]);

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc, 0xBFC0_0004, "branch redirected immediately");

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.get(T1), 9, "delay slot did not execute");
        assert_eq!(cpu.regs.pc, 0xBFC0_0010);

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.get(T3), 5);
        assert_eq!(cpu.regs.get(T2), 0, "skipped instruction executed");
    }

    #[test]
    fn jal_links_the_return_address() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x03, 0, 0, 0) | ((0xBFC0_0010 >> 2) & 0x03FF_FFFF), // jal 0xBFC00010
            0,                                // nop (delay slot)
            0,
            0,
            itype(0x09, 0, T0, 1),            // addiu $t0, $zero, 1   (target)
        ]);

        run(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.regs.pc, 0xBFC0_0010);
        assert_eq!(cpu.regs.get(31), 0xBFC0_0008);
    }

    #[test]
    fn regimm_links_even_when_not_taken() {
        let (mut cpu, mut bus) = setup(&[
            // bltzal $zero, +4: $zero is not negative, so no branch
            itype(0x01, 0, 0x10, 4),
            0,
        ]);

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.get(31), 0xBFC0_0008);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc, 0xBFC0_0008, "untaken branch redirected");
    }

    #[test]
    fn signed_division_edge_cases() {
        let mut cpu = Cpu::default();
        let div = Instruction(rtype(0x1A, 1, 2, 0));

        cpu.regs.set(1, 5);
        cpu.regs.set(2, 0);
        cpu.div(div).unwrap();
        assert_eq!(cpu.regs.lo, 0xFFFF_FFFF);
        assert_eq!(cpu.regs.hi, 5);

        cpu.regs.set(1, -5i32 as u32);
        cpu.div(div).unwrap();
        assert_eq!(cpu.regs.lo, 1);
        assert_eq!(cpu.regs.hi, 0xFFFF_FFFB);

        cpu.regs.set(1, i32::MIN as u32);
        cpu.regs.set(2, -1i32 as u32);
        cpu.div(div).unwrap();
        assert_eq!(cpu.regs.lo, i32::MIN as u32);
        assert_eq!(cpu.regs.hi, 0);
    }

    #[test]
    fn unsigned_division_by_zero() {
        let mut cpu = Cpu::default();
        cpu.regs.set(1, 7);
        cpu.regs.set(2, 0);
        cpu.divu(Instruction(rtype(0x1B, 1, 2, 0))).unwrap();
        assert_eq!(cpu.regs.lo, 0xFFFF_FFFF);
        assert_eq!(cpu.regs.hi, 7);
    }

    #[test]
    fn add_overflow_traps_without_committing() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x0F, 0, T0, 0x7FFF),       // lui $t0, 0x7fff
            itype(0x0D, T0, T0, 0xFFFF),      // ori $t0, $t0, 0xffff
            itype(0x09, 0, T1, 1),            // addiu $t1, $zero, 1
            rtype(0x20, T0, T1, T2),          // add $t2, $t0, $t1
        ]);

        run(&mut cpu, &mut bus, 4);
        assert_eq!(cpu.regs.get(T2), 0, "overflowed result was committed");
        assert_eq!(cpu.regs.pc, 0x8000_0080);
        assert_eq!(cpu.regs.cop0.cause() & 0x7C, 0xC << 2);
        assert_eq!(cpu.regs.cop0.epc(), 0xBFC0_000C);
    }

    #[test]
    fn misaligned_load_raises_an_address_error() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, 16, 1),            // addiu $s0, $zero, 1
            itype(0x23, 16, T0, 0),           // lw $t0, 0($s0)
            0,
            0,
        ]);

        run(&mut cpu, &mut bus, 4);
        assert_eq!(cpu.regs.get(T0), 0, "misaligned load delivered data");
        assert_eq!(cpu.regs.cop0.cause() & 0x7C, 0x4 << 2);
        assert_eq!(cpu.regs.cop0.badvaddr(), 1);
        assert_eq!(cpu.regs.cop0.epc(), 0xBFC0_0004);
    }

    #[test]
    fn syscall_pushes_the_privilege_stack() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, T1, 0x1),          // addiu $t1, $zero, 1
            itype(0x10, 0x04, T1, 0) | 12 << 11, // mtc0 $t1, $sr
            rtype(0x0C, 0, 0, 0),             // syscall
        ]);

        run(&mut cpu, &mut bus, 3);
        assert_eq!(cpu.regs.pc, 0x8000_0080);
        assert_eq!(cpu.regs.cop0.cause() & 0x7C, 0x8 << 2);
        assert_eq!(cpu.regs.cop0.epc(), 0xBFC0_0008);
        // Interrupt-enable pushed into the "previous" slot
        assert_eq!(cpu.regs.cop0.sr() & 0x3F, 0x04);
    }

    #[test]
    fn exception_in_a_branch_delay_slot_points_at_the_branch() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x04, 0, 0, 3),             // beq $zero, $zero, +3
            rtype(0x0C, 0, 0, 0),             // syscall (delay slot)
        ]);

        run(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.regs.pc, 0x8000_0080);
        assert_eq!(cpu.regs.cop0.epc(), 0xBFC0_0000);
        assert!(cpu.regs.cop0.cause() >> 31 == 1, "branch delay flag not set");
    }

    #[test]
    fn rfe_pops_the_privilege_stack() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, T1, 0x1),          // addiu $t1, $zero, 1
            itype(0x10, 0x04, T1, 0) | 12 << 11, // mtc0 $t1, $sr
            rtype(0x0C, 0, 0, 0),             // syscall
        ]);
        // Guest handler at the RAM vector: rfe; jr $ra is irrelevant here
        bus.write::<u32>(0x0000_0080, itype(0x10, 0x10, 0, 0) | 0x10)
            .unwrap();

        run(&mut cpu, &mut bus, 4);
        assert_eq!(cpu.regs.cop0.sr() & 0x3F, 0x01);
    }

    #[test]
    fn mfc0_goes_through_the_load_delay_slot() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, T1, 0x41),         // addiu $t1, $zero, 0x41
            itype(0x10, 0x04, T1, 0) | 12 << 11, // mtc0 $t1, $sr
            itype(0x10, 0x00, T0, 0) | 12 << 11, // mfc0 $t0, $sr
            itype(0x09, 0, T2, 1),            // addiu $t2, $zero, 1
            0,
        ]);

        run(&mut cpu, &mut bus, 3);
        assert_eq!(cpu.regs.get(T0), 0, "mfc0 value visible immediately");
        run(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.regs.get(T0), 0x41);
    }

    #[test]
    fn stores_are_suppressed_while_the_cache_is_isolated() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x0F, 0, T1, 0x1),          // lui $t1, 0x1 (sr bit 16)
            itype(0x10, 0x04, T1, 0) | 12 << 11, // mtc0 $t1, $sr
            itype(0x09, 0, T2, 0x55),         // addiu $t2, $zero, 0x55
            itype(0x2B, 0, T2, 0x100),        // sw $t2, 0x100($zero)
        ]);

        run(&mut cpu, &mut bus, 4);
        assert_eq!(bus.read::<u32>(0x100).unwrap(), 0, "isolated store landed");
    }

    #[test]
    fn unknown_opcodes_are_fatal_not_silent() {
        let (mut cpu, mut bus) = setup(&[0xFC00_0000]);
        let err = cpu.step(&mut bus).unwrap_err();
        assert_eq!(
            err,
            FatalError::IllegalInstruction {
                word: 0xFC00_0000,
                addr: 0xBFC0_0000,
            }
        );
    }

    #[test]
    fn gte_opcodes_are_loud_stubs() {
        let (mut cpu, mut bus) = setup(&[0x4A00_0001]);
        let err = cpu.step(&mut bus).unwrap_err();
        assert!(matches!(err, FatalError::UnimplementedGte { .. }));
    }

    #[test]
    fn lwl_lwr_assemble_an_unaligned_word() {
        let (mut cpu, mut bus) = setup(&[
            itype(0x09, 0, 16, 0x101),        // addiu $s0, $zero, 0x101
            itype(0x22, 16, T0, 3),           // lwl $t0, 3($s0)
            itype(0x26, 16, T0, 0),           // lwr $t0, 0($s0)
            0,
            0,
            0,
        ]);
        bus.write::<u32>(0x100, 0x4433_2211).unwrap();
        bus.write::<u32>(0x104, 0x8877_6655).unwrap();

        run(&mut cpu, &mut bus, 6);
        // Word starting at 0x101: bytes 22 33 44 55
        assert_eq!(cpu.regs.get(T0), 0x5544_3322);
    }

    #[test]
    fn misaligned_pc_raises_before_executing() {
        let (mut cpu, mut bus) = setup(&[
            rtype(0x08, T1, 0, 0),            // jr $t1
            0,                                // nop (delay slot)
        ]);
        cpu.regs.set(T1, 0xBFC0_0002);

        run(&mut cpu, &mut bus, 3);
        assert_eq!(cpu.regs.pc, 0x8000_0080);
        assert_eq!(cpu.regs.cop0.cause() & 0x7C, 0x4 << 2);
        assert_eq!(cpu.regs.cop0.epc(), 0xBFC0_0002);
    }
}
