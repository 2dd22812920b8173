use super::*;
use tracing::trace;

impl Cpu {
    // Load and store instructions

    /// Load byte
    pub(super) fn lb(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let data = bus.read::<u8>(addr)? as i8;

        self.take_delayed_load(instr.rt(), data as u32);
        Ok(())
    }

    /// Load byte unsigned
    pub(super) fn lbu(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let data = bus.read::<u8>(addr)?;

        self.take_delayed_load(instr.rt(), data as u32);
        Ok(())
    }

    /// Load half word
    pub(super) fn lh(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let data = bus.read::<u16>(addr)? as i16;

        self.take_delayed_load(instr.rt(), data as u32);
        Ok(())
    }

    /// Load half word unsigned
    pub(super) fn lhu(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let data = bus.read::<u16>(addr)?;

        self.take_delayed_load(instr.rt(), data as u32);
        Ok(())
    }

    /// Load word
    pub(super) fn lw(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let data = bus.read::<u32>(addr)?;

        self.take_delayed_load(instr.rt(), data);
        Ok(())
    }

    /// Store byte
    pub(super) fn sb(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        if self.regs.cop0.cache_isolated() {
            trace!("ignoring store while cache is isolated");
            return Ok(());
        }
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let data = self.regs.get(instr.rt()) as u8;

        bus.write::<u8>(addr, data)
    }

    /// Store half word
    pub(super) fn sh(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        if self.regs.cop0.cache_isolated() {
            trace!("ignoring store while cache is isolated");
            return Ok(());
        }
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let data = self.regs.get(instr.rt()) as u16;

        bus.write::<u16>(addr, data)
    }

    /// Store word
    pub(super) fn sw(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        if self.regs.cop0.cache_isolated() {
            trace!("ignoring store while cache is isolated");
            return Ok(());
        }
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let data = self.regs.get(instr.rt());

        bus.write::<u32>(addr, data)
    }

    /// The value LWL/LWR merge into: the in-flight load when one already
    /// targets this register, the committed register otherwise.
    fn unaligned_merge_base(&self, rt: usize) -> u32 {
        let pending = self.load_delay || self.in_load_delay_slot || self.commit_load;
        if pending && self.regs.ld_target == rt {
            self.regs.ld_value
        } else {
            self.regs.get(rt)
        }
    }

    /// Unaligned left word load
    pub(super) fn lwl(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        let rt = instr.rt();
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let val = self.unaligned_merge_base(rt);

        let word = bus.read::<u32>(addr & !3)?;

        let data = match addr & 3 {
            0 => (val & 0x00FFFFFF) | (word << 24),
            1 => (val & 0x0000FFFF) | (word << 16),
            2 => (val & 0x000000FF) | (word << 8),
            3 => word,
            _ => unreachable!(),
        };

        self.take_delayed_load(rt, data);
        Ok(())
    }

    /// Unaligned right word load
    pub(super) fn lwr(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        let rt = instr.rt();
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let val = self.unaligned_merge_base(rt);

        let word = bus.read::<u32>(addr & !3)?;

        let data = match addr & 3 {
            0 => word,
            1 => (val & 0xFF000000) | (word >> 8),
            2 => (val & 0xFFFF0000) | (word >> 16),
            3 => (val & 0xFFFFFF00) | (word >> 24),
            _ => unreachable!(),
        };

        self.take_delayed_load(rt, data);
        Ok(())
    }

    /// Unaligned left word store
    pub(super) fn swl(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        if self.regs.cop0.cache_isolated() {
            trace!("ignoring store while cache is isolated");
            return Ok(());
        }
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let val = self.regs.get(instr.rt());

        let aligned = addr & !3;
        let word = bus.read::<u32>(aligned)?;

        let data = match addr & 3 {
            0 => (word & 0xFFFFFF00) | (val >> 24),
            1 => (word & 0xFFFF0000) | (val >> 16),
            2 => (word & 0xFF000000) | (val >> 8),
            3 => val,
            _ => unreachable!(),
        };

        bus.write::<u32>(aligned, data)
    }

    /// Unaligned right word store
    pub(super) fn swr(&mut self, instr: Instruction, bus: &mut Bus) -> Result<(), Exception> {
        if self.regs.cop0.cache_isolated() {
            trace!("ignoring store while cache is isolated");
            return Ok(());
        }
        let addr = self.regs.get(instr.rs()).wrapping_add(instr.imm16_se());
        let val = self.regs.get(instr.rt());

        let aligned = addr & !3;
        let word = bus.read::<u32>(aligned)?;

        let data = match addr & 3 {
            0 => val,
            1 => (word & 0x000000FF) | (val << 8),
            2 => (word & 0x0000FFFF) | (val << 16),
            3 => (word & 0x00FFFFFF) | (val << 24),
            _ => unreachable!(),
        };

        bus.write::<u32>(aligned, data)
    }

    // ALU instructions

    /// rd = rs + rt (overflow trap)
    pub(super) fn add(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs()) as i32;
        let rhs = self.regs.get(instr.rt()) as i32;

        match lhs.checked_add(rhs) {
            Some(v) => self.regs.set(instr.rd(), v as u32),
            None => return Err(Exception::Overflow),
        }
        Ok(())
    }

    /// rd = rs + rt
    pub(super) fn addu(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs());
        let rhs = self.regs.get(instr.rt());

        self.regs.set(instr.rd(), lhs.wrapping_add(rhs));
        Ok(())
    }

    /// rd = rs - rt (overflow trap)
    pub(super) fn sub(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs()) as i32;
        let rhs = self.regs.get(instr.rt()) as i32;

        match lhs.checked_sub(rhs) {
            Some(v) => self.regs.set(instr.rd(), v as u32),
            None => return Err(Exception::Overflow),
        }
        Ok(())
    }

    /// rd = rs - rt
    pub(super) fn subu(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs());
        let rhs = self.regs.get(instr.rt());

        self.regs.set(instr.rd(), lhs.wrapping_sub(rhs));
        Ok(())
    }

    /// rt = rs + imm (overflow trap)
    pub(super) fn addi(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs()) as i32;
        let rhs = instr.imm16_se() as i32;

        match lhs.checked_add(rhs) {
            Some(v) => self.regs.set(instr.rt(), v as u32),
            None => return Err(Exception::Overflow),
        }
        Ok(())
    }

    /// rt = rs + imm
    pub(super) fn addiu(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs());
        let rhs = instr.imm16_se() as i32;

        self.regs.set(instr.rt(), lhs.wrapping_add_signed(rhs));
        Ok(())
    }

    /// rd = rs < rt
    pub(super) fn slt(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs()) as i32;
        let rhs = self.regs.get(instr.rt()) as i32;

        self.regs.set(instr.rd(), (lhs < rhs) as u32);
        Ok(())
    }

    /// rd = rs < rt (unsigned)
    pub(super) fn sltu(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs());
        let rhs = self.regs.get(instr.rt());

        self.regs.set(instr.rd(), (lhs < rhs) as u32);
        Ok(())
    }

    /// rt = rs < imm
    pub(super) fn slti(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs()) as i32;
        let rhs = instr.imm16_se() as i32;

        self.regs.set(instr.rt(), (lhs < rhs) as u32);
        Ok(())
    }

    /// rt = rs < imm (unsigned)
    pub(super) fn sltiu(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs());
        let rhs = instr.imm16_se();

        self.regs.set(instr.rt(), (lhs < rhs) as u32);
        Ok(())
    }

    /// rd = rs AND rt
    pub(super) fn and(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rs()) & self.regs.get(instr.rt());
        self.regs.set(instr.rd(), value);
        Ok(())
    }

    /// rd = rs OR rt
    pub(super) fn or(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rs()) | self.regs.get(instr.rt());
        self.regs.set(instr.rd(), value);
        Ok(())
    }

    /// rd = rs XOR rt
    pub(super) fn xor(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rs()) ^ self.regs.get(instr.rt());
        self.regs.set(instr.rd(), value);
        Ok(())
    }

    /// rd = NOT (rs OR rt)
    pub(super) fn nor(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = !(self.regs.get(instr.rs()) | self.regs.get(instr.rt()));
        self.regs.set(instr.rd(), value);
        Ok(())
    }

    /// rt = rs AND imm
    pub(super) fn andi(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rs()) & instr.imm16();
        self.regs.set(instr.rt(), value);
        Ok(())
    }

    /// rt = rs OR imm
    pub(super) fn ori(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rs()) | instr.imm16();
        self.regs.set(instr.rt(), value);
        Ok(())
    }

    /// rt = rs XOR imm
    pub(super) fn xori(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rs()) ^ instr.imm16();
        self.regs.set(instr.rt(), value);
        Ok(())
    }

    /// rd = rt SHL (rs AND 1Fh)
    pub(super) fn sllv(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rt()).wrapping_shl(self.regs.get(instr.rs()));
        self.regs.set(instr.rd(), value);
        Ok(())
    }

    /// rd = rt SHR (rs AND 1Fh)
    pub(super) fn srlv(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rt()).wrapping_shr(self.regs.get(instr.rs()));
        self.regs.set(instr.rd(), value);
        Ok(())
    }

    /// rd = rt SAR (rs AND 1Fh)
    pub(super) fn srav(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = (self.regs.get(instr.rt()) as i32).wrapping_shr(self.regs.get(instr.rs()));
        self.regs.set(instr.rd(), value as u32);
        Ok(())
    }

    /// rd = rt SHL imm
    pub(super) fn sll(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rt()) << instr.imm5();
        self.regs.set(instr.rd(), value);
        Ok(())
    }

    /// rd = rt SHR imm
    pub(super) fn srl(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = self.regs.get(instr.rt()) >> instr.imm5();
        self.regs.set(instr.rd(), value);
        Ok(())
    }

    /// rd = rt SAR imm
    pub(super) fn sra(&mut self, instr: Instruction) -> Result<(), Exception> {
        let value = (self.regs.get(instr.rt()) as i32) >> instr.imm5();
        self.regs.set(instr.rd(), value as u32);
        Ok(())
    }

    /// rt = imm << 16
    pub(super) fn lui(&mut self, instr: Instruction) -> Result<(), Exception> {
        self.regs.set(instr.rt(), instr.imm16() << 16);
        Ok(())
    }

    // Multiply and divide

    /// hi:lo = rs * rt (signed)
    pub(super) fn mult(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs()) as i32 as i64;
        let rhs = self.regs.get(instr.rt()) as i32 as i64;

        let res = lhs * rhs;

        self.regs.hi = (res >> 32) as u32;
        self.regs.lo = res as u32;
        Ok(())
    }

    /// hi:lo = rs * rt (unsigned)
    pub(super) fn multu(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs()) as u64;
        let rhs = self.regs.get(instr.rt()) as u64;

        let res = lhs * rhs;

        self.regs.hi = (res >> 32) as u32;
        self.regs.lo = res as u32;
        Ok(())
    }

    /// lo = rs / rt, hi = rs % rt (signed). Division by zero and
    /// i32::MIN / -1 produce the documented hi/lo values, they do not trap.
    pub(super) fn div(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs()) as i32;
        let rhs = self.regs.get(instr.rt()) as i32;

        let (quo, rem) = match rhs {
            -1 if lhs == i32::MIN => (i32::MIN, 0),
            0 => (if lhs >= 0 { -1 } else { 1 }, lhs),
            _ => (lhs / rhs, lhs % rhs),
        };

        self.regs.hi = rem as u32;
        self.regs.lo = quo as u32;
        Ok(())
    }

    /// lo = rs / rt, hi = rs % rt (unsigned)
    pub(super) fn divu(&mut self, instr: Instruction) -> Result<(), Exception> {
        let lhs = self.regs.get(instr.rs());
        let rhs = self.regs.get(instr.rt());

        let (quo, rem) = match rhs {
            0 => (u32::MAX, lhs),
            _ => (lhs / rhs, lhs % rhs),
        };

        self.regs.hi = rem;
        self.regs.lo = quo;
        Ok(())
    }

    /// Move from hi
    pub(super) fn mfhi(&mut self, instr: Instruction) -> Result<(), Exception> {
        self.regs.set(instr.rd(), self.regs.hi);
        Ok(())
    }

    /// Move from lo
    pub(super) fn mflo(&mut self, instr: Instruction) -> Result<(), Exception> {
        self.regs.set(instr.rd(), self.regs.lo);
        Ok(())
    }

    /// Move to hi
    pub(super) fn mthi(&mut self, instr: Instruction) -> Result<(), Exception> {
        self.regs.hi = self.regs.get(instr.rs());
        Ok(())
    }

    /// Move to lo
    pub(super) fn mtlo(&mut self, instr: Instruction) -> Result<(), Exception> {
        self.regs.lo = self.regs.get(instr.rs());
        Ok(())
    }

    // Branching instructions

    /// Jump: top nibble of pc glued to the shifted 26-bit target
    pub(super) fn j(&mut self, instr: Instruction) -> Result<(), Exception> {
        let target = (self.regs.pc & 0xF0000000) | (instr.imm26() << 2);
        self.take_branch(target);
        Ok(())
    }

    /// Jump and link
    pub(super) fn jal(&mut self, instr: Instruction) -> Result<(), Exception> {
        let target = (self.regs.pc & 0xF0000000) | (instr.imm26() << 2);
        self.regs.link = Some((31, self.regs.pc.wrapping_add(8)));
        self.take_branch(target);
        Ok(())
    }

    /// Jump to register address
    pub(super) fn jr(&mut self, instr: Instruction) -> Result<(), Exception> {
        let target = self.regs.get(instr.rs());
        self.take_branch(target);
        Ok(())
    }

    /// Jump to register address and link into rd
    pub(super) fn jalr(&mut self, instr: Instruction) -> Result<(), Exception> {
        let target = self.regs.get(instr.rs());
        self.regs.link = Some((instr.rd(), self.regs.pc.wrapping_add(8)));
        self.take_branch(target);
        Ok(())
    }

    fn branch_target(&self, instr: Instruction) -> u32 {
        self.regs
            .pc
            .wrapping_add((instr.imm16_se() << 2).wrapping_add(4))
    }

    /// Branch if equal
    pub(super) fn beq(&mut self, instr: Instruction) -> Result<(), Exception> {
        if self.regs.get(instr.rs()) == self.regs.get(instr.rt()) {
            let target = self.branch_target(instr);
            self.take_branch(target);
        }
        Ok(())
    }

    /// Branch if not equal
    pub(super) fn bne(&mut self, instr: Instruction) -> Result<(), Exception> {
        if self.regs.get(instr.rs()) != self.regs.get(instr.rt()) {
            let target = self.branch_target(instr);
            self.take_branch(target);
        }
        Ok(())
    }

    /// Branch if greater than zero
    pub(super) fn bgtz(&mut self, instr: Instruction) -> Result<(), Exception> {
        if (self.regs.get(instr.rs()) as i32) > 0 {
            let target = self.branch_target(instr);
            self.take_branch(target);
        }
        Ok(())
    }

    /// Branch if less than or equal to zero
    pub(super) fn blez(&mut self, instr: Instruction) -> Result<(), Exception> {
        if (self.regs.get(instr.rs()) as i32) <= 0 {
            let target = self.branch_target(instr);
            self.take_branch(target);
        }
        Ok(())
    }

    /// REGIMM class: BLTZ, BGEZ, BLTZAL, BGEZAL, selected by the condition
    /// and link bits of the instruction word.
    pub(super) fn bxxx(&mut self, instr: Instruction) -> Result<(), Exception> {
        let cond = ((self.regs.get(instr.rs()) as i32) < 0) ^ instr.bcond();
        let return_addr = self.regs.pc.wrapping_add(8);

        if cond {
            if instr.blink() {
                self.regs.link = Some((31, return_addr));
            }
            let target = self.branch_target(instr);
            self.take_branch(target);
        } else if instr.blink() {
            // Not-taken AL variants still link
            self.regs.set(31, return_addr);
        }
        Ok(())
    }

    pub(super) fn syscall(&mut self) -> Result<(), Exception> {
        Err(Exception::Syscall)
    }

    pub(super) fn breakk(&mut self) -> Result<(), Exception> {
        Err(Exception::Break)
    }
}
