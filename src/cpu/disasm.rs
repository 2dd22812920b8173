//! Mnemonic formatting for the trace log and the inspection surface.

/// Conventional name for a 5-bit register number.
pub fn reg_name(r: usize) -> &'static str {
    const NAMES: [&str; 32] = [
        "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3",
        "$t4", "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8",
        "$t9", "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
    ];
    NAMES[r & 0x1F]
}

/// Render one instruction word as assembly text.
pub fn disassemble(word: u32) -> String {
    let rs = reg_name((word >> 21) as usize);
    let rt = reg_name((word >> 16) as usize);
    let rd = reg_name((word >> 11) as usize);
    let shamt = (word >> 6) & 0x1F;
    let imm = word & 0xFFFF;
    let simm = imm as u16 as i16;
    let target = (word & 0x03FF_FFFF) << 2;

    match word >> 26 {
        0x00 => match word & 0x3F {
            0x00 if word == 0 => "nop".into(),
            0x00 => format!("sll   {rd}, {rt}, {shamt}"),
            0x02 => format!("srl   {rd}, {rt}, {shamt}"),
            0x03 => format!("sra   {rd}, {rt}, {shamt}"),
            0x04 => format!("sllv  {rd}, {rt}, {rs}"),
            0x06 => format!("srlv  {rd}, {rt}, {rs}"),
            0x07 => format!("srav  {rd}, {rt}, {rs}"),
            0x08 => format!("jr    {rs}"),
            0x09 => format!("jalr  {rd}, {rs}"),
            0x0C => "syscall".into(),
            0x0D => "break".into(),
            0x10 => format!("mfhi  {rd}"),
            0x11 => format!("mthi  {rs}"),
            0x12 => format!("mflo  {rd}"),
            0x13 => format!("mtlo  {rs}"),
            0x18 => format!("mult  {rs}, {rt}"),
            0x19 => format!("multu {rs}, {rt}"),
            0x1A => format!("div   {rs}, {rt}"),
            0x1B => format!("divu  {rs}, {rt}"),
            0x20 => format!("add   {rd}, {rs}, {rt}"),
            0x21 => format!("addu  {rd}, {rs}, {rt}"),
            0x22 => format!("sub   {rd}, {rs}, {rt}"),
            0x23 => format!("subu  {rd}, {rs}, {rt}"),
            0x24 => format!("and   {rd}, {rs}, {rt}"),
            0x25 => format!("or    {rd}, {rs}, {rt}"),
            0x26 => format!("xor   {rd}, {rs}, {rt}"),
            0x27 => format!("nor   {rd}, {rs}, {rt}"),
            0x2A => format!("slt   {rd}, {rs}, {rt}"),
            0x2B => format!("sltu  {rd}, {rs}, {rt}"),
            fun => format!("special? funct={fun:#04x}"),
        },
        0x01 => {
            let op = match (word >> 16) & 0x1F {
                0x00 => "bltz ",
                0x01 => "bgez ",
                0x10 => "bltzal",
                0x11 => "bgezal",
                _ => "bcond?",
            };
            format!("{op} {rs}, {simm}")
        }
        0x02 => format!("j     {target:#x}"),
        0x03 => format!("jal   {target:#x}"),
        0x04 => format!("beq   {rs}, {rt}, {simm}"),
        0x05 => format!("bne   {rs}, {rt}, {simm}"),
        0x06 => format!("blez  {rs}, {simm}"),
        0x07 => format!("bgtz  {rs}, {simm}"),
        0x08 => format!("addi  {rt}, {rs}, {simm}"),
        0x09 => format!("addiu {rt}, {rs}, {simm}"),
        0x0A => format!("slti  {rt}, {rs}, {simm}"),
        0x0B => format!("sltiu {rt}, {rs}, {simm}"),
        0x0C => format!("andi  {rt}, {rs}, {imm:#x}"),
        0x0D => format!("ori   {rt}, {rs}, {imm:#x}"),
        0x0E => format!("xori  {rt}, {rs}, {imm:#x}"),
        0x0F => format!("lui   {rt}, {imm:#x}"),
        0x10 => match (word >> 21) & 0x1F {
            0x00 => format!("mfc0  {rt}, cop0r{}", (word >> 11) & 0x1F),
            0x04 => format!("mtc0  {rt}, cop0r{}", (word >> 11) & 0x1F),
            0x10 => "rfe".into(),
            sub => format!("cop0? sub={sub:#04x}"),
        },
        0x12 => format!("cop2  {:#09x}", word & 0x1FF_FFFF),
        0x20 => format!("lb    {rt}, {simm}({rs})"),
        0x21 => format!("lh    {rt}, {simm}({rs})"),
        0x22 => format!("lwl   {rt}, {simm}({rs})"),
        0x23 => format!("lw    {rt}, {simm}({rs})"),
        0x24 => format!("lbu   {rt}, {simm}({rs})"),
        0x25 => format!("lhu   {rt}, {simm}({rs})"),
        0x26 => format!("lwr   {rt}, {simm}({rs})"),
        0x28 => format!("sb    {rt}, {simm}({rs})"),
        0x29 => format!("sh    {rt}, {simm}({rs})"),
        0x2A => format!("swl   {rt}, {simm}({rs})"),
        0x2B => format!("sw    {rt}, {simm}({rs})"),
        0x2E => format!("swr   {rt}, {simm}({rs})"),
        0x32 => format!("lwc2  cop2r{}, {simm}({rs})", (word >> 16) & 0x1F),
        0x3A => format!("swc2  cop2r{}, {simm}({rs})", (word >> 16) & 0x1F),
        op => format!("op? {op:#04x}"),
    }
}
