//! Facilities for decoding and disassembling MSP430 machine code.

use crate::bus::Ram64k;
use std::fmt;
use thiserror::Error;

//===========================================================================//

/// The program counter.
pub const REG_PC: u8 = 0;
/// The stack pointer.
pub const REG_SP: u8 = 1;
/// The status register, which doubles as the first constant generator.
pub const REG_SR: u8 = 2;
/// The second constant generator.
pub const REG_CG: u8 = 3;

/// Debugger-facing register names, indexed by register number.
pub const REGISTER_NAMES: [&str; 16] = [
    "pc", "sp", "sr", "cg", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11",
    "r12", "r13", "r14", "r15",
];

/// Returns the debugger-facing name of a register (`pc`, `sp`, `sr`, `cg`, or
/// `r4` through `r15`).
pub fn register_name(reg: u8) -> String {
    match REGISTER_NAMES.get(reg as usize) {
        Some(name) => name.to_string(),
        None => format!("r{reg}"),
    }
}

//===========================================================================//

/// An error that prevents an instruction from being decoded.
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
pub enum DecodeError {
    /// Instructions must be word-aligned.
    #[error("instruction unaligned, pc: {0:04x}")]
    Unaligned(u16),
    /// The instruction word doesn't match any defined operation.
    #[error("no operation matches word {word:04x} at pc {pc:04x}")]
    InvalidOpcode {
        /// The address of the instruction word.
        pc: u16,
        /// The undecodable instruction word.
        word: u16,
    },
}

//===========================================================================//

/// The encoding format of an instruction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Format {
    /// One operand, encoded in the low seven bits of the instruction word.
    Single,
    /// A conditional or unconditional relative jump.
    Jump,
    /// A source and a destination operand.
    Double,
}

//===========================================================================//

/// An operation that can be executed by an MSP430 processor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// Rotate right through carry.
    Rrc,
    /// Swap the high and low bytes.
    Swpb,
    /// Rotate right arithmetically.
    Rra,
    /// Sign-extend the low byte into the high byte.
    Sxt,
    /// Push onto the stack.
    Push,
    /// Call a subroutine.
    Call,
    /// Return from interrupt.
    Reti,
    /// Move source to destination.
    Mov,
    /// Add source to destination.
    Add,
    /// Add source and carry to destination.
    Addc,
    /// Subtract source from destination, with borrow.
    Subc,
    /// Subtract source from destination.
    Sub,
    /// Compare source with destination.
    Cmp,
    /// Decimal (BCD) add source to destination.
    Dadd,
    /// Test bits of destination against source.
    Bit,
    /// Clear the bits of destination that are set in source.
    Bic,
    /// Set the bits of destination that are set in source.
    Bis,
    /// Exclusive-or source into destination.
    Xor,
    /// Bitwise-and source into destination.
    And,
    /// Jump if not equal (zero flag clear).
    Jne,
    /// Jump if equal (zero flag set).
    Jeq,
    /// Jump if carry clear (unsigned lower).
    Jnc,
    /// Jump if carry set (unsigned higher or same).
    Jc,
    /// Jump if negative.
    Jn,
    /// Jump if greater or equal (signed).
    Jge,
    /// Jump if less (signed).
    Jl,
    /// Jump unconditionally.
    Jmp,
}

impl Operation {
    const FORMAT_ONE: [Operation; 7] = [
        Operation::Rrc,
        Operation::Swpb,
        Operation::Rra,
        Operation::Sxt,
        Operation::Push,
        Operation::Call,
        Operation::Reti,
    ];

    const CONDITIONS: [Operation; 8] = [
        Operation::Jne,
        Operation::Jeq,
        Operation::Jnc,
        Operation::Jc,
        Operation::Jn,
        Operation::Jge,
        Operation::Jl,
        Operation::Jmp,
    ];

    const FORMAT_TWO: [Option<Operation>; 16] = [
        None,
        None,
        None,
        None,
        Some(Operation::Mov),
        Some(Operation::Add),
        Some(Operation::Addc),
        Some(Operation::Subc),
        Some(Operation::Sub),
        Some(Operation::Cmp),
        Some(Operation::Dadd),
        Some(Operation::Bit),
        Some(Operation::Bic),
        Some(Operation::Bis),
        Some(Operation::Xor),
        Some(Operation::And),
    ];

    /// Returns the encoding format used by this operation.
    pub fn format(self) -> Format {
        match self {
            Operation::Rrc
            | Operation::Swpb
            | Operation::Rra
            | Operation::Sxt
            | Operation::Push
            | Operation::Call
            | Operation::Reti => Format::Single,
            Operation::Jne
            | Operation::Jeq
            | Operation::Jnc
            | Operation::Jc
            | Operation::Jn
            | Operation::Jge
            | Operation::Jl
            | Operation::Jmp => Format::Jump,
            _ => Format::Double,
        }
    }

    /// Returns the lowercase assembly mnemonic for this operation.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Operation::Rrc => "rrc",
            Operation::Swpb => "swpb",
            Operation::Rra => "rra",
            Operation::Sxt => "sxt",
            Operation::Push => "push",
            Operation::Call => "call",
            Operation::Reti => "reti",
            Operation::Mov => "mov",
            Operation::Add => "add",
            Operation::Addc => "addc",
            Operation::Subc => "subc",
            Operation::Sub => "sub",
            Operation::Cmp => "cmp",
            Operation::Dadd => "dadd",
            Operation::Bit => "bit",
            Operation::Bic => "bic",
            Operation::Bis => "bis",
            Operation::Xor => "xor",
            Operation::And => "and",
            Operation::Jne => "jnz",
            Operation::Jeq => "jz",
            Operation::Jnc => "jnc",
            Operation::Jc => "jc",
            Operation::Jn => "jn",
            Operation::Jge => "jge",
            Operation::Jl => "jl",
            Operation::Jmp => "jmp",
        }
    }

    /// Returns the instruction word bits that select this operation within
    /// its format.
    pub fn opcode_bits(self) -> u16 {
        match self.format() {
            Format::Single => {
                let index = Operation::FORMAT_ONE
                    .iter()
                    .position(|&op| op == self)
                    .unwrap_or_default() as u16;
                0x1000 | (index << 7)
            }
            Format::Jump => {
                let index = Operation::CONDITIONS
                    .iter()
                    .position(|&op| op == self)
                    .unwrap_or_default() as u16;
                0x2000 | (index << 10)
            }
            Format::Double => {
                let index = Operation::FORMAT_TWO
                    .iter()
                    .position(|&op| op == Some(self))
                    .unwrap_or_default() as u16;
                index << 12
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

//===========================================================================//

/// An operand addressing mode, as encoded in two bits (or one bit, for the
/// destination of a two-operand instruction).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    /// `Rn`
    Register,
    /// `X(Rn)`
    Indexed,
    /// `@Rn`
    Indirect,
    /// `@Rn+`
    Autoincrement,
}

impl Mode {
    /// Decodes a two-bit addressing mode field.
    pub fn from_bits(bits: u16) -> Mode {
        match bits & 0x3 {
            0 => Mode::Register,
            1 => Mode::Indexed,
            2 => Mode::Indirect,
            _ => Mode::Autoincrement,
        }
    }

    /// Returns the two-bit encoding of this addressing mode.
    pub fn bits(self) -> u16 {
        match self {
            Mode::Register => 0,
            Mode::Indexed => 1,
            Mode::Indirect => 2,
            Mode::Autoincrement => 3,
        }
    }
}

//===========================================================================//

/// What a constant-generator combination of (mode, register) stands for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Literal {
    /// One of the generated constants 0, 1, 2, 4, 8, or -1.
    Constant(i16),
    /// An absolute address, taken from the extension word (`&ADDR`).
    Absolute(u16),
    /// An immediate value, taken from the extension word (`#N`).
    Immediate(u16),
}

//===========================================================================//

/// A decoded operand: an addressing mode, a register, and an optional
/// extension word.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Operand {
    /// The addressing mode.
    pub mode: Mode,
    /// The register number, from 0 to 15.
    pub reg: u8,
    /// The extension word following the instruction word, if any.
    pub ext: Option<u16>,
}

impl Operand {
    /// Returns an operand with no extension word.
    pub const fn new(mode: Mode, reg: u8) -> Operand {
        Operand { mode, reg, ext: None }
    }

    /// Returns an operand that uses the given extension word.
    pub const fn with_ext(mode: Mode, reg: u8, ext: u16) -> Operand {
        Operand { mode, reg, ext: Some(ext) }
    }

    /// Returns a register-direct operand.
    pub const fn register(reg: u8) -> Operand {
        Operand::new(Mode::Register, reg)
    }

    /// Returns an `#N` immediate operand.
    pub const fn immediate(value: u16) -> Operand {
        Operand::with_ext(Mode::Autoincrement, REG_PC, value)
    }

    /// Returns an `&ADDR` absolute operand.
    pub const fn absolute(addr: u16) -> Operand {
        Operand::with_ext(Mode::Indexed, REG_SR, addr)
    }

    /// Returns the constant-generator operand that encodes `value` without an
    /// extension word, if there is one.
    pub fn constant(value: i16) -> Option<Operand> {
        let (mode, reg) = match value {
            4 => (Mode::Indirect, REG_SR),
            8 => (Mode::Autoincrement, REG_SR),
            0 => (Mode::Register, REG_CG),
            1 => (Mode::Indexed, REG_CG),
            2 => (Mode::Indirect, REG_CG),
            -1 => (Mode::Autoincrement, REG_CG),
            _ => return None,
        };
        Some(Operand::new(mode, reg))
    }

    /// Returns the most compact operand for the source value `value`: a
    /// generated constant if one exists, otherwise an immediate.
    pub fn source_value(value: u16) -> Operand {
        Operand::constant(value as i16)
            .unwrap_or_else(|| Operand::immediate(value))
    }

    /// Returns true if an operand with this mode and register is followed by
    /// an extension word.
    pub fn needs_extension(mode: Mode, reg: u8) -> bool {
        (mode == Mode::Indexed && reg != REG_CG)
            || (mode == Mode::Autoincrement && reg == REG_PC)
    }

    /// Returns the literal meaning of this operand, if its (mode, register)
    /// combination is folded by the constant generators.
    pub fn literal(&self) -> Option<Literal> {
        match (self.mode, self.reg) {
            (Mode::Indexed, REG_SR) => {
                Some(Literal::Absolute(self.ext.unwrap_or_default()))
            }
            (Mode::Indirect, REG_SR) => Some(Literal::Constant(4)),
            (Mode::Autoincrement, REG_SR) => Some(Literal::Constant(8)),
            (Mode::Register, REG_CG) => Some(Literal::Constant(0)),
            (Mode::Indexed, REG_CG) => Some(Literal::Constant(1)),
            (Mode::Indirect, REG_CG) => Some(Literal::Constant(2)),
            (Mode::Autoincrement, REG_CG) => Some(Literal::Constant(-1)),
            (Mode::Autoincrement, REG_PC) => {
                Some(Literal::Immediate(self.ext.unwrap_or_default()))
            }
            _ => None,
        }
    }

    /// Returns true if this operand denotes a value rather than a location.
    pub fn is_value(&self) -> bool {
        matches!(
            self.literal(),
            Some(Literal::Constant(_) | Literal::Immediate(_))
        )
    }

    fn ext_signed(&self) -> i16 {
        self.ext.unwrap_or_default() as i16
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal() {
            Some(Literal::Absolute(addr)) => return write!(f, "&{addr:04x}"),
            Some(Literal::Constant(-1)) => return f.write_str("#-1"),
            Some(Literal::Constant(value)) => return write!(f, "#{value:x}"),
            Some(Literal::Immediate(value)) => {
                return write!(f, "#{value:04x}");
            }
            None => {}
        }
        let reg = register_name(self.reg);
        match self.mode {
            Mode::Register => f.write_str(&reg),
            Mode::Indexed => {
                let offset = self.ext_signed();
                if offset < 0 {
                    write!(f, "-{:x}({reg})", offset.unsigned_abs())
                } else {
                    write!(f, "{offset:x}({reg})")
                }
            }
            Mode::Indirect => write!(f, "@{reg}"),
            Mode::Autoincrement => write!(f, "@{reg}+"),
        }
    }
}

//===========================================================================//

/// The operands of a decoded instruction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operands {
    /// The single operand of a format-one instruction.
    Single(Operand),
    /// The signed byte offset of a jump, relative to the jump's own address.
    Jump(i16),
    /// The source and destination operands of a format-two instruction.
    Double(Operand, Operand),
}

//===========================================================================//

/// A complete decoded instruction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Instruction {
    /// The operation to be performed.
    pub operation: Operation,
    /// True if the instruction operates on bytes rather than words.
    pub is_byte: bool,
    /// The instruction's operands.
    pub operands: Operands,
    /// The encoded size of the instruction in bytes, including extension
    /// words.
    pub size: u16,
}

impl Instruction {
    /// Reads and decodes the instruction at `pc`.
    pub fn decode(mem: &Ram64k, pc: u16) -> Result<Instruction, DecodeError> {
        if pc & 1 != 0 {
            return Err(DecodeError::Unaligned(pc));
        }
        let word = mem.read_word(pc);
        let is_byte = word & 0x0040 != 0;
        let invalid = DecodeError::InvalidOpcode { pc, word };
        if word >> 12 == 1 {
            let operation = *Operation::FORMAT_ONE
                .get(((word >> 7) & 0x7) as usize)
                .ok_or(invalid)?;
            let mut size = 2;
            let operand =
                read_operand(mem, pc, &mut size, word >> 4, word & 0xf);
            Ok(Instruction {
                operation,
                is_byte,
                operands: Operands::Single(operand),
                size,
            })
        } else if word >> 13 == 1 {
            let condition = ((word >> 10) & 0x7) as usize;
            let operation = Operation::CONDITIONS[condition];
            Ok(Instruction {
                operation,
                is_byte: false,
                operands: Operands::Jump(jump_offset(word)),
                size: 2,
            })
        } else {
            let operation =
                Operation::FORMAT_TWO[(word >> 12) as usize].ok_or(invalid)?;
            let mut size = 2;
            let src = read_operand(mem, pc, &mut size, word >> 4, word >> 8);
            let dest = read_operand(
                mem,
                pc,
                &mut size,
                (word >> 7) & 0x1,
                word & 0xf,
            );
            Ok(Instruction {
                operation,
                is_byte,
                operands: Operands::Double(src, dest),
                size,
            })
        }
    }

    /// Encodes this instruction as a sequence of words (the instruction word
    /// followed by any extension words).  Returns `None` if an operand can't
    /// be encoded, e.g. a two-operand destination in an indirect mode.
    pub fn encode(&self) -> Option<Vec<u16>> {
        let mut word = self.operation.opcode_bits();
        if self.is_byte {
            word |= 0x0040;
        }
        let mut words = vec![0];
        let push_ext = |words: &mut Vec<u16>, operand: &Operand| {
            if Operand::needs_extension(operand.mode, operand.reg) {
                words.push(operand.ext.unwrap_or_default());
            }
        };
        match (self.operation.format(), &self.operands) {
            (Format::Single, Operands::Single(operand)) => {
                word |= (operand.mode.bits() << 4) | u16::from(operand.reg);
                push_ext(&mut words, operand);
            }
            (Format::Jump, &Operands::Jump(offset)) => {
                if offset & 1 != 0 || !(-1022..=1024).contains(&offset) {
                    return None;
                }
                word |= ((offset >> 1) - 1) as u16 & 0x3ff;
            }
            (Format::Double, Operands::Double(src, dest)) => {
                let dest_mode = match dest.mode {
                    Mode::Register => 0,
                    Mode::Indexed => 1,
                    Mode::Indirect | Mode::Autoincrement => return None,
                };
                word |= (u16::from(src.reg) << 8)
                    | (dest_mode << 7)
                    | (src.mode.bits() << 4)
                    | u16::from(dest.reg);
                push_ext(&mut words, src);
                push_ext(&mut words, dest);
            }
            _ => return None,
        }
        words[0] = word;
        Some(words)
    }

    /// Returns true if this is `mov @sp+, pc`, i.e. a subroutine return.
    pub fn is_ret(&self) -> bool {
        self.operation == Operation::Mov
            && self.operands
                == Operands::Double(
                    Operand::new(Mode::Autoincrement, REG_SP),
                    Operand::register(REG_PC),
                )
    }

    /// Returns true if this is a subroutine call.
    pub fn is_call(&self) -> bool {
        self.operation == Operation::Call
    }

    /// Returns the mnemonic and operands this instruction is conventionally
    /// written as (`ret` for `mov @sp+, pc`, `br X` for `mov X, pc`).
    pub fn emulated(&self) -> (&'static str, Vec<Operand>) {
        match self.operands {
            _ if self.is_ret() => ("ret", Vec::new()),
            Operands::Double(src, dest)
                if self.operation == Operation::Mov
                    && dest == Operand::register(REG_PC) =>
            {
                ("br", vec![src])
            }
            Operands::Single(operand) => {
                (self.operation.mnemonic(), vec![operand])
            }
            Operands::Double(src, dest) => {
                (self.operation.mnemonic(), vec![src, dest])
            }
            Operands::Jump(_) => (self.operation.mnemonic(), Vec::new()),
        }
    }

    /// Formats a disassembled instruction as a human-readable string.  `addr`
    /// specifies the address of the start of the instruction; if
    /// `show_target` is true, jumps are annotated with their absolute target.
    pub fn format(&self, addr: u16, show_target: bool) -> String {
        if let Operands::Jump(offset) = self.operands {
            let mut text =
                format!("{}\t{}", self.operation, format_offset(offset));
            if show_target {
                let target = addr.wrapping_add(offset as u16);
                text.push_str(&format!(" [{target:x}]"));
            }
            return text;
        }
        let (name, operands) = self.emulated();
        let suffix = if self.is_byte { ".b" } else { "" };
        let operands = operands
            .iter()
            .map(Operand::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        format!("{name}{suffix}\t{operands}")
    }
}

//===========================================================================//

fn read_operand(
    mem: &Ram64k,
    pc: u16,
    size: &mut u16,
    mode_bits: u16,
    reg_bits: u16,
) -> Operand {
    let mode = Mode::from_bits(mode_bits);
    let reg = (reg_bits & 0xf) as u8;
    if Operand::needs_extension(mode, reg) {
        let ext = mem.read_word(pc.wrapping_add(*size));
        *size += 2;
        Operand::with_ext(mode, reg, ext)
    } else {
        Operand::new(mode, reg)
    }
}

/// Extracts the signed byte offset from a jump instruction word.  The offset
/// is relative to the address of the jump itself.
fn jump_offset(word: u16) -> i16 {
    let raw = (((word & 0x3ff) << 6) as i16) >> 6;
    (raw + 1) << 1
}

/// Formats a jump offset as `$+n` or `$-n`.
pub fn format_offset(offset: i16) -> String {
    if offset < 0 {
        format!("$-{:x}", offset.unsigned_abs())
    } else {
        format!("$+{offset:x}")
    }
}

//===========================================================================//

/// Disassembles instructions starting at `start` and continuing while the
/// address is below `limit`.  In interactive mode (`stop_at_branch`),
/// disassembly also stops after a `ret` or `jmp`, and jumps are annotated with
/// their targets.  An undecodable word ends the listing with a
/// `Failed to disassemble.` line.
pub fn disassemble(
    mem: &Ram64k,
    start: u16,
    limit: u32,
    stop_at_branch: bool,
) -> Vec<(u16, String)> {
    let mut lines = Vec::new();
    let mut pc = u32::from(start);
    while pc < limit && pc < 0x10000 {
        let addr = pc as u16;
        let instruction = match Instruction::decode(mem, addr) {
            Ok(instruction) => instruction,
            Err(_) => {
                lines.push((addr, "Failed to disassemble.".to_string()));
                break;
            }
        };
        lines.push((addr, instruction.format(addr, stop_at_branch)));
        pc += u32::from(instruction.size);
        let is_branch = instruction.is_ret()
            || instruction.operation == Operation::Jmp;
        if stop_at_branch && is_branch {
            break;
        }
    }
    lines
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{
        DecodeError, Instruction, Literal, Mode, Operand, Operands, Operation,
        REG_CG, REG_PC, REG_SP, REG_SR, disassemble,
    };
    use crate::bus::Ram64k;

    fn decode(words: &[u16]) -> Instruction {
        Instruction::decode(&Ram64k::from_words(0x4400, words), 0x4400)
            .unwrap()
    }

    fn disassemble_one(words: &[u16]) -> String {
        decode(words).format(0x4400, true)
    }

    #[test]
    fn constant_generator_table() {
        for value in [0, 1, 2, 4, 8, -1] {
            let operand = Operand::constant(value).unwrap();
            assert!(!Operand::needs_extension(operand.mode, operand.reg));
            assert_eq!(operand.literal(), Some(Literal::Constant(value)));
        }
        assert_eq!(Operand::constant(3), None);
        assert_eq!(
            Operand::absolute(0x0200).literal(),
            Some(Literal::Absolute(0x0200))
        );
        assert_eq!(
            Operand::immediate(0x1234).literal(),
            Some(Literal::Immediate(0x1234))
        );
        assert_eq!(Operand::register(5).literal(), None);
        assert_eq!(Operand::new(Mode::Register, REG_SR).literal(), None);
    }

    #[test]
    fn constant_generator_round_trip_through_encoding() {
        for value in [0, 1, 2, 4, 8, -1] {
            let instruction = Instruction {
                operation: Operation::Mov,
                is_byte: false,
                operands: Operands::Double(
                    Operand::constant(value).unwrap(),
                    Operand::register(5),
                ),
                size: 2,
            };
            let words = instruction.encode().unwrap();
            assert_eq!(words.len(), 1);
            assert_eq!(decode(&words), instruction);
        }
    }

    #[test]
    fn extension_words() {
        assert!(Operand::needs_extension(Mode::Indexed, 4));
        assert!(Operand::needs_extension(Mode::Indexed, REG_SR));
        assert!(!Operand::needs_extension(Mode::Indexed, REG_CG));
        assert!(Operand::needs_extension(Mode::Autoincrement, REG_PC));
        assert!(!Operand::needs_extension(Mode::Autoincrement, REG_SP));
        assert!(!Operand::needs_extension(Mode::Register, REG_PC));
    }

    #[test]
    fn two_operand_sizes() {
        // mov r4, r5
        assert_eq!(decode(&[0x4405]).size, 2);
        // mov #0x1234, r5
        assert_eq!(decode(&[0x4035, 0x1234]).size, 4);
        // mov r4, 2(r5)
        assert_eq!(decode(&[0x4485, 0x0002]).size, 4);
        // mov #0x1234, &0x0200
        let instruction = decode(&[0x40b2, 0x1234, 0x0200]);
        assert_eq!(instruction.size, 6);
        assert_eq!(
            instruction.operands,
            Operands::Double(
                Operand::immediate(0x1234),
                Operand::absolute(0x0200)
            )
        );
        // mov #1, 1(cg) has no extension words at all
        assert_eq!(decode(&[0x4393]).size, 2);
    }

    #[test]
    fn every_two_operand_size_matches_extension_rule() {
        let mut ram = Ram64k::new();
        for opcode in 4..16u16 {
            for src_reg in 0..16u16 {
                for src_mode in 0..4u16 {
                    for dest_mode in 0..2u16 {
                        for dest_reg in [0u16, 2, 3, 4] {
                            let word = (opcode << 12)
                                | (src_reg << 8)
                                | (dest_mode << 7)
                                | (src_mode << 4)
                                | dest_reg;
                            ram.write_word(0x4400, word);
                            let insn =
                                Instruction::decode(&ram, 0x4400).unwrap();
                            let src_ext = Operand::needs_extension(
                                Mode::from_bits(src_mode),
                                src_reg as u8,
                            );
                            let dest_ext = dest_mode == 1 && dest_reg != 3;
                            let expected = 2
                                + 2 * u16::from(src_ext)
                                + 2 * u16::from(dest_ext);
                            assert_eq!(insn.size, expected, "{word:04x}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn extension_words_are_read_in_order() {
        // mov 2(r4), 6(r5)
        let instruction = decode(&[0x4495, 0x0002, 0x0006]);
        assert_eq!(
            instruction.operands,
            Operands::Double(
                Operand::with_ext(Mode::Indexed, 4, 2),
                Operand::with_ext(Mode::Indexed, 5, 6)
            )
        );
    }

    #[test]
    fn unaligned_pc() {
        let ram = Ram64k::new();
        assert_eq!(
            Instruction::decode(&ram, 0x4401),
            Err(DecodeError::Unaligned(0x4401))
        );
    }

    #[test]
    fn invalid_opcodes() {
        let ram = Ram64k::from_words(0x4400, &[0x0123, 0x1380]);
        assert_eq!(
            Instruction::decode(&ram, 0x4400),
            Err(DecodeError::InvalidOpcode { pc: 0x4400, word: 0x0123 })
        );
        assert_eq!(
            Instruction::decode(&ram, 0x4402),
            Err(DecodeError::InvalidOpcode { pc: 0x4402, word: 0x1380 })
        );
    }

    #[test]
    fn format_one() {
        assert_eq!(disassemble_one(&[0x1005]), "rrc\tr5");
        assert_eq!(disassemble_one(&[0x1085]), "swpb\tr5");
        assert_eq!(disassemble_one(&[0x1105]), "rra\tr5");
        assert_eq!(disassemble_one(&[0x1185]), "sxt\tr5");
        assert_eq!(disassemble_one(&[0x120b]), "push\tr11");
        assert_eq!(disassemble_one(&[0x1245]), "push.b\tr5");
        assert_eq!(disassemble_one(&[0x12b0, 0x4558]), "call\t#4558");
        assert_eq!(disassemble_one(&[0x1300]), "reti\tpc");
    }

    #[test]
    fn jumps() {
        assert_eq!(disassemble_one(&[0x23fe]), "jnz\t$-2 [43fe]");
        assert_eq!(disassemble_one(&[0x2404]), "jz\t$+a [440a]");
        assert_eq!(disassemble_one(&[0x3c00]), "jmp\t$+2 [4402]");
        assert_eq!(disassemble_one(&[0x3fff]), "jmp\t$+0 [4400]");
        assert_eq!(disassemble_one(&[0x3200]), "jn\t$-3fe [4002]");
        assert_eq!(disassemble_one(&[0x31ff]), "jn\t$+400 [4800]");
        assert_eq!(decode(&[0x3bfe]).format(0x4400, false), "jl\t$-2");
    }

    #[test]
    fn jump_encoding_round_trip() {
        for word in [0x23feu16, 0x2404, 0x3c00, 0x3200, 0x31ff, 0x2bff] {
            assert_eq!(decode(&[word]).encode(), Some(vec![word]));
        }
    }

    #[test]
    fn format_two() {
        assert_eq!(disassemble_one(&[0x4031, 0x4400]), "mov\t#4400, sp");
        assert_eq!(disassemble_one(&[0x4130]), "ret\t");
        assert_eq!(disassemble_one(&[0x4030, 0x4500]), "br\t#4500");
        assert_eq!(disassemble_one(&[0x5505]), "add\tr5, r5");
        assert_eq!(disassemble_one(&[0x533f]), "add\t#-1, r15");
        assert_eq!(disassemble_one(&[0x93c2, 0x0200]), "cmp.b\t#0, &0200");
        assert_eq!(disassemble_one(&[0x4f5e, 0xfffe]), "mov.b\t-2(r15), r14");
        assert_eq!(disassemble_one(&[0x4e6f]), "mov.b\t@r14, r15");
        assert_eq!(disassemble_one(&[0x4f3e]), "mov\t@r15+, r14");
        assert_eq!(disassemble_one(&[0xf232]), "and\t#8, sr");
        assert_eq!(disassemble_one(&[0xd222]), "bis\t#4, sr");
        assert_eq!(disassemble_one(&[0x4302]), "mov\t#0, sr");
    }

    #[test]
    fn disassemble_window_stops_at_ret() {
        let ram = Ram64k::from_words(0x4400, &[0x5505, 0x4130, 0x5505]);
        let lines = disassemble(&ram, 0x4400, 0x4410, true);
        assert_eq!(
            lines,
            vec![
                (0x4400, "add\tr5, r5".to_string()),
                (0x4402, "ret\t".to_string()),
            ]
        );
        let lines = disassemble(&ram, 0x4400, 0x4406, false);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn disassemble_window_reports_failure() {
        let ram = Ram64k::from_words(0x4400, &[0x5505, 0x0000]);
        let lines = disassemble(&ram, 0x4400, 0x4410, true);
        assert_eq!(lines[1], (0x4402, "Failed to disassemble.".to_string()));
        assert_eq!(lines.len(), 2);
    }
}

//===========================================================================//
