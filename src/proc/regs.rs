use crate::dis::msp430::{
    REG_PC, REG_SP, REG_SR, REGISTER_NAMES, register_name,
};

//===========================================================================//

const SR_FLAG_C: u16 = 0b0000_0000_0000_0001;
const SR_FLAG_Z: u16 = 0b0000_0000_0000_0010;
const SR_FLAG_N: u16 = 0b0000_0000_0000_0100;
const SR_FLAG_V: u16 = 0b0000_0001_0000_0000;

/// The status register bit that halts the processor.
pub const SR_CPUOFF: u16 = 0b0000_0000_0001_0000;

/// The status register bit that enables the call gate.
pub const SR_GATE_ENABLE: u16 = 0b1000_0000_0000_0000;

//===========================================================================//

/// One of the four status flags held in the status register.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Flag {
    /// Bit 0.
    Carry,
    /// Bit 1.
    Zero,
    /// Bit 2.
    Negative,
    /// Bit 8.
    Overflow,
}

impl Flag {
    /// All flags, in the order the debugger lists them.
    pub const ALL: [Flag; 4] =
        [Flag::Carry, Flag::Zero, Flag::Negative, Flag::Overflow];

    fn mask(self) -> u16 {
        match self {
            Flag::Carry => SR_FLAG_C,
            Flag::Zero => SR_FLAG_Z,
            Flag::Negative => SR_FLAG_N,
            Flag::Overflow => SR_FLAG_V,
        }
    }

    /// Returns the debugger-facing name of this flag.
    pub fn name(self) -> &'static str {
        match self {
            Flag::Carry => "carry",
            Flag::Zero => "zero",
            Flag::Negative => "negative",
            Flag::Overflow => "overflow",
        }
    }

    /// Looks up a flag by its debugger-facing name.
    pub fn from_name(name: &str) -> Option<Flag> {
        Flag::ALL.into_iter().find(|flag| flag.name() == name)
    }
}

//===========================================================================//

/// Returns the register number for a register name: `pc`, `sp`, `sr`, `cg`,
/// or `r0` through `r15`.
pub fn register_number(name: &str) -> Option<u8> {
    if let Some(reg) = REGISTER_NAMES.iter().position(|&known| known == name) {
        return Some(reg as u8);
    }
    let digits = name.strip_prefix('r')?;
    if digits.is_empty()
        || !digits.bytes().all(|byte| byte.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    let number = digits.parse::<u8>().ok()?;
    (number < 16).then_some(number)
}

//===========================================================================//

/// The sixteen 16-bit registers of an MSP430 processor.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Registers {
    regs: [u16; 16],
}

impl Registers {
    /// Returns a register file with every register zeroed.
    pub fn new() -> Registers {
        Registers::default()
    }

    /// Returns the value of the given register.
    pub fn get(&self, reg: u8) -> u16 {
        self.regs[(reg & 0xf) as usize]
    }

    /// Sets the value of the given register.
    pub fn set(&mut self, reg: u8, value: u16) {
        self.regs[(reg & 0xf) as usize] = value;
    }

    /// Returns the program counter.
    pub fn pc(&self) -> u16 {
        self.get(REG_PC)
    }

    /// Sets the program counter.
    pub fn set_pc(&mut self, value: u16) {
        self.set(REG_PC, value);
    }

    /// Returns the stack pointer.
    pub fn sp(&self) -> u16 {
        self.get(REG_SP)
    }

    /// Sets the stack pointer.
    pub fn set_sp(&mut self, value: u16) {
        self.set(REG_SP, value);
    }

    /// Returns the status register.
    pub fn sr(&self) -> u16 {
        self.get(REG_SR)
    }

    /// Returns the value of a single status flag.
    pub fn flag(&self, flag: Flag) -> bool {
        self.sr() & flag.mask() != 0
    }

    /// Sets or clears a single status flag.
    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        let sr = self.sr() & !flag.mask();
        self.set(REG_SR, if value { sr | flag.mask() } else { sr });
    }

    /// Recomputes the negative, zero and carry flags from an arithmetic
    /// result and clears the overflow flag.  `result` is the full-width value
    /// before truncation to the operand size, so that the carry out of the
    /// top bit is still visible.
    pub fn set_result_flags(&mut self, result: u32, is_byte: bool) {
        let bits = if is_byte { 8 } else { 16 };
        let truncated = result & ((1 << bits) - 1);
        self.set_flag(Flag::Negative, (truncated >> (bits - 1)) & 1 != 0);
        self.set_flag(Flag::Zero, truncated == 0);
        self.set_flag(Flag::Carry, (result >> bits) & 1 != 0);
        self.set_flag(Flag::Overflow, false);
    }

    /// Returns an iterator over (name, value) pairs for all sixteen
    /// registers.
    pub fn named(&self) -> impl Iterator<Item = (String, u16)> + '_ {
        self.regs
            .iter()
            .enumerate()
            .map(|(reg, &value)| (register_name(reg as u8), value))
    }
}

//===========================================================================//


//===========================================================================//
