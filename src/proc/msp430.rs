use super::frame::CallStack;
use super::gate::{self, CALL_GATE, InputMode, ProgramIo};
use super::regs::{Flag, Registers, SR_CPUOFF, register_number};
use super::{ExecObserver, SimBreak, SimErr, SimProc};
use crate::bus::Ram64k;
use crate::dis::msp430::{
    Instruction, Literal, Mode, Operand, Operands, Operation, REG_CG, REG_PC,
    REGISTER_NAMES,
};
use log::{trace, warn};

//===========================================================================//

/// How control left an executed instruction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Flow {
    /// Execution continues with the next instruction in memory.
    Sequential,
    /// A jump or other write to the program counter.
    Branch,
    /// A `call` instruction.
    Call,
    /// A `ret` instruction.
    Return,
}

/// Describes one successfully executed step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StepInfo {
    /// The address of the instruction that was executed.
    pub pc: u16,
    /// How control left the instruction.
    pub flow: Flow,
    /// True if the call gate read program input before this instruction.
    pub consumed_input: bool,
}

//===========================================================================//

/// Where an operand reads from and writes to, once its addressing mode has
/// been resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Location {
    Register(u8),
    Memory(u16),
    /// A constant or immediate; writes to it are discarded.
    Value(u16),
}

//===========================================================================//

/// A simulated MSP430 processor, together with its 64 KiB of memory.
#[derive(Clone)]
pub struct Msp430 {
    regs: Registers,
    mem: Ram64k,
    call_stack: CallStack,
    block_start: u16,
    insn_count: u64,
    input_mode: InputMode,
    door_unlocked: bool,
    collapse_countdowns: bool,
}

impl Msp430 {
    /// Returns a new simulated processor running the given memory image.
    /// All registers are zero except the program counter, which is loaded
    /// from the reset vector.
    pub fn new(mem: Ram64k) -> Msp430 {
        let entry = mem.reset_vector();
        let mut regs = Registers::new();
        regs.set_pc(entry);
        Msp430 {
            regs,
            mem,
            call_stack: CallStack::new(entry),
            block_start: entry,
            insn_count: 0,
            input_mode: InputMode::default(),
            door_unlocked: false,
            collapse_countdowns: true,
        }
    }

    /// Returns the processor's registers.
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Returns the processor's registers for modification.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Returns the processor's memory.
    pub fn memory(&self) -> &Ram64k {
        &self.mem
    }

    /// Returns the processor's memory for modification.
    pub fn memory_mut(&mut self) -> &mut Ram64k {
        &mut self.mem
    }

    /// Returns the shadow call stack.
    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Returns the address at which the current straight-line block of code
    /// was entered, i.e. the most recent branch target (or the entry point).
    pub fn block_start(&self) -> u16 {
        self.block_start
    }

    /// Returns the number of instructions executed so far.
    pub fn insn_count(&self) -> u64 {
        self.insn_count
    }

    /// Returns how program input is currently interpreted.
    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    /// Sets how program input is interpreted.
    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
    }

    /// Enables or disables collapsing of `add #-1, X; jnz $-2` countdown
    /// loops into a single step.  Enabled by default.
    pub fn set_collapse_countdowns(&mut self, enabled: bool) {
        self.collapse_countdowns = enabled;
    }

    /// Returns true if the program has unlocked the door.
    pub fn is_door_unlocked(&self) -> bool {
        self.door_unlocked
    }

    /// Returns true if the CPUOFF bit of the status register is set.
    pub fn is_cpu_off(&self) -> bool {
        self.regs.sr() & SR_CPUOFF != 0
    }

    /// Returns the value an operand would currently read as, without any
    /// side effects (in particular, without autoincrementing).
    pub fn peek_operand(&self, operand: &Operand, is_byte: bool) -> u16 {
        self.load(self.locate(operand, is_byte), is_byte)
    }

    //=======================================================================//

    fn locate(&self, operand: &Operand, is_byte: bool) -> Location {
        let mask = width_mask(is_byte);
        match operand.literal() {
            Some(Literal::Constant(value)) => {
                return Location::Value(value as u16 & mask);
            }
            Some(Literal::Immediate(value)) => {
                return Location::Value(value & mask);
            }
            Some(Literal::Absolute(addr)) => return Location::Memory(addr),
            None => {}
        }
        let base = self.regs.get(operand.reg);
        match operand.mode {
            Mode::Register => Location::Register(operand.reg),
            Mode::Indexed => {
                Location::Memory(base.wrapping_add(operand.ext.unwrap_or(0)))
            }
            Mode::Indirect | Mode::Autoincrement => Location::Memory(base),
        }
    }

    /// Resolves an operand to a location, performing any autoincrement.  Both
    /// byte and word autoincrements advance the register by two.
    fn resolve(&mut self, operand: &Operand, is_byte: bool) -> Location {
        let location = self.locate(operand, is_byte);
        if operand.mode == Mode::Autoincrement && operand.literal().is_none() {
            let reg = operand.reg;
            self.regs.set(reg, self.regs.get(reg).wrapping_add(2));
        }
        location
    }

    fn load(&self, location: Location, is_byte: bool) -> u16 {
        match location {
            Location::Register(reg) => {
                self.regs.get(reg) & width_mask(is_byte)
            }
            Location::Memory(addr) if is_byte => {
                u16::from(self.mem.read_byte(addr))
            }
            Location::Memory(addr) => self.mem.read_word(addr),
            Location::Value(value) => value,
        }
    }

    fn store(&mut self, location: Location, value: u32, is_byte: bool) {
        let value = (value as u16) & width_mask(is_byte);
        match location {
            Location::Register(REG_CG) | Location::Value(_) => {}
            Location::Register(reg) => self.regs.set(reg, value),
            Location::Memory(addr) if is_byte => {
                self.mem.write_byte(addr, value as u8)
            }
            Location::Memory(addr) => self.mem.write_word(addr, value),
        }
    }

    fn read(&mut self, operand: &Operand, is_byte: bool) -> u16 {
        let location = self.resolve(operand, is_byte);
        self.load(location, is_byte)
    }

    //=======================================================================//

    fn execute(&mut self, instruction: &Instruction, next_pc: u16) {
        let is_byte = instruction.is_byte;
        match instruction.operands {
            Operands::Jump(offset) => {
                if self.condition_holds(instruction.operation) {
                    let addr = self.regs.pc().wrapping_sub(2);
                    self.regs.set_pc(addr.wrapping_add(offset as u16));
                }
            }
            Operands::Single(operand) => self.execute_single(
                instruction.operation,
                &operand,
                is_byte,
                next_pc,
            ),
            Operands::Double(src, dest) => self.execute_double(
                instruction.operation,
                &src,
                &dest,
                is_byte,
            ),
        }
    }

    fn condition_holds(&self, operation: Operation) -> bool {
        let n = self.regs.flag(Flag::Negative);
        let v = self.regs.flag(Flag::Overflow);
        match operation {
            Operation::Jne => !self.regs.flag(Flag::Zero),
            Operation::Jeq => self.regs.flag(Flag::Zero),
            Operation::Jnc => !self.regs.flag(Flag::Carry),
            Operation::Jc => self.regs.flag(Flag::Carry),
            Operation::Jn => n,
            Operation::Jge => n == v,
            Operation::Jl => n != v,
            _ => true,
        }
    }

    fn execute_single(
        &mut self,
        operation: Operation,
        operand: &Operand,
        is_byte: bool,
        next_pc: u16,
    ) {
        match operation {
            Operation::Rrc => self.op_rrc(operand, is_byte),
            Operation::Swpb => self.op_swpb(operand, is_byte),
            Operation::Rra => self.op_rra(operand, is_byte),
            Operation::Sxt => self.op_sxt(operand, is_byte),
            Operation::Push => self.op_push(operand, is_byte),
            Operation::Call => self.op_call(operand, next_pc),
            Operation::Reti => {
                warn!("reti is not implemented; treating it as a no-op");
            }
            _ => unreachable!("{operation} is not a single-operand operation"),
        }
    }

    fn execute_double(
        &mut self,
        operation: Operation,
        src: &Operand,
        dest: &Operand,
        is_byte: bool,
    ) {
        let mask = u32::from(width_mask(is_byte));
        let source = u32::from(self.read(src, is_byte));
        let location = self.resolve(dest, is_byte);
        if operation == Operation::Mov {
            self.store(location, source, is_byte);
            return;
        }
        let target = u32::from(self.load(location, is_byte));
        let carry = u32::from(self.regs.flag(Flag::Carry));
        match operation {
            Operation::Add => {
                self.arithmetic(location, target + source, is_byte, true)
            }
            Operation::Addc => self.arithmetic(
                location,
                target + source + carry,
                is_byte,
                true,
            ),
            Operation::Subc => self.arithmetic(
                location,
                target + (!source & mask) + carry,
                is_byte,
                true,
            ),
            Operation::Sub => self.arithmetic(
                location,
                target + (!source & mask) + 1,
                is_byte,
                true,
            ),
            Operation::Cmp => self.arithmetic(
                location,
                target + (!source & mask) + 1,
                is_byte,
                false,
            ),
            Operation::Dadd => self.op_dadd(location, target, source, is_byte),
            Operation::Bit => {
                self.regs.set_result_flags(target & source, is_byte)
            }
            Operation::Bic => {
                self.store(location, target & !source, is_byte)
            }
            Operation::Bis => self.store(location, target | source, is_byte),
            Operation::Xor => self.logical(location, target ^ source, is_byte),
            Operation::And => self.logical(location, target & source, is_byte),
            _ => unreachable!("{operation} is not a two-operand operation"),
        }
    }

    fn arithmetic(
        &mut self,
        location: Location,
        result: u32,
        is_byte: bool,
        write: bool,
    ) {
        self.regs.set_result_flags(result, is_byte);
        if write {
            self.store(location, result, is_byte);
        }
    }

    fn logical(&mut self, location: Location, result: u32, is_byte: bool) {
        self.regs.set_result_flags(result, is_byte);
        let zero = self.regs.flag(Flag::Zero);
        self.regs.set_flag(Flag::Carry, !zero);
        self.store(location, result, is_byte);
    }

    /// Adds two values as packed binary-coded decimal, one nibble at a time,
    /// with no carry in.  The zero flag is not affected.
    fn op_dadd(
        &mut self,
        location: Location,
        target: u32,
        source: u32,
        is_byte: bool,
    ) {
        let nibbles = if is_byte { 2 } else { 4 };
        let mut result = 0;
        let mut carry = 0;
        let mut negative = false;
        for index in 0..nibbles {
            let shift = 4 * index;
            let mut digit =
                ((target >> shift) & 0xf) + ((source >> shift) & 0xf) + carry;
            negative = (digit >> 3) & 1 != 0;
            carry = u32::from(digit >= 10);
            if carry != 0 {
                digit -= 10;
            }
            result |= (digit & 0xf) << shift;
        }
        self.regs.set_flag(Flag::Carry, carry != 0);
        if negative {
            self.regs.set_flag(Flag::Negative, true);
        }
        self.store(location, result, is_byte);
    }

    /// Rotates right through the carry flag.  The zero flag is always
    /// cleared, whatever the result.
    fn op_rrc(&mut self, operand: &Operand, is_byte: bool) {
        let bits = width_bits(is_byte);
        let location = self.resolve(operand, is_byte);
        let value = self.load(location, is_byte);
        let carry_in = u16::from(self.regs.flag(Flag::Carry));
        let result = (value >> 1) | (carry_in << (bits - 1));
        self.regs.set_flag(Flag::Carry, value & 1 != 0);
        self.regs.set_flag(Flag::Zero, false);
        self.regs.set_flag(Flag::Negative, (result >> (bits - 1)) & 1 != 0);
        self.store(location, u32::from(result), is_byte);
    }

    /// Shifts right arithmetically.  The zero flag is always cleared and the
    /// carry flag is left alone.
    fn op_rra(&mut self, operand: &Operand, is_byte: bool) {
        let bits = width_bits(is_byte);
        let location = self.resolve(operand, is_byte);
        let value = self.load(location, is_byte);
        let sign = value & (1 << (bits - 1));
        let result = (value >> 1) | sign;
        self.regs.set_flag(Flag::Zero, false);
        self.regs.set_flag(Flag::Negative, sign != 0);
        self.store(location, u32::from(result), is_byte);
    }

    fn op_swpb(&mut self, operand: &Operand, is_byte: bool) {
        let location = self.resolve(operand, is_byte);
        let value = self.load(location, is_byte);
        self.store(location, u32::from(value.swap_bytes()), is_byte);
    }

    fn op_sxt(&mut self, operand: &Operand, is_byte: bool) {
        let location = self.resolve(operand, is_byte);
        let value = self.load(location, is_byte);
        let result = u32::from(value as u8 as i8 as i16 as u16);
        self.logical(location, result, is_byte);
    }

    fn op_push(&mut self, operand: &Operand, is_byte: bool) {
        let sp = self.regs.sp().wrapping_sub(2);
        self.regs.set_sp(sp);
        let value = self.read(operand, is_byte);
        self.mem.write_word(sp, value);
    }

    fn op_call(&mut self, operand: &Operand, next_pc: u16) {
        let sp = self.regs.sp().wrapping_sub(2);
        self.regs.set_sp(sp);
        self.mem.write_word(sp, next_pc);
        let target = self.read(operand, false);
        self.regs.set_pc(target);
    }

    //=======================================================================//

    /// Recognizes a `jnz $-2` that closes an `add #-1, X` countdown loop and,
    /// if found, runs the loop to completion in one step: X becomes zero,
    /// execution falls through, and the flags are set as the final `add`
    /// would have left them.
    fn try_collapse_countdown(
        &mut self,
        pc: u16,
        instruction: &Instruction,
        observer: Option<&mut dyn ExecObserver>,
    ) -> Result<bool, SimBreak> {
        if !self.collapse_countdowns
            || instruction.operation != Operation::Jne
            || instruction.operands != Operands::Jump(-2)
        {
            return Ok(false);
        }
        let previous = match Instruction::decode(&self.mem, pc.wrapping_sub(2))
        {
            Ok(previous) => previous,
            Err(_) => return Ok(false),
        };
        let dest = match previous.operands {
            Operands::Double(src, dest)
                if previous.operation == Operation::Add
                    && Some(src) == Operand::constant(-1)
                    && !(dest.mode == Mode::Register && dest.reg == REG_PC) =>
            {
                dest
            }
            _ => return Ok(false),
        };
        let location = self.locate(&dest, previous.is_byte);
        let remaining = self.load(location, previous.is_byte);
        if let Some(observer) = observer {
            observer.on_countdown(self, pc, remaining).map_err(SimErr::Io)?;
        }
        trace!("collapsed countdown at {pc:04x} from {remaining:#x}");
        self.store(location, 0, previous.is_byte);
        self.regs.set_pc(pc.wrapping_add(instruction.size));
        self.regs.set_flag(Flag::Zero, true);
        self.regs.set_flag(Flag::Negative, false);
        self.regs.set_flag(Flag::Carry, true);
        Ok(true)
    }

    /// Executes one instruction, servicing the call gate first if the program
    /// counter is at the gate.
    pub fn step(
        &mut self,
        io: &mut dyn ProgramIo,
        mut observer: Option<&mut dyn ExecObserver>,
    ) -> Result<StepInfo, SimBreak> {
        if self.door_unlocked {
            return Err(SimBreak::DoorUnlocked);
        }
        if self.is_cpu_off() {
            return Err(SimBreak::CpuOff);
        }
        let pc = self.regs.pc();
        let mut consumed_input = false;
        if pc == CALL_GATE {
            let effect = gate::service(
                &mut self.regs,
                &mut self.mem,
                self.input_mode,
                io,
            )?;
            consumed_input = effect.consumed_input;
            self.door_unlocked |= effect.door_unlocked;
        }
        let instruction =
            Instruction::decode(&self.mem, pc).map_err(SimErr::Decode)?;
        trace!("{pc:04x}: {}", instruction.format(pc, true));
        self.insn_count += 1;
        let next_pc = pc.wrapping_add(instruction.size);
        let fallthrough = pc.wrapping_add(2);
        self.regs.set_pc(fallthrough);
        let collapsed = self.try_collapse_countdown(
            pc,
            &instruction,
            observer.as_deref_mut().map(|o| o as &mut dyn ExecObserver),
        )?;
        if !collapsed {
            if let Some(observer) = observer {
                observer
                    .on_execute(self, pc, &instruction)
                    .map_err(SimErr::Io)?;
            }
            self.execute(&instruction, next_pc);
        }
        let new_pc = self.regs.pc();
        let flow = if new_pc == fallthrough {
            self.regs.set_pc(next_pc);
            Flow::Sequential
        } else {
            self.block_start = new_pc;
            if instruction.is_call() {
                self.call_stack.push(pc, new_pc);
                Flow::Call
            } else if instruction.is_ret() {
                self.call_stack.pop();
                Flow::Return
            } else {
                Flow::Branch
            }
        };
        Ok(StepInfo { pc, flow, consumed_input })
    }
}

impl SimProc for Msp430 {
    fn description(&self) -> String {
        "MSP430".to_string()
    }

    fn disassemble(&self, addr: u16) -> (u16, String) {
        match Instruction::decode(&self.mem, addr) {
            Ok(instruction) => {
                (instruction.size, instruction.format(addr, false))
            }
            Err(_) => (2, "Failed to disassemble.".to_string()),
        }
    }

    fn pc(&self) -> u16 {
        self.regs.pc()
    }

    fn set_pc(&mut self, addr: u16) {
        self.regs.set_pc(addr);
    }

    fn register_names(&self) -> &'static [&'static str] {
        &REGISTER_NAMES
    }

    fn get_register(&self, name: &str) -> Option<u16> {
        register_number(name).map(|reg| self.regs.get(reg))
    }

    fn set_register(&mut self, name: &str, value: u16) -> bool {
        match register_number(name) {
            Some(reg) => {
                self.regs.set(reg, value);
                true
            }
            None => false,
        }
    }

    fn step(
        &mut self,
        io: &mut dyn ProgramIo,
        observer: Option<&mut dyn ExecObserver>,
    ) -> Result<StepInfo, SimBreak> {
        Msp430::step(self, io, observer)
    }
}

//===========================================================================//

fn width_mask(is_byte: bool) -> u16 {
    if is_byte { 0x00ff } else { 0xffff }
}

fn width_bits(is_byte: bool) -> u16 {
    if is_byte { 8 } else { 16 }
}

//===========================================================================//


//===========================================================================//
