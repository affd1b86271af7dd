//! Facilities for writing a line-per-instruction execution trace.

use crate::dis::msp430::{Instruction, Operands, Operation, format_offset};
use crate::proc::{ExecObserver, Msp430};
use std::collections::VecDeque;
use std::io::{self, Write};

//===========================================================================//

/// How many recently traced instructions are remembered when deciding
/// whether a backward jump closes a simple loop.
const HISTORY_LEN: usize = 0x11;

/// Backward jumps at most this many bytes long are loop candidates.
const MAX_LOOP_SPAN: i16 = 0x20;

//===========================================================================//

struct ActiveLoop {
    header: u16,
    end: u16,
    count: u64,
}

/// An [`ExecObserver`] that writes one line per executed instruction, of the
/// form `PPPP name\toperands [values]`.
///
/// Tight loops are compressed: when a short backward conditional jump closes
/// a loop whose body contains no other jump, the first pass is traced
/// normally and each further pass only increments a counter.  Once execution
/// leaves the loop, a `<loop N times>` line is written.
pub struct Tracer<W: Write> {
    out: W,
    history: VecDeque<(u16, bool)>,
    active_loop: Option<ActiveLoop>,
}

impl<W: Write> Tracer<W> {
    /// Returns a tracer that writes to `out`.
    pub fn new(out: W) -> Tracer<W> {
        Tracer {
            out,
            history: VecDeque::with_capacity(HISTORY_LEN),
            active_loop: None,
        }
    }

    /// Writes the summary line for any loop still being compressed, then
    /// flushes the output.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(active) = self.active_loop.take() {
            writeln!(self.out, "<loop {} times>", active.count)?;
        }
        self.out.flush()
    }

    /// Finishes the trace and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.finish()?;
        Ok(self.out)
    }

    /// Returns true if the instruction at `pc` is swallowed by the loop
    /// currently being compressed.  Writes the loop summary if `pc` has left
    /// the loop.
    fn inside_loop(&mut self, pc: u16) -> io::Result<bool> {
        if let Some(active) = &mut self.active_loop {
            if pc == active.header {
                active.count += 1;
                return Ok(true);
            }
            if active.header < pc && pc <= active.end {
                return Ok(true);
            }
            writeln!(self.out, "<loop {} times>", active.count)?;
            self.active_loop = None;
        }
        Ok(false)
    }

    fn detect_loop(&mut self, pc: u16, offset: i16) {
        if !(-MAX_LOOP_SPAN..0).contains(&offset) {
            return;
        }
        let target = pc.wrapping_add(offset as u16);
        for &(op_pc, is_jump) in self.history.iter().rev() {
            if op_pc == target {
                break;
            }
            if is_jump {
                return;
            }
        }
        self.active_loop =
            Some(ActiveLoop { header: target, end: pc, count: 0 });
    }

    fn emit(&mut self, pc: u16, is_jump: bool, text: &str) -> io::Result<()> {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back((pc, is_jump));
        writeln!(self.out, "{pc:04x} {text}")
    }
}

impl<W: Write> ExecObserver for Tracer<W> {
    fn on_execute(
        &mut self,
        cpu: &Msp430,
        pc: u16,
        instruction: &Instruction,
    ) -> io::Result<()> {
        if self.inside_loop(pc)? {
            return Ok(());
        }
        if let Operands::Jump(offset) = instruction.operands {
            if instruction.operation != Operation::Jmp {
                self.detect_loop(pc, offset);
            }
            let text = jump_text(instruction.operation.mnemonic(), pc, offset);
            return self.emit(pc, true, &text);
        }
        let text = operation_text(cpu, instruction);
        self.emit(pc, false, &text)
    }

    fn on_countdown(
        &mut self,
        _cpu: &Msp430,
        pc: u16,
        remaining: u16,
    ) -> io::Result<()> {
        if self.inside_loop(pc)? {
            return Ok(());
        }
        let name = format!("jnz_peephole_{remaining}");
        self.emit(pc, true, &jump_text(&name, pc, -2))
    }
}

//===========================================================================//

fn jump_text(name: &str, pc: u16, offset: i16) -> String {
    let target = pc.wrapping_add(offset as u16);
    format!("{name}\t{} [{target:04x}]", format_offset(offset))
}

/// Renders a non-jump instruction along with the current value of each
/// operand that isn't a literal, as `value (register)`.
fn operation_text(cpu: &Msp430, instruction: &Instruction) -> String {
    let (name, operands) = instruction.emulated();
    let suffix = if instruction.is_byte { ".b" } else { "" };
    let mut names = Vec::with_capacity(operands.len());
    let mut values = Vec::new();
    for operand in &operands {
        let text = operand.to_string();
        if !text.starts_with('#') {
            let value = cpu.peek_operand(operand, instruction.is_byte);
            let reg = cpu.registers().get(operand.reg);
            values.push(format!("{value:04x} ({reg:04x})"));
        }
        names.push(text);
    }
    let mut text = format!("{name}{suffix}\t{}", names.join(", "));
    if !values.is_empty() {
        text.push_str(&format!(" [{}]", values.join(", ")));
    }
    text
}

//===========================================================================//


//===========================================================================//
