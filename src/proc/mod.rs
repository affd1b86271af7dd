//! Facilities for simulating an MSP430 processor.

mod frame;
mod gate;
mod msp430;
mod regs;

pub use frame::{CallStack, Frame};
pub use gate::{CALL_GATE, InputMode, ProgramIo, ScriptedIo, StdProgramIo};
pub use msp430::{Flow, Msp430, StepInfo};
pub use regs::{Flag, Registers, SR_CPUOFF, SR_GATE_ENABLE, register_number};

use crate::dis::msp430::{DecodeError, Instruction};
use std::io;
use thiserror::Error;

//===========================================================================//

/// An unrecoverable error raised while executing an instruction.
#[derive(Debug, Error)]
pub enum SimErr {
    /// The word at the program counter could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The program requested a call-gate interrupt that isn't implemented.
    #[error("unknown interrupt: {0:#04x}")]
    UnknownInterrupt(u8),
    /// Reading program input or writing program output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

//===========================================================================//

/// A condition that pauses or halts the simulation.
#[derive(Debug)]
pub enum SimBreak {
    /// The CPUOFF bit of the status register is set, so the processor is
    /// halted.
    CpuOff,
    /// The program unlocked the door; the simulation is over.
    DoorUnlocked,
    /// The program asked for input, but the input stream has ended.
    EndOfInput,
    /// The program asked for input, but the user cancelled the prompt.  The
    /// processor state is unchanged, so stepping again re-issues the prompt.
    InputCancelled,
    /// The processor cannot continue.
    Fault(SimErr),
}

impl From<SimErr> for SimBreak {
    fn from(error: SimErr) -> SimBreak {
        SimBreak::Fault(error)
    }
}

//===========================================================================//

/// Receives a notification for each instruction the processor executes.
pub trait ExecObserver {
    /// Called just before `instruction` (located at `pc`) executes.  The
    /// processor's program counter has already been advanced past the
    /// instruction word, but no operand has been resolved yet.
    fn on_execute(
        &mut self,
        cpu: &Msp430,
        pc: u16,
        instruction: &Instruction,
    ) -> io::Result<()>;

    /// Called instead of `on_execute` when the `jnz $-2` at `pc` closes a
    /// countdown loop that the processor collapses into a single step.
    /// `remaining` is the counter value before the collapse.
    fn on_countdown(
        &mut self,
        cpu: &Msp430,
        pc: u16,
        remaining: u16,
    ) -> io::Result<()>;
}

//===========================================================================//

/// A simulated processor.
pub trait SimProc {
    /// Returns a human-readable description of this simulated processor.
    fn description(&self) -> String;

    /// Disassembles the instruction starting at the given address, returning
    /// the length of the instruction in bytes, and a human-readable string
    /// with the assembly code for that instruction.
    fn disassemble(&self, addr: u16) -> (u16, String);

    /// Returns the current address of the program counter.
    fn pc(&self) -> u16;

    /// Sets the current address of the program counter.
    fn set_pc(&mut self, addr: u16);

    /// Returns the names of this processor's registers.
    fn register_names(&self) -> &'static [&'static str];

    /// Returns the current value of the specified register, or `None` if the
    /// register name is invalid.
    fn get_register(&self, name: &str) -> Option<u16>;

    /// Sets the current value of the specified register.  Returns false if
    /// the register name is invalid.
    fn set_register(&mut self, name: &str, value: u16) -> bool;

    /// Advances this processor by one instruction.
    fn step(
        &mut self,
        io: &mut dyn ProgramIo,
        observer: Option<&mut dyn ExecObserver>,
    ) -> Result<StepInfo, SimBreak>;
}

//===========================================================================//
