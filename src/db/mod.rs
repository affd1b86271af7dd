//! Facilities for interactively debugging a simulated MSP430 program.

mod binop;
mod breakpoint;
mod cmd;
mod debugger;
mod expr;
mod load;
mod value;

pub use breakpoint::{Breakpoint, BreakpointSet, Condition};
pub use cmd::{COMMAND_HELP, Command, CommandError};
pub use debugger::{Debugger, DebuggerOptions, Outcome, TraceSink};
pub use expr::{DbAssignment, DbExpr, DbTarget, MemorySpace};
pub use load::load_binary;
pub use value::{DbType, DbValue};

//===========================================================================//
