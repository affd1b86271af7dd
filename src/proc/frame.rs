use log::debug;

//===========================================================================//

/// One entry of the shadow call stack: the address of a `call` instruction
/// and the address it called.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Frame {
    /// The address of the `call` instruction.
    pub callsite: u16,
    /// The address of the called function.
    pub target: u16,
}

//===========================================================================//

/// A shadow of the program's call stack, maintained by watching `call` and
/// `ret` instructions rather than by reading the stack in memory.  A program
/// that manipulates its return addresses directly will desynchronize it; the
/// shadow stack is best-effort and only used for backtraces and `finish`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallStack {
    entry: u16,
    frames: Vec<Frame>,
}

impl CallStack {
    /// Returns an empty call stack whose outermost function starts at
    /// `entry`.
    pub fn new(entry: u16) -> CallStack {
        CallStack { entry, frames: Vec::new() }
    }

    /// Records a call from `callsite` to `target`.
    pub fn push(&mut self, callsite: u16, target: u16) {
        self.frames.push(Frame { callsite, target });
    }

    /// Records a return.  Returns the frame that was exited, or `None` if the
    /// stack was already empty (in which case the desync is logged and the
    /// stack is left unchanged).
    pub fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop();
        if frame.is_none() {
            debug!("return with an empty shadow call stack");
        }
        frame
    }

    /// Returns the number of calls that haven't yet returned.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns the start address of the function currently executing.
    pub fn current_function(&self) -> u16 {
        self.frames.last().map_or(self.entry, |frame| frame.target)
    }

    /// Returns the call stack as (location, function) pairs, innermost
    /// first.  The innermost location is `pc`; each outer location is the
    /// callsite that entered the next-inner function.
    pub fn backtrace(&self, pc: u16) -> Vec<(u16, u16)> {
        let mut functions = Vec::with_capacity(self.frames.len() + 1);
        functions.push(self.entry);
        functions.extend(self.frames.iter().map(|frame| frame.target));
        let mut locations: Vec<u16> =
            self.frames.iter().map(|frame| frame.callsite).collect();
        locations.push(pc);
        locations.into_iter().zip(functions).rev().collect()
    }
}

//===========================================================================//


//===========================================================================//
