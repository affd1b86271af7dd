use super::breakpoint::BreakpointSet;
use super::cmd::{COMMAND_HELP, Command};
use crate::bus::Ram64k;
use crate::dis::msp430::{REG_SP, disassemble, register_name};
use crate::proc::{
    ExecObserver, Flow, InputMode, Msp430, ProgramIo, SimBreak, SimErr,
};
use crate::trace::Tracer;
use crossterm::style::{Color, Stylize};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

//===========================================================================//

/// How far past the program counter the prompt's disassembly extends.
const DISPLAY_WINDOW: u32 = 10;

/// How many bytes on either side of an address a memory view shows.
const MEM_RADIUS: u16 = 16;

/// A tracer whose destination is chosen at runtime.
pub type TraceSink = Tracer<Box<dyn Write>>;

//===========================================================================//

/// Settings for a debugging session.
#[derive(Clone, Debug)]
pub struct DebuggerOptions {
    /// Whether to highlight output with terminal colors.
    pub color: bool,
    /// Whether `add #-1, Rn; jnz $-2` countdown loops run as one step.
    pub collapse_countdowns: bool,
    /// How program input is interpreted at first.
    pub input_mode: InputMode,
    /// Registers whose surrounding memory is shown at every prompt.
    pub tracked_registers: Vec<u8>,
}

impl Default for DebuggerOptions {
    fn default() -> DebuggerOptions {
        DebuggerOptions {
            color: true,
            collapse_countdowns: true,
            input_mode: InputMode::Text,
            tracked_registers: vec![REG_SP],
        }
    }
}

/// Why a debugging session ended.
#[derive(Debug)]
pub enum Outcome {
    /// The program halted by setting the CPUOFF bit.
    CpuOff,
    /// The program unlocked the door.
    DoorUnlocked,
    /// Debugger commands or program input ran out.
    EndOfInput,
    /// The processor could not continue.
    Fault(SimErr),
}

enum Resume {
    Run,
    Restart,
    Quit,
}

//===========================================================================//

/// An interactive debugger driving a single [`Msp430`].
///
/// The debugger prompts for commands before the first instruction, after
/// every breakpoint hit, when a requested number of steps has run, when a
/// `finish` completes, and after the program reads input.
pub struct Debugger {
    image: Ram64k,
    cpu: Msp430,
    collapse_countdowns: bool,
    color: bool,
    breakpoints: BreakpointSet,
    tracked: BTreeSet<u8>,
    step_count: u64,
    finish_depth: Option<u64>,
    prev_input: Option<String>,
    resume_gate: bool,
    tracer: Option<TraceSink>,
}

impl Debugger {
    /// Returns a debugger for a program whose initial memory is `image`.
    pub fn new(image: Ram64k, options: DebuggerOptions) -> Debugger {
        let mut cpu = Msp430::new(image.clone());
        cpu.set_collapse_countdowns(options.collapse_countdowns);
        cpu.set_input_mode(options.input_mode);
        Debugger {
            image,
            cpu,
            collapse_countdowns: options.collapse_countdowns,
            color: options.color,
            breakpoints: BreakpointSet::new(),
            tracked: options.tracked_registers.into_iter().collect(),
            step_count: 1,
            finish_depth: None,
            prev_input: None,
            resume_gate: false,
            tracer: None,
        }
    }

    /// Returns the simulated processor.
    pub fn cpu(&self) -> &Msp430 {
        &self.cpu
    }

    /// Returns the simulated processor, mutably.
    pub fn cpu_mut(&mut self) -> &mut Msp430 {
        &mut self.cpu
    }

    /// Returns the breakpoint set.
    pub fn breakpoints(&self) -> &BreakpointSet {
        &self.breakpoints
    }

    /// Returns the breakpoint set, mutably.
    pub fn breakpoints_mut(&mut self) -> &mut BreakpointSet {
        &mut self.breakpoints
    }

    /// Starts writing an execution trace to `sink`, replacing (and
    /// finishing) any trace already in progress.
    pub fn set_tracer(&mut self, sink: Box<dyn Write>) -> io::Result<()> {
        self.stop_tracing()?;
        self.tracer = Some(Tracer::new(sink));
        Ok(())
    }

    /// Finishes and closes the current trace, if any.
    pub fn stop_tracing(&mut self) -> io::Result<()> {
        match self.tracer.take() {
            Some(mut tracer) => tracer.finish(),
            None => Ok(()),
        }
    }

    /// Runs the program until it halts, reading debugger commands from
    /// `commands` and writing debugger output to `out`.  Program I/O goes
    /// through `io`.  Errors are only returned for failures of the
    /// debugger's own streams; problems with the program are reported
    /// through the [`Outcome`].
    pub fn run(
        &mut self,
        commands: &mut dyn BufRead,
        out: &mut dyn Write,
        io: &mut dyn ProgramIo,
    ) -> io::Result<Outcome> {
        let outcome = self.run_loop(commands, out, io)?;
        self.stop_tracing()?;
        out.flush()?;
        Ok(outcome)
    }

    fn run_loop(
        &mut self,
        commands: &mut dyn BufRead,
        out: &mut dyn Write,
        io: &mut dyn ProgramIo,
    ) -> io::Result<Outcome> {
        loop {
            if self.cpu.is_door_unlocked() {
                self.report_count(out)?;
                return Ok(Outcome::DoorUnlocked);
            }
            if self.cpu.is_cpu_off() {
                writeln!(out, "<CPUOFF bit set. Exiting.>")?;
                self.report_count(out)?;
                return Ok(Outcome::CpuOff);
            }
            let pc = self.cpu.registers().pc();
            let step_count = self.step_count;
            self.step_count = self.step_count.saturating_sub(1);
            let resuming = std::mem::take(&mut self.resume_gate);
            let hit = !resuming && self.breakpoints.check(pc, &self.cpu);
            if hit || step_count == 1 {
                match self.prompt(commands, out)? {
                    Resume::Run => {}
                    Resume::Restart => continue,
                    Resume::Quit => {
                        writeln!(out, "EOF received. Bye!")?;
                        return Ok(Outcome::EndOfInput);
                    }
                }
            }
            let observer = self
                .tracer
                .as_mut()
                .map(|tracer| tracer as &mut dyn ExecObserver);
            match self.cpu.step(io, observer) {
                Ok(info) => {
                    if info.consumed_input {
                        self.step_count = 1;
                    }
                    self.follow_flow(info.flow);
                }
                Err(SimBreak::CpuOff | SimBreak::DoorUnlocked) => {}
                Err(SimBreak::EndOfInput) => {
                    writeln!(out, "EOF received. Bye!")?;
                    return Ok(Outcome::EndOfInput);
                }
                Err(SimBreak::InputCancelled) => {
                    debug!("program input cancelled at {pc:04x}");
                    self.step_count = 1;
                    self.resume_gate = true;
                }
                Err(SimBreak::Fault(error)) => {
                    writeln!(out, "<Fault: {error}>")?;
                    self.report_count(out)?;
                    return Ok(Outcome::Fault(error));
                }
            }
        }
    }

    fn follow_flow(&mut self, flow: Flow) {
        let Some(depth) = self.finish_depth else { return };
        match flow {
            Flow::Call => self.finish_depth = Some(depth + 1),
            Flow::Return if depth == 0 => {
                self.finish_depth = None;
                self.step_count = 1;
            }
            Flow::Return => self.finish_depth = Some(depth - 1),
            Flow::Branch | Flow::Sequential => {}
        }
    }

    fn report_count(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "<Executed {} instructions.>", self.cpu.insn_count())
    }

    fn prompt(
        &mut self,
        commands: &mut dyn BufRead,
        out: &mut dyn Write,
    ) -> io::Result<Resume> {
        loop {
            self.display_state(out)?;
            write!(out, "> ")?;
            out.flush()?;
            let mut line = String::new();
            if commands.read_line(&mut line)? == 0 {
                return Ok(Resume::Quit);
            }
            let mut line = line.trim_end_matches(['\r', '\n']).to_string();
            if line.trim().is_empty() {
                match &self.prev_input {
                    Some(prev) => line = prev.clone(),
                    None => continue,
                }
            }
            self.prev_input = Some(line.clone());
            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(error) => {
                    writeln!(out, "{error}")?;
                    continue;
                }
            };
            if let Some(resume) = self.execute(command, out)? {
                return Ok(resume);
            }
        }
    }

    /// Carries out one command.  Returns `None` if the debugger should keep
    /// prompting.
    fn execute(
        &mut self,
        command: Command,
        out: &mut dyn Write,
    ) -> io::Result<Option<Resume>> {
        match command {
            Command::Backtrace => {
                writeln!(out, "Backtrace:")?;
                let pc = self.cpu.registers().pc();
                let frames = self.cpu.call_stack().backtrace(pc);
                for (index, (location, function)) in frames.iter().enumerate()
                {
                    writeln!(out, "#{index}\t{location:x} in {function:x}")?;
                }
                writeln!(out)?;
            }
            Command::Break { addr, condition } => {
                self.breakpoints.set_permanent(addr, condition);
            }
            Command::Breakpoints => {
                writeln!(out, "List of breakpoints currently set:")?;
                for (addr, breakpoint) in self.breakpoints.iter() {
                    write!(out, "\t{addr:x}")?;
                    if let Some(condition) = &breakpoint.condition {
                        write!(out, " if {}", condition.source)?;
                    }
                    if let Some(hits) = breakpoint.hits_left {
                        write!(out, " ({hits} left)")?;
                    }
                    writeln!(out)?;
                }
            }
            Command::Continue => return Ok(Some(Resume::Run)),
            Command::Disas(addr) => {
                let limit = u32::from(addr) + DISPLAY_WINDOW;
                for (addr, text) in
                    disassemble(self.cpu.memory(), addr, limit, true)
                {
                    writeln!(out, "{addr:x}: {text}")?;
                }
            }
            Command::Dump(path) => {
                if let Err(error) = self.dump_memory(&path) {
                    let path = path.display();
                    writeln!(out, "Could not write {path}: {error}")?;
                }
            }
            Command::Finish => {
                self.finish_depth = Some(0);
                return Ok(Some(Resume::Run));
            }
            Command::Help => {
                for (usage, description) in COMMAND_HELP {
                    writeln!(out, "{usage:<24}{description}")?;
                }
            }
            Command::InsnCount => writeln!(out, "{}", self.cpu.insn_count())?,
            Command::Mem(addr) => {
                self.display_mem(out, addr)?;
                writeln!(out)?;
            }
            Command::Print(expr) => {
                writeln!(out, "{}", expr.evaluate(&self.cpu))?;
            }
            Command::Reset => {
                self.reset();
                return Ok(Some(Resume::Restart));
            }
            Command::Set(assignment) => assignment.apply(&mut self.cpu),
            Command::SetInputMode(mode) => {
                self.cpu.set_input_mode(mode);
                let name = match mode {
                    InputMode::Hex => "hexadecimal",
                    InputMode::Text => "text",
                };
                writeln!(out, "Program input will now be treated as {name}.")?;
            }
            Command::Step(count) => {
                self.step_count = count;
                return Ok(Some(Resume::Run));
            }
            Command::TBreak { addr, count } => {
                self.breakpoints.set_temporary(addr, count);
            }
            Command::Trace(Some(path)) => {
                let sink = match File::create(&path) {
                    Ok(file) => BufWriter::new(file),
                    Err(error) => {
                        writeln!(
                            out,
                            "Could not open {}: {error}",
                            path.display()
                        )?;
                        return Ok(None);
                    }
                };
                self.set_tracer(Box::new(sink))?;
                info!("tracing to {}", path.display());
            }
            Command::Trace(None) => self.stop_tracing()?,
            Command::Track(reg) => {
                self.tracked.insert(reg);
            }
            Command::Unbreak(None) => self.breakpoints.clear(),
            Command::Unbreak(Some(addr)) => {
                if !self.breakpoints.remove(addr) {
                    writeln!(out, "No breakpoint at {addr:x}.")?;
                }
            }
            Command::Untrack(reg) => {
                self.tracked.remove(&reg);
            }
        }
        Ok(None)
    }

    fn dump_memory(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.cpu.memory().dump(&mut writer)?;
        writer.flush()
    }

    /// Reloads the original image and rewinds to the entry point.
    /// Breakpoints, tracked registers, the input mode, and any trace in
    /// progress are kept.
    fn reset(&mut self) {
        let mode = self.cpu.input_mode();
        self.cpu = Msp430::new(self.image.clone());
        self.cpu.set_collapse_countdowns(self.collapse_countdowns);
        self.cpu.set_input_mode(mode);
        self.step_count = 1;
        self.finish_depth = None;
        self.resume_gate = false;
        info!("reset to entry point {:04x}", self.cpu.registers().pc());
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn display_state(&self, out: &mut dyn Write) -> io::Result<()> {
        let pc = self.cpu.registers().pc();
        let start = self.cpu.block_start().min(pc);
        let limit = u32::from(pc) + DISPLAY_WINDOW;
        for (addr, text) in disassemble(self.cpu.memory(), start, limit, true)
        {
            let line = format!("{addr:x}: {text}");
            if addr == pc {
                writeln!(out, "{}", self.paint(&line, Color::Green))?;
            } else {
                writeln!(out, "{line}")?;
            }
        }
        writeln!(out)?;
        for (index, (name, value)) in self.cpu.registers().named().enumerate()
        {
            let separator = if index % 4 == 3 { "\n" } else { "\t" };
            write!(out, "{name}: {value:04x}{separator}")?;
        }
        writeln!(out)?;
        for &reg in &self.tracked {
            let label = format!("{} >> ", register_name(reg));
            write!(out, "{}", self.paint(&label, Color::Blue))?;
            self.display_mem(out, self.cpu.registers().get(reg))?;
        }
        Ok(())
    }

    /// Shows the bytes from `addr - 16` up to `addr + 16`, grouped in pairs,
    /// with the byte at `addr` highlighted.
    fn display_mem(&self, out: &mut dyn Write, addr: u16) -> io::Result<()> {
        let start = addr.saturating_sub(MEM_RADIUS);
        let end = addr.saturating_add(MEM_RADIUS);
        write!(out, "{start:x}:")?;
        for byte_addr in start..end {
            if (byte_addr - start) % 2 == 0 {
                write!(out, " ")?;
            }
            let byte = self.cpu.memory().read_byte(byte_addr);
            let text = format!("{byte:02x}");
            if byte_addr == addr {
                write!(out, "{}", self.paint(&text, Color::Red))?;
            } else {
                write!(out, "{text}")?;
            }
        }
        writeln!(out)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Debugger, DebuggerOptions, Outcome};
    use crate::bus::Ram64k;
    use crate::proc::{InputMode, ScriptedIo};
    use std::io::Cursor;

    const START: u16 = 0x4400;

    /// `mov #2, r4; add r4, r4; bis #0x10, sr`
    const DOUBLE: &[u16] = &[0x4324, 0x5404, 0xd032, 0x0010];

    /// `mov #0x4000, sp; call #0x440c; bis #0x10, sr; mov #2, r4; ret`
    const CALL: &[u16] =
        &[0x4031, 0x4000, 0x12b0, 0x440c, 0xd032, 0x0010, 0x4324, 0x4130];

    /// `mov #3, r5; sub #1, r5; jnz $-2; bis #0x10, sr`
    const LOOP: &[u16] = &[0x4035, 0x0003, 0x8315, 0x23fe, 0xd032, 0x0010];

    fn debugger(code: &[u16]) -> Debugger {
        let mut image = Ram64k::from_words(START, code);
        image.write_word(0xfffe, START);
        let options = DebuggerOptions { color: false, ..Default::default() };
        Debugger::new(image, options)
    }

    fn run_script(
        db: &mut Debugger,
        script: &str,
        io: &mut ScriptedIo,
    ) -> (Outcome, String) {
        let mut commands = Cursor::new(script.as_bytes());
        let mut out = Vec::<u8>::new();
        let outcome = db.run(&mut commands, &mut out, io).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    fn prompt_count(output: &str) -> usize {
        output.matches("\n> ").count()
    }

    #[test]
    fn continue_until_cpuoff() {
        let mut db = debugger(DOUBLE);
        let (outcome, output) =
            run_script(&mut db, "c\n", &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(output.ends_with(
            "<CPUOFF bit set. Exiting.>\n<Executed 3 instructions.>\n"
        ));
        assert_eq!(db.cpu().registers().get(4), 4);
        assert_eq!(prompt_count(&output), 1);
    }

    #[test]
    fn end_of_commands() {
        let mut db = debugger(DOUBLE);
        let (outcome, output) =
            run_script(&mut db, "", &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::EndOfInput));
        assert!(output.ends_with("> EOF received. Bye!\n"));
        assert_eq!(db.cpu().insn_count(), 0);
    }

    #[test]
    fn prompt_shows_registers_and_tracked_memory() {
        let mut db = debugger(DOUBLE);
        let (_, output) = run_script(&mut db, "", &mut ScriptedIo::new());
        assert!(output.starts_with("4400: "));
        let first_row = "\n\npc: 4400\tsp: 0000\tsr: 0000\tcg: 0000\n";
        let last_row = "r12: 0000\tr13: 0000\tr14: 0000\tr15: 0000\n";
        assert!(output.contains(first_row));
        assert!(output.contains(last_row));
        assert!(output.contains(
            "\nsp >> 0: 0000 0000 0000 0000 0000 0000 0000 0000\n> "
        ));
    }

    #[test]
    fn breakpoint_and_print() {
        let mut db = debugger(DOUBLE);
        let script = "break 4402\nc\nprint r4\nprint r4 == 2\nc\n";
        let (outcome, output) =
            run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(output.contains("\n> 2 (0x2)\n"));
        assert!(output.contains("\n> true\n"));
        assert_eq!(prompt_count(&output), 5);
    }

    #[test]
    fn permanent_breakpoint_hits_every_pass() {
        let mut db = debugger(LOOP);
        let script = "break 4404\nc\nc\nc\nc\n";
        let (outcome, _) = run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(db.breakpoints().get(0x4404).is_some());
    }

    #[test]
    fn temporary_breakpoint_hits_once() {
        let mut db = debugger(LOOP);
        let (outcome, output) =
            run_script(&mut db, "tbreak 4404\nc\nc\n", &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert_eq!(prompt_count(&output), 3);
        assert!(db.breakpoints().is_empty());
    }

    #[test]
    fn conditional_breakpoint() {
        let mut db = debugger(LOOP);
        let script = "break 4404 if r5 == 1\nc\nprint r5\nc\n";
        let (outcome, output) =
            run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(output.contains("\n> 1 (0x1)\n"));
    }

    #[test]
    fn list_breakpoints() {
        let mut db = debugger(LOOP);
        let script = "break 4404 if r5 == 1\ntbreak 4408 2\nbreakpoints\n";
        let (_, output) = run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(output.contains(
            "List of breakpoints currently set:\n\
             \t4404 if r5 == 1\n\t4408 (2 left)\n"
        ));
    }

    #[test]
    fn step_and_repeat() {
        let mut db = debugger(LOOP);
        let script = "s\n\ninsncount\ns 3\ninsncount\nc\n";
        let (outcome, output) =
            run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(output.contains("\n> 2\n"));
        assert!(output.contains("\n> 5\n"));
        assert!(output.ends_with("<Executed 8 instructions.>\n"));
    }

    #[test]
    fn finish_returns_to_caller() {
        let mut db = debugger(CALL);
        let script = "break 440c\nc\nbt\nf\nprint pc\nc\n";
        let (outcome, output) =
            run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(
            output.contains("Backtrace:\n#0\t440c in 440c\n#1\t4404 in 4400\n")
        );
        assert!(output.contains("\n> 17416 (0x4408)\n"));
    }

    #[test]
    fn set_changes_state() {
        let mut db = debugger(DOUBLE);
        let script = "set pc = 0x4404\nset byte[0x2000] = 0x41\nc\n";
        let (outcome, output) =
            run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(output.ends_with("<Executed 1 instructions.>\n"));
        assert_eq!(db.cpu().memory().read_byte(0x2000), 0x41);
    }

    #[test]
    fn bad_commands_are_reported() {
        let mut db = debugger(DOUBLE);
        let script = "frobnicate\nbreak\nprint r4 + zero\nprint 1 + )\n\
                      set r4 5\nc\n";
        let (outcome, output) =
            run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(output.contains("\n> Unrecognized command\n"));
        assert!(output.contains("\n> usage: break ADDR [if EXPR]\n"));
        assert!(output.contains("error: Cannot add int and bool\n"));
        assert!(output.contains("error: unexpected ')'\n"));
        assert!(output.contains("error: unexpected int literal\n"));
        assert!(!output.contains("unexpected end of input"));
    }

    #[test]
    fn mem_view() {
        let mut db = debugger(DOUBLE);
        let (_, output) =
            run_script(&mut db, "mem 4400\n", &mut ScriptedIo::new());
        assert!(output.contains(
            "\n> 43f0: 0000 0000 0000 0000 0000 0000 0000 0000 \
             2443 0454 32d0 1000 0000 0000 0000 0000\n\n"
        ));
    }

    #[test]
    fn reset_restarts_at_entry() {
        let mut db = debugger(DOUBLE);
        let script = "s\nreset\ninsncount\nc\n";
        let (outcome, output) =
            run_script(&mut db, script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        assert!(output.contains("\n> 0\n"));
        assert!(output.ends_with("<Executed 3 instructions.>\n"));
    }

    #[test]
    fn input_mode_commands() {
        let mut db = debugger(DOUBLE);
        let (_, output) =
            run_script(&mut db, "hex\ntext\nhex\n", &mut ScriptedIo::new());
        assert!(output.contains(
            "Program input will now be treated as hexadecimal.\n"
        ));
        assert!(
            output.contains("Program input will now be treated as text.\n")
        );
        assert_eq!(db.cpu().input_mode(), InputMode::Hex);
    }

    #[test]
    fn cancelled_input_prompts_again() {
        let mut db = debugger(&[0xd032, 0x0010]);
        {
            let cpu = db.cpu_mut();
            cpu.registers_mut().set_pc(0x0010);
            cpu.registers_mut().set(2, 0x8200);
            cpu.registers_mut().set_sp(0x3ff0);
            cpu.memory_mut().write_word(0x3ff0, START);
            cpu.memory_mut().write_word(0x3ff8, 0x2000);
            cpu.memory_mut().write_word(0x3ffa, 0x0010);
        }
        let mut io = ScriptedIo::new();
        io.push_cancel();
        io.push_line("hi");
        let script = "c\nc\nprint byte[0x2000]\nc\n";
        let (outcome, output) = run_script(&mut db, script, &mut io);
        assert!(matches!(outcome, Outcome::CpuOff));
        assert_eq!(io.prompts.len(), 2);
        assert!(output.contains("\n> 104 (0x68)\n"));
        assert_eq!(db.cpu().memory().read_byte(0x2002), 0);
    }

    #[test]
    fn trace_to_file() {
        let path = std::env::temp_dir()
            .join(format!("msp430db-trace-{}.txt", std::process::id()));
        let mut db = debugger(DOUBLE);
        let script = format!("trace {}\nc\n", path.display());
        let (outcome, _) =
            run_script(&mut db, &script, &mut ScriptedIo::new());
        assert!(matches!(outcome, Outcome::CpuOff));
        let trace = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(trace.lines().count(), 3);
        assert!(trace.starts_with("4400 "));
    }
}

//===========================================================================//
