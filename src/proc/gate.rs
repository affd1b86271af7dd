use super::regs::{Registers, SR_GATE_ENABLE};
use super::{SimBreak, SimErr};
use crate::bus::Ram64k;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::terminal;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

//===========================================================================//

/// The address of the call gate.  Executing at this address hands control to
/// the host, which services the interrupt selected by the status register.
pub const CALL_GATE: u16 = 0x0010;

/// `ret`, which the gate writes at its own address so that execution returns
/// to the caller afterwards.
const RET_WORD: u16 = 0x4130;

const INT_PUTCHAR: u8 = 0x00;
const INT_GETS: u8 = 0x02;
const INT_DEP: u8 = 0x20;
const INT_HSM1: u8 = 0x7d;
const INT_HSM2: u8 = 0x7e;
const INT_UNLOCK: u8 = 0x7f;

//===========================================================================//

/// How program input typed at the `gets` prompt is interpreted.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum InputMode {
    /// Input is stored as raw bytes followed by a NUL terminator.
    #[default]
    Text,
    /// Input is a string of hex digit pairs, each stored as one byte.
    Hex,
}

impl InputMode {
    fn prompt_name(self) -> &'static str {
        match self {
            InputMode::Text => "char",
            InputMode::Hex => "hex",
        }
    }
}

//===========================================================================//

/// The host side of the call gate: where program output goes and where
/// program input comes from.
pub trait ProgramIo {
    /// Emits one byte of program output.
    fn write_output(&mut self, byte: u8) -> io::Result<()>;

    /// Shows `prompt` and reads one line of program input, without its line
    /// terminator.  Returns `Ok(None)` at end of input.  An error of kind
    /// `Interrupted` means the user cancelled the prompt.
    fn read_input(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Shows a message from the simulator itself (not from the program).
    fn notice(&mut self, message: &str) -> io::Result<()>;
}

/// Program I/O on the process's standard input and output.  When standard
/// input is a terminal, lines are read key by key in raw mode, so that
/// Ctrl-C cancels the prompt instead of ending the process.
#[derive(Default)]
pub struct StdProgramIo {}

impl StdProgramIo {
    /// Returns a new `StdProgramIo`.
    pub fn new() -> StdProgramIo {
        StdProgramIo {}
    }
}

impl ProgramIo for StdProgramIo {
    fn write_output(&mut self, byte: u8) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&[byte])?;
        stdout.flush()
    }

    fn read_input(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        drop(stdout);
        if io::stdin().is_terminal() {
            return read_terminal_line();
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        println!("{message}");
        Ok(())
    }
}

fn read_terminal_line() -> io::Result<Option<String>> {
    terminal::enable_raw_mode()?;
    let keys = std::iter::from_fn(|| Some(next_key_event()));
    let result = read_key_line(keys, &mut io::stdout());
    terminal::disable_raw_mode()?;
    result
}

fn next_key_event() -> io::Result<KeyEvent> {
    loop {
        if let Event::Key(key) = event::read()? {
            return Ok(key);
        }
    }
}

/// Assembles one line of input from key presses, echoing it to `echo`.
/// Ctrl-C cancels with an `Interrupted` error.  Ctrl-D on an empty line, or
/// running out of keys, ends input.
pub(crate) fn read_key_line<K, W>(
    keys: K,
    echo: &mut W,
) -> io::Result<Option<String>>
where
    K: IntoIterator<Item = io::Result<KeyEvent>>,
    W: Write,
{
    let mut line = String::new();
    for key in keys {
        let key = key?;
        if key.kind == KeyEventKind::Release {
            continue;
        }
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if control => {
                write!(echo, "^C\r\n")?;
                echo.flush()?;
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "input cancelled",
                ));
            }
            KeyCode::Char('d') if control && line.is_empty() => {
                write!(echo, "\r\n")?;
                echo.flush()?;
                return Ok(None);
            }
            KeyCode::Char(ch) if !control => {
                line.push(ch);
                write!(echo, "{ch}")?;
            }
            KeyCode::Backspace => {
                if line.pop().is_some() {
                    write!(echo, "\x08 \x08")?;
                }
            }
            KeyCode::Enter => {
                write!(echo, "\r\n")?;
                echo.flush()?;
                return Ok(Some(line));
            }
            _ => {}
        }
        echo.flush()?;
    }
    Ok(None)
}

//===========================================================================//

/// Program I/O driven from memory, for tests and scripted sessions.  Input
/// lines are consumed in order; output and notices are collected.
#[derive(Debug, Default)]
pub struct ScriptedIo {
    input: VecDeque<Option<String>>,
    /// Every byte the program has written.
    pub output: Vec<u8>,
    /// Every prompt that was shown, in order.
    pub prompts: Vec<String>,
    /// Every simulator message that was shown, in order.
    pub notices: Vec<String>,
}

impl ScriptedIo {
    /// Returns a `ScriptedIo` with no queued input.
    pub fn new() -> ScriptedIo {
        ScriptedIo::default()
    }

    /// Queues a line of program input.
    pub fn push_line(&mut self, line: &str) {
        self.input.push_back(Some(line.to_string()));
    }

    /// Queues a cancelled prompt.
    pub fn push_cancel(&mut self) {
        self.input.push_back(None);
    }

    /// Returns the program output decoded as (lossy) UTF-8.
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl ProgramIo for ScriptedIo {
    fn write_output(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }

    fn read_input(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        match self.input.pop_front() {
            None => Ok(None),
            Some(Some(line)) => Ok(Some(line)),
            Some(None) => Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "input cancelled",
            )),
        }
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        self.notices.push(message.to_string());
        Ok(())
    }
}

//===========================================================================//

/// What servicing the call gate did, beyond its effect on registers and
/// memory.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct GateEffect {
    pub(crate) consumed_input: bool,
    pub(crate) door_unlocked: bool,
}

/// Services the interrupt requested at the call gate, then plants a `ret` at
/// the gate address.  The interrupt number is bits 8-14 of the status
/// register; nothing happens unless bit 15 is set.  Arguments are read from
/// the stack, starting at `sp + 8`.
pub(crate) fn service(
    regs: &mut Registers,
    mem: &mut Ram64k,
    mode: InputMode,
    io: &mut dyn ProgramIo,
) -> Result<GateEffect, SimBreak> {
    let mut effect = GateEffect::default();
    let sr = regs.sr();
    if sr & SR_GATE_ENABLE != 0 {
        let sp = regs.sp();
        let interrupt = ((sr >> 8) & 0x7f) as u8;
        match interrupt {
            INT_PUTCHAR => {
                let byte = mem.read_byte(sp.wrapping_add(8));
                io.write_output(byte).map_err(SimErr::Io)?;
            }
            INT_GETS => {
                let addr = mem.read_word(sp.wrapping_add(8));
                let max_len = mem.read_word(sp.wrapping_add(10));
                read_program_input(mem, mode, io, addr, max_len)?;
                effect.consumed_input = true;
            }
            INT_DEP | INT_HSM2 => regs.set(15, 0),
            INT_HSM1 => {
                let flag_addr = mem.read_word(sp.wrapping_add(10));
                mem.write_word(flag_addr, 0);
            }
            INT_UNLOCK => {
                io.notice("<Door unlocked!>").map_err(SimErr::Io)?;
                effect.door_unlocked = true;
            }
            _ => return Err(SimErr::UnknownInterrupt(interrupt).into()),
        }
    }
    mem.write_word(CALL_GATE, RET_WORD);
    Ok(effect)
}

fn read_program_input(
    mem: &mut Ram64k,
    mode: InputMode,
    io: &mut dyn ProgramIo,
    addr: u16,
    max_len: u16,
) -> Result<(), SimBreak> {
    let prompt = format!("(max: {max_len}; mode: {})> ", mode.prompt_name());
    loop {
        let line = match io.read_input(&prompt) {
            Ok(Some(line)) => line,
            Ok(None) => return Err(SimBreak::EndOfInput),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {
                return Err(SimBreak::InputCancelled);
            }
            Err(error) => return Err(SimErr::Io(error).into()),
        };
        let bytes = match mode {
            InputMode::Text => {
                let mut bytes = line.into_bytes();
                bytes.truncate(max_len as usize);
                bytes.push(0);
                bytes
            }
            InputMode::Hex => match parse_hex(&line) {
                Ok(mut bytes) => {
                    bytes.truncate(max_len as usize);
                    bytes
                }
                Err(message) => {
                    io.notice(message).map_err(SimErr::Io)?;
                    continue;
                }
            },
        };
        let mut dest = addr;
        for byte in bytes {
            mem.write_byte(dest, byte);
            dest = dest.wrapping_add(1);
        }
        return Ok(());
    }
}

fn parse_hex(line: &str) -> Result<Vec<u8>, &'static str> {
    let digits: Vec<u8> = line
        .bytes()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err("Hex input should have an even length.");
    }
    digits
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16);
            let lo = (pair[1] as char).to_digit(16);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok(((hi << 4) | lo) as u8),
                _ => Err(
                    "Error parsing hex input: invalid digit found in string",
                ),
            }
        })
        .collect()
}

//===========================================================================//


//===========================================================================//
