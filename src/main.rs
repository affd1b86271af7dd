use clap::{Parser, Subcommand};
use log::LevelFilter;
use msp430db::bus::Ram64k;
use msp430db::db::{Debugger, DebuggerOptions, Outcome, load_binary};
use msp430db::proc::{InputMode, Msp430, SimProc, StdProgramIo};
use simple_logger::SimpleLogger;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

//===========================================================================//

#[derive(Parser)]
#[clap(author, about, long_about = None, version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulates and debugs a memory image.
    Db {
        /// The 64 KiB memory image to load and debug.
        binary: PathBuf,
        /// The debugger script to run, or none for interactive mode.
        script: Option<PathBuf>,
        /// Writes an execution trace to this file.
        #[clap(long, value_name = "FILE")]
        trace: Option<PathBuf>,
        /// Treats program input as hex-encoded bytes.
        #[clap(long)]
        hex_input: bool,
        /// Disables colored output.
        #[clap(long)]
        no_color: bool,
        /// Executes countdown loops one iteration at a time.
        #[clap(long)]
        no_peephole: bool,
    },
    /// Disassembles a memory image.
    Dis {
        /// The 64 KiB memory image to disassemble.
        binary: PathBuf,
        /// The first address to disassemble (hex).
        #[clap(long, value_parser = parse_hex_addr, default_value = "0")]
        start: u16,
        /// The address to stop disassembling at (hex, exclusive).
        #[clap(long, value_parser = parse_hex_addr)]
        end: Option<u16>,
    },
}

fn parse_hex_addr(arg: &str) -> Result<u16, String> {
    let digits = arg.strip_prefix("0x").unwrap_or(arg);
    u16::from_str_radix(digits, 16)
        .map_err(|error| format!("invalid address {arg:?}: {error}"))
}

//===========================================================================//

fn main() -> io::Result<ExitCode> {
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()
        .map_err(io::Error::other)?;
    let cli = Cli::parse();
    match cli.command {
        Command::Db {
            binary,
            script,
            trace,
            hex_input,
            no_color,
            no_peephole,
        } => {
            let options = DebuggerOptions {
                color: !no_color && io::stdout().is_terminal(),
                collapse_countdowns: !no_peephole,
                input_mode: if hex_input {
                    InputMode::Hex
                } else {
                    InputMode::Text
                },
                ..DebuggerOptions::default()
            };
            let mut debugger = Debugger::new(load_image(&binary)?, options);
            if let Some(path) = trace {
                let file = File::create(path)?;
                debugger.set_tracer(Box::new(BufWriter::new(file)))?;
            }
            let mut commands: Box<dyn BufRead> = match script {
                Some(path) => Box::new(BufReader::new(File::open(path)?)),
                // One byte at a time, so that no program input is read ahead
                // along with a debugger command.
                None => Box::new(BufReader::with_capacity(1, io::stdin())),
            };
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let outcome = debugger.run(
                &mut commands,
                &mut out,
                &mut StdProgramIo::new(),
            )?;
            match outcome {
                Outcome::Fault(_) => return Ok(ExitCode::FAILURE),
                Outcome::CpuOff
                | Outcome::DoorUnlocked
                | Outcome::EndOfInput => {}
            }
        }
        Command::Dis { binary, start, end } => {
            let cpu = Msp430::new(load_image(&binary)?);
            let end = end.map_or(0x10000, u32::from);
            print_listing(&cpu, start, end)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn load_image(path: &Path) -> io::Result<Ram64k> {
    let file = File::open(path)?;
    load_binary(BufReader::new(file))
}

/// Prints one line per instruction from `start` up to `end`.  Each run of
/// zero words is shown as a single `*` line.
fn print_listing(cpu: &Msp430, start: u16, end: u32) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut addr = u32::from(start);
    let mut eliding = false;
    while addr < end {
        let pc = addr as u16;
        if cpu.memory().read_word(pc) == 0 {
            if !eliding {
                writeln!(out, "*")?;
                eliding = true;
            }
            addr += 2;
            continue;
        }
        eliding = false;
        let (size, text) = cpu.disassemble(pc);
        writeln!(out, "{pc:04x}: {text}")?;
        addr += u32::from(size);
    }
    Ok(())
}

//===========================================================================//
