use super::breakpoint::Condition;
use super::expr::{DbAssignment, DbExpr};
use super::value::DbType;
use crate::parse::{ParseError, SrcSpan};
use crate::proc::{InputMode, register_number};
use std::path::PathBuf;
use thiserror::Error;

//===========================================================================//

/// Usage line and description for every debugger command, in the order
/// `help` lists them.
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("break ADDR [if EXPR]", "stop at ADDR (when EXPR is true)"),
    ("tbreak ADDR [COUNT]", "stop at ADDR, COUNT times only"),
    ("unbreak ADDR|all", "remove breakpoints"),
    ("breakpoints", "list breakpoints"),
    ("s [N]", "execute N instructions (default 1)"),
    ("c", "continue until a breakpoint"),
    ("f", "continue until the current function returns"),
    ("bt", "print the call stack"),
    ("print EXPR", "evaluate an expression"),
    ("set LVALUE = EXPR", "assign to a register, flag, or memory"),
    ("track REG", "show memory around REG at every prompt"),
    ("untrack REG", "stop showing memory around REG"),
    ("mem ADDR", "show memory around ADDR"),
    ("disas ADDR", "disassemble starting at ADDR"),
    ("hex", "treat program input as hex-encoded bytes"),
    ("text", "treat program input as text"),
    ("dump FILE", "write all of memory to FILE"),
    ("trace FILE|off", "start or stop tracing to FILE"),
    ("insncount", "print the number of executed instructions"),
    ("reset", "reload the image and restart"),
    ("help", "show this list"),
];

fn usage(name: &str) -> &'static str {
    COMMAND_HELP
        .iter()
        .map(|&(usage, _)| usage)
        .find(|usage| usage.split(' ').next() == Some(name))
        .unwrap_or("help")
}

//===========================================================================//

/// An error in a line of debugger input.  None of these change any state.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The first word of the line is not a command.
    #[error("Unrecognized command")]
    Unrecognized,
    /// The command's arguments are missing or malformed.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// An address argument is not a 16-bit hex number.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
    /// A count argument is not a valid number.
    #[error("invalid count: {0:?}")]
    InvalidCount(String),
    /// A register argument names no register.
    #[error("invalid register: {0:?}")]
    InvalidRegister(String),
    /// An expression failed to parse or typecheck.
    #[error("{}", render_errors(.input, .errors))]
    Expression {
        /// The expression text the error spans refer to.
        input: String,
        /// The errors found in the expression.
        errors: Vec<ParseError>,
    },
}

fn render_errors(input: &str, errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|error| error.render(input))
        .collect::<Vec<String>>()
        .join("\n")
}

fn expression_error(input: &str, errors: Vec<ParseError>) -> CommandError {
    CommandError::Expression { input: input.to_string(), errors }
}

//===========================================================================//

/// A parsed line of debugger input.
#[derive(Debug)]
pub enum Command {
    /// Print the call-stack shadow.
    Backtrace,
    /// Set a permanent breakpoint, optionally conditional.
    Break {
        /// The breakpoint address.
        addr: u16,
        /// The condition under which the breakpoint triggers.
        condition: Option<Condition>,
    },
    /// List breakpoints.
    Breakpoints,
    /// Resume until a breakpoint.
    Continue,
    /// Disassemble a window of instructions.
    Disas(u16),
    /// Write all of memory to a file.
    Dump(PathBuf),
    /// Resume until the current function returns.
    Finish,
    /// List the available commands.
    Help,
    /// Print the number of executed instructions.
    InsnCount,
    /// Show a hex dump of memory around an address.
    Mem(u16),
    /// Evaluate and print an expression.
    Print(DbExpr),
    /// Reload the image and restart from the entry point.
    Reset,
    /// Store a value into a register, flag, or memory location.
    Set(DbAssignment),
    /// Choose how program input is interpreted.
    SetInputMode(InputMode),
    /// Execute this many instructions, then prompt again.
    Step(u64),
    /// Set a breakpoint that triggers a limited number of times.
    TBreak {
        /// The breakpoint address.
        addr: u16,
        /// How many times the breakpoint triggers.
        count: u32,
    },
    /// Start tracing to a file, or stop tracing.
    Trace(Option<PathBuf>),
    /// Show memory around a register at every prompt.
    Track(u8),
    /// Remove one breakpoint, or all of them.
    Unbreak(Option<u16>),
    /// Stop showing memory around a register.
    Untrack(u8),
}

impl Command {
    /// Parses one line of debugger input.  The first word names the command
    /// and the rest of the line holds its arguments.
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        match name {
            "break" => {
                let (target, condition) = match rest.split_once(" if ") {
                    Some((target, source)) => (target, Some(source.trim())),
                    None => (rest, None),
                };
                let addr = parse_address(name, target)?;
                let condition = condition.map(parse_condition).transpose()?;
                Ok(Command::Break { addr, condition })
            }
            "breakpoints" => Ok(Command::Breakpoints),
            "bt" => Ok(Command::Backtrace),
            "c" => Ok(Command::Continue),
            "disas" => Ok(Command::Disas(parse_address(name, rest)?)),
            "dump" => Ok(Command::Dump(parse_path(name, rest)?)),
            "f" => Ok(Command::Finish),
            "help" => Ok(Command::Help),
            "hex" => Ok(Command::SetInputMode(InputMode::Hex)),
            "insncount" => Ok(Command::InsnCount),
            "mem" => Ok(Command::Mem(parse_address(name, rest)?)),
            "print" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage(usage(name)));
                }
                let expr = DbExpr::compile(rest)
                    .map_err(|errors| expression_error(rest, errors))?;
                Ok(Command::Print(expr))
            }
            "reset" => Ok(Command::Reset),
            "s" => {
                if rest.is_empty() {
                    return Ok(Command::Step(1));
                }
                let count = rest
                    .parse::<u64>()
                    .map_err(|_| CommandError::InvalidCount(rest.into()))?;
                Ok(Command::Step(count))
            }
            "set" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage(usage(name)));
                }
                let assignment = DbAssignment::compile(rest)
                    .map_err(|errors| expression_error(rest, errors))?;
                Ok(Command::Set(assignment))
            }
            "tbreak" => {
                let mut args = rest.split_whitespace();
                let addr = parse_address(name, args.next().unwrap_or(""))?;
                let count = match args.next() {
                    None => 1,
                    Some(arg) => match arg.parse::<u32>() {
                        Ok(count) if count > 0 => count,
                        _ => {
                            return Err(CommandError::InvalidCount(arg.into()));
                        }
                    },
                };
                if args.next().is_some() {
                    return Err(CommandError::Usage(usage(name)));
                }
                Ok(Command::TBreak { addr, count })
            }
            "text" => Ok(Command::SetInputMode(InputMode::Text)),
            "trace" => match rest {
                "off" => Ok(Command::Trace(None)),
                _ => Ok(Command::Trace(Some(parse_path(name, rest)?))),
            },
            "track" => Ok(Command::Track(parse_register(name, rest)?)),
            "unbreak" => match rest {
                "all" => Ok(Command::Unbreak(None)),
                _ => Ok(Command::Unbreak(Some(parse_address(name, rest)?))),
            },
            "untrack" => Ok(Command::Untrack(parse_register(name, rest)?)),
            _ => Err(CommandError::Unrecognized),
        }
    }
}

//===========================================================================//

/// Parses a hex address, with or without a `0x` prefix.
fn parse_address(name: &str, arg: &str) -> Result<u16, CommandError> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(CommandError::Usage(usage(name)));
    }
    let digits = arg
        .strip_prefix("0x")
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);
    u16::from_str_radix(digits, 16)
        .map_err(|_| CommandError::InvalidAddress(arg.to_string()))
}

fn parse_path(name: &str, arg: &str) -> Result<PathBuf, CommandError> {
    if arg.is_empty() {
        Err(CommandError::Usage(usage(name)))
    } else {
        Ok(PathBuf::from(arg))
    }
}

/// Accepts a register name (`sp`, `r15`) or a bare register number.
fn parse_register(name: &str, arg: &str) -> Result<u8, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::Usage(usage(name)));
    }
    if let Some(reg) = register_number(arg) {
        return Ok(reg);
    }
    match arg.parse::<u8>() {
        Ok(reg) if reg < 16 => Ok(reg),
        _ => Err(CommandError::InvalidRegister(arg.to_string())),
    }
}

fn parse_condition(source: &str) -> Result<Condition, CommandError> {
    let expr = DbExpr::compile(source)
        .map_err(|errors| expression_error(source, errors))?;
    if expr.db_type() != DbType::Boolean {
        let message =
            format!("condition must be of type bool, not {}", expr.db_type());
        let span = SrcSpan::from_byte_range(0..source.len());
        let errors = vec![ParseError::new(span, message)];
        return Err(expression_error(source, errors));
    }
    Ok(Condition { source: source.to_string(), expr })
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Command, CommandError};
    use crate::proc::InputMode;
    use std::path::PathBuf;

    fn error_text(line: &str) -> String {
        Command::parse(line).unwrap_err().to_string()
    }

    #[test]
    fn break_with_condition() {
        let Command::Break { addr, condition } =
            Command::parse("break 4400 if r15 == 0x10").unwrap()
        else {
            panic!("expected break command");
        };
        assert_eq!(addr, 0x4400);
        assert_eq!(condition.unwrap().source, "r15 == 0x10");
    }

    #[test]
    fn break_without_condition() {
        let command = Command::parse("break 0x44a2").unwrap();
        assert!(matches!(
            command,
            Command::Break { addr: 0x44a2, condition: None }
        ));
    }

    #[test]
    fn condition_must_be_bool() {
        assert_eq!(
            error_text("break 4400 if r15"),
            "error: condition must be of type bool, not int\n  r15\n  ^^^"
        );
    }

    #[test]
    fn tbreak_counts() {
        let command = Command::parse("tbreak 4400").unwrap();
        assert!(matches!(command, Command::TBreak { count: 1, .. }));
        let command = Command::parse("tbreak 4400 3").unwrap();
        assert!(matches!(command, Command::TBreak { count: 3, .. }));
        assert_eq!(error_text("tbreak 4400 0"), "invalid count: \"0\"");
    }

    #[test]
    fn steps() {
        assert!(matches!(Command::parse("s").unwrap(), Command::Step(1)));
        let command = Command::parse("s 25").unwrap();
        assert!(matches!(command, Command::Step(25)));
        assert_eq!(error_text("s many"), "invalid count: \"many\"");
    }

    #[test]
    fn registers() {
        let command = Command::parse("track r15").unwrap();
        assert!(matches!(command, Command::Track(15)));
        let command = Command::parse("track 4").unwrap();
        assert!(matches!(command, Command::Track(4)));
        let command = Command::parse("untrack sp").unwrap();
        assert!(matches!(command, Command::Untrack(1)));
        assert_eq!(error_text("track 16"), "invalid register: \"16\"");
    }

    #[test]
    fn unbreak() {
        assert!(matches!(
            Command::parse("unbreak all").unwrap(),
            Command::Unbreak(None)
        ));
        assert!(matches!(
            Command::parse("unbreak 4400").unwrap(),
            Command::Unbreak(Some(0x4400))
        ));
    }

    #[test]
    fn input_modes() {
        assert!(matches!(
            Command::parse("hex").unwrap(),
            Command::SetInputMode(InputMode::Hex)
        ));
        assert!(matches!(
            Command::parse("text").unwrap(),
            Command::SetInputMode(InputMode::Text)
        ));
    }

    #[test]
    fn trace_and_dump() {
        let Command::Trace(Some(path)) =
            Command::parse("trace out.txt").unwrap()
        else {
            panic!("expected trace command");
        };
        assert_eq!(path, PathBuf::from("out.txt"));
        assert!(matches!(
            Command::parse("trace off").unwrap(),
            Command::Trace(None)
        ));
        assert_eq!(error_text("dump"), "usage: dump FILE");
    }

    #[test]
    fn bad_arguments() {
        assert_eq!(error_text("mem"), "usage: mem ADDR");
        assert_eq!(error_text("mem xyz"), "invalid address: \"xyz\"");
        assert_eq!(error_text("disas 10000"), "invalid address: \"10000\"");
        assert_eq!(error_text("print"), "usage: print EXPR");
    }

    #[test]
    fn expression_errors_are_rendered() {
        let error = Command::parse("print r4 + zero").unwrap_err();
        assert!(matches!(error, CommandError::Expression { .. }));
        assert!(error.to_string().starts_with(
            "error: Cannot add int and bool\n  r4 + zero\n     ^"
        ));
    }

    #[test]
    fn syntax_errors_name_the_offending_token() {
        assert_eq!(
            error_text("print 1 + )"),
            "error: unexpected ')'\n  1 + )\n      ^"
        );
        assert_eq!(
            error_text("set r4 5"),
            "error: unexpected int literal\n  r4 5\n     ^"
        );
        assert_eq!(
            error_text("break 4400 if r4 +"),
            "error: unexpected end of input\n  r4 +\n      ^"
        );
    }

    #[test]
    fn unrecognized() {
        assert_eq!(error_text("frobnicate"), "Unrecognized command");
        assert_eq!(error_text(""), "Unrecognized command");
    }
}

//===========================================================================//
