//! Error types for parsing and executing Intcode programs.

use std::fmt::{Display, self};
use nom::error::ErrorKind;

use crate::emulator::State;

#[derive(Debug, Clone)]
enum InnerError {
    Incomplete,
    Context(&'static str),
    Nom(ErrorKind),
}

impl fmt::Display for InnerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InnerError::Context(ctx) => write!(f, "invalid {}", ctx),
            InnerError::Nom(ErrorKind::Eof) => write!(f, "unexpected trailing input"),
            InnerError::Nom(_err) => write!(f, "unexpected input"),
            InnerError::Incomplete => write!(f, "expected more input"),
        }
    }
}

/// Error type that contains the reason of the error and the unconsumed input.
///
/// For error location information see [ParseError::verbose].
#[derive(Clone, Debug)]
pub struct ParseError {
    stack: Vec<(String, InnerError)>,
}

impl ParseError {
    pub(crate) fn incomplete() -> ParseError {
        ParseError {
            stack: vec![(String::new(), InnerError::Incomplete)],
        }
    }

    /// Calculates the error location information from the [ParseError] and the original input
    /// buffer.
    ///
    /// # Parameters
    /// - `input`: The original input buffer or an exact copy of it.
    pub fn verbose(self, input: &str) -> VerboseParseError {
        // The innermost entry points at the exact location of the failure.
        let (rest, kind) = self.stack
            .into_iter()
            .next()
            .unwrap_or_else(|| (String::new(), InnerError::Incomplete));

        let offset = input.len().saturating_sub(rest.len());

        let mut line = 1;
        let mut column = 1;

        // A buffer other than the parsed one may not split at `offset`.
        for ch in input.get(..offset).unwrap_or(input).chars() {
            if ch == '\n' {
                line += 1;
                column = 0;
            }

            column += 1;
        }

        let rest = rest
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(20)
            .collect();

        VerboseParseError {
            line,
            column,
            kind,
            rest,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (input, kind) = &self.stack[0];

        let rest: String = input
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(20)
            .collect();

        write!(f, "{} at: '{}'", kind, rest)
    }
}

impl std::error::Error for ParseError {}

impl nom::error::ParseError<&str> for ParseError {
    fn from_error_kind(input: &str, kind: ErrorKind) -> Self {
        ParseError {
            stack: vec![(input.to_string(), InnerError::Nom(kind))],
        }
    }

    fn append(input: &str, kind: ErrorKind, mut other: Self) -> Self {
        other.stack.push((input.to_string(), InnerError::Nom(kind)));
        other
    }

    fn add_context(input: &str, ctx: &'static str, mut other: Self) -> Self {
        other.stack.push((input.to_string(), InnerError::Context(ctx)));
        other
    }
}

/// Error type containing location information in addition to the reason of the error.
///
/// Created from a [ParseError] with [ParseError::verbose].
#[derive(Clone, Debug)]
pub struct VerboseParseError {
    /// The line number of the error location.
    pub line: usize,
    /// The column number of the error location.
    pub column: usize,
    kind: InnerError,
    rest: String,
}

impl fmt::Display for VerboseParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "at line {} col {}: {}, at '{}'", self.line, self.column, self.kind, self.rest)
    }
}

impl std::error::Error for VerboseParseError {}

/// A condition that must hold before the emulator can continue executing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precondition {
    /// The program has already executed a halt instruction.
    Halted,

    /// The emulator is waiting for input, but none has been supplied.
    NoPendingInput,

    /// Outputs were requested from a channel that does not retain them.
    OutputsNotRetained,
}

impl Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Precondition::Halted => write!(f, "the program has already halted"),
            Precondition::NoPendingInput => write!(f, "resumed without pending input"),
            Precondition::OutputsNotRetained => write!(f, "outputs are not retained by this channel"),
        }
    }
}

/// Reason for aborting the execution of a program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    /// The instruction word does not contain a known opcode.
    Decode {
        word: i64,
    },

    /// A parameter mode digit is neither position (`0`) nor immediate (`1`).
    Mode {
        digit: i64,
    },

    /// An address outside of the program memory was accessed.
    Address {
        address: i64,
    },

    Precondition(Precondition),
}

impl Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fault::Decode { word } => write!(f, "invalid opcode in instruction {}", word),
            Fault::Mode { digit } => write!(f, "invalid parameter mode {}", digit),
            Fault::Address { address } => write!(f, "invalid address: {}", address),
            Fault::Precondition(precondition) => Display::fmt(precondition, f),
        }
    }
}

impl std::error::Error for Fault {}

/// A [Fault] together with the location of the instruction that caused it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionError {
    /// Value of the instruction pointer when the fault occurred.
    pub pointer: usize,
    pub fault: Fault,
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "at pointer {}: {}", self.pointer, self.fault)
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.fault)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkErrorKind {
    /// The instance faulted while executing.
    Execution(ExecutionError),

    /// The instance stopped without emitting an output.
    NoOutput,

    /// A pipeline stage stopped in a state other than [State::Halted].
    NotHalted(State),

    /// The network was built without any instances.
    NoInstances,
}

/// Error raised by a [Pipeline](crate::network::Pipeline) or a
/// [FeedbackLoop](crate::network::FeedbackLoop).
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkError {
    /// Index of the instance that caused the error.
    pub instance: usize,
    pub kind: NetworkErrorKind,
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            NetworkErrorKind::Execution(err) => write!(f, "instance {}: {}", self.instance, err),
            NetworkErrorKind::NoOutput => write!(f, "instance {}: no output", self.instance),
            NetworkErrorKind::NotHalted(state) =>
                write!(f, "instance {}: stopped while {}", self.instance, state),
            NetworkErrorKind::NoInstances => write!(f, "the network has no instances"),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            NetworkErrorKind::Execution(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchErrorKind {
    /// The noun or the verb could not be stored into the program.
    Patch(Fault),

    /// The program faulted while executing.
    Execution(ExecutionError),

    /// The program stopped in a state other than [State::Halted].
    NotHalted {
        pointer: usize,
        state: State,
    },
}

/// Error raised by the noun and verb search of the [search](crate::search) module.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchError {
    pub noun: i64,
    pub verb: i64,
    pub kind: SearchErrorKind,
}

impl Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "noun {} verb {}: ", self.noun, self.verb)?;

        match &self.kind {
            SearchErrorKind::Patch(fault) => write!(f, "{}", fault),
            SearchErrorKind::Execution(err) => write!(f, "{}", err),
            SearchErrorKind::NotHalted { pointer, state } =>
                write!(f, "stopped while {} at pointer {}", state, pointer),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            SearchErrorKind::Patch(fault) => Some(fault),
            SearchErrorKind::Execution(err) => Some(err),
            SearchErrorKind::NotHalted { .. } => None,
        }
    }
}
