//! types for representing instructions and their parts

use std::fmt;

use itertools::Itertools;

use crate::error::Fault;

/// Instructions of the Intcode instruction architecture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OpCode {
    /// Adds the first two parameters and stores the sum at the address given by the third.
    Add,

    /// Multiplies the first two parameters and stores the product at the address given by the
    /// third.
    Multiply,

    /// Consumes a value from the input queue and stores it at the address given by the parameter.
    /// Suspends the execution if no input is available.
    Input,

    /// Emits the value of the parameter.
    Output,

    /// Jumps to the second parameter if the first parameter is non-zero.
    JumpIfTrue,

    /// Jumps to the second parameter if the first parameter is zero.
    JumpIfFalse,

    /// Stores `1` if the first parameter is less than the second, `0` otherwise.
    LessThan,

    /// Stores `1` if the first two parameters are equal, `0` otherwise.
    Equals,

    /// Stops the execution.
    Halt,
}

impl OpCode {
    pub fn as_code(&self) -> i64 {
        match self {
            OpCode::Add => 1,
            OpCode::Multiply => 2,
            OpCode::Input => 3,
            OpCode::Output => 4,
            OpCode::JumpIfTrue => 5,
            OpCode::JumpIfFalse => 6,
            OpCode::LessThan => 7,
            OpCode::Equals => 8,
            OpCode::Halt => 99,
        }
    }

    pub fn from_code(code: i64) -> Option<OpCode> {
        match code {
            1 => Some(OpCode::Add),
            2 => Some(OpCode::Multiply),
            3 => Some(OpCode::Input),
            4 => Some(OpCode::Output),
            5 => Some(OpCode::JumpIfTrue),
            6 => Some(OpCode::JumpIfFalse),
            7 => Some(OpCode::LessThan),
            8 => Some(OpCode::Equals),
            99 => Some(OpCode::Halt),
            _ => None,
        }
    }

    /// Number of parameter words following the instruction word.
    pub fn parameter_count(&self) -> usize {
        match self {
            OpCode::Add | OpCode::Multiply | OpCode::LessThan | OpCode::Equals => 3,
            OpCode::JumpIfTrue | OpCode::JumpIfFalse => 2,
            OpCode::Input | OpCode::Output => 1,
            OpCode::Halt => 0,
        }
    }

    /// Index of the parameter holding the address the instruction writes to, if any.
    pub fn destination(&self) -> Option<usize> {
        match self {
            OpCode::Add | OpCode::Multiply | OpCode::LessThan | OpCode::Equals => Some(2),
            OpCode::Input => Some(0),
            _ => None,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            OpCode::Add => "ADD",
            OpCode::Multiply => "MUL",
            OpCode::Input => "IN",
            OpCode::Output => "OUT",
            OpCode::JumpIfTrue => "JNZ",
            OpCode::JumpIfFalse => "JZ",
            OpCode::LessThan => "LT",
            OpCode::Equals => "EQ",
            OpCode::Halt => "HALT",
        })
    }
}

/// Addressing mode of a single parameter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mode {
    /// The parameter is an address, its value is read from memory.
    Position,

    /// The parameter is the value itself.
    Immediate,
}

impl Mode {
    pub fn from_digit(digit: i64) -> Result<Mode, Fault> {
        match digit {
            0 => Ok(Mode::Position),
            1 => Ok(Mode::Immediate),
            _ => Err(Fault::Mode { digit }),
        }
    }

    pub fn as_digit(&self) -> i64 {
        match self {
            Mode::Position => 0,
            Mode::Immediate => 1,
        }
    }
}

/// A decoded instruction word.
///
/// Only the opcode and the parameter modes are stored here, the parameters themselves live in
/// the memory cells following the instruction word.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,

    /// One mode per parameter, first parameter first.
    pub modes: Vec<Mode>,
}

impl Instruction {
    /// Splits an instruction word into the opcode and the modes of its parameters.
    ///
    /// Mode digits are read from the hundreds digit upwards. Missing digits default to
    /// [Mode::Position] and digits beyond the parameter count are ignored. The destination of a
    /// writing instruction is always an address, so its digit is not interpreted.
    ///
    /// # Errors
    /// - [Fault::Decode] if the word is negative or the opcode is unknown.
    /// - [Fault::Mode] if the mode digit of a read parameter is not `0` or `1`.
    pub fn decode(word: i64) -> Result<Instruction, Fault> {
        if word < 0 {
            return Err(Fault::Decode { word });
        }

        let opcode = OpCode::from_code(word % 100)
            .ok_or(Fault::Decode { word })?;

        let mut digits = word / 100;
        let mut modes = Vec::with_capacity(opcode.parameter_count());

        for index in 0..opcode.parameter_count() {
            if opcode.destination() == Some(index) {
                modes.push(Mode::Position);
            } else {
                modes.push(Mode::from_digit(digits % 10)?);
            }

            digits /= 10;
        }

        Ok(Instruction {
            opcode,
            modes,
        })
    }

    /// Number of memory cells occupied by the instruction, including the instruction word.
    pub fn len(&self) -> usize {
        self.opcode.parameter_count() + 1
    }

    /// Encodes the instruction back into an instruction word.
    pub fn as_word(&self) -> i64 {
        self.modes
            .iter()
            .rev()
            .fold(0, |acc, mode| acc * 10 + mode.as_digit()) * 100 + self.opcode.as_code()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.modes.is_empty() {
            return write!(f, "{}", self.opcode);
        }

        write!(f, "{} {}", self.opcode, self.modes
            .iter()
            .map(|mode| match mode {
                Mode::Position => "@",
                Mode::Immediate => "=",
            })
            .join(", "))
    }
}
