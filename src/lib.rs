//! A crate for running programs of the Intcode instruction architecture.
//!
//! Currently this crate provides the functionality to:
//! - Read Intcode programs from comma separated text.
//! - Execute programs, suspending them when they run out of input and resuming them later.
//! - Connect several emulators into pipelines and feedback loops.
//! - Search phase settings and noun/verb pairs exhaustively.
//!
//! # Example
//! ```
//! use intcode::{
//!     program::Program,
//!     emulator::{Emulator, State},
//!     io::OutputMode,
//! };
//!
//! // Reads a value and echoes it back.
//! let program = Program::parse("3,0,4,0,99").unwrap();
//!
//! let mut emulator = Emulator::with_channel(program.words(), vec![], OutputMode::Accumulate);
//!
//! // There is no input yet, so the program suspends itself.
//! assert_eq!(emulator.run(), Ok(State::Waiting));
//!
//! // Resume after supplying the input.
//! emulator.enqueue_input(7);
//! assert_eq!(emulator.run(), Ok(State::Halted));
//! assert_eq!(emulator.drain_outputs(), Ok(vec![7]));
//! ```
//!
//! # Executables
//!
//! ## `intcode-run`
//!
//! Runs a single program. Inputs are given with `-i` or, if none are given, asked from the user.
//!
//! ```text
//! $ intcode-run diagnostics.txt -i 5
//! 1000
//! ```
//!
//! ## `intcode-amplify`
//!
//! Finds the phase settings that produce the strongest signal from a chain of amplifiers, with
//! `--feedback` connecting the last amplifier back to the first one.
pub mod emulator;
pub mod error;
pub mod event;
pub mod instruction;
pub mod io;
pub mod memory;
pub mod network;
pub mod program;
pub mod search;
