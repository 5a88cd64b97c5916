//! Parsing and storing Intcode programs.

mod parser;
mod program;

pub use self::parser::ParseError;
pub use self::program::Program;
