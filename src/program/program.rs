use std::str::FromStr;

use super::parser::{parse_program, ParseError};
use crate::error::Fault;
use crate::memory::Memory;

/// The initial memory image of an Intcode program.
///
/// Emulators copy the image on construction, so a single [Program] can be used to create any
/// number of independent emulators.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    words: Vec<i64>,
}

impl Program {
    /// Parses a program from comma separated integers.
    pub fn parse(source: &str) -> Result<Program, ParseError> {
        parse_program(source).map(Program::from_words)
    }

    pub fn from_words(words: Vec<i64>) -> Program {
        Program {
            words,
        }
    }

    pub fn words(&self) -> &[i64] {
        &self.words[..]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns a copy of the program with some of its cells replaced.
    ///
    /// # Parameters
    /// - `patches`: Pairs of addresses and the values to store in them.
    ///
    /// # Errors
    /// [Fault::Address] if an address is outside of the program.
    pub fn patched(&self, patches: &[(usize, i64)]) -> Result<Program, Fault> {
        let mut words = self.words.clone();

        for (address, value) in patches {
            words.write(*address as i64, *value)?;
        }

        Ok(Program::from_words(words))
    }
}

impl FromStr for Program {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Program, ParseError> {
        Program::parse(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patched() {
        let program: Program = "1,0,0,0,99".parse().unwrap();
        let patched = program.patched(&[(1, 4), (2, 4)]).unwrap();

        assert_eq!(patched.words(), &[1, 4, 4, 0, 99]);
        assert_eq!(program.words(), &[1, 0, 0, 0, 99]);
        assert_eq!(program.patched(&[(5, 1)]), Err(Fault::Address { address: 5 }));
    }
}
