//! Bounds-checked access to the program memory and parameter resolution.

use std::convert::TryFrom;

use crate::error::Fault;
use crate::instruction::Mode;

/// Trait for accessing the memory of an Intcode machine.
///
/// Memory is a fixed-size sequence of integers holding both the instructions and the data of
/// the program. Every access is checked against the bounds of the memory.
pub trait Memory {
    /// Validates an address.
    ///
    /// # Returns
    /// The address as an index into the memory, or [Fault::Address] if it's negative or past the
    /// end of the memory.
    fn check(&self, address: i64) -> Result<usize, Fault>;

    /// Fetch the word from the specified address.
    fn read(&self, address: i64) -> Result<i64, Fault>;

    /// Overwrite the word in the specified address.
    fn write(&mut self, address: i64, value: i64) -> Result<(), Fault>;

    /// Resolves the value of a raw parameter according to its addressing mode.
    ///
    /// Destination parameters of writing instructions are never resolved, they are always used
    /// as addresses.
    ///
    /// # Parameters
    /// - `value`: The raw parameter as it is stored after the instruction word.
    /// - `mode`: The addressing mode of the parameter.
    fn resolve(&self, value: i64, mode: Mode) -> Result<i64, Fault> {
        match mode {
            Mode::Position => self.read(value),
            Mode::Immediate => Ok(value),
        }
    }
}

impl Memory for [i64] {
    fn check(&self, address: i64) -> Result<usize, Fault> {
        usize::try_from(address)
            .ok()
            .filter(|index| *index < self.len())
            .ok_or(Fault::Address { address })
    }

    fn read(&self, address: i64) -> Result<i64, Fault> {
        let index = self.check(address)?;
        Ok(self[index])
    }

    fn write(&mut self, address: i64, value: i64) -> Result<(), Fault> {
        let index = self.check(address)?;
        self[index] = value;
        Ok(())
    }
}
