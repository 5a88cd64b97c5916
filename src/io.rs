//! Input and output devices of the emulator.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::{Fault, Precondition};

/// Interface to the input queue and the output sink of an emulator.
pub trait InputOutput {
    /// Called when an Input instruction is executed.
    ///
    /// # Returns
    /// The next input value, or `None` if no input is currently available. In that case the
    /// emulator suspends itself and retries the same instruction on the next run.
    fn input(&mut self) -> Option<i64>;

    /// Tells whether a call to [input](InputOutput::input) could produce a value.
    ///
    /// Used to refuse resuming a suspended emulator that would immediately suspend again.
    fn input_pending(&self) -> bool;

    /// Called when an Output instruction is executed.
    ///
    /// # Parameters
    /// - `value`: The value of the instruction's parameter.
    fn output(&mut self, value: i64);
}

impl<T> InputOutput for &mut T where T: InputOutput {
    fn input(&mut self) -> Option<i64> {
        (**self).input()
    }

    fn input_pending(&self) -> bool {
        (**self).input_pending()
    }

    fn output(&mut self, value: i64) {
        (**self).output(value)
    }
}

/// What a [Channel] does with the values emitted by the program.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutputMode {
    /// Print every value to the standard output as it is emitted.
    Transient,

    /// Keep the values until they are [drained](Channel::drain_outputs).
    Accumulate,
}

/// An IO handler with a FIFO input queue and a configurable output sink.
#[derive(Clone, Debug)]
pub struct Channel {
    inputs: VecDeque<i64>,
    outputs: Vec<i64>,
    mode: OutputMode,
}

impl Channel {
    pub fn new(mode: OutputMode) -> Channel {
        Channel {
            inputs: VecDeque::new(),
            outputs: Vec::new(),
            mode,
        }
    }

    pub fn with_input<I: IntoIterator<Item=i64>>(input: I, mode: OutputMode) -> Channel {
        Channel {
            inputs: input.into_iter().collect(),
            outputs: Vec::new(),
            mode,
        }
    }

    /// Appends a value to the back of the input queue.
    pub fn enqueue_input(&mut self, value: i64) {
        self.inputs.push_back(value);
    }

    /// Values not yet consumed by the program, front of the queue first.
    pub fn pending_inputs(&self) -> impl Iterator<Item=&i64> {
        self.inputs.iter()
    }

    /// Returns and clears the outputs accumulated so far, in emission order.
    ///
    /// # Errors
    /// [Precondition::OutputsNotRetained] if the channel was created with
    /// [OutputMode::Transient].
    pub fn drain_outputs(&mut self) -> Result<Vec<i64>, Fault> {
        match self.mode {
            OutputMode::Accumulate => Ok(std::mem::take(&mut self.outputs)),
            OutputMode::Transient => Err(Fault::Precondition(Precondition::OutputsNotRetained)),
        }
    }
}

impl InputOutput for Channel {
    fn input(&mut self) -> Option<i64> {
        self.inputs.pop_front()
    }

    fn input_pending(&self) -> bool {
        !self.inputs.is_empty()
    }

    fn output(&mut self, value: i64) {
        match self.mode {
            OutputMode::Accumulate => self.outputs.push(value),
            OutputMode::Transient => println!("{}", value),
        }
    }
}

/// An IO handler that asks the user for every input on the terminal and prints every output to
/// the standard output.
///
/// Lines that are not integers are rejected and asked again. If the standard input is closed, no
/// input is produced and the emulator suspends itself.
pub struct StdIo;

/// Prompts on `prompt` and reads lines from `reader` until one of them is an integer.
///
/// # Returns
/// The integer, or `None` once `reader` is exhausted or fails.
fn read_value<R: BufRead, W: Write>(mut reader: R, mut prompt: W) -> Option<i64> {
    loop {
        let _ = write!(prompt, "Provide input: ");
        let _ = prompt.flush();

        let mut line = String::new();

        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => match line.trim().parse() {
                Ok(value) => return Some(value),
                Err(_) => {
                    let _ = writeln!(prompt, "'{}' is not an integer", line.trim());
                },
            },
        }
    }
}

impl InputOutput for StdIo {
    fn input(&mut self) -> Option<i64> {
        let stdin = std::io::stdin();
        read_value(stdin.lock(), std::io::stderr())
    }

    fn input_pending(&self) -> bool {
        true
    }

    fn output(&mut self, value: i64) {
        println!("{}", value);
    }
}
