//! [Emulator] for executing Intcode programs.

use std::fmt;

use slog::{o, debug, trace, Discard, Logger};

use crate::error::{ExecutionError, Fault, Precondition};
use crate::event::{Event, EventDispatcher, EventListener};
use crate::instruction::{Instruction, OpCode};
use crate::io::{Channel, InputOutput, OutputMode};
use crate::memory::Memory;

/// Execution state of an [Emulator].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum State {
    /// The program can continue executing.
    Running,

    /// An Input instruction found the input queue empty. The instruction is retried once the
    /// emulator is run again, nothing was modified by the failed attempt.
    Waiting,

    /// The program executed a halt instruction.
    Halted,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            State::Running => write!(f, "running"),
            State::Waiting => write!(f, "waiting"),
            State::Halted => write!(f, "halted"),
        }
    }
}

/// Outcome of emulating a single instruction.
enum Transition {
    /// Continue with the instruction following the current one.
    Advance,

    /// Continue at the given address.
    Jump(usize),

    /// Suspend before the current instruction.
    Wait,

    Halt,
}

/// Utility struct for implementing methods in the context of emulating a single instruction.
struct InstructionEmulationContext<'e, 'i, IO> {
    /// The emulator in whose context the instruction is being emulated.
    emulator: &'e mut Emulator<IO>,

    /// The instruction that we are currently emulating.
    instruction: &'i Instruction,
}

impl<'e, 'i, IO> InstructionEmulationContext<'e, 'i, IO>
    where IO: InputOutput,
{
    /// Returns the raw value of a parameter.
    fn parameter(&self, index: usize) -> Result<i64, Fault> {
        let address = self.emulator.pointer + 1 + index;
        self.emulator.memory.read(address as i64)
    }

    /// Resolves a parameter according to its addressing mode and returns it's value.
    fn operand(&self, index: usize) -> Result<i64, Fault> {
        let raw = self.parameter(index)?;
        self.emulator.memory.resolve(raw, self.instruction.modes[index])
    }

    /// Returns the address a parameter points to. Modes are ignored.
    fn target(&self, index: usize) -> Result<usize, Fault> {
        let raw = self.parameter(index)?;
        self.emulator.memory.check(raw)
    }

    fn store(&mut self, address: usize, data: i64) {
        self.emulator.memory[address] = data;
        self.emulator.events.dispatch(Event::MemoryChange { address, data });
    }

    /// Execute the instruction.
    ///
    /// Nothing is modified before all the parameters have been validated, so a faulting or
    /// suspending instruction leaves the memory untouched.
    fn emulate(&mut self) -> Result<Transition, Fault> {
        match self.instruction.opcode {
            OpCode::Add => {
                let sum = self.operand(0)?.wrapping_add(self.operand(1)?);
                let target = self.target(2)?;
                self.store(target, sum);
            },
            OpCode::Multiply => {
                let product = self.operand(0)?.wrapping_mul(self.operand(1)?);
                let target = self.target(2)?;
                self.store(target, product);
            },
            OpCode::Input => {
                let target = self.target(0)?;

                let value = match self.emulator.io.input() {
                    Some(value) => value,
                    None => return Ok(Transition::Wait),
                };

                self.emulator.events.dispatch(Event::Input { value });
                self.store(target, value);
            },
            OpCode::Output => {
                let value = self.operand(0)?;
                self.emulator.io.output(value);
                self.emulator.events.dispatch(Event::Output { value });
            },
            opcode @ OpCode::JumpIfTrue | opcode @ OpCode::JumpIfFalse => {
                let condition = self.operand(0)? != 0;

                if condition == (opcode == OpCode::JumpIfTrue) {
                    let target = self.operand(1)?;
                    return Ok(Transition::Jump(self.emulator.memory.check(target)?));
                }
            },
            OpCode::LessThan => {
                let result = self.operand(0)? < self.operand(1)?;
                let target = self.target(2)?;
                self.store(target, result as i64);
            },
            OpCode::Equals => {
                let result = self.operand(0)? == self.operand(1)?;
                let target = self.target(2)?;
                self.store(target, result as i64);
            },
            OpCode::Halt => return Ok(Transition::Halt),
        }

        Ok(Transition::Advance)
    }
}

/// The emulator contains all neccessary context for executing an Intcode program
/// and an interface for doing IO.
///
/// Every emulator owns a private copy of its program, so several emulators can be created from
/// the same program without affecting each other.
pub struct Emulator<IO> {
    /// The memory of the emulated machine.
    /// Contains all the instructions and data of the program.
    memory: Vec<i64>,

    /// Address of the next instruction to be executed.
    pointer: usize,

    state: State,

    /// Interface for doing IO operations.
    pub io: IO,

    events: EventDispatcher,

    logger: Logger,
}

impl<IO> Emulator<IO> where IO: InputOutput {
    /// Create a new emulator.
    ///
    /// # Parameters
    /// - `program`: The initial memory image. It is copied, the caller's slice is never
    ///   modified.
    /// - `io`: An [IO handler](InputOutput).
    pub fn new(program: &[i64], io: IO) -> Emulator<IO> {
        Emulator::with_logger(program, io, None::<Logger>)
    }

    /// Create a new emulator which logs its execution into `logger`.
    pub fn with_logger<L>(program: &[i64], io: IO, logger: L) -> Emulator<IO>
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "emulation"));

        Emulator {
            memory: program.to_vec(),
            pointer: 0,
            state: State::Running,
            io,
            events: EventDispatcher::new(),
            logger,
        }
    }

    pub fn set_logger(&mut self, logger: Logger) {
        self.logger = logger.new(o!("stage" => "emulation"));
    }

    /// Registers a listener which is notified of every [Event] of this emulator.
    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.events.add_listener(listener);
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Address of the next instruction to be executed.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn memory(&self) -> &[i64] {
        &self.memory[..]
    }

    /// Reads a single memory cell, for example the result cell of a program.
    pub fn memory_at(&self, address: usize) -> Result<i64, Fault> {
        self.memory
            .get(address)
            .copied()
            .ok_or(Fault::Address { address: address as i64 })
    }

    /// Decodes the instruction at the address pointed by the instruction pointer.
    pub fn get_current_instruction(&self) -> Result<Instruction, ExecutionError> {
        self.memory
            .read(self.pointer as i64)
            .and_then(Instruction::decode)
            .map_err(|fault| self.error(fault))
    }

    fn error(&self, fault: Fault) -> ExecutionError {
        ExecutionError {
            pointer: self.pointer,
            fault,
        }
    }

    /// Fetches the next instruction, executes it and moves the instruction pointer.
    ///
    /// # Returns
    /// The state of the emulator after the instruction.
    ///
    /// # Errors
    /// Returns an error if the instruction cannot be decoded, accesses memory out of bounds, or
    /// if the emulator cannot continue: it has halted, or it is waiting and no input is pending.
    pub fn step(&mut self) -> Result<State, ExecutionError> {
        match self.state {
            State::Halted => {
                return Err(self.error(Fault::Precondition(Precondition::Halted)));
            },
            State::Waiting if !self.io.input_pending() => {
                return Err(self.error(Fault::Precondition(Precondition::NoPendingInput)));
            },
            _ => (),
        }

        let ins = self.get_current_instruction()?;
        trace!(self.logger, "execute instruction"; "pointer" => self.pointer, "instruction" => %ins);

        let mut ctx = InstructionEmulationContext {
            emulator: self,
            instruction: &ins,
        };

        let transition = ctx.emulate();
        let transition = transition.map_err(|fault| self.error(fault))?;

        match transition {
            Transition::Advance => {
                self.pointer += ins.len();
                self.state = State::Running;
            },
            Transition::Jump(target) => {
                trace!(self.logger, "jump"; "target" => target);
                self.pointer = target;
                self.state = State::Running;
            },
            Transition::Wait => {
                debug!(self.logger, "waiting for input"; "pointer" => self.pointer);
                self.state = State::Waiting;
                self.events.dispatch(Event::Suspended { pointer: self.pointer });
            },
            Transition::Halt => {
                debug!(self.logger, "halted"; "pointer" => self.pointer);
                self.events.dispatch(Event::Halted { pointer: self.pointer });
                self.pointer += ins.len();
                self.state = State::Halted;
            },
        }

        Ok(self.state)
    }

    /// Executes the program until it halts or waits for input.
    ///
    /// A waiting emulator resumes at the Input instruction that suspended it.
    ///
    /// # Errors
    /// See [step](Emulator::step).
    pub fn run(&mut self) -> Result<State, ExecutionError> {
        loop {
            match self.step()? {
                State::Running => continue,
                state => return Ok(state),
            }
        }
    }
}

impl Emulator<Channel> {
    /// Create a new emulator with a [Channel] as its IO handler.
    ///
    /// # Parameters
    /// - `program`: The initial memory image.
    /// - `inputs`: Values initially in the input queue.
    /// - `mode`: Whether outputs are printed or retained for [drain_outputs](Self::drain_outputs).
    pub fn with_channel<I>(program: &[i64], inputs: I, mode: OutputMode) -> Emulator<Channel>
    where
        I: IntoIterator<Item=i64>,
    {
        Emulator::new(program, Channel::with_input(inputs, mode))
    }

    /// Appends a value to the input queue. Allowed at any time, also while waiting.
    pub fn enqueue_input(&mut self, value: i64) {
        self.io.enqueue_input(value);
    }

    /// Returns and clears the outputs emitted so far.
    ///
    /// # Errors
    /// Fails with [Precondition::OutputsNotRetained] on a [transient](OutputMode::Transient)
    /// channel.
    pub fn drain_outputs(&mut self) -> Result<Vec<i64>, ExecutionError> {
        let outputs = self.io.drain_outputs();
        outputs.map_err(|fault| self.error(fault))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    macro_rules! assert_memory {
        ($emulator:expr, $address:expr, $value:expr) => {
            assert_eq!($emulator.memory_at($address), Ok($value), "Memory[{}] != {}", $address, $value);
        };
    }

    fn emulator(program: &[i64], inputs: &[i64]) -> Emulator<Channel> {
        Emulator::with_channel(program, inputs.iter().copied(), OutputMode::Accumulate)
    }

    fn fault_of(program: &[i64]) -> ExecutionError {
        emulator(program, &[])
            .run()
            .expect_err("program should fault")
    }

    #[test]
    fn test_add() {
        let mut e = emulator(&[1, 0, 0, 0, 99], &[]);

        assert_eq!(e.run(), Ok(State::Halted));
        assert_memory!(e, 0, 2);
    }

    #[test]
    fn test_immediate_parameters() {
        let mut e = emulator(&[1101, 100, -1, 4, 0], &[]);

        assert_eq!(e.run(), Ok(State::Halted));
        assert_eq!(e.memory(), &[1101, 100, -1, 4, 99]);
        assert_eq!(e.pointer(), 5);
    }

    #[test]
    fn test_echo_input() {
        let mut e = emulator(&[3, 0, 4, 0, 99], &[7]);

        assert_eq!(e.run(), Ok(State::Halted));
        assert_eq!(e.drain_outputs(), Ok(vec![7]));
    }

    #[test]
    fn test_suspend_and_resume() {
        let program = [3, 0, 4, 0, 99];
        let mut e = emulator(&program, &[]);

        assert_eq!(e.run(), Ok(State::Waiting));
        assert_eq!(e.pointer(), 0);
        assert_eq!(e.memory(), &program);
        assert_eq!(e.drain_outputs(), Ok(vec![]));

        e.enqueue_input(7);

        assert_eq!(e.run(), Ok(State::Halted));
        assert_eq!(e.drain_outputs(), Ok(vec![7]));
    }

    #[test]
    fn test_resume_without_input() {
        let mut e = emulator(&[3, 0, 4, 0, 99], &[]);

        assert_eq!(e.run(), Ok(State::Waiting));
        assert_eq!(e.run(), Err(ExecutionError {
            pointer: 0,
            fault: Fault::Precondition(Precondition::NoPendingInput),
        }));
        assert_eq!(e.state(), State::Waiting);
    }

    #[test]
    fn test_run_after_halt() {
        let program = [99, 5, 6];
        let mut e = emulator(&program, &[]);

        assert_eq!(e.run(), Ok(State::Halted));
        assert_eq!(e.memory(), &program);
        assert_eq!(e.pointer(), 1);

        assert_eq!(e.run(), Err(ExecutionError {
            pointer: 1,
            fault: Fault::Precondition(Precondition::Halted),
        }));
        assert_eq!(e.memory(), &program);
    }

    #[test]
    fn test_arithmetic_and_comparison_advance_by_four() {
        let mut e = emulator(&[
            1101, 2, 3, 17,
            1102, 2, 3, 17,
            1107, 2, 3, 17,
            1108, 2, 2, 17,
            99, 0,
        ], &[]);

        let expected = [(4, 5), (8, 6), (12, 1), (16, 1)];

        for (pointer, value) in expected.iter() {
            assert_eq!(e.step(), Ok(State::Running));
            assert_eq!(e.pointer(), *pointer);
            assert_memory!(e, 17, *value);
        }

        assert_eq!(e.step(), Ok(State::Halted));
    }

    #[test]
    fn test_jumps() {
        let mut e = emulator(&[
            1105, 0, 99,
            1105, 1, 7,
            99,
            1106, 1, 99,
            1106, 0, 14,
            99,
            99,
        ], &[]);

        for pointer in &[3, 7, 10, 14] {
            assert_eq!(e.step(), Ok(State::Running));
            assert_eq!(e.pointer(), *pointer);
        }

        assert_eq!(e.step(), Ok(State::Halted));
        assert_eq!(e.pointer(), 15);
    }

    #[test]
    fn test_position_mode_comparisons() {
        // Outputs 1 if the input equals 8, 0 otherwise.
        let equal_to_8 = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
        // Outputs 1 if the input is less than 8, 0 otherwise.
        let less_than_8 = [3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8];

        for (input, equal, less) in &[(7, 0, 1), (8, 1, 0), (9, 0, 0)] {
            let mut e = emulator(&equal_to_8, &[*input]);
            e.run().unwrap();
            assert_eq!(e.drain_outputs(), Ok(vec![*equal]));

            let mut e = emulator(&less_than_8, &[*input]);
            e.run().unwrap();
            assert_eq!(e.drain_outputs(), Ok(vec![*less]));
        }
    }

    #[test]
    fn test_faults() {
        assert_eq!(fault_of(&[42]), ExecutionError {
            pointer: 0,
            fault: Fault::Decode { word: 42 },
        });

        assert_eq!(fault_of(&[0]).fault, Fault::Decode { word: 0 });
        assert_eq!(fault_of(&[201, 0, 0, 0, 99]).fault, Fault::Mode { digit: 2 });
        assert_eq!(fault_of(&[1, 100, 0, 0, 99]).fault, Fault::Address { address: 100 });
        assert_eq!(fault_of(&[1101, 1, 1, 50, 99]).fault, Fault::Address { address: 50 });
        assert_eq!(fault_of(&[1, 0]).fault, Fault::Address { address: 2 });
        assert_eq!(fault_of(&[1105, 1, 50]).fault, Fault::Address { address: 50 });

        assert_eq!(fault_of(&[1101, 1, 1, 0]), ExecutionError {
            pointer: 4,
            fault: Fault::Address { address: 4 },
        });
    }

    #[test]
    fn test_destination_mode_digit() {
        let mut e = emulator(&[20001, 0, 0, 0, 99], &[]);

        assert_eq!(e.run(), Ok(State::Halted));
        assert_memory!(e, 0, 40002);

        let mut e = emulator(&[703, 0, 99], &[5]);

        assert_eq!(e.run(), Ok(State::Halted));
        assert_memory!(e, 0, 5);
    }

    #[test]
    fn test_faulting_input_keeps_queue() {
        let mut e = emulator(&[3, 50, 99], &[7]);

        assert_eq!(e.run().unwrap_err().fault, Fault::Address { address: 50 });
        assert_eq!(e.io.pending_inputs().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_program_is_copied() {
        let program = vec![1, 0, 0, 0, 99];
        let mut e = emulator(&program, &[]);
        e.run().unwrap();

        assert_eq!(program, vec![1, 0, 0, 0, 99]);
        assert_memory!(e, 0, 2);
        assert_eq!(e.memory_at(5), Err(Fault::Address { address: 5 }));
    }

    #[test]
    fn test_transient_outputs_cannot_be_drained() {
        let mut e = Emulator::with_channel(&[104, 3, 99], vec![], OutputMode::Transient);

        assert_eq!(e.run(), Ok(State::Halted));
        assert_eq!(
            e.drain_outputs().unwrap_err().fault,
            Fault::Precondition(Precondition::OutputsNotRetained),
        );
    }

    #[test]
    fn test_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut e = emulator(&[3, 0, 4, 0, 99], &[]);

        let sink = events.clone();
        e.add_listener(move |event: &Event| sink.borrow_mut().push(event.clone()));

        e.run().unwrap();
        e.enqueue_input(7);
        e.run().unwrap();

        assert_eq!(*events.borrow(), vec![
            Event::Suspended { pointer: 0 },
            Event::Input { value: 7 },
            Event::MemoryChange { address: 0, data: 7 },
            Event::Output { value: 7 },
            Event::Halted { pointer: 4 },
        ]);
    }
}
