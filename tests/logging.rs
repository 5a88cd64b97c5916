use intcode::{
    emulator::{Emulator, State},
    io::{Channel, OutputMode},
    network::FeedbackLoop,
    program::Program,
};

use slog::{Logger, Drain, o};
use slog_term::{TermDecorator, FullFormat};

fn logger() -> Logger {
    let decorator = TermDecorator::new().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(drain, o!())
}

#[test]
fn test_emulator_with_logger() {
    let program = Program::parse(include_str!("compare8.ic")).unwrap();

    let mut io = Channel::new(OutputMode::Accumulate);
    let mut emulator = Emulator::with_logger(program.words(), &mut io, logger());

    assert_eq!(emulator.run(), Ok(State::Waiting));

    emulator.io.enqueue_input(8);
    assert_eq!(emulator.run(), Ok(State::Halted));

    drop(emulator);
    assert_eq!(io.drain_outputs(), Ok(vec![1000]));
}

#[test]
fn test_feedback_with_logger() {
    let program = Program::parse(include_str!("feedback.ic")).unwrap();
    let mut network = FeedbackLoop::with_logger(program.words(), &[9, 8, 7, 6, 5], logger());

    assert_eq!(network.run(0), Ok(139629729));
}

#[test]
fn test_set_logger() {
    let mut emulator = Emulator::with_channel(&[1, 0, 0, 0, 99], vec![], OutputMode::Accumulate);
    emulator.set_logger(logger());

    assert_eq!(emulator.run(), Ok(State::Halted));
    assert_eq!(emulator.memory_at(0), Ok(2));
}
