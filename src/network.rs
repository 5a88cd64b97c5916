//! Networks of emulators connected output to input.
//!
//! A [Pipeline] passes a single value through a series of emulators, each of which runs to
//! completion once. A [FeedbackLoop] connects the last emulator back to the first one and keeps
//! the value circulating until the last emulator halts.

use slog::{o, debug, Discard, Logger};

use crate::emulator::{Emulator, State};
use crate::error::{ExecutionError, NetworkError, NetworkErrorKind};
use crate::io::{Channel, OutputMode};

fn root_logger<L: Into<Option<Logger>>>(logger: L) -> Logger {
    logger
        .into()
        .unwrap_or(Logger::root(Discard, o!()))
        .new(o!("stage" => "network"))
}

fn execution_error(instance: usize) -> impl Fn(ExecutionError) -> NetworkError {
    move |err| NetworkError {
        instance,
        kind: NetworkErrorKind::Execution(err),
    }
}

/// Takes the most recent output of an instance.
fn last_output(instance: usize, emulator: &mut Emulator<Channel>) -> Result<i64, NetworkError> {
    emulator
        .drain_outputs()
        .map_err(execution_error(instance))?
        .last()
        .copied()
        .ok_or(NetworkError {
            instance,
            kind: NetworkErrorKind::NoOutput,
        })
}

/// A series of emulators running the same program, each fed with its own phase setting and the
/// output of the previous one.
pub struct Pipeline<'p> {
    program: &'p [i64],
    logger: Logger,
}

impl<'p> Pipeline<'p> {
    pub fn new(program: &'p [i64]) -> Pipeline<'p> {
        Pipeline::with_logger(program, None::<Logger>)
    }

    pub fn with_logger<L: Into<Option<Logger>>>(program: &'p [i64], logger: L) -> Pipeline<'p> {
        Pipeline {
            program,
            logger: root_logger(logger),
        }
    }

    /// Passes `seed` through one fresh emulator per phase setting.
    ///
    /// Every emulator receives the inputs `[phase, value]` and must halt. Its last output is the
    /// value given to the next emulator.
    ///
    /// # Returns
    /// The last output of the last emulator.
    pub fn run(&self, phases: &[i64], seed: i64) -> Result<i64, NetworkError> {
        if phases.is_empty() {
            return Err(NetworkError {
                instance: 0,
                kind: NetworkErrorKind::NoInstances,
            });
        }

        let mut value = seed;

        for (instance, phase) in phases.iter().enumerate() {
            let logger = self.logger.new(o!("instance" => instance));

            let mut emulator = Emulator::with_logger(
                self.program,
                Channel::with_input(vec![*phase, value], OutputMode::Accumulate),
                logger.clone(),
            );

            let state = emulator.run().map_err(execution_error(instance))?;

            if state != State::Halted {
                return Err(NetworkError {
                    instance,
                    kind: NetworkErrorKind::NotHalted(state),
                });
            }

            value = last_output(instance, &mut emulator)?;
            debug!(logger, "stage done"; "phase" => *phase, "output" => value);
        }

        Ok(value)
    }
}

/// A ring of emulators which are kept alive between their turns.
///
/// The output of every emulator is fed to the next one and the output of the last emulator back
/// to the first one.
pub struct FeedbackLoop {
    instances: Vec<Emulator<Channel>>,
    logger: Logger,
}

impl FeedbackLoop {
    /// Creates one emulator per phase setting, with the phase already in its input queue.
    pub fn new(program: &[i64], phases: &[i64]) -> FeedbackLoop {
        FeedbackLoop::with_logger(program, phases, None::<Logger>)
    }

    pub fn with_logger<L>(program: &[i64], phases: &[i64], logger: L) -> FeedbackLoop
    where
        L: Into<Option<Logger>>,
    {
        let logger = root_logger(logger);

        let instances = phases
            .iter()
            .enumerate()
            .map(|(instance, phase)| Emulator::with_logger(
                program,
                Channel::with_input(vec![*phase], OutputMode::Accumulate),
                logger.new(o!("instance" => instance)),
            ))
            .collect();

        FeedbackLoop {
            instances,
            logger,
        }
    }

    pub fn instances(&self) -> &[Emulator<Channel>] {
        &self.instances[..]
    }

    /// Circulates `seed` through the ring until the last emulator halts.
    ///
    /// On every turn the circulating value is queued to the current emulator, which is then run
    /// until it halts or waits for more input. Its last output becomes the new circulating
    /// value. Other emulators halting before the last one is not an error: an emulator that has
    /// already halted is skipped and the value passes it unchanged.
    ///
    /// # Returns
    /// The last output of the last emulator.
    pub fn run(&mut self, seed: i64) -> Result<i64, NetworkError> {
        let last = match self.instances.len() {
            0 => return Err(NetworkError {
                instance: 0,
                kind: NetworkErrorKind::NoInstances,
            }),
            len => len - 1,
        };

        let mut value = seed;
        let mut instance = 0;
        let mut round = 0;

        loop {
            let emulator = &mut self.instances[instance];

            let state = if emulator.state() == State::Halted {
                debug!(self.logger, "turn skipped";
                       "instance" => instance, "round" => round, "value" => value);

                State::Halted
            } else {
                emulator.enqueue_input(value);
                let state = emulator.run().map_err(execution_error(instance))?;
                value = last_output(instance, emulator)?;

                debug!(self.logger, "turn done";
                       "instance" => instance, "round" => round, "state" => %state, "output" => value);

                state
            };

            if instance == last && state == State::Halted {
                return Ok(value);
            }

            instance = (instance + 1) % self.instances.len();

            if instance == 0 {
                round += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads a phase, then echoes `input + phase` three times before halting.
    const ECHO: [i64; 34] = [
        3, 30,
        3, 31,
        1, 30, 31, 32,
        4, 32,
        1001, 33, -1, 33,
        1005, 33, 2,
        99,
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 3,
    ];

    #[test]
    fn test_pipeline() {
        let program = [
            3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0,
        ];

        assert_eq!(Pipeline::new(&program).run(&[4, 3, 2, 1, 0], 0), Ok(43210));
    }

    #[test]
    fn test_pipeline_without_halt() {
        // Echoes forever, so every stage ends up waiting.
        let program = [3, 0, 3, 1, 4, 1, 1105, 1, 2];

        assert_eq!(Pipeline::new(&program).run(&[1, 2], 0), Err(NetworkError {
            instance: 0,
            kind: NetworkErrorKind::NotHalted(State::Waiting),
        }));
    }

    #[test]
    fn test_feedback_echo() {
        let mut network = FeedbackLoop::new(&ECHO, &[9, 8, 7, 6, 5]);

        // Every round adds 9 + 8 + 7 + 6 + 5 = 35 and the last instance halts after three rounds.
        assert_eq!(network.run(0), Ok(105));

        for emulator in network.instances() {
            assert_eq!(emulator.state(), State::Halted);
        }
    }

    #[test]
    fn test_feedback_single_round() {
        let mut program = ECHO;
        program[33] = 1;

        assert_eq!(FeedbackLoop::new(&program, &[9, 8, 7, 6, 5]).run(0), Ok(35));
        assert_eq!(FeedbackLoop::new(&program, &[1]).run(10), Ok(11));
    }

    #[test]
    fn test_feedback_skips_halted_instance() {
        // The first instance echoes once and halts, the second one echoes twice.
        let mut short = ECHO.to_vec();
        short[33] = 1;

        let mut long = ECHO.to_vec();
        long[33] = 2;

        let mut network = FeedbackLoop::new(&long, &[0, 10]);
        network.instances[0] = Emulator::with_channel(&short, vec![1], OutputMode::Accumulate);

        // Round one: 0 -> 1 -> 11. Round two passes the halted first instance: 11 -> 21.
        assert_eq!(network.run(0), Ok(21));

        for emulator in network.instances() {
            assert_eq!(emulator.state(), State::Halted);
        }
    }

    #[test]
    fn test_feedback_no_output() {
        // Consumes both of its inputs and halts without producing anything.
        let program = [3, 0, 3, 0, 99];

        assert_eq!(FeedbackLoop::new(&program, &[0, 0]).run(0), Err(NetworkError {
            instance: 0,
            kind: NetworkErrorKind::NoOutput,
        }));
    }

    #[test]
    fn test_no_instances() {
        let err = NetworkError {
            instance: 0,
            kind: NetworkErrorKind::NoInstances,
        };

        assert_eq!(Pipeline::new(&ECHO).run(&[], 0), Err(err.clone()));
        assert_eq!(FeedbackLoop::new(&ECHO, &[]).run(0), Err(err));
    }
}
