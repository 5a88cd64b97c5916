//! Exhaustive searches built on top of the emulator.

use itertools::Itertools;

use crate::emulator::{Emulator, State};
use crate::error::{ExecutionError, SearchError, SearchErrorKind};
use crate::io::{Channel, OutputMode};
use crate::program::Program;

/// Tries every ordering of `settings` and keeps the one with the largest result.
///
/// # Parameters
/// - `settings`: The values to permute.
/// - `evaluate`: Computes the result of a single ordering, for example by running a
///   [Pipeline](crate::network::Pipeline) with it.
///
/// # Returns
/// The best ordering and its result, or `None` if `evaluate` was never called.
/// The first error returned by `evaluate` aborts the search.
pub fn best_permutation<F, E>(settings: &[i64], mut evaluate: F) -> Result<Option<(Vec<i64>, i64)>, E>
where
    F: FnMut(&[i64]) -> Result<i64, E>,
{
    let mut best: Option<(Vec<i64>, i64)> = None;

    for ordering in settings.iter().copied().permutations(settings.len()) {
        let result = evaluate(&ordering)?;

        if best.as_ref().map_or(true, |(_, best_result)| result > *best_result) {
            best = Some((ordering, result));
        }
    }

    Ok(best)
}

/// Address of the noun in a gravity assist program.
pub const NOUN_ADDRESS: usize = 1;

/// Address of the verb in a gravity assist program.
pub const VERB_ADDRESS: usize = 2;

/// Runs `program` with the given noun and verb and returns the value left at address `0`.
///
/// # Errors
/// A [SearchError] naming the pair if the program cannot be patched, faults, or stops without
/// halting.
pub fn run_with_noun_verb(program: &Program, noun: i64, verb: i64) -> Result<i64, SearchError> {
    let error = |kind| SearchError { noun, verb, kind };

    let patched = program
        .patched(&[(NOUN_ADDRESS, noun), (VERB_ADDRESS, verb)])
        .map_err(|fault| error(SearchErrorKind::Patch(fault)))?;

    let mut emulator: Emulator<Channel> =
        Emulator::with_channel(patched.words(), vec![], OutputMode::Accumulate);

    match emulator.run() {
        Ok(State::Halted) => (),
        Ok(state) => return Err(error(SearchErrorKind::NotHalted {
            pointer: emulator.pointer(),
            state,
        })),
        Err(err) => return Err(error(SearchErrorKind::Execution(err))),
    }

    emulator
        .memory_at(0)
        .map_err(|fault| error(SearchErrorKind::Execution(ExecutionError {
            pointer: emulator.pointer(),
            fault,
        })))
}

/// Finds the noun and the verb, both in `0..=99`, that make `program` leave `target` at
/// address `0`.
///
/// Nouns are tried in increasing order, and verbs in increasing order for every noun. The first
/// pair that fails to run aborts the search with its error.
pub fn find_noun_verb(program: &Program, target: i64) -> Result<Option<(i64, i64)>, SearchError> {
    for noun in 0..=99 {
        for verb in 0..=99 {
            if run_with_noun_verb(program, noun, verb)? == target {
                return Ok(Some((noun, verb)));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;

    #[test]
    fn test_best_permutation() {
        // Weights every position differently, so exactly one ordering wins.
        let best = best_permutation(&[1, 2, 3], |ordering| {
            Ok::<_, ()>(ordering[0] * 100 + ordering[1] * 10 + ordering[2])
        });

        assert_eq!(best, Ok(Some((vec![3, 2, 1], 321))));
    }

    #[test]
    fn test_best_permutation_visits_every_ordering() {
        let mut seen = Vec::new();

        best_permutation(&[0, 1, 2, 3], |ordering| {
            seen.push(ordering.to_vec());
            Ok::<_, ()>(0)
        }).unwrap();

        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn test_best_permutation_error() {
        let result = best_permutation(&[1, 2], |ordering| {
            if ordering[0] == 2 { Err("bad ordering") } else { Ok(1) }
        });

        assert_eq!(result, Err("bad ordering"));
    }

    #[test]
    fn test_noun_verb() {
        // Stores memory[noun] + memory[verb] at address 0.
        let program = Program::from_words(vec![1, 0, 0, 0, 99, 30, 40, 50]);
        assert_eq!(run_with_noun_verb(&program, 5, 6), Ok(70));

        // Stores noun + verb at address 0.
        let program = Program::from_words(vec![1101, 0, 0, 0, 99]);
        assert_eq!(find_noun_verb(&program, 90), Ok(Some((0, 90))));
        assert_eq!(find_noun_verb(&program, 150), Ok(Some((51, 99))));
        assert_eq!(find_noun_verb(&program, 1000), Ok(None));
    }

    #[test]
    fn test_noun_verb_fault_aborts_search() {
        let program = Program::from_words(vec![1, 0, 0, 0, 99, 30, 40, 50]);

        assert_eq!(find_noun_verb(&program, 1000), Err(SearchError {
            noun: 0,
            verb: 8,
            kind: SearchErrorKind::Execution(ExecutionError {
                pointer: 0,
                fault: Fault::Address { address: 8 },
            }),
        }));
    }

    #[test]
    fn test_noun_verb_patch_fault() {
        let program = Program::from_words(vec![99]);

        assert_eq!(run_with_noun_verb(&program, 0, 0), Err(SearchError {
            noun: 0,
            verb: 0,
            kind: SearchErrorKind::Patch(Fault::Address { address: 1 }),
        }));
    }

    #[test]
    fn test_noun_verb_without_halt() {
        // Reads into the noun address and finds no input.
        let program = Program::from_words(vec![3, 0, 0]);

        assert_eq!(run_with_noun_verb(&program, 0, 0), Err(SearchError {
            noun: 0,
            verb: 0,
            kind: SearchErrorKind::NotHalted {
                pointer: 0,
                state: State::Waiting,
            },
        }));
    }
}
