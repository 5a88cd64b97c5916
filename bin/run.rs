use std::fmt;

use intcode::{
    emulator::{Emulator, State},
    error::{ExecutionError, SearchError, VerboseParseError},
    io::{Channel, InputOutput, OutputMode, StdIo},
    program::Program,
    search,
};

use clap::{App, Arg, ArgMatches};
use slog::{o, Discard, Drain, Level, Logger};
use slog_term::{FullFormat, TermDecorator};

enum Error {
    Parse(VerboseParseError),
    Argument(String),
    Execution(ExecutionError),
    Search(SearchError),
    Waiting(usize),
    IO(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<VerboseParseError> for Error {
    fn from(e: VerboseParseError) -> Error {
        Error::Parse(e)
    }
}

impl From<ExecutionError> for Error {
    fn from(e: ExecutionError) -> Error {
        Error::Execution(e)
    }
}

impl From<SearchError> for Error {
    fn from(e: SearchError) -> Error {
        Error::Search(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "Parse error {}", err),
            Error::Argument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::Execution(err) => write!(f, "Execution error {}", err),
            Error::Search(err) => write!(f, "Search failed at {}", err),
            Error::Waiting(pointer) => write!(f, "Program is waiting for input at pointer {}", pointer),
            Error::IO(io) => write!(f, "IO error: {}", io),
        }
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("intcode-run")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility for executing Intcode programs")
        .arg(Arg::with_name("source")
             .help("File containing the comma separated program")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("input")
             .help("Value appended to the input queue. If no inputs are given, they are asked interactively")
             .short("i")
             .long("input")
             .value_name("VALUE")
             .takes_value(true)
             .multiple(true)
             .number_of_values(1)
             .allow_hyphen_values(true))
        .arg(Arg::with_name("noun")
             .help("Value stored at address 1 before running")
             .long("noun")
             .value_name("NOUN")
             .takes_value(true)
             .allow_hyphen_values(true))
        .arg(Arg::with_name("verb")
             .help("Value stored at address 2 before running")
             .long("verb")
             .value_name("VERB")
             .takes_value(true)
             .allow_hyphen_values(true))
        .arg(Arg::with_name("dump")
             .help("Prints the value at this address after the program halts")
             .long("dump")
             .value_name("ADDRESS")
             .takes_value(true))
        .arg(Arg::with_name("search")
             .help("Searches the noun and verb which leave this value at address 0")
             .long("search")
             .value_name("TARGET")
             .takes_value(true)
             .allow_hyphen_values(true)
             .conflicts_with_all(&["input", "noun", "verb", "dump"]))
        .arg(Arg::with_name("verbose")
             .help("Enables verbose logging, repeat for instruction traces")
             .short("v")
             .long("verbose")
             .multiple(true))
        .get_matches()
}

fn build_logger(verbosity: u64) -> Logger {
    let level = match verbosity {
        0 => return Logger::root(Discard, o!()),
        1 => Level::Debug,
        _ => Level::Trace,
    };

    let decorator = TermDecorator::new().stderr().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(drain.filter_level(level).fuse(), o!())
}

fn integer_argument<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> Result<Option<T>, Error> {
    args.value_of(name)
        .map(|value| value
            .parse()
            .map_err(|_| Error::Argument(format!("{} must be an integer, got '{}'", name, value))))
        .transpose()
}

fn main() {
    let args = parse_arguments();

    if let Err(err) = run(&args) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: &ArgMatches) -> Result<(), Error> {
    let logger = build_logger(args.occurrences_of("verbose"));

    let file_path = args.value_of("source")
        .ok_or_else(|| Error::Argument("missing source file".into()))?;

    let source = std::fs::read_to_string(file_path)?;
    let mut program = Program::parse(&source)
        .map_err(|err| err.verbose(&source))?;

    if let Some(target) = integer_argument(args, "search")? {
        match search::find_noun_verb(&program, target)? {
            Some((noun, verb)) => println!("{}", 100 * noun + verb),
            None => println!("No noun and verb produce {}", target),
        }

        return Ok(());
    }

    let mut patches = Vec::new();

    if let Some(noun) = integer_argument(args, "noun")? {
        patches.push((search::NOUN_ADDRESS, noun));
    }

    if let Some(verb) = integer_argument(args, "verb")? {
        patches.push((search::VERB_ADDRESS, verb));
    }

    if !patches.is_empty() {
        program = program.patched(&patches)
            .map_err(|fault| ExecutionError { pointer: 0, fault })?;
    }

    let dump = integer_argument::<usize>(args, "dump")?;

    let inputs = args.values_of("input")
        .map(|values| values
            .map(|value| value
                .parse()
                .map_err(|_| Error::Argument(format!("input must be an integer, got '{}'", value))))
            .collect::<Result<Vec<i64>, Error>>())
        .transpose()?;

    match inputs {
        Some(inputs) => {
            let io = Channel::with_input(inputs, OutputMode::Transient);
            execute(Emulator::with_logger(program.words(), io, logger), dump)
        },
        None => execute(Emulator::with_logger(program.words(), StdIo, logger), dump),
    }
}

fn execute<IO: InputOutput>(mut emulator: Emulator<IO>, dump: Option<usize>) -> Result<(), Error> {
    if emulator.run()? != State::Halted {
        return Err(Error::Waiting(emulator.pointer()));
    }

    if let Some(address) = dump {
        let value = emulator.memory_at(address)
            .map_err(|fault| ExecutionError { pointer: emulator.pointer(), fault })?;

        println!("{}", value);
    }

    Ok(())
}
