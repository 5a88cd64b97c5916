use std::fmt;

use intcode::{
    error::{NetworkError, VerboseParseError},
    network::{FeedbackLoop, Pipeline},
    program::Program,
    search::best_permutation,
};

use clap::{App, Arg, ArgMatches};
use itertools::Itertools;
use slog::{o, Discard, Drain, Level, Logger};
use slog_term::{FullFormat, TermDecorator};

enum Error {
    Parse(VerboseParseError),
    Argument(String),
    Network(NetworkError),
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

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Error {
        Error::Network(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "Parse error {}", err),
            Error::Argument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::Network(err) => write!(f, "Execution error in {}", err),
            Error::IO(io) => write!(f, "IO error: {}", io),
        }
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("intcode-amplify")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Finds the phase settings giving the highest signal from a chain of amplifiers")
        .arg(Arg::with_name("source")
             .help("File containing the comma separated amplifier program")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("feedback")
             .help("Connects the last amplifier back to the first one")
             .short("f")
             .long("feedback"))
        .arg(Arg::with_name("phases")
             .help("Comma separated phase settings to permute [default: 0,1,2,3,4 or 5,6,7,8,9 with --feedback]")
             .short("p")
             .long("phases")
             .value_name("LIST")
             .takes_value(true)
             .allow_hyphen_values(true))
        .arg(Arg::with_name("seed")
             .help("Signal given to the first amplifier")
             .short("s")
             .long("seed")
             .value_name("SIGNAL")
             .takes_value(true)
             .default_value("0")
             .allow_hyphen_values(true))
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

fn parse_integer(value: &str) -> Result<i64, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Argument(format!("expected an integer, got '{}'", value)))
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
    let feedback = args.is_present("feedback");

    let file_path = args.value_of("source")
        .ok_or_else(|| Error::Argument("missing source file".into()))?;

    let source = std::fs::read_to_string(file_path)?;
    let program = Program::parse(&source)
        .map_err(|err| err.verbose(&source))?;

    let phases = match args.value_of("phases") {
        Some(list) => list
            .split(',')
            .map(parse_integer)
            .collect::<Result<Vec<i64>, Error>>()?,
        None if feedback => (5..=9).collect(),
        None => (0..=4).collect(),
    };

    let seed = parse_integer(args.value_of("seed").unwrap_or("0"))?;

    let best = best_permutation(&phases, |ordering| {
        if feedback {
            FeedbackLoop::with_logger(program.words(), ordering, logger.clone()).run(seed)
        } else {
            Pipeline::with_logger(program.words(), logger.clone()).run(ordering, seed)
        }
    })?;

    match best {
        Some((ordering, signal)) => println!("{} (phases {})", signal, ordering.iter().join(",")),
        None => println!("No phase settings given"),
    }

    Ok(())
}
