use std::io;
use std::iter::FromIterator;
use std::process::exit;

use clap::{App, Arg, ArgMatches};
use slog::{o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use hack::{
    assembler::{self, AssembleError},
    bytecode,
    emulator::{EmulationError, Emulator, SparseMemory, Ticks},
    error::VerboseParseError,
    translator::STACK_BASE,
};

enum Error {
    IO(io::Error),
    Toolchain(hack::Error),
    Ticks(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IO(err)
    }
}

impl From<AssembleError> for Error {
    fn from(err: AssembleError) -> Error {
        Error::Toolchain(err.into())
    }
}

impl From<VerboseParseError<bytecode::ErrorKind>> for Error {
    fn from(err: VerboseParseError<bytecode::ErrorKind>) -> Error {
        Error::Toolchain(err.into())
    }
}

impl From<EmulationError> for Error {
    fn from(err: EmulationError) -> Error {
        Error::Toolchain(err.into())
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("hackrun")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility for assembling and executing Hack programs")
        .arg(Arg::with_name("source")
             .help("File containing assembly source (.asm) or binary (.hack)")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("ticks")
             .help("Number of instructions to execute, runs until the end of the program if omitted")
             .long("ticks")
             .short("t")
             .takes_value(true))
        .arg(Arg::with_name("verbose")
             .help("Enables verbose logging")
             .long("verbose")
             .short("v"))
        .get_matches()
}

fn run(file_path: &str, ticks: Ticks, logger: Logger) -> Result<SparseMemory, Error> {
    let file = std::fs::read_to_string(file_path)?;

    let program = if file_path.ends_with(".asm") {
        assembler::assemble_with_logger(&file, logger.clone())?.program
    } else {
        bytecode::Program::parse(&file)?
    };

    let memory = SparseMemory::from_iter(vec![(0, STACK_BASE)]);
    let mut emulator = Emulator::with_logger(&program, memory, logger);

    emulator.run(ticks)?;

    Ok(emulator.memory)
}

fn main() {
    let args = parse_arguments();

    let logger = if args.is_present("verbose") {
        let decorator = TermDecorator::new().build();
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    } else {
        Logger::root(Discard, o!())
    };

    let file_path = args.value_of("source").unwrap_or_default();

    let ticks = match args.value_of("ticks") {
        None => Ok(Ticks::Unbounded),
        Some(ticks) => ticks.parse()
            .map(Ticks::Limited)
            .map_err(|_| Error::Ticks(ticks.to_string())),
    };

    match ticks.and_then(|ticks| run(file_path, ticks, logger)) {
        Ok(memory) => {
            for (address, value) in memory.dump() {
                if value != 0 {
                    println!("{}: {}", address, value);
                }
            }
        },
        Err(err) => {
            match err {
                Error::IO(io) => eprintln!("IO error: {}", io),
                Error::Toolchain(err) => eprintln!("{}: {}", file_path, err),
                Error::Ticks(ticks) => eprintln!("invalid tick count '{}'", ticks),
            }

            exit(1);
        },
    }
}
