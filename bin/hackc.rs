use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{App, Arg, ArgMatches};
use slog::{o, debug, info, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use hack::{
    assembler,
    jack::{self, CompileError},
    translator::{self, TranslateOptions},
    vm::{self, Item},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Vm,
    Asm,
    Hack,
}

enum Error {
    IO(PathBuf, io::Error),
    Compile(PathBuf, String, CompileError),
    Toolchain(PathBuf, hack::Error),
    Input(String),
}

impl From<Error> for String {
    fn from(err: Error) -> String {
        match err {
            Error::IO(path, err) => format!("{}: {}", path.display(), err),
            Error::Compile(path, source, err) => match err.location(&source) {
                Some(location) => format!("{}:{}:{}: {}", path.display(), location.line, location.column, err),
                None => format!("{}: {}", path.display(), err),
            },
            Error::Toolchain(path, err) => format!("{}: {}", path.display(), err),
            Error::Input(message) => message,
        }
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("hackc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles Jack classes down to Hack binaries")
        .arg(Arg::with_name("path")
             .help("A .jack, .vm or .asm file, or a directory of .jack or .vm files")
             .value_name("PATH")
             .required(true)
             .index(1))
        .arg(Arg::with_name("stage")
             .help("Last stage to run")
             .long("stage")
             .short("s")
             .takes_value(true)
             .possible_values(&["vm", "asm", "hack"])
             .default_value("hack"))
        .arg(Arg::with_name("xml")
             .help("Also writes the parse tree of every class")
             .long("xml"))
        .arg(Arg::with_name("verbose")
             .help("Enables verbose logging")
             .long("verbose")
             .short("v"))
        .get_matches()
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|err| Error::IO(path.to_owned(), err))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), Error> {
    let mut text = lines.join("\n");
    text.push('\n');

    fs::write(path, text).map_err(|err| Error::IO(path.to_owned(), err))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().map(|ext| ext == extension).unwrap_or(false)
}

/// Files in `dir` with the given extension, sorted by name.
fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(dir).map_err(|err| Error::IO(dir.to_owned(), err))?;
    let mut files = Vec::new();

    for entry in entries {
        let path = entry.map_err(|err| Error::IO(dir.to_owned(), err))?.path();

        if path.is_file() && has_extension(&path, extension) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compiles every Jack file into a `.vm` file next to it.
fn compile(files: &[PathBuf], xml: bool, logger: &Logger) -> Result<vm::Program, Error> {
    let mut program = vm::Program::default();

    for path in files {
        let source = read(path)?;

        let class = jack::parse(&source)
            .map_err(|err| Error::Compile(path.clone(), source.clone(), err))?;

        if xml {
            write_lines(&path.with_extension("xml"), &jack::xml::to_xml_lines(&class))?;
        }

        let commands = jack::codegen::generate_with_logger(&class, logger.clone())
            .map_err(|err| Error::Compile(path.clone(), source.clone(), err.into()))?;

        let lines = commands.iter().map(ToString::to_string).collect::<Vec<_>>();
        write_lines(&path.with_extension("vm"), &lines)?;
        info!(logger, "compiled"; "file" => %path.display(), "commands" => commands.len());

        program.push_unit(&class.name, commands);
    }

    Ok(program)
}

/// Reads `.vm` files into one program, each file forming a unit named after it.
fn load_vm(files: &[PathBuf]) -> Result<vm::Program, Error> {
    let mut program = vm::Program::default();

    for path in files {
        let source = read(path)?;
        let unit = vm::parse_program(&source)
            .map_err(|err| Error::Toolchain(path.clone(), err.into()))?;

        program.push(Item::Unit(stem(path)));
        program.items.extend(unit.items);
    }

    Ok(program)
}

fn translate(program: &vm::Program, bootstrap: bool, output: &Path, logger: &Logger) -> Result<(), Error> {
    let options = TranslateOptions {
        bootstrap,
        unit: None,
    };

    let lines = translator::translate_with_logger(program, &options, logger.clone())
        .map_err(|err| Error::Toolchain(output.to_owned(), err.into()))?;

    write_lines(output, &lines)?;
    info!(logger, "translated"; "file" => %output.display(), "lines" => lines.len());

    Ok(())
}

fn assemble(input: &Path, logger: &Logger) -> Result<(), Error> {
    let source = read(input)?;
    let assembly = assembler::assemble_with_logger(&source, logger.clone())
        .map_err(|err| Error::Toolchain(input.to_owned(), err.into()))?;

    let output = input.with_extension("hack");
    write_lines(&output, &assembly.program.to_lines())?;
    info!(logger, "assembled"; "file" => %output.display(), "words" => assembly.program.len());

    Ok(())
}

fn run(path: &Path, stage: Stage, xml: bool, logger: &Logger) -> Result<(), Error> {
    if has_extension(path, "asm") {
        return assemble(path, logger);
    }

    let (program, bootstrap, output) = if path.is_dir() {
        let name = path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        let output = path.join(name).with_extension("asm");

        let sources = files_with_extension(path, "jack")?;
        debug!(logger, "scanned directory"; "path" => %path.display(), "classes" => sources.len());

        let program = if sources.is_empty() {
            let units = files_with_extension(path, "vm")?;

            if units.is_empty() {
                return Err(Error::Input(format!("{}: no .jack or .vm files found", path.display())));
            }

            load_vm(&units)?
        } else {
            compile(&sources, xml, logger)?
        };

        (program, true, output)
    } else if has_extension(path, "jack") {
        (compile(&[path.to_owned()], xml, logger)?, false, path.with_extension("asm"))
    } else if has_extension(path, "vm") {
        (load_vm(&[path.to_owned()])?, false, path.with_extension("asm"))
    } else {
        return Err(Error::Input(format!("{}: expected a .jack, .vm or .asm file", path.display())));
    };

    if stage < Stage::Asm {
        return Ok(());
    }

    translate(&program, bootstrap, &output, logger)?;

    if stage < Stage::Hack {
        return Ok(());
    }

    assemble(&output, logger)
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

    let stage = match args.value_of("stage") {
        Some("vm") => Stage::Vm,
        Some("asm") => Stage::Asm,
        _ => Stage::Hack,
    };

    let path = Path::new(args.value_of("path").unwrap_or_default());

    if let Err(err) = run(path, stage, args.is_present("xml"), &logger) {
        eprintln!("{}", String::from(err));
        exit(1);
    }
}
