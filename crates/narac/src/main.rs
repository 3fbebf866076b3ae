//! Nara Language Compiler Executable
//!
//! A thin driver around [`libnara`]: it parses the command line, builds the
//! compiler configuration, runs the module compiler, and renders any
//! diagnostics. The interesting work all happens in the library.
//!
//! # Usage
//!
//! ```text
//! narac [--src DIR]... [--mode debug|release] [--target PATH] MODULE
//! ```
//!
//! `MODULE` is a qualified module name such as `main` or `app::cli`. Source
//! directories are searched in the order given; the current directory is
//! used when none are provided.

use std::{path::PathBuf, process::exit};

use libnara::{
    compile,
    config::{Config, Mode},
    error::{render_diagnostics, CompilerError},
    reader::DiskReader,
};
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelPadding, TermLogger, TerminalMode,
    ThreadLogMode,
};

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} [--src DIR]... [--mode debug|release] [--target PATH] MODULE");
    exit(1);
}

fn main() -> Result<(), CompilerError> {
    let log_config = ConfigBuilder::new()
        .set_location_level(LevelFilter::Error)
        .set_thread_mode(ThreadLogMode::Both)
        .set_level_padding(LevelPadding::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let _ = CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Warn,
        log_config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);

    let arguments: Vec<String> = std::env::args().collect();
    let program = arguments
        .first()
        .cloned()
        .unwrap_or_else(|| "narac".to_string());

    let mut source_directories: Vec<PathBuf> = Vec::new();
    let mut mode = Mode::Debug;
    let mut target = PathBuf::new();
    let mut module = None;
    let mut iterator = arguments.into_iter().skip(1);

    while let Some(argument) = iterator.next() {
        match argument.as_str() {
            "--src" => match iterator.next() {
                Some(directory) => source_directories.push(directory.into()),
                None => usage(&program),
            },
            "--mode" => match iterator.next() {
                Some(value) => mode = Mode::parse(&value)?,
                None => usage(&program),
            },
            "--target" => match iterator.next() {
                Some(path) => target = path.into(),
                None => usage(&program),
            },
            "--help" | "-h" => usage(&program),
            name if module.is_none() => module = Some(name.to_string()),
            _ => usage(&program),
        }
    }

    let Some(module) = module else {
        usage(&program);
    };

    if source_directories.is_empty() {
        source_directories.push(".".into());
    }

    let mut config = Config::new(source_directories).with_mode(mode);

    config.target = target;

    let state = compile(config, DiskReader, &module)?;

    if state.diagnostics.is_empty() {
        return Ok(());
    }

    render_diagnostics(&state.diagnostics);

    if state.diagnostics.has_errors() {
        exit(1);
    }

    Ok(())
}
