//! Binary entry point: `loxide [script]`. With no arguments, starts an
//! interactive REPL; with one argument, runs that file once; with more than
//! one, prints a usage message and exits 64. A thin `main.rs` driving a
//! `clap`-parsed `Cli` plus `simple_logger` for the ambient log stream.
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use loxide::cli::Cli;
use loxide::interpreter::Interpreter;
use loxide::{run_source, RunOptions, RunOutcome};

const EXIT_USAGE: u8 = 64;
const EXIT_DATA_ERROR: u8 = 65;

fn main() -> ExitCode {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).expect("logger can only be initialized once");

    let options = RunOptions {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
    };

    let mut scripts = args.script.into_iter();
    match (scripts.next(), scripts.next()) {
        (None, _) => run_prompt(options),
        (Some(path), None) => run_file(&path, options),
        (Some(_), Some(_)) => {
            println!("Usage: loxide [script]");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run_file(path: &std::path::Path, options: RunOptions) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            log::error!("couldn't read {}: {err}", path.display());
            return ExitCode::from(EXIT_DATA_ERROR);
        }
    };

    let mut interpreter = Interpreter::new();
    match run_source(&source, &mut interpreter, options) {
        RunOutcome::Ok => ExitCode::SUCCESS,
        RunOutcome::Error => ExitCode::from(EXIT_DATA_ERROR),
    }
}

fn run_prompt(options: RunOptions) -> ExitCode {
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::SUCCESS;
        }

        let mut line = String::new();
        let bytes_read = match stdin.read_line(&mut line) {
            Ok(bytes_read) => bytes_read,
            Err(_) => return ExitCode::SUCCESS,
        };

        if bytes_read == 0 || line.trim().is_empty() {
            return ExitCode::SUCCESS;
        }

        // errors in a REPL line are reported but don't end the session.
        let _ = run_source(&line, &mut interpreter, options);
    }
}
