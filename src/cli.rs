//! Command-line surface: a `clap::Parser` struct plus a separate log-level
//! enum with a `From<&LogLevel> for log::Level` conversion, no subcommand
//! structure — this interpreter only ever does one thing, run a script or
//! start a REPL, so there's nothing to dispatch on.
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a script to run. Omit to start an interactive REPL. Passing
    /// more than one is a usage error (see `loxide::EXIT_USAGE`), matched
    /// by hand in `main` rather than left to clap's own arity validation,
    /// so the printed message and exit code stay exactly what the
    /// interpreter's own usage contract specifies.
    #[arg(index = 1, num_args = 0..)]
    pub script: Vec<std::path::PathBuf>,

    /// Specify the log level of the interpreter.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,

    /// Print the token stream before parsing, then continue normally.
    #[arg(long)]
    pub dump_tokens: bool,

    /// Print the parsed AST before resolving, then continue normally.
    #[arg(long)]
    pub dump_ast: bool,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of the interpreter.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings.
    #[value(alias("1"))]
    Warn,

    /// Also log information about the state of the pipeline, e.g., which
    /// file is being run.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally in the interpreter.
    #[value(alias("3"))]
    Debug,

    /// Log extra information, including scope-resolution bookkeeping.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
