//! Library surface shared by the binary's one-shot file runner and its REPL:
//! both push source text through the same lexer → parser → resolver →
//! interpreter pipeline and report failures the same way.
pub mod ast;
pub mod cli;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod value;

use interpreter::Interpreter;
use lexer::Lexer;
use parser::Parser;
use resolver::Resolver;

/// Debug-dump hooks wired to the CLI's `--dump-tokens`/`--dump-ast` flags.
#[derive(Default, Clone, Copy)]
pub struct RunOptions {
    pub dump_tokens: bool,
    pub dump_ast: bool,
}

/// Whether a chunk of source ran cleanly. A lex, parse, resolve or runtime
/// failure has already been reported to stderr by the time this comes back;
/// the caller only needs it to decide an exit code.
pub enum RunOutcome {
    Ok,
    Error,
}

/// Runs one chunk of source text (a whole file, or one REPL line) against a
/// persistent `Interpreter`, so that global state — and, in the REPL case,
/// variables defined on earlier lines — survives across calls.
pub fn run_source(source: &str, interpreter: &mut Interpreter, options: RunOptions) -> RunOutcome {
    let tokens = match Lexer::new(source).scan_tokens() {
        Ok(tokens) => tokens,
        Err(err) => {
            diagnostics::report_lex_error(err.line, &err.message);
            return RunOutcome::Error;
        }
    };

    if options.dump_tokens {
        log::info!("Tokens:\n{tokens:#?}");
    }

    let (statements, had_parse_error) = Parser::new(tokens).parse();
    if had_parse_error {
        return RunOutcome::Error;
    }

    if options.dump_ast {
        log::info!("Parsed AST:\n{statements:#?}");
    }

    let locals = match Resolver::new().resolve(&statements) {
        Ok(locals) => locals,
        Err(()) => return RunOutcome::Error,
    };

    match interpreter.interpret(&statements, locals) {
        Ok(()) => RunOutcome::Ok,
        Err(err) => {
            diagnostics::report_runtime_error(&err.message, err.token.line);
            RunOutcome::Error
        }
    }
}
