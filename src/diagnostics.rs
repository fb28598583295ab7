//! One place that knows the exact wire format for every diagnostic class in
//! the language, so the lexer/parser/resolver/evaluator never have to
//! reimplement `[line N] Error at X: Y` at each call site.
use crate::lexer::{Token, TokenKind};

/// Parse- and resolve-time diagnostics are reported against a token: the
/// offending lexeme, or "end" when the token is EOF.
pub fn report_at_token(token: &Token, message: &str) {
    let location = if token.kind == TokenKind::Eof {
        "end".to_string()
    } else {
        token.lexeme.clone()
    };
    eprintln!("[line {}] Error at {}: {}", token.line, location, message);
}

/// Lex errors have no token yet, only a line.
pub fn report_lex_error(line: usize, message: &str) {
    eprintln!("[line {line}] Error: {message}");
}

/// Runtime errors are reported message-first.
pub fn report_runtime_error(message: &str, line: usize) {
    eprintln!("{message} [line {line}]");
}
