//! The scanner: turns source text into a linear token stream.
//!
//! A hand-rolled `Lexer` (`start`/`current`/`line` cursor state, a
//! lazily-built keyword map) rather than a parser-generator crate — there
//! is no grammar here, just character classes.
mod token;
mod token_kind;

pub use token::{Literal, Token};
pub use token_kind::TokenKind;

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use once_cell::sync::Lazy;

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("and", TokenKind::And);
    m.insert("class", TokenKind::Class);
    m.insert("else", TokenKind::Else);
    m.insert("false", TokenKind::False);
    m.insert("for", TokenKind::For);
    m.insert("fun", TokenKind::Fun);
    m.insert("if", TokenKind::If);
    m.insert("nil", TokenKind::Nil);
    m.insert("or", TokenKind::Or);
    m.insert("print", TokenKind::Print);
    m.insert("return", TokenKind::Return);
    m.insert("super", TokenKind::Super);
    m.insert("this", TokenKind::This);
    m.insert("true", TokenKind::True);
    m.insert("var", TokenKind::Var);
    m.insert("while", TokenKind::While);
    m
});

/// A lex failure. The scanner fails closed: the first bad byte aborts the
/// whole pass, no partial token list is forwarded.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: {}", self.line, self.message)
    }
}

impl Error for LexError {}

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, LexError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, "", None, self.line));
        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.current + 1).copied()
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != Some(expected) {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_with_literal(kind, None);
    }

    fn add_token_with_literal(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    fn scan_token(&mut self) -> Result<(), LexError> {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.matches('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.matches('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != Some('\n') && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number(),
            c if is_alpha(c) => self.identifier(),
            _ => {
                return Err(LexError {
                    line: self.line,
                    message: "Unexpected character.".to_string(),
                })
            }
        }
        Ok(())
    }

    fn string(&mut self) -> Result<(), LexError> {
        while self.peek() != Some('"') && !self.is_at_end() {
            if self.peek() == Some('\n') {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(LexError {
                line: self.line,
                message: "Unterminated string.".to_string(),
            });
        }

        // closing quote
        self.advance();

        let value: String = self.source[self.start + 1..self.current - 1].iter().collect();
        self.add_token_with_literal(TokenKind::String, Some(Literal::Str(value)));
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.lexeme();
        let value: f64 = text.parse().expect("lexed digits always parse as f64");
        self.add_token_with_literal(TokenKind::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(|c| is_alpha(c) || c.is_ascii_digit()) {
            self.advance();
        }

        let text = self.lexeme();
        let kind = KEYWORDS.get(text.as_str()).copied().unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_punctuation_and_operators() {
        assert_eq!(
            kinds("(){},.-+;*!= == <= >="),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::BangEqual,
                TokenKind::EqualEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("var x = foo"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_number_literal() {
        let tokens = Lexer::new("123.45").scan_tokens().unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.45)));
    }

    #[test]
    fn dot_without_trailing_digit_is_its_own_token() {
        let tokens = Lexer::new("123.").scan_tokens().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }

    #[test]
    fn line_comment_is_consumed_without_token() {
        assert_eq!(kinds("// hi\n1"), vec![TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new("\"abc").scan_tokens().unwrap_err();
        assert_eq!(err.message, "Unterminated string.");
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = Lexer::new("@").scan_tokens().unwrap_err();
        assert_eq!(err.message, "Unexpected character.");
    }

    #[test]
    fn string_spanning_multiple_lines_tracks_line_number() {
        let tokens = Lexer::new("\"a\nb\" 1").scan_tokens().unwrap();
        assert_eq!(tokens[1].line, 2);
    }
}
