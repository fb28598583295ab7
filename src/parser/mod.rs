//! Recursive-descent parser: token stream → statement list. Grammar exactly
//! as specified (expression precedence climbing from `assignment` down to
//! `primary`), with panic-mode recovery synchronizing on statement
//! boundaries so one bad declaration doesn't stop the rest of the file from
//! being diagnosed.
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, LiteralValue, NodeId, Stmt};
use crate::diagnostics;
use crate::lexer::{Literal, Token, TokenKind};

const MAX_ARGS: usize = 255;

/// A parse failure that unwinds to the nearest `declaration` boundary. The
/// error itself is printed immediately (see `Parser::error`); this type only
/// carries enough to drive `synchronize`.
#[derive(Debug, Clone)]
pub struct ParseError;

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("parse error")
    }
}

impl Error for ParseError {}

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: NodeId,
    had_error: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            next_id: 0,
            had_error: false,
        }
    }

    /// Parses the whole token stream. Returns the statements that parsed
    /// successfully (failed declarations are simply omitted, there is no
    /// placeholder value to stand in for them in Rust's `Stmt`) plus whether
    /// any declaration failed — the pipeline reports overall failure via
    /// this flag even though recovery let parsing continue.
    pub fn parse(mut self) -> (Vec<Stmt>, bool) {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(_) => self.synchronize(),
            }
        }
        (statements, self.had_error)
    }

    // ---- declarations ----------------------------------------------------

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.match_token(&[TokenKind::Class]) {
            return self.class_declaration();
        }
        if self.match_token(&[TokenKind::Fun]) {
            return self.function("function").map(Stmt::Function);
        }
        if self.match_token(&[TokenKind::Var]) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect class name.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenKind::RightBrace, "Expect '}' after class body.")?;
        Ok(Stmt::Class { name, methods })
    }

    fn function(&mut self, kind: &str) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name."))?;
        self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.error_no_throw(self.peek().clone(), "Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;

        let initializer = if self.match_token(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    // ---- statements --------------------------------------------------

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_token(&[TokenKind::For]) {
            return self.for_statement();
        }
        if self.match_token(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.match_token(&[TokenKind::Print]) {
            return self.print_statement();
        }
        if self.match_token(&[TokenKind::Return]) {
            return self.return_statement();
        }
        if self.match_token(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.match_token(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expression_statement()
    }

    /// `for (init; cond; inc) body` desugars to `{ init; while (cond) { body; inc; } }`
    /// at parse time — there is no `For` statement variant in the AST.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_token(&[TokenKind::Semicolon]) {
            None
        } else if self.match_token(&[TokenKind::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            self.expression()?
        } else {
            Expr::Literal {
                id: self.next_node_id(),
                value: LiteralValue::Bool(true),
            }
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_token(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(_) => self.synchronize(),
            }
        }

        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // ---- expressions -------------------------------------------------

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.match_token(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.next_node_id(),
                    name,
                    value: Box::new(value),
                }),
                Expr::Get { object, name, .. } => Ok(Expr::Set {
                    id: self.next_node_id(),
                    object,
                    name,
                    value: Box::new(value),
                }),
                other => {
                    self.error_no_throw(equals, "invalid assignment target");
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while self.match_token(&[TokenKind::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                id: self.next_node_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.match_token(&[TokenKind::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                id: self.next_node_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.left_assoc_binary(Self::comparison, &[TokenKind::BangEqual, TokenKind::EqualEqual])
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.left_assoc_binary(
            Self::term,
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.left_assoc_binary(Self::factor, &[TokenKind::Minus, TokenKind::Plus])
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.left_assoc_binary(Self::unary, &[TokenKind::Slash, TokenKind::Star])
    }

    fn left_assoc_binary(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
        operators: &[TokenKind],
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;

        while self.match_token(operators) {
            let operator = self.previous().clone();
            let right = operand(self)?;
            expr = Expr::Binary {
                id: self.next_node_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_token(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                id: self.next_node_id(),
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get {
                    id: self.next_node_id(),
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    self.error_no_throw(self.peek().clone(), "Can't have more than 255 arguments.");
                }
                arguments.push(self.expression()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            id: self.next_node_id(),
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.match_token(&[TokenKind::False]) {
            return Ok(self.literal(LiteralValue::Bool(false)));
        }
        if self.match_token(&[TokenKind::True]) {
            return Ok(self.literal(LiteralValue::Bool(true)));
        }
        if self.match_token(&[TokenKind::Nil]) {
            return Ok(self.literal(LiteralValue::Nil));
        }
        if self.match_token(&[TokenKind::Number]) {
            let value = match self.previous().literal.clone() {
                Some(Literal::Number(n)) => n,
                _ => unreachable!("NUMBER token always carries a Literal::Number"),
            };
            return Ok(self.literal(LiteralValue::Number(value)));
        }
        if self.match_token(&[TokenKind::String]) {
            let value = match self.previous().literal.clone() {
                Some(Literal::Str(s)) => s,
                _ => unreachable!("STRING token always carries a Literal::Str"),
            };
            return Ok(self.literal(LiteralValue::Str(value)));
        }
        if self.match_token(&[TokenKind::This]) {
            return Ok(Expr::This {
                id: self.next_node_id(),
                keyword: self.previous().clone(),
            });
        }
        if self.match_token(&[TokenKind::Identifier]) {
            return Ok(Expr::Variable {
                id: self.next_node_id(),
                name: self.previous().clone(),
            });
        }
        if self.match_token(&[TokenKind::LeftParen]) {
            let expression = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping {
                id: self.next_node_id(),
                expression: Box::new(expression),
            });
        }

        Err(self.error(self.peek().clone(), "Expect expression."))
    }

    fn literal(&mut self, value: LiteralValue) -> Expr {
        Expr::Literal {
            id: self.next_node_id(),
            value,
        }
    }

    // ---- token-stream plumbing ----------------------------------------

    fn next_node_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn match_token(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        Err(self.error(self.peek().clone(), message))
    }

    fn error(&mut self, token: Token, message: &str) -> ParseError {
        self.had_error = true;
        diagnostics::report_at_token(&token, message);
        ParseError
    }

    fn error_no_throw(&mut self, token: Token, message: &str) {
        self.had_error = true;
        diagnostics::report_at_token(&token, message);
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> (Vec<Stmt>, bool) {
        let tokens = Lexer::new(source).scan_tokens().unwrap();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_print_statement() {
        let (stmts, had_error) = parse("print 1 + 2;");
        assert!(!had_error);
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Print(_)));
    }

    #[test]
    fn desugars_for_loop_into_while() {
        let (stmts, had_error) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!had_error);
        assert_eq!(stmts.len(), 1);
        let Stmt::Block(block) = &stmts[0] else {
            panic!("expected desugared for-loop block");
        };
        assert_eq!(block.len(), 2);
        assert!(matches!(block[0], Stmt::Var { .. }));
        assert!(matches!(block[1], Stmt::While { .. }));
    }

    #[test]
    fn invalid_assignment_target_recovers() {
        let (stmts, had_error) = parse("1 = 2;");
        assert!(had_error);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn parse_error_synchronizes_to_next_statement() {
        let (stmts, had_error) = parse("var = ; print 1;");
        assert!(had_error);
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Print(_)));
    }
}
