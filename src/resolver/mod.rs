//! Static resolution pass: walks the AST once before evaluation and records,
//! for every `Variable`/`This`/`Assign` node that resolves to a non-global
//! binding, how many environment links to walk at runtime. Absence of an
//! entry means "look it up in globals" (see `crate::interpreter`).
use std::collections::HashMap;

use crate::ast::{Expr, FunctionDecl, NodeId, Stmt};
use crate::diagnostics;
use crate::lexer::Token;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    locals: HashMap<NodeId, usize>,
    current_function: FunctionType,
    current_class: ClassType,
    had_error: bool,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            had_error: false,
        }
    }

    /// Resolves a whole program. On success, returns the side-table the
    /// evaluator uses for scope-distance lookups; on the first static error
    /// resolution aborts (the error itself was already printed).
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<HashMap<NodeId, usize>, ()> {
        self.resolve_statements(statements);
        if self.had_error {
            Err(())
        } else {
            Ok(self.locals)
        }
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_statement(stmt);
        }
    }

    fn resolve_statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(name);
            }
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_statement(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_statement(body);
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "can't return from top-level code.");
                }
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "can't return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Class { name, methods } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                self.begin_scope();
                self.scopes
                    .last_mut()
                    .expect("scope just pushed")
                    .insert("this".to_string(), true);

                for method in methods {
                    let kind = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };
                    self.resolve_function(method, kind);
                }

                self.end_scope();
                self.current_class = enclosing_class;
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_statements(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Grouping { expression, .. } => self.resolve_expr(expression),
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(*id, name);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }
        }
    }

    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(id, depth);
                return;
            }
        }
        // not found in any scope: leave unresolved, the evaluator treats
        // it as a global lookup.
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "already a variable with this name in this scope.");
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.had_error = true;
        diagnostics::report_at_token(token, message);
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn resolve(source: &str) -> Result<HashMap<NodeId, usize>, ()> {
        let tokens = Lexer::new(source).scan_tokens().unwrap();
        let (stmts, had_error) = Parser::new(tokens).parse();
        assert!(!had_error, "source failed to parse");
        Resolver::new().resolve(&stmts)
    }

    #[test]
    fn self_referential_initializer_is_an_error() {
        assert!(resolve("{ var a = a; }").is_err());
    }

    #[test]
    fn duplicate_local_declaration_is_an_error() {
        assert!(resolve("{ var a = 1; var a = 2; }").is_err());
    }

    #[test]
    fn top_level_return_is_an_error() {
        assert!(resolve("return 1;").is_err());
    }

    #[test]
    fn this_outside_class_is_an_error() {
        assert!(resolve("print this;").is_err());
    }

    #[test]
    fn block_local_resolves_to_depth_zero() {
        let locals = resolve("{ var a = 1; print a; }").unwrap();
        assert_eq!(locals.values().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn global_reference_is_left_unresolved() {
        let locals = resolve("var a = 1; print a;").unwrap();
        assert!(locals.is_empty());
    }
}
