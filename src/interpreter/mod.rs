//! The evaluator: walks the AST produced by the parser (and annotated by the
//! resolver) and actually runs the program.
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::{Expr, FunctionDecl, LiteralValue, NodeId, Stmt};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::lexer::{Token, TokenKind};
use crate::value::{Callable, Class, Function, NativeFunction, Value};

/// What happened while executing a statement sequence. `return` doesn't
/// unwind the Rust call stack (no panics, no `Err`-as-control-flow): it
/// bubbles up as a distinguished `Ok` value until `execute_block` in the
/// enclosing function call absorbs it.
pub enum Signal {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    pub globals: Environment,
    environment: Environment,
    locals: HashMap<NodeId, usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new();
        globals.define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: Box::new(|_args| {
                    let elapsed = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .expect("system clock is after the unix epoch");
                    Value::Number(elapsed.as_secs_f64())
                }),
            })),
        );

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
        }
    }

    /// Runs a freshly parsed and resolved program. `locals` replaces the
    /// side-table wholesale rather than merging into it: each call to the
    /// REPL or the one-shot file runner resolves a self-contained chunk
    /// whose `NodeId`s start over at zero, so reusing an older table across
    /// chunks would misattribute distances.
    pub fn interpret(&mut self, statements: &[Stmt], locals: HashMap<NodeId, usize>) -> Result<(), RuntimeError> {
        self.locals = locals;
        for stmt in statements {
            self.execute_statement(stmt)?;
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Signal, RuntimeError> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Signal::Normal)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{}", value.stringify());
                Ok(Signal::Normal)
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(&name.lexeme, value);
                Ok(Signal::Normal)
            }
            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(self.environment.clone());
                self.execute_block(statements, scope)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute_statement(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_statement(else_branch)
                } else {
                    Ok(Signal::Normal)
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute_statement(body)? {
                        Signal::Normal => {}
                        signal @ Signal::Return(_) => return Ok(signal),
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::Function(decl) => {
                let function = Function::new(decl.clone(), self.environment.clone(), false);
                self.environment
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Signal::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Signal::Return(value))
            }
            Stmt::Class { name, methods } => {
                self.environment.define(&name.lexeme, Value::Nil);

                let mut method_table = HashMap::new();
                for method in methods {
                    let is_initializer = method.name.lexeme == "init";
                    let function = Function::new(method.clone(), self.environment.clone(), is_initializer);
                    method_table.insert(method.name.lexeme.clone(), Rc::new(function));
                }

                let class = Class {
                    name: name.lexeme.clone(),
                    methods: method_table,
                };
                self.environment.assign(name, Value::Class(Rc::new(class)))?;
                Ok(Signal::Normal)
            }
        }
    }

    /// Runs `statements` in `scope`, restoring the caller's environment on
    /// every exit path (fall-through, early `return`, or a propagated
    /// error) so a callee can never leak its local scope into the caller.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: Environment) -> Result<Signal, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, scope);

        let mut result = Signal::Normal;
        let mut error = None;
        for stmt in statements {
            match self.execute_statement(stmt) {
                Ok(Signal::Normal) => {}
                Ok(signal @ Signal::Return(_)) => {
                    result = signal;
                    break;
                }
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }

        self.environment = previous;

        match error {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal { value, .. } => Ok(literal_value(value)),
            Expr::Grouping { expression, .. } => self.evaluate(expression),
            Expr::Unary { operator, right, .. } => self.evaluate_unary(operator, right),
            Expr::Binary {
                left, operator, right, ..
            } => self.evaluate_binary(left, operator, right),
            Expr::Logical {
                left, operator, right, ..
            } => self.evaluate_logical(left, operator, right),
            Expr::Variable { id, name } => self.lookup_variable(name, *id),
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => self.environment.assign_at(distance, name, value.clone()),
                    None => self.globals.assign(name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
                ..
            } => self.evaluate_call(callee, paren, arguments),
            Expr::Get { object, name, .. } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => instance.get(name),
                    _ => Err(RuntimeError::new(name.clone(), "Only instances have properties.")),
                }
            }
            Expr::Set { object, name, value, .. } => {
                let object = self.evaluate(object)?;
                let Value::Instance(instance) = object else {
                    return Err(RuntimeError::new(name.clone(), "Only instances have fields."));
                };
                let value = self.evaluate(value)?;
                instance.set(name, value.clone());
                Ok(value)
            }
            Expr::This { id, keyword } => self.lookup_variable(keyword, *id),
        }
    }

    fn lookup_variable(&self, name: &Token, id: NodeId) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(self.environment.get_at(distance, &name.lexeme)),
            None => self.globals.get(name),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, RuntimeError> {
        let right = self.evaluate(right)?;
        match operator.kind {
            TokenKind::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(operator.clone(), "Operand must be a number.")),
            },
            TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser never produces other unary operators"),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(left)?;
        match operator.kind {
            TokenKind::Or if left.is_truthy() => Ok(left),
            TokenKind::Or => self.evaluate(right),
            TokenKind::And if !left.is_truthy() => Ok(left),
            TokenKind::And => self.evaluate(right),
            _ => unreachable!("parser never produces other logical operators"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.kind {
            TokenKind::Minus => numeric_op(operator, left, right, |a, b| Value::Number(a - b)),
            TokenKind::Slash => numeric_op(operator, left, right, |a, b| Value::Number(a / b)),
            TokenKind::Star => numeric_op(operator, left, right, |a, b| Value::Number(a * b)),
            TokenKind::Greater => numeric_op(operator, left, right, |a, b| Value::Bool(a > b)),
            TokenKind::GreaterEqual => numeric_op(operator, left, right, |a, b| Value::Bool(a >= b)),
            TokenKind::Less => numeric_op(operator, left, right, |a, b| Value::Bool(a < b)),
            TokenKind::LessEqual => numeric_op(operator, left, right, |a, b| Value::Bool(a <= b)),
            TokenKind::Plus => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::string(format!("{a}{b}"))),
                _ => Err(RuntimeError::new(
                    operator.clone(),
                    "Operands must be two numbers or two strings.",
                )),
            },
            TokenKind::BangEqual => Ok(Value::Bool(!left.is_equal(&right))),
            TokenKind::EqualEqual => Ok(Value::Bool(left.is_equal(&right))),
            _ => unreachable!("parser never produces other binary operators"),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(callee)?;

        let mut evaluated = Vec::with_capacity(arguments.len());
        for argument in arguments {
            evaluated.push(self.evaluate(argument)?);
        }

        let arity = match &callee {
            Value::Function(f) => f.arity(),
            Value::Native(n) => n.arity(),
            Value::Class(c) => c.arity(),
            _ => {
                return Err(RuntimeError::new(
                    paren.clone(),
                    "Can only call functions and classes.",
                ))
            }
        };

        if evaluated.len() != arity {
            return Err(RuntimeError::new(
                paren.clone(),
                format!("Expected {arity} arguments but got {}.", evaluated.len()),
            ));
        }

        match callee {
            Value::Function(f) => f.call(self, evaluated),
            Value::Native(n) => n.call(self, evaluated),
            Value::Class(c) => c.call(self, evaluated),
            _ => unreachable!("callability already checked above"),
        }
    }
}

fn literal_value(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::string(s.clone()),
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Nil => Value::Nil,
    }
}

fn numeric_op(
    operator: &Token,
    left: Value,
    right: Value,
    f: impl FnOnce(f64, f64) -> Value,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(f(a, b)),
        _ => Err(RuntimeError::new(operator.clone(), "Operands must be numbers.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::resolver::Resolver;

    fn run(source: &str) -> Result<Vec<Stmt>, ()> {
        let tokens = Lexer::new(source).scan_tokens().map_err(|_| ())?;
        let (stmts, had_error) = Parser::new(tokens).parse();
        if had_error {
            return Err(());
        }
        Ok(stmts)
    }

    fn eval_statements(source: &str) -> Result<(), RuntimeError> {
        let stmts = run(source).expect("source failed to parse");
        let locals = Resolver::new().resolve(&stmts).expect("source failed to resolve");
        Interpreter::new().interpret(&stmts, locals)
    }

    #[test]
    fn arithmetic_evaluates_left_to_right_with_precedence() {
        eval_statements("print 1 + 2 * 3;").unwrap();
    }

    #[test]
    fn string_concatenation_via_plus() {
        eval_statements(r#"print "a" + "b";"#).unwrap();
    }

    #[test]
    fn adding_number_and_string_is_a_runtime_error() {
        let err = eval_statements(r#"print 1 + "a";"#).unwrap_err();
        assert!(err.message.contains("two numbers or two strings"));
    }

    #[test]
    fn uninitialized_variable_is_nil() {
        eval_statements("var x; print x;").unwrap();
    }

    #[test]
    fn closures_capture_shared_mutable_state() {
        eval_statements(
            r#"
            fun makeCounter() {
                var i = 0;
                fun counter() {
                    i = i + 1;
                    return i;
                }
                return counter;
            }
            var counter = makeCounter();
            print counter();
            print counter();
            "#,
        )
        .unwrap();
    }

    #[test]
    fn class_init_and_method_and_this() {
        eval_statements(
            r#"
            class Greeter {
                init(name) {
                    this.name = name;
                }
                greet() {
                    return "hi " + this.name;
                }
            }
            var g = Greeter("world");
            print g.greet();
            "#,
        )
        .unwrap();
    }

    #[test]
    fn block_scoped_shadowing() {
        eval_statements(
            r#"
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
            "#,
        )
        .unwrap();
    }
}
