//! The runtime value domain: a tagged union dispatched on in arithmetic,
//! equality and truthiness, plus the callable/class/instance object model.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Interpreter, Signal};
use crate::lexer::Token;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// `nil` and `false` are false, everything else — including `0` and
    /// `""` — is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    /// `nil == nil` is true, `nil == x` is false for any other `x`,
    /// otherwise values compare equal by their runtime tag and content.
    /// Functions, classes and instances only ever compare equal to
    /// themselves (object identity), never structurally.
    pub fn is_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, _) | (_, Value::Nil) => false,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Print representation: numbers use Rust's shortest round-trip `f64`
    /// formatting rather than a fixed-width decimal.
    pub fn stringify(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Str(s) => s.to_string(),
            Value::Function(f) => format!("<fn {}>", f.declaration.name.lexeme),
            Value::Native(n) => format!("<native fn {}>", n.name),
            Value::Class(c) => c.name.clone(),
            Value::Instance(i) => format!("{} instance", i.class.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

/// Anything that can appear on the left of a `Call` expression.
pub trait Callable {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError>;
}

/// A closure: the declaring AST node plus the environment captured at the
/// declaration site, and whether it's a class `init` method (which returns
/// the bound `this` instead of its own result).
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Environment,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Environment, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Produces a new closure whose captured environment is a fresh scope,
    /// enclosing this function's own closure, with `this` bound to
    /// `instance`. This is how `Get` turns a method lookup into a bound
    /// method: `this` becomes reachable through ordinary lexical lookup.
    pub fn bind(&self, instance: Value) -> Function {
        let env = Environment::with_enclosing(self.closure.clone());
        env.define("this", instance);
        Function {
            declaration: self.declaration.clone(),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let call_env = Environment::with_enclosing(self.closure.clone());
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            call_env.define(&param.lexeme, argument);
        }

        let signal = interpreter.execute_block(&self.declaration.body, call_env)?;

        if self.is_initializer {
            return Ok(self.closure.get_at(0, "this"));
        }

        match signal {
            Signal::Return(value) => Ok(value),
            Signal::Normal => Ok(Value::Nil),
        }
    }
}

/// The single built-in, `clock`, plus the shape any future native function
/// would take: a fixed arity and a plain Rust closure.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: Box<dyn Fn(&[Value]) -> Value>,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        Ok((self.func)(&arguments))
    }
}

pub struct Class {
    pub name: String,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).cloned()
    }

    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Instantiating a class isn't routed through the `Callable` trait:
    /// the new `Instance` needs to hold the same `Rc<Class>` the caller
    /// already has, not a private copy of its method table, so this takes
    /// `self` by `Rc` rather than by the plain `&self` `Callable::call`
    /// requires.
    pub fn call(self: &Rc<Self>, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let instance = Rc::new(Instance {
            class: self.clone(),
            fields: RefCell::new(HashMap::new()),
        });

        if let Some(initializer) = self.find_method("init") {
            let bound = initializer.bind(Value::Instance(instance.clone()));
            bound.call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = self.class.find_method(&name.lexeme) {
            let bound = method.bind(Value::Instance(self.clone()));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}
