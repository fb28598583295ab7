//! Lexical scope at runtime: a name→value mapping plus an optional link to
//! an enclosing scope. The chain's head is the innermost scope; children
//! hold a strong reference to their parent, never the reverse, so a closure
//! captured inside a block keeps that block's environment alive for as long
//! as the closure itself is alive.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::lexer::Token;
use crate::value::Value;

struct EnvironmentData {
    values: HashMap<String, Value>,
    enclosing: Option<Environment>,
}

#[derive(Clone)]
pub struct Environment(Rc<RefCell<EnvironmentData>>);

impl Environment {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(EnvironmentData {
            values: HashMap::new(),
            enclosing: None,
        })))
    }

    pub fn with_enclosing(enclosing: Environment) -> Self {
        Self(Rc::new(RefCell::new(EnvironmentData {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        })))
    }

    pub fn define(&self, name: &str, value: Value) {
        self.0.borrow_mut().values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.0.borrow().values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.0.borrow().enclosing {
            return enclosing.get(name);
        }

        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    pub fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.0.borrow().values.contains_key(&name.lexeme) {
            self.0.borrow_mut().values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        let enclosing = self.0.borrow().enclosing.clone();
        if let Some(enclosing) = enclosing {
            return enclosing.assign(name, value);
        }

        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    fn ancestor(&self, distance: usize) -> Environment {
        let mut env = self.clone();
        for _ in 0..distance {
            let next = env
                .0
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-computed distance must stay within the environment chain");
            env = next;
        }
        env
    }

    /// Reads a variable a known `distance` links up the chain, bypassing
    /// the enclosing-walk in `get` — used for resolver-annotated lookups,
    /// where the distance is already known to be correct.
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        self.ancestor(distance)
            .0
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or(Value::Nil)
    }

    pub fn assign_at(&self, distance: usize, name: &Token, value: Value) {
        self.ancestor(distance)
            .0
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), value);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
