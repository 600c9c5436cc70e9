use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One frame of bindings plus a link to the lexically enclosing frame.
///
/// Frames are shared through `Rc<RefCell<_>>` because a closure keeps the
/// frame it was created in alive after the block or call that made it exits.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh frame enclosed by `enclosing` for sharing.
    pub fn child_of(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            enclosing,
        ))))
    }

    /// Bind `name` in this frame, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Define '{}' ({})", name, value.type_name());

        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame only.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Read a variable, walking outward through enclosing frames.
    pub fn get(&self, name: &Token) -> Result<Value> {
        check_name(name)?;

        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrite an existing variable, walking outward through enclosing
    /// frames.  Assigning a name that was never defined is an error.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        check_name(name)?;

        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Frame exactly `distance` enclosing links above `env`.
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Result<Rc<RefCell<Environment>>> {
        let mut current: Rc<RefCell<Environment>> = Rc::clone(env);

        for hop in 0..distance {
            let next = current.borrow().enclosing.clone().ok_or_else(|| {
                LoxError::internal(format!(
                    "environment chain ends after {} of {} hops",
                    hop, distance
                ))
            })?;

            current = next;
        }

        Ok(current)
    }

    /// Read `name` from the frame `distance` links above `env`.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &Token) -> Result<Value> {
        check_name(name)?;

        let frame = Self::ancestor(env, distance)?;
        let value = frame.borrow().lookup(&name.lexeme);

        value.ok_or_else(|| {
            LoxError::internal(format!(
                "'{}' is not bound {} frame(s) up",
                name.lexeme, distance
            ))
        })
    }

    /// Overwrite `name` in the frame `distance` links above `env`.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<()> {
        check_name(name)?;

        let frame = Self::ancestor(env, distance)?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(LoxError::internal(format!(
                "'{}' is not bound {} frame(s) up",
                name.lexeme, distance
            ))),
        }
    }
}

fn check_name(name: &Token) -> Result<()> {
    if name.is_name() {
        Ok(())
    } else {
        Err(LoxError::internal(format!(
            "attempted variable access with a {} token",
            name.token_type
        )))
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name.line, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::simple(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn inner_definitions_shadow_outer_ones() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::from("outer"));

        let inner = Environment::child_of(&outer);
        inner.borrow_mut().define("a", Value::from("inner"));

        assert_eq!(inner.borrow().get(&ident("a")).unwrap(), Value::from("inner"));
        assert_eq!(outer.borrow().get(&ident("a")).unwrap(), Value::from("outer"));
    }

    #[test]
    fn assign_walks_outward_and_rejects_unknown_names() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::child_of(&outer);

        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Number(2.0))
            .unwrap();
        assert_eq!(outer.borrow().lookup("a"), Some(Value::Number(2.0)));

        let err = inner
            .borrow_mut()
            .assign(&ident("missing"), Value::Nil)
            .unwrap_err();
        assert!(matches!(err, LoxError::Runtime { .. }));
    }

    #[test]
    fn distance_lookups_hit_exactly_one_frame() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));
        let middle = Environment::child_of(&global);
        let inner = Environment::child_of(&middle);

        assert_eq!(
            Environment::get_at(&inner, 2, &ident("a")).unwrap(),
            Value::Number(1.0)
        );
        assert!(matches!(
            Environment::get_at(&inner, 1, &ident("a")),
            Err(LoxError::Internal(_))
        ));
        assert!(matches!(
            Environment::get_at(&inner, 3, &ident("a")),
            Err(LoxError::Internal(_))
        ));

        Environment::assign_at(&inner, 2, &ident("a"), Value::Number(5.0)).unwrap();
        assert_eq!(global.borrow().lookup("a"), Some(Value::Number(5.0)));
    }

    #[test]
    fn non_identifier_tokens_are_rejected() {
        let env = Environment::new();
        let token = Token::simple(TokenType::PLUS, "+", 1);

        assert!(matches!(env.get(&token), Err(LoxError::Internal(_))));
    }
}
