//! Callable runtime values: user functions (closures and bound methods),
//! host‑provided natives, classes and the instances they construct.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Completion, Interpreter};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

/// Signature of a host function exposed to scripts.
pub type NativeFn = fn(&[Value]) -> Result<Value>;

/// A user function together with the frame it closes over.
pub struct Function {
    decl: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl Function {
    pub fn new(
        decl: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            decl,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        self.decl.name()
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    /// Produce a copy of this method whose closure binds `this` to `instance`.
    pub fn bind(&self, instance: &Rc<RefCell<Instance>>) -> Function {
        let env = Environment::child_of(&self.closure);
        env.borrow_mut()
            .define("this", Value::Instance(Rc::clone(instance)));

        Function {
            decl: Rc::clone(&self.decl),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }

    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling '{}' with {} argument(s)", self.name(), arguments.len());

        let env = Environment::child_of(&self.closure);

        {
            let mut frame = env.borrow_mut();
            for (param, argument) in self.decl.params.iter().zip(arguments) {
                frame.define(&param.lexeme, argument);
            }
        }

        let completion = interpreter.execute_block(&self.decl.body, env)?;

        // An initializer always hands back the instance it was bound to.
        if self.is_initializer {
            let this = self.closure.borrow().lookup("this");

            return this.ok_or_else(|| {
                LoxError::internal(format!("initializer '{}' has no bound 'this'", self.name()))
            });
        }

        match completion {
            Completion::Return(value) => Ok(value),
            Completion::Normal(_) => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

/// A function implemented by the host.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl NativeFunction {
    /// `clock()`: seconds since the Unix epoch, with millisecond resolution.
    pub fn clock() -> Self {
        Self {
            name: "clock",
            arity: 0,
            func: |_args: &[Value]| {
                let seconds = Utc::now().timestamp_millis() as f64 / 1000.0;

                debug!("Native 'clock' returned {}", seconds);

                Ok(Value::Number(seconds))
            },
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A class: a name plus its methods.  Calling it constructs an instance.
pub struct Class {
    pub name: String,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(name: String, methods: HashMap<String, Rc<Function>>) -> Self {
        info!("Class '{}' created with {} method(s)", name, methods.len());

        Self { name, methods }
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).cloned()
    }

    /// The initializer's arity, or zero for classes without `init`.
    pub fn arity(&self) -> usize {
        self.methods.get("init").map_or(0, |init| init.arity())
    }

    pub fn instantiate(
        class: &Rc<Class>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating '{}'", class.name);

        let instance = Instance::new(Rc::clone(class));

        if let Some(init) = class.find_method("init") {
            init.bind(&instance).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();

        f.debug_struct("Class")
            .field("name", &self.name)
            .field("methods", &methods)
            .finish()
    }
}

/// An object created by calling a class.  Fields are created on first write.
pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            class,
            fields: HashMap::new(),
        }))
    }

    /// Read a property: a field if one exists, otherwise a method bound to
    /// this instance.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            let bound = method.bind(instance);
            return Ok(Value::Callable(Callable::Function(Rc::new(bound))));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        debug!("Set field '{}' on '{}' instance", name.lexeme, self.class.name);

        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        fields.sort_unstable();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}

/// Anything that can appear before `(` in a call.
#[derive(Clone, Debug)]
pub enum Callable {
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
    Class(Rc<Class>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),
            Callable::Native(native) => native.arity,
            Callable::Class(class) => class.arity(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Function(function) => function.name(),
            Callable::Native(native) => native.name,
            Callable::Class(class) => &class.name,
        }
    }

    /// Invoke with already evaluated arguments.  Arity is checked by the
    /// caller.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        match self {
            Callable::Function(function) => function.call(interpreter, arguments),
            Callable::Native(native) => (native.func)(&arguments),
            Callable::Class(class) => Class::instantiate(class, interpreter, arguments),
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(function) => write!(f, "<fn {}>", function.name()),
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Class(class) => write!(f, "{}", class.name),
        }
    }
}
