use std::{
    fmt::{Debug, Display},
    rc::Rc,
};

use procyon_syntax::{
    ast::{Function, Literal},
    token::Pos,
};

use crate::{error::Exception, interpret::Interpreter};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Func(Func),
    None,
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => f.write_str(&format_float(*n)),
            Self::Str(s) => f.write_str(s),
            Self::Func(func) => write!(f, "{func}"),
            Self::None => f.write_str("None"),
        }
    }
}

/// Floats always show a fractional part or an exponent, so `1.0` never
/// reads back as the integer `1`. Magnitudes outside `1e-4..1e16` switch
/// to a signed exponent of at least two digits: `1e+20`, `1.5e-07`.
fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = n.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // `{:e}` writes a bare exponent: `1e20`, `1e-5`
        let scientific = format!("{n:e}");
        return match scientific.split_once('e') {
            Some((mantissa, exponent)) => match exponent.strip_prefix('-') {
                Some(digits) => format!("{mantissa}e-{digits:0>2}"),
                None => format!("{mantissa}e+{exponent:0>2}"),
            },
            None => scientific,
        };
    }
    if n.fract() == 0.0 {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Int(n) => Self::Int(*n),
            Literal::Float(n) => Self::Float(*n),
            Literal::Str(s) => Self::Str(s.clone()),
        }
    }
}

impl Value {
    pub fn from_bool(b: bool) -> Self {
        Self::Int(b as i64)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Int(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Func(_) => true,
            Self::None => false,
        }
    }

    /// The numeric value of an int or float, widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Like `Display`, but strings keep their quotes. Used in error
    /// messages so `"1"` and `1` can be told apart.
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => format!("\"{s}\""),
            other => other.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => n == count,
            Self::Variadic => true,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Variadic => f.write_str("any number of"),
        }
    }
}

pub trait Callable {
    fn name(&self) -> &str;
    fn arity(&self) -> Arity;
    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        pos: Pos,
    ) -> Result<Value, Exception>;
}

/// A user-defined function. Two values compare equal when they hold
/// the same definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Func {
    pub decl: Rc<Function>,
}

impl Func {
    pub fn new(decl: Rc<Function>) -> Self {
        Self { decl }
    }
}

impl Display for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.decl)
    }
}

impl Callable for Func {
    fn name(&self) -> &str {
        &self.decl.ident.name
    }

    fn arity(&self) -> Arity {
        Arity::Exact(self.decl.params.len())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        pos: Pos,
    ) -> Result<Value, Exception> {
        interpreter.call_func(self, args, pos)
    }
}

pub type NativeBody = fn(&mut Interpreter, Vec<Value>, Pos) -> Result<Value, Exception>;

/// A built-in function. These are never stored in a scope; calls fall
/// back to the built-in table when no user binding shadows the name.
#[derive(Clone, Copy)]
pub struct NativeFunc {
    pub name: &'static str,
    pub arity: Arity,
    pub body: NativeBody,
}

impl PartialEq for NativeFunc {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Debug for NativeFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunc")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Display for NativeFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "built-in func {}", self.name)
    }
}

impl Callable for NativeFunc {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        pos: Pos,
    ) -> Result<Value, Exception> {
        (self.body)(interpreter, args, pos)
    }
}
