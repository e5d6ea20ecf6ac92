use std::{fmt::Display, io};

use procyon_syntax::{ast::ControlKind, error::SyntaxError, token::Pos};
use thiserror::Error;

use crate::types::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalKind {
    Break,
    Continue,
    Return,
    Abort,
}

impl From<ControlKind> for SignalKind {
    fn from(kind: ControlKind) -> Self {
        match kind {
            ControlKind::Break => Self::Break,
            ControlKind::Continue => Self::Continue,
            ControlKind::Return => Self::Return,
        }
    }
}

/// A non-local exit travelling up the evaluation stack until a loop
/// (`break`, `continue`) or a function call (`return`) claims it.
/// `abort` is never claimed.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlSignal {
    pub kind: SignalKind,
    pub value: Option<Value>,
    pub pos: Pos,
}

impl ControlSignal {
    pub fn new(kind: SignalKind, value: Option<Value>, pos: Pos) -> Self {
        Self { kind, value, pos }
    }
}

impl Display for ControlSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            SignalKind::Abort => write!(f, "abort() called at {}", self.pos),
            SignalKind::Break => write!(f, "Error: break called outside of a loop at {}", self.pos),
            SignalKind::Continue => {
                write!(f, "Error: continue called outside of a loop at {}", self.pos)
            }
            SignalKind::Return => {
                write!(f, "Error: return called outside of a function at {}", self.pos)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("Name error: {message}{}", at(.pos))]
    Name { pos: Option<Pos>, message: String },
    #[error("Type error: {message} at {pos}")]
    Type { pos: Pos, message: String },
    #[error("Math error: {message} at {pos}")]
    Math { pos: Pos, message: String },
    #[error("Overflow: result is out of range at {pos}")]
    Overflow { pos: Pos },
    #[error("Recursion error: maximum call depth of {depth} exceeded at {pos}")]
    Recursion { pos: Pos, depth: usize },
    #[error("BUG: {0}")]
    Internal(String),
    #[error("{0}")]
    Misuse(ControlSignal),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn at(pos: &Option<Pos>) -> String {
    pos.map(|p| format!(" at {p}")).unwrap_or_default()
}

impl Error {
    pub fn name(pos: Pos, message: impl Display) -> Self {
        Self::Name {
            pos: Some(pos),
            message: message.to_string(),
        }
    }

    pub fn type_error(pos: Pos, message: impl Display) -> Self {
        Self::Type {
            pos,
            message: message.to_string(),
        }
    }

    pub fn math(pos: Pos, message: impl Display) -> Self {
        Self::Math {
            pos,
            message: message.to_string(),
        }
    }
}

/// Everything that can interrupt the evaluation of a statement: either
/// a genuine error, or a control signal on its way to its catcher.
#[derive(Debug)]
pub enum Exception {
    Error(Error),
    Signal(ControlSignal),
}

impl From<Error> for Exception {
    fn from(e: Error) -> Self {
        Self::Error(e)
    }
}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        Self::Error(Error::Io(e))
    }
}

/// A signal reaching the top level has escaped every construct able
/// to handle it, which makes it a misuse.
impl From<Exception> for Error {
    fn from(exception: Exception) -> Self {
        match exception {
            Exception::Error(e) => e,
            Exception::Signal(signal) => Self::Misuse(signal),
        }
    }
}
