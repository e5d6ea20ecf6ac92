use std::{fmt::Display, rc::Rc};

use crate::token::{Pos, TokenKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Bang,
    Minus,
}

impl UnaryOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::BANG => Self::Bang,
            TokenKind::MINUS => Self::Minus,
            _ => return None,
        };
        Some(op)
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bang => "!",
            Self::Minus => "-",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    Caret,
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::SlashSlash => "//",
            Self::Percent => "%",
            Self::Caret => "^",
        })
    }
}

impl BinOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::PLUS => Self::Plus,
            TokenKind::MINUS => Self::Minus,
            TokenKind::STAR => Self::Star,
            TokenKind::SLASH => Self::Slash,
            TokenKind::SLASH_SLASH => Self::SlashSlash,
            TokenKind::PERCENT => Self::Percent,
            TokenKind::CARET => Self::Caret,
            _ => return None,
        };
        Some(op)
    }

    /// The operator a compound assignment token (`+=`, `//=`, ...)
    /// desugars to. Plain `=` has none.
    pub fn from_compound_assignment(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::PLUS_EQUAL => Self::Plus,
            TokenKind::MINUS_EQUAL => Self::Minus,
            TokenKind::STAR_EQUAL => Self::Star,
            TokenKind::SLASH_EQUAL => Self::Slash,
            TokenKind::SLASH_SLASH_EQUAL => Self::SlashSlash,
            TokenKind::PERCENT_EQUAL => Self::Percent,
            TokenKind::CARET_EQUAL => Self::Caret,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    EqualEqual,
    BangEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::EqualEqual => "==",
            Self::BangEqual => "!=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::LessEqual => "<=",
        })
    }
}

impl CmpOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::EQUAL_EQUAL => Self::EqualEqual,
            TokenKind::BANG_EQUAL => Self::BangEqual,
            TokenKind::GREATER => Self::Greater,
            TokenKind::GREATER_EQUAL => Self::GreaterEqual,
            TokenKind::LESS => Self::Less,
            TokenKind::LESS_EQUAL => Self::LessEqual,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::AND_AND => Self::And,
            TokenKind::OR_OR => Self::Or,
            _ => return None,
        };
        Some(op)
    }
}

impl Display for LogicalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::And => "&&",
            Self::Or => "||",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    /// Raw string contents; backslash escapes are still encoded.
    Str(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Prefix marking a variable as living in the global scope.
pub const GLOBAL_SIGIL: char = '$';

#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Pos) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }

    pub fn is_global(&self) -> bool {
        self.name.starts_with(GLOBAL_SIGIL)
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        pos: Pos,
    },
    Ident(Ident),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        pos: Pos,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinOp,
        rhs: Box<Expr>,
        pos: Pos,
    },
    Logical {
        lhs: Box<Expr>,
        op: LogicalOp,
        rhs: Box<Expr>,
        pos: Pos,
    },
    Assignment {
        target: Ident,
        value: Box<Expr>,
        pos: Pos,
    },
    /// `a > b >= c` is a single node with `operands = [a, b, c]` and
    /// `ops = [>, >=]`; `operands.len() == ops.len() + 1` always holds.
    Comparison {
        operands: Vec<Expr>,
        ops: Vec<CmpOp>,
        pos: Pos,
    },
    Call {
        callee: Ident,
        args: Vec<Expr>,
        pos: Pos,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKind {
    Break,
    Continue,
    Return,
}

impl Display for ControlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Return => "return",
        })
    }
}

#[derive(Debug, PartialEq)]
pub struct Function {
    pub ident: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Item>,
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self
            .params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "func {}({params})", self.ident)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    ExprStmt(Expr),
    /// `else if` chains are stored as an else body holding a single
    /// nested `IfStmt`.
    IfStmt {
        condition: Expr,
        then_body: Vec<Item>,
        else_body: Option<Vec<Item>>,
        pos: Pos,
    },
    WhileStmt {
        condition: Expr,
        body: Vec<Item>,
        pos: Pos,
    },
    Function(Rc<Function>),
    ControlFlow {
        kind: ControlKind,
        value: Option<Expr>,
        pos: Pos,
    },
}

#[derive(Debug, Default, PartialEq)]
pub struct Source {
    pub items: Vec<Item>,
}
