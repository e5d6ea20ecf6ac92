use std::fmt::Display;

use thiserror::Error;

use crate::token::{Pos, Token};

#[derive(Debug)]
pub enum ErrorMsg {
    // Lex errors
    UnexpectedChar,
    UnterminatedString,
    MissingDigits,
    IntegerTooLarge,
    // Parse errors
    UnexpectedToken,
    MissingOpeningBrace,
    MissingClosingBrace,
    MissingOpeningParen,
    MissingClosingParen,
    MissingSemicolon,
    InvalidIdent,
    GlobalParam,
    TooDeeplyNested,
    // EOF
    EndOfStream,
}

impl Display for ErrorMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UnexpectedChar => "unexpected character",
            Self::UnterminatedString => "unterminated string",
            Self::MissingDigits => "missing digits in number literal",
            Self::IntegerTooLarge => "integer literal too large",
            Self::UnexpectedToken => "unexpected token",
            Self::MissingOpeningBrace => "expected '{' before",
            Self::MissingClosingBrace => "expected '}' before",
            Self::MissingOpeningParen => "expected '(' before",
            Self::MissingClosingParen => "expected ')' before",
            Self::MissingSemicolon => "expected ';' before",
            Self::InvalidIdent => "expected identifier, found",
            Self::GlobalParam => "parameters cannot be global variables:",
            Self::TooDeeplyNested => "expression nested too deeply",
            Self::EndOfStream => {
                "unexpected end of input; unbalanced parenthesis or missing argument(s)?"
            }
        })
    }
}

/// A lexer or parser failure. `pos` is `None` when the input ended
/// before the grammar was satisfied, so no token can be blamed.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("Syntax error: {message}{}", .pos.map(|p| format!(" at {p}")).unwrap_or_default())]
pub struct SyntaxError {
    pub pos: Option<Pos>,
    pub message: String,
}

impl SyntaxError {
    pub fn new(pos: Pos, msg: ErrorMsg, ctx: impl Display) -> Self {
        Self {
            pos: Some(pos),
            message: format!("{msg} {ctx}").trim_end().to_string(),
        }
    }

    pub fn at_token(token: &Token, msg: ErrorMsg) -> Self {
        Self::new(token.pos, msg, format!("`{}`", token.lexeme))
    }

    pub fn end_of_input() -> Self {
        Self {
            pos: None,
            message: ErrorMsg::EndOfStream.to_string(),
        }
    }

    /// Line of the error, or `-1` for an unexpected end of input.
    pub fn line(&self) -> isize {
        self.pos.map_or(-1, |p| p.line as isize)
    }

    /// Column of the error, or `-1` for an unexpected end of input.
    pub fn column(&self) -> isize {
        self.pos.map_or(-1, |p| p.column as isize)
    }
}
