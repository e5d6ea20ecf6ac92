use std::fmt::Display;

use crate::ast::Literal;

/// A 1-based line/column location in the source text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The enum variants are in SCREAMING_SNAKE_CASE as they technically
/// represent constants, but Rust does not allow const enum variants.
#[allow(nonstandard_style)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenKind {
    // Symbols
    LPAREN,
    RPAREN,
    LBRACE,
    RBRACE,
    COMMA,
    SEMICOLON,
    // Arithmetic
    BANG,
    MINUS,
    PLUS,
    SLASH,
    SLASH_SLASH,
    STAR,
    CARET,
    PERCENT,
    // Logical
    AND_AND,
    OR_OR,
    // Comparisons
    BANG_EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,
    // Assignments
    EQUAL,
    PLUS_EQUAL,
    MINUS_EQUAL,
    STAR_EQUAL,
    SLASH_EQUAL,
    SLASH_SLASH_EQUAL,
    CARET_EQUAL,
    PERCENT_EQUAL,
    // Literals
    IDENT,
    STRING,
    INT,
    FLOAT,
    // Keywords
    BREAK,
    CONTINUE,
    ELSE,
    ELSE_IF,
    FUNC,
    IF,
    RETURN,
    WHILE,
    // Miscellaneous tokens
    COMMENT,
    WHITESPACE,
    EOF,
}

impl TokenKind {
    pub fn from_char(c: char) -> Option<Self> {
        let token = match c {
            '(' => Self::LPAREN,
            ')' => Self::RPAREN,
            '{' => Self::LBRACE,
            '}' => Self::RBRACE,
            ',' => Self::COMMA,
            ';' => Self::SEMICOLON,
            ' ' | '\t' | '\r' | '\n' | '\x0b' => Self::WHITESPACE,
            _ => return None,
        };
        Some(token)
    }

    pub fn from_keyword(kw: &str) -> Option<Self> {
        let token = match kw {
            "break" => Self::BREAK,
            "continue" => Self::CONTINUE,
            "else" => Self::ELSE,
            "func" => Self::FUNC,
            "if" => Self::IF,
            "return" => Self::RETURN,
            "while" => Self::WHILE,
            _ => return None,
        };
        Some(token)
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Self::EQUAL
                | Self::PLUS_EQUAL
                | Self::MINUS_EQUAL
                | Self::STAR_EQUAL
                | Self::SLASH_EQUAL
                | Self::SLASH_SLASH_EQUAL
                | Self::CARET_EQUAL
                | Self::PERCENT_EQUAL
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
    pub lexeme: String,
    /// Decoded payload of number and string literals.
    pub literal: Option<Literal>,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos, lexeme: String) -> Self {
        Self {
            kind,
            pos,
            lexeme,
            literal: None,
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }
}
