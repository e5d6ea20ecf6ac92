pub mod ast;
pub mod error;
pub mod lex;
pub mod parse;
pub mod token;

use ast::{Expr, Source};
use error::SyntaxError;
use lex::Lexer;
use parse::Parser;

/// Lex and parse a whole program.
pub fn parse_source(source: &str) -> Result<Source, SyntaxError> {
    let tokens = Lexer::new(source).lex_all_sanitised()?;
    Parser::new(&tokens).parse_all()
}

/// Lex and parse a single free-standing expression.
pub fn parse_expression(source: &str) -> Result<Expr, SyntaxError> {
    let tokens = Lexer::new(source).lex_all_sanitised()?;
    Parser::new(&tokens).parse_expr_only()
}
