pub mod command;
pub mod environment;
pub mod error;
pub mod interpret;
pub mod ops;
pub mod stdlib;
pub mod types;

pub use error::Error;
pub use interpret::Interpreter;
pub use types::Value;

use log::trace;
use procyon_syntax::ast::Source;

/// Lex and parse a program into its syntax tree.
pub fn parse(source: &str) -> Result<Source, Error> {
    trace!("Parsing {source}");
    let root = procyon_syntax::parse_source(source)?;
    trace!("Parsed {root:#?}");
    Ok(root)
}
