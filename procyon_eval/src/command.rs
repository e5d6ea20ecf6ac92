use std::io::Write;

use log::debug;

use crate::{
    error::Error,
    interpret::Interpreter,
    stdlib::{self, BUILTINS},
    types::Arity,
};

impl Interpreter {
    /// Run a REPL command such as `.vars`. The leading dot is optional.
    pub fn evaluate_command(&mut self, command: &str) -> Result<(), Error> {
        let command = command.trim();
        let command = command.strip_prefix('.').unwrap_or(command);
        let mut words = command.split_whitespace();
        let name = words.next().unwrap_or_default();
        let args = words.collect::<Vec<_>>();
        debug!("Command {name} {args:?}");
        match name {
            "vars" => self.print_vars(),
            "help" => self.print_help(),
            "import" => match args.as_slice() {
                [path] => self.evaluate_file(path, false).map(|_| ()),
                _ => Ok(writeln!(self.output, "Usage: .import <file.pr>")?),
            },
            _ => Err(Error::Name {
                pos: None,
                message: format!("unknown command \"{name}\""),
            }),
        }
    }

    fn print_vars(&mut self) -> Result<(), Error> {
        let mut vars = self
            .globals
            .borrow()
            .bindings()
            .filter(|(name, value)| *name != "_" && !stdlib::is_pristine_constant(name, value))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<Vec<_>>();
        vars.sort();
        for (name, value) in vars {
            writeln!(self.output, "{name}:\t{value}")?;
        }
        Ok(())
    }

    fn print_help(&mut self) -> Result<(), Error> {
        let builtins = BUILTINS
            .iter()
            .map(|f| match f.arity {
                Arity::Exact(n) if n > 1 => format!("{}({n})", f.name),
                _ => f.name.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let constants = stdlib::CONSTANTS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            self.output,
            "Procyon {version}

Statements end with ';'. Blocks are wrapped in braces:
    if cond {{ ... }} else if cond {{ ... }} else {{ ... }}
    while cond {{ ... }}
    func name(a, b) {{ ... return a + b; }}
Variables prefixed with '$' always live in the global scope.
'_' holds the result of the previous REPL entry.

Commands:
    .vars           list variables set in the global scope
    .import <file>  evaluate a file into the current session
    .help           show this message

Built-in functions: {builtins}
Built-in constants: {constants}",
            version = env!("CARGO_PKG_VERSION"),
        )?;
        Ok(())
    }
}
