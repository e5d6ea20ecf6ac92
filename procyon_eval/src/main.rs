use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use procyon_eval::{Error, Interpreter, Value};

const PROMPT: &str = "> ";
const CONTINUATION_PROMPT: &str = ". ";

/// Procyon is a small scripting language with C-like syntax for
/// numeric calculations.
#[derive(Parser, Debug)]
#[command(name = "procyon", version, about, long_about = None)]
struct Cli {
    /// Program to run. Starts an interactive session when omitted.
    file: Option<PathBuf>,

    /// Print the syntax tree of each input before evaluating it.
    #[arg(long)]
    dump_ast: bool,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let mut interpreter = Interpreter::new();
    match cli.file {
        Some(path) => run_file(&mut interpreter, &path, cli.dump_ast),
        None => {
            run_repl(&mut interpreter, cli.dump_ast);
            ExitCode::SUCCESS
        }
    }
}

fn run_file(interpreter: &mut Interpreter, path: &Path, dump_ast: bool) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read '{}': {e}", path.display());
            return ExitCode::FAILURE;
        }
    };
    if dump_ast {
        dump(&source);
    }
    match interpreter.evaluate(&source, false) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            report(&source, &e);
            ExitCode::FAILURE
        }
    }
}

fn run_repl(interpreter: &mut Interpreter, dump_ast: bool) {
    println!(
        "Procyon {}. Type .help for help.",
        env!("CARGO_PKG_VERSION")
    );
    let (stdin, mut stdout) = (io::stdin(), io::stdout());
    let mut program = String::new();
    let mut last = None;
    loop {
        print!("{}", if program.is_empty() { PROMPT } else { CONTINUATION_PROMPT });
        if stdout.flush().is_err() {
            break;
        }
        let mut line = String::new();
        // If zero bytes are read, then exit (usually triggered by Ctrl-D)
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => {
                println!();
                break;
            }
            Ok(_) => {}
        }
        let line = line.trim_end();
        if program.is_empty() && line.trim_start().starts_with('.') {
            if let Err(e) = interpreter.evaluate_command(line) {
                report(line, &e);
            }
            continue;
        }
        if !program.is_empty() {
            program.push('\n');
        }
        program.push_str(line);
        match interpreter.evaluate_with_last(&program, false, last.clone()) {
            Ok(values) => {
                if dump_ast {
                    dump(&program);
                }
                let shown = values
                    .iter()
                    .filter(|v| **v != Value::None)
                    .map(Value::repr)
                    .collect::<Vec<_>>();
                if !shown.is_empty() {
                    println!("{}", shown.join(", "));
                }
                if let Some(value) = values.last() {
                    last = Some(value.clone());
                }
                program.clear();
            }
            // The input ended mid-construct; keep reading lines
            Err(Error::Syntax(e)) if e.pos.is_none() => {}
            Err(e) => {
                report(&program, &e);
                program.clear();
            }
        }
    }
}

fn dump(source: &str) {
    match procyon_eval::parse(source) {
        Ok(root) => eprintln!("{root:#?}"),
        Err(e) => eprintln!("{e}"),
    }
}

/// Print an error, pointing at the offending column for syntax errors.
fn report(source: &str, error: &Error) {
    if let Error::Syntax(e) = error {
        if let Some(pos) = e.pos {
            if let Some(line) = source.lines().nth(pos.line.saturating_sub(1)) {
                let indent = line
                    .chars()
                    .take(pos.column.saturating_sub(1))
                    .map(|c| if c == '\t' { '\t' } else { ' ' })
                    .collect::<String>();
                eprintln!("{line}");
                eprintln!("{indent}^");
            }
        }
    }
    eprintln!("{error}");
}
