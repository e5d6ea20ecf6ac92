#![allow(dead_code)]

use std::{
    cell::RefCell,
    io::{self, Cursor, Write},
    rc::Rc,
};

use procyon_eval::{Error, Interpreter, Value};

/// Shared in-memory sink standing in for stdout.
#[derive(Clone, Default)]
pub struct Output(Rc<RefCell<Vec<u8>>>);

impl Output {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn interpreter_with_input(input: &str) -> (Interpreter, Output) {
    let output = Output::default();
    let interpreter = Interpreter::with_io(Cursor::new(input.to_string()), output.clone());
    (interpreter, output)
}

pub fn interpreter() -> (Interpreter, Output) {
    interpreter_with_input("")
}

/// Evaluate `source` with a fresh global state.
pub fn ev(source: &str) -> Result<Vec<Value>, Error> {
    interpreter().0.evaluate(source, true)
}

/// Evaluate `source`, also returning everything it printed.
pub fn ev_output(source: &str) -> (Result<Vec<Value>, Error>, String) {
    let (mut interpreter, output) = interpreter();
    let result = interpreter.evaluate(source, true);
    (result, output.contents())
}

/// The value of the last statement of `source`.
pub fn last(source: &str) -> Value {
    match ev(source) {
        Ok(values) => values.last().cloned().unwrap_or(Value::None),
        Err(e) => panic!("evaluating {source:?} failed: {e}"),
    }
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

pub fn assert_ints(source: &str, expected: &[i64]) {
    match ev(source) {
        Ok(values) => assert_eq!(values, ints(expected), "{source}"),
        Err(e) => panic!("evaluating {source:?} failed: {e}"),
    }
}

pub fn assert_float(source: &str, expected: f64) {
    match last(source) {
        Value::Float(n) => assert!(
            (n - expected).abs() < 1e-9,
            "{source}: expected {expected}, got {n}"
        ),
        other => panic!("{source}: expected a float, got {other:?}"),
    }
}
