mod common;

use common::*;
use procyon_eval::{Error, Value};

#[test]
fn math_functions() {
    assert_eq!(last("log10(100)"), Value::Float(2.0));
    assert_eq!(last("log2(256)"), Value::Float(8.0));
    assert_float("log(e)", 1.0);
    assert_float("log(e^4)", 4.0);
    assert_float("log10(10^3)^3 + 3 * 3^3", 108.0);
    assert_float("(( (1-3)^2 - 5) + log2(128) - 1)", 5.0);
    assert_float("atan2(1, 1)", std::f64::consts::FRAC_PI_4);
    assert_float("sin(pi / 2) + cos(0)", 2.0);
    assert_float("tanh(0) + asinh(0) + atan(0)", 0.0);
    assert_eq!(last("sqrt(16)"), Value::Float(4.0));
}

#[test]
fn integer_results() {
    assert_eq!(last("ceil(sqrt(2))"), Value::Int(2));
    assert_eq!(last("floor(-2.5)"), Value::Int(-3));
    assert_eq!(last("trunc(-2.5)"), Value::Int(-2));
    assert_eq!(last("ceil(7)"), Value::Int(7));
    assert_eq!(last("abs(-3)"), Value::Int(3));
    assert_eq!(last("abs(-2.5)"), Value::Float(2.5));
    assert!(matches!(ev("floor(1e300)"), Err(Error::Overflow { .. })));
}

#[test]
fn rounding() {
    assert_eq!(last("round(123.456, 0)"), Value::Float(123.0));
    assert_eq!(last("round(123456, -3)"), Value::Int(123000));
    assert_eq!(last("round(2.5, 0)"), Value::Float(2.0));
    assert_eq!(last("round(3.5, 0)"), Value::Float(4.0));
    assert_eq!(last("round(0.125, 2)"), Value::Float(0.12));
    assert_eq!(last("round(15, 2)"), Value::Int(15));
    assert!(matches!(ev("round(1.5, 0.5)"), Err(Error::Type { .. })));
}

#[test]
fn arity_and_types() {
    assert!(matches!(ev("cos()"), Err(Error::Type { .. })));
    assert!(matches!(ev("cos(3, 2)"), Err(Error::Type { .. })));
    assert!(matches!(ev("atan2(1)"), Err(Error::Type { .. })));
    assert!(matches!(ev("abort(1)"), Err(Error::Type { .. })));
    assert!(matches!(ev("sqrt(\"4\")"), Err(Error::Type { .. })));
    assert!(matches!(ev("func f() { } sin(f)"), Err(Error::Type { .. })));
}

#[test]
fn print_output() {
    let (result, printed) = ev_output("s = \"Hello, world!\"; print(s);");
    assert_eq!(result.unwrap().last(), Some(&Value::None));
    assert_eq!(printed, "Hello, world!\n");

    let (_, printed) = ev_output(r#"print("line 1\nline 2\n\nline 4");"#);
    assert_eq!(printed, "line 1\nline 2\n\nline 4\n");

    let (_, printed) = ev_output(r#"print("\n\\\n");"#);
    assert_eq!(printed, "\n\\\n\n");

    let (_, printed) = ev_output(
        r#"
        s = "Woo-\"";
        s2 = "! \"Escaped\" quotes!";
        print (s + "hoo\"" + s2);
        "#,
    );
    assert_eq!(printed, "Woo-\"hoo\"! \"Escaped\" quotes!\n");

    let (_, printed) = ev_output(r#"print(1, 2.5, "x", 4.0, 1/4); print();"#);
    assert_eq!(printed, "1 2.5 x 4.0 0.25\n\n");

    let (_, printed) = ev_output("print(1e20, 0.00001, 1.5e-7, 1e15 + 0.5, 0.0001);");
    assert_eq!(printed, "1e+20 1e-05 1.5e-07 1000000000000000.5 0.0001\n");

    let (_, printed) = ev_output(r#"print("tab\there", "\x41\u00e9", "\q");"#);
    assert_eq!(printed, "tab\there Aé \\q\n");
}

#[test]
fn strings_keep_raw_escapes() {
    assert_eq!(last(r#""a\tb""#), Value::Str(r"a\tb".to_string()));
    assert_eq!(last(r#""ab" + "cd""#), Value::Str("abcd".to_string()));
    assert!(matches!(ev(r#"print(4 + "abc");"#), Err(Error::Type { .. })));
    assert!(matches!(ev(r#"print("abc" - "def");"#), Err(Error::Type { .. })));
    assert!(matches!(ev(r#"-"abc""#), Err(Error::Type { .. })));
}

#[test]
fn input_functions() {
    let (mut interpreter, output) = interpreter_with_input("42\n3.5\nhello world\n");
    let values = interpreter
        .evaluate(
            r#"
            a = input_int("a? ");
            b = input_float("b? ");
            c = input_str("c? ");
            a; b; c;
            "#,
            true,
        )
        .unwrap();
    assert_eq!(
        values[values.len() - 3..],
        [
            Value::Int(42),
            Value::Float(3.5),
            Value::Str("hello world".to_string())
        ]
    );
    assert_eq!(output.contents(), "a? b? c? ");
}

#[test]
fn invalid_input() {
    let (mut interpreter, _) = interpreter_with_input("forty-two\n");
    assert!(matches!(
        interpreter.evaluate("input_int(\"n: \")", true),
        Err(Error::Type { .. })
    ));

    let (mut interpreter, _) = interpreter_with_input("1.5.2\n");
    assert!(matches!(
        interpreter.evaluate("input_float(\"x: \")", true),
        Err(Error::Type { .. })
    ));

    let (mut interpreter, _) = interpreter_with_input("");
    assert!(matches!(
        interpreter.evaluate("input_str(\"> \")", true),
        Err(Error::Io(_))
    ));
}
