use std::{
    f64::consts::{E, PI},
    io::Write,
};

use procyon_syntax::token::Pos;

use crate::{
    environment::Env,
    error::{ControlSignal, Error, Exception, SignalKind},
    interpret::Interpreter,
    types::{Arity, NativeFunc, Value},
};

pub const CONSTANTS: [(&str, f64); 2] = [("e", E), ("pi", PI)];

pub fn init_constants(env: &mut Env) {
    for (name, value) in CONSTANTS {
        env.set(name, Value::Float(value));
    }
}

/// Whether `name` is a built-in constant still holding its seeded
/// value.
pub fn is_pristine_constant(name: &str, value: &Value) -> bool {
    CONSTANTS
        .iter()
        .any(|(n, v)| *n == name && *value == Value::Float(*v))
}

pub fn lookup(name: &str) -> Option<&'static NativeFunc> {
    BUILTINS.iter().find(|f| f.name == name)
}

pub fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

#[derive(Clone, Copy)]
enum OnInfinity {
    Overflow,
    Domain,
}

pub static BUILTINS: &[NativeFunc] = &[
    NativeFunc {
        name: "sin",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("sin", f64::sin, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "cos",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("cos", f64::cos, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "tan",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("tan", f64::tan, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "exp",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("exp", f64::exp, OnInfinity::Overflow, args, pos),
    },
    NativeFunc {
        name: "log",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("log", f64::ln, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "log10",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("log10", f64::log10, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "log2",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("log2", f64::log2, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "asin",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("asin", f64::asin, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "acos",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("acos", f64::acos, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "atan",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("atan", f64::atan, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "atan2",
        arity: Arity::Exact(2),
        body: atan2,
    },
    NativeFunc {
        name: "sinh",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("sinh", f64::sinh, OnInfinity::Overflow, args, pos),
    },
    NativeFunc {
        name: "cosh",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("cosh", f64::cosh, OnInfinity::Overflow, args, pos),
    },
    NativeFunc {
        name: "tanh",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("tanh", f64::tanh, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "asinh",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("asinh", f64::asinh, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "acosh",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("acosh", f64::acosh, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "atanh",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("atanh", f64::atanh, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "abs",
        arity: Arity::Exact(1),
        body: abs,
    },
    NativeFunc {
        name: "sqrt",
        arity: Arity::Exact(1),
        body: |_, args, pos| float_fn("sqrt", f64::sqrt, OnInfinity::Domain, args, pos),
    },
    NativeFunc {
        name: "ceil",
        arity: Arity::Exact(1),
        body: |_, args, pos| int_fn("ceil", f64::ceil, args, pos),
    },
    NativeFunc {
        name: "floor",
        arity: Arity::Exact(1),
        body: |_, args, pos| int_fn("floor", f64::floor, args, pos),
    },
    NativeFunc {
        name: "trunc",
        arity: Arity::Exact(1),
        body: |_, args, pos| int_fn("trunc", f64::trunc, args, pos),
    },
    NativeFunc {
        name: "round",
        arity: Arity::Exact(2),
        body: round,
    },
    NativeFunc {
        name: "print",
        arity: Arity::Variadic,
        body: print,
    },
    NativeFunc {
        name: "abort",
        arity: Arity::Exact(0),
        body: |_, _, pos| {
            Err(Exception::Signal(ControlSignal::new(
                SignalKind::Abort,
                None,
                pos,
            )))
        },
    },
    NativeFunc {
        name: "input_str",
        arity: Arity::Exact(1),
        body: |interpreter, args, pos| {
            let line = read_input(interpreter, "input_str", args, pos)?;
            Ok(Value::Str(line))
        },
    },
    NativeFunc {
        name: "input_int",
        arity: Arity::Exact(1),
        body: |interpreter, args, pos| {
            let line = read_input(interpreter, "input_int", args, pos)?;
            match line.trim().parse::<i64>() {
                Ok(n) => Ok(Value::Int(n)),
                Err(_) => {
                    Err(Error::type_error(pos, "user-entered string is not a valid int").into())
                }
            }
        },
    },
    NativeFunc {
        name: "input_float",
        arity: Arity::Exact(1),
        body: |interpreter, args, pos| {
            let line = read_input(interpreter, "input_float", args, pos)?;
            match line.trim().parse::<f64>() {
                Ok(n) => Ok(Value::Float(n)),
                Err(_) => {
                    Err(Error::type_error(pos, "user-entered string is not a valid float").into())
                }
            }
        },
    },
];

/// Arity is checked by the caller, so a mismatch here is a bug.
fn wrong_arity(name: &str, args: &[Value]) -> Exception {
    Error::Internal(format!("{name}() reached with {} argument(s)", args.len())).into()
}

fn number(name: &str, value: &Value, pos: Pos) -> Result<f64, Error> {
    value.as_f64().ok_or_else(|| {
        Error::type_error(pos, format!("{name}() expects a number, got {}", value.repr()))
    })
}

/// Reject NaN produced from non-NaN inputs and infinities produced from
/// finite ones.
fn checked(result: f64, inputs: &[f64], on_inf: OnInfinity, pos: Pos) -> Result<Value, Error> {
    if result.is_nan() && !inputs.iter().any(|x| x.is_nan()) {
        return Err(Error::math(pos, "math domain error"));
    }
    if result.is_infinite() && inputs.iter().all(|x| x.is_finite()) {
        return Err(match on_inf {
            OnInfinity::Overflow => Error::Overflow { pos },
            OnInfinity::Domain => Error::math(pos, "math domain error"),
        });
    }
    Ok(Value::Float(result))
}

fn float_fn(
    name: &str,
    f: fn(f64) -> f64,
    on_inf: OnInfinity,
    args: Vec<Value>,
    pos: Pos,
) -> Result<Value, Exception> {
    let [x] = args.as_slice() else {
        return Err(wrong_arity(name, &args));
    };
    let x = number(name, x, pos)?;
    Ok(checked(f(x), &[x], on_inf, pos)?)
}

fn atan2(_: &mut Interpreter, args: Vec<Value>, pos: Pos) -> Result<Value, Exception> {
    let [y, x] = args.as_slice() else {
        return Err(wrong_arity("atan2", &args));
    };
    let (y, x) = (number("atan2", y, pos)?, number("atan2", x, pos)?);
    Ok(checked(y.atan2(x), &[y, x], OnInfinity::Domain, pos)?)
}

fn abs(_: &mut Interpreter, args: Vec<Value>, pos: Pos) -> Result<Value, Exception> {
    match args.as_slice() {
        [Value::Int(n)] => n
            .checked_abs()
            .map(Value::Int)
            .ok_or(Error::Overflow { pos }.into()),
        [x] => Ok(Value::Float(number("abs", x, pos)?.abs())),
        _ => Err(wrong_arity("abs", &args)),
    }
}

pub fn float_to_int(n: f64, pos: Pos) -> Result<i64, Error> {
    if n.is_nan() {
        return Err(Error::math(pos, "cannot convert NaN to an integer"));
    }
    // i64::MIN is exactly -2^63, so the bound is exact in both directions
    if n >= -(i64::MIN as f64) || n < i64::MIN as f64 {
        return Err(Error::Overflow { pos });
    }
    Ok(n as i64)
}

fn int_fn(
    name: &str,
    f: fn(f64) -> f64,
    args: Vec<Value>,
    pos: Pos,
) -> Result<Value, Exception> {
    match args.as_slice() {
        [Value::Int(n)] => Ok(Value::Int(*n)),
        [x] => Ok(Value::Int(float_to_int(f(number(name, x, pos)?), pos)?)),
        _ => Err(wrong_arity(name, &args)),
    }
}

fn round(_: &mut Interpreter, args: Vec<Value>, pos: Pos) -> Result<Value, Exception> {
    let [x, digits] = args.as_slice() else {
        return Err(wrong_arity("round", &args));
    };
    let Value::Int(digits) = digits else {
        return Err(Error::type_error(
            pos,
            format!("round() expects an integer number of digits, got {}", digits.repr()),
        )
        .into());
    };
    match x {
        Value::Int(n) => Ok(Value::Int(round_int(*n, *digits, pos)?)),
        x => Ok(Value::Float(round_float(number("round", x, pos)?, *digits))),
    }
}

fn round_int(n: i64, digits: i64, pos: Pos) -> Result<i64, Error> {
    if digits >= 0 {
        return Ok(n);
    }
    let Some(scale) = u32::try_from(digits.unsigned_abs())
        .ok()
        .and_then(|exp| 10i64.checked_pow(exp))
    else {
        // The scale exceeds every representable magnitude
        return Ok(0);
    };
    let (quotient, remainder) = (n.div_euclid(scale), n.rem_euclid(scale));
    let twice = remainder * 2;
    let quotient = if twice > scale || (twice == scale && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    };
    quotient.checked_mul(scale).ok_or(Error::Overflow { pos })
}

fn round_float(x: f64, digits: i64) -> f64 {
    if !x.is_finite() || digits > 308 {
        return x;
    }
    if digits < -308 {
        return 0.0_f64.copysign(x);
    }
    let digits = digits as i32;
    if digits >= 0 {
        let scale = 10f64.powi(digits);
        let scaled = x * scale;
        if !scaled.is_finite() {
            return x;
        }
        scaled.round_ties_even() / scale
    } else {
        let scale = 10f64.powi(-digits);
        (x / scale).round_ties_even() * scale
    }
}

fn print(interpreter: &mut Interpreter, args: Vec<Value>, _: Pos) -> Result<Value, Exception> {
    let line = args
        .iter()
        .map(|arg| match arg {
            Value::Str(s) => decode_escapes(s),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(interpreter.output, "{line}")?;
    Ok(Value::None)
}

fn read_input(
    interpreter: &mut Interpreter,
    name: &str,
    args: Vec<Value>,
    _: Pos,
) -> Result<String, Exception> {
    let [prompt] = args.as_slice() else {
        return Err(wrong_arity(name, &args));
    };
    Ok(interpreter.read_line(&prompt.to_string())?)
}

/// Expand backslash escapes in a string literal. Unknown or malformed
/// escapes are kept as written.
pub fn decode_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            out.push('\\');
            break;
        };
        let decoded = match escape {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            'x' | 'u' => {
                let width = if escape == 'x' { 2 } else { 4 };
                let mut digits = String::new();
                while digits.len() < width {
                    match chars.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let code = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32);
                match code {
                    Some(ch) if digits.len() == width => ch,
                    _ => {
                        out.push('\\');
                        out.push(escape);
                        out.push_str(&digits);
                        continue;
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
                continue;
            }
        };
        out.push(decoded);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes() {
        assert_eq!(decode_escapes(r"a\tb\nc"), "a\tb\nc");
        assert_eq!(decode_escapes(r#"\"quoted\""#), "\"quoted\"");
        assert_eq!(decode_escapes(r"\\"), "\\");
        assert_eq!(decode_escapes(r"\x41é"), "Aé");
        assert_eq!(decode_escapes(r"\q"), r"\q");
        assert_eq!(decode_escapes(r"\xZZ"), r"\xZZ");
        assert_eq!(decode_escapes(r"\u12"), r"\u12");
        assert_eq!(decode_escapes("trailing\\"), "trailing\\");
    }

    #[test]
    fn round_half_to_even() {
        let pos = Pos::default();
        assert_eq!(round_int(123456, -3, pos).unwrap(), 123000);
        assert_eq!(round_int(2500, -3, pos).unwrap(), 2000);
        assert_eq!(round_int(3500, -3, pos).unwrap(), 4000);
        assert_eq!(round_int(-2500, -3, pos).unwrap(), -2000);
        assert_eq!(round_int(-2501, -3, pos).unwrap(), -3000);
        assert_eq!(round_int(42, 2, pos).unwrap(), 42);
        assert_eq!(round_int(42, -30, pos).unwrap(), 0);
        assert_eq!(round_float(123.456, 0), 123.0);
        assert_eq!(round_float(0.5, 0), 0.0);
        assert_eq!(round_float(1.5, 0), 2.0);
        assert_eq!(round_float(1250.0, -2), 1200.0);
    }

    #[test]
    fn float_to_int_bounds() {
        let pos = Pos::default();
        assert_eq!(float_to_int(-3.0, pos).unwrap(), -3);
        assert!(matches!(float_to_int(1e19, pos), Err(Error::Overflow { .. })));
        assert!(matches!(float_to_int(f64::NEG_INFINITY, pos), Err(Error::Overflow { .. })));
        assert!(matches!(float_to_int(f64::NAN, pos), Err(Error::Math { .. })));
    }

    #[test]
    fn builtin_table() {
        assert_eq!(BUILTINS.len(), 28);
        assert_eq!(lookup("atan2").map(|f| f.arity), Some(Arity::Exact(2)));
        assert_eq!(lookup("print").map(|f| f.arity), Some(Arity::Variadic));
        assert_eq!(lookup("abort").map(|f| f.arity), Some(Arity::Exact(0)));
        assert!(!is_builtin("pi"));
    }

    #[test]
    fn pristine_constants() {
        assert!(is_pristine_constant("pi", &Value::Float(PI)));
        assert!(!is_pristine_constant("pi", &Value::Int(3)));
        assert!(!is_pristine_constant("x", &Value::Float(PI)));
    }
}
