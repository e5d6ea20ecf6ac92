//! Operator semantics on runtime values. Integers stay integers except
//! under `/` and negative powers; any float operand promotes the result
//! to a float.

use std::cmp::Ordering;

use procyon_syntax::{
    ast::{BinOp, CmpOp},
    token::Pos,
};

use crate::{error::Error, types::Value};

pub fn negate(value: Value, pos: Pos) -> Result<Value, Error> {
    match value {
        Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(Error::Overflow { pos }),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => Err(Error::type_error(
            pos,
            format!("bad operand type for unary -: {}", other.repr()),
        )),
    }
}

pub fn binary(op: BinOp, lhs: Value, rhs: Value, pos: Pos) -> Result<Value, Error> {
    match (lhs, rhs) {
        (Value::Str(l), Value::Str(r)) => match op {
            BinOp::Plus => Ok(Value::Str(l + &r)),
            _ => Err(Error::type_error(
                pos,
                format!("operator {op} is not defined on strings"),
            )),
        },
        (Value::Int(l), Value::Int(r)) => int_op(op, l, r, pos),
        (lhs, rhs) => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(l), Some(r)) => float_op(op, l, r, pos),
            _ => Err(Error::type_error(
                pos,
                format!(
                    "unsupported operand types: {} {op} {}",
                    lhs.repr(),
                    rhs.repr()
                ),
            )),
        },
    }
}

fn zero_division(pos: Pos) -> Error {
    Error::math(pos, "division by zero")
}

fn int_op(op: BinOp, l: i64, r: i64, pos: Pos) -> Result<Value, Error> {
    let result = match op {
        BinOp::Plus => l.checked_add(r),
        BinOp::Minus => l.checked_sub(r),
        BinOp::Star => l.checked_mul(r),
        BinOp::Slash => return float_op(op, l as f64, r as f64, pos),
        BinOp::SlashSlash => {
            if r == 0 {
                return Err(zero_division(pos));
            }
            floor_div(l, r)
        }
        BinOp::Percent => {
            if r == 0 {
                return Err(Error::math(pos, "modulo by zero"));
            }
            Some(floor_mod(l, r))
        }
        BinOp::Caret => return int_pow(l, r, pos),
    };
    result.map(Value::Int).ok_or(Error::Overflow { pos })
}

/// Division rounding towards negative infinity. `None` on overflow.
fn floor_div(l: i64, r: i64) -> Option<i64> {
    let quotient = l.checked_div(r)?;
    let remainder = l.wrapping_rem(r);
    if remainder != 0 && (remainder < 0) != (r < 0) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Remainder carrying the sign of the divisor.
fn floor_mod(l: i64, r: i64) -> i64 {
    let remainder = l.wrapping_rem(r);
    if remainder != 0 && (remainder < 0) != (r < 0) {
        remainder + r
    } else {
        remainder
    }
}

fn int_pow(base: i64, exp: i64, pos: Pos) -> Result<Value, Error> {
    if exp < 0 {
        return float_pow(base as f64, exp as f64, pos);
    }
    let result = match u32::try_from(exp) {
        Ok(exp) => base.checked_pow(exp),
        Err(_) => match base {
            0 | 1 => Some(base),
            -1 => Some(if exp % 2 == 0 { 1 } else { -1 }),
            _ => None,
        },
    };
    result.map(Value::Int).ok_or(Error::Overflow { pos })
}

fn float_op(op: BinOp, l: f64, r: f64, pos: Pos) -> Result<Value, Error> {
    let result = match op {
        BinOp::Plus => l + r,
        BinOp::Minus => l - r,
        BinOp::Star => l * r,
        BinOp::Slash => {
            if r == 0.0 {
                return Err(zero_division(pos));
            }
            l / r
        }
        BinOp::SlashSlash => {
            if r == 0.0 {
                return Err(zero_division(pos));
            }
            (l / r).floor()
        }
        BinOp::Percent => {
            if r == 0.0 {
                return Err(Error::math(pos, "modulo by zero"));
            }
            let remainder = l % r;
            if remainder != 0.0 && (remainder < 0.0) != (r < 0.0) {
                remainder + r
            } else {
                remainder
            }
        }
        BinOp::Caret => return float_pow(l, r, pos),
    };
    Ok(Value::Float(result))
}

fn float_pow(base: f64, exp: f64, pos: Pos) -> Result<Value, Error> {
    if base == 0.0 && exp < 0.0 {
        return Err(Error::math(pos, "zero cannot be raised to a negative power"));
    }
    let result = base.powf(exp);
    if result.is_nan() && !base.is_nan() && !exp.is_nan() {
        return Err(Error::math(
            pos,
            "a negative number cannot be raised to a fractional power",
        ));
    }
    if result.is_infinite() && base.is_finite() && exp.is_finite() {
        return Err(Error::Overflow { pos });
    }
    Ok(Value::Float(result))
}

/// Evaluate a single comparison. Ints compare exactly, mixed numbers
/// compare as floats, strings compare lexicographically.
pub fn compare(op: CmpOp, lhs: &Value, rhs: &Value, pos: Pos) -> Result<bool, Error> {
    let ordering = match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        (Value::None, Value::None) | (Value::Func(_), Value::Func(_))
            if matches!(op, CmpOp::EqualEqual | CmpOp::BangEqual) =>
        {
            return Ok((lhs == rhs) == (op == CmpOp::EqualEqual));
        }
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => {
                return Err(Error::type_error(
                    pos,
                    format!(
                        "comparison between incompatible types: {} {op} {}",
                        lhs.repr(),
                        rhs.repr()
                    ),
                ))
            }
        },
    };
    // An unordered pair (NaN) is only ever unequal
    let Some(ordering) = ordering else {
        return Ok(op == CmpOp::BangEqual);
    };
    Ok(match op {
        CmpOp::EqualEqual => ordering == Ordering::Equal,
        CmpOp::BangEqual => ordering != Ordering::Equal,
        CmpOp::Greater => ordering == Ordering::Greater,
        CmpOp::GreaterEqual => ordering != Ordering::Less,
        CmpOp::Less => ordering == Ordering::Less,
        CmpOp::LessEqual => ordering != Ordering::Greater,
    })
}
