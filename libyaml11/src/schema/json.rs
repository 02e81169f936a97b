//! `null`, `bool`, `int` and `float`: the implicit scalar types.

use std::sync::LazyLock;

use num_bigint::BigInt;
use num_traits::{Num, Zero};
use regex::Regex;

use super::{Kind, Type};
use crate::value::Value;

static FLOAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:[-+]?(?:0|[1-9][0-9_]*)(?:\.[0-9_]*)?(?:[eE][-+]?[0-9]+)?",
        r"|\.[0-9_]+(?:[eE][-+]?[0-9]+)?",
        r"|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*",
        r"|[-+]?\.(?:inf|Inf|INF)",
        r"|\.(?:nan|NaN|NAN))$",
    ))
    .expect("float pattern compiles")
});

static SEXAGESIMAL_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?::[0-5]?[0-9])+$").expect("base 60 pattern compiles"));

pub(super) fn null_type() -> Type {
    Type::new("tag:yaml.org,2002:null", Kind::Scalar)
        .with_resolve(|value| match value {
            Value::Null => true,
            Value::String(s) => matches!(s.as_str(), "~" | "null" | "Null" | "NULL"),
            _ => false,
        })
        .with_construct(|_| Value::Null)
}

pub(super) fn bool_type() -> Type {
    Type::new("tag:yaml.org,2002:bool", Kind::Scalar)
        .with_resolve(|value| parse_bool(value).is_some())
        .with_construct(|value| match parse_bool(&value) {
            Some(b) => Value::Bool(b),
            None => value,
        })
}

pub(super) fn int_type() -> Type {
    Type::new("tag:yaml.org,2002:int", Kind::Scalar)
        .with_resolve(|value| value.as_str().is_some_and(is_int))
        .with_construct(|value| match value.as_str().and_then(parse_int) {
            Some(n) => Value::Integer(n),
            None => value,
        })
}

pub(super) fn float_type() -> Type {
    Type::new("tag:yaml.org,2002:float", Kind::Scalar)
        .with_resolve(|value| value.as_str().is_some_and(is_float))
        .with_construct(|value| match value.as_str().and_then(parse_float) {
            Some(f) => Value::Float(f),
            None => value,
        })
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value.as_str()? {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Check `[-+]?` followed by a binary, hex, octal, decimal or base-60
/// integer, with `_` separators anywhere but the end.
fn is_int(data: &str) -> bool {
    let chars: Vec<char> = data.chars().collect();
    let at = |i: usize| chars.get(i).copied().unwrap_or('\0');
    let max = chars.len();
    if max == 0 {
        return false;
    }

    let mut index = 0;
    let mut ch = at(index);
    if ch == '-' || ch == '+' {
        index += 1;
        ch = at(index);
    }

    if ch == '0' {
        if index + 1 == max {
            return true;
        }
        index += 1;
        ch = at(index);
        let digit: fn(char) -> bool = match ch {
            'b' => {
                index += 1;
                |c| c == '0' || c == '1'
            }
            'x' => {
                index += 1;
                |c| c.is_ascii_hexdigit()
            }
            _ => |c| ('0'..='7').contains(&c),
        };
        let mut has_digits = false;
        for &c in &chars[index..] {
            ch = c;
            if c == '_' {
                continue;
            }
            if !digit(c) {
                return false;
            }
            has_digits = true;
        }
        return has_digits && ch != '_';
    }

    if ch == '_' {
        return false;
    }

    let mut has_digits = false;
    while index < max {
        ch = chars[index];
        if ch == ':' {
            break;
        }
        if ch != '_' {
            if !ch.is_ascii_digit() {
                return false;
            }
            has_digits = true;
        }
        index += 1;
    }
    if !has_digits || ch == '_' {
        return false;
    }
    if ch != ':' {
        return true;
    }
    let tail: String = chars[index..].iter().collect();
    SEXAGESIMAL_TAIL.is_match(&tail)
}

fn parse_int(data: &str) -> Option<BigInt> {
    let mut value: String = data.chars().filter(|&c| c != '_').collect();
    let negative = value.starts_with('-');
    if negative || value.starts_with('+') {
        value.remove(0);
    }

    let magnitude = if value == "0" {
        BigInt::zero()
    } else if let Some(bin) = value.strip_prefix("0b") {
        BigInt::from_str_radix(bin, 2).ok()?
    } else if let Some(hex) = value.strip_prefix("0x") {
        BigInt::from_str_radix(hex, 16).ok()?
    } else if value.starts_with('0') {
        BigInt::from_str_radix(&value, 8).ok()?
    } else if value.contains(':') {
        let mut acc = BigInt::zero();
        for part in value.split(':') {
            acc = acc * 60 + BigInt::from_str_radix(part, 10).ok()?;
        }
        acc
    } else {
        BigInt::from_str_radix(&value, 10).ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn is_float(data: &str) -> bool {
    FLOAT_PATTERN.is_match(data) && !data.ends_with('_')
}

fn parse_float(data: &str) -> Option<f64> {
    let value = data.replace('_', "").to_lowercase();
    let (sign, body) = match value.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, value.strip_prefix('+').unwrap_or(&value)),
    };

    match body {
        ".inf" => Some(sign * f64::INFINITY),
        ".nan" => Some(f64::NAN),
        _ if body.contains(':') => {
            let mut acc = 0.0;
            for part in body.split(':') {
                acc = acc * 60.0 + part.parse::<f64>().ok()?;
            }
            Some(sign * acc)
        }
        _ => body.parse::<f64>().ok().map(|f| sign * f),
    }
}
