//! `timestamp`, `merge`, `binary`, `omap`, `pairs` and `set`.

use std::collections::HashSet;
use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use indexmap::IndexMap;
use regex::{Captures, Regex};

use super::{Kind, Type, MERGE_TAG};
use crate::value::Value;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("date pattern compiles")
});

static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^([0-9]{4})-([0-9][0-9]?)-([0-9][0-9]?)",
        r"(?:[Tt]|[ \t]+)([0-9][0-9]?):([0-9]{2}):([0-9]{2})",
        r"(?:\.([0-9]*))?",
        r"(?:[ \t]*(Z|([-+])([0-9][0-9]?)(?::([0-9]{2}))?))?$",
    ))
    .expect("timestamp pattern compiles")
});

/// Padding is optional and `=` may appear anywhere; only the bit count is
/// checked before decoding.
const BINARY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

pub(super) fn timestamp_type() -> Type {
    Type::new("tag:yaml.org,2002:timestamp", Kind::Scalar)
        .with_resolve(|value| value.as_str().and_then(parse_timestamp).is_some())
        .with_construct(|value| match value.as_str().and_then(parse_timestamp) {
            Some(t) => Value::Timestamp(t),
            None => value,
        })
}

pub(super) fn merge_type() -> Type {
    Type::new(MERGE_TAG, Kind::Scalar).with_resolve(|value| match value {
        Value::Null => true,
        Value::String(s) => s == "<<",
        _ => false,
    })
}

pub(super) fn binary_type() -> Type {
    Type::new("tag:yaml.org,2002:binary", Kind::Scalar)
        .with_resolve(|value| value.as_str().and_then(decode_binary).is_some())
        .with_construct(|value| match value.as_str().and_then(decode_binary) {
            Some(bytes) => Value::Bytes(bytes),
            None => value,
        })
}

pub(super) fn omap_type() -> Type {
    Type::new("tag:yaml.org,2002:omap", Kind::Sequence)
        .with_resolve(is_omap)
        .with_construct(|value| match value {
            Value::Null => Value::sequence(Vec::new()),
            other => other,
        })
}

pub(super) fn pairs_type() -> Type {
    Type::new("tag:yaml.org,2002:pairs", Kind::Sequence)
        .with_resolve(|value| match value {
            Value::Null => true,
            Value::Sequence(seq) => seq.borrow().iter().all(|item| single_pair(item).is_some()),
            _ => false,
        })
        .with_construct(|value| {
            let Value::Sequence(seq) = value else {
                return Value::sequence(Vec::new());
            };
            let pairs = seq
                .borrow()
                .iter()
                .filter_map(single_pair)
                .map(|(key, value)| Value::sequence(vec![Value::String(key), value]))
                .collect();
            Value::sequence(pairs)
        })
}

pub(super) fn set_type() -> Type {
    Type::new("tag:yaml.org,2002:set", Kind::Mapping)
        .with_resolve(|value| match value {
            Value::Null => true,
            Value::Mapping(map) => map.borrow().values().all(Value::is_null),
            _ => false,
        })
        .with_construct(|value| match value {
            Value::Null => Value::mapping(IndexMap::new()),
            other => other,
        })
}

fn parse_timestamp(data: &str) -> Option<DateTime<FixedOffset>> {
    if let Some(caps) = DATE_PATTERN.captures(data) {
        let naive = NaiveDate::from_ymd_opt(
            number(&caps, 1)? as i32,
            number(&caps, 2)?,
            number(&caps, 3)?,
        )?
        .and_hms_opt(0, 0, 0)?;
        return FixedOffset::east_opt(0)?
            .from_local_datetime(&naive)
            .single();
    }

    let caps = TIMESTAMP_PATTERN.captures(data)?;
    let nanos = match caps.get(7) {
        Some(fraction) => {
            let digits: String = fraction.as_str().chars().take(9).collect();
            format!("{:0<9}", digits).parse().ok()?
        }
        None => 0,
    };
    let naive = NaiveDate::from_ymd_opt(
        number(&caps, 1)? as i32,
        number(&caps, 2)?,
        number(&caps, 3)?,
    )?
    .and_hms_nano_opt(
        number(&caps, 4)?,
        number(&caps, 5)?,
        number(&caps, 6)?,
        nanos,
    )?;

    let mut offset = 0;
    if let Some(sign) = caps.get(9) {
        let minutes = number(&caps, 10)? * 60 + number(&caps, 11).unwrap_or(0);
        offset = minutes as i32 * 60;
        if sign.as_str() == "-" {
            offset = -offset;
        }
    }
    FixedOffset::east_opt(offset)?
        .from_local_datetime(&naive)
        .single()
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn decode_binary(data: &str) -> Option<Vec<u8>> {
    let mut bits = 0usize;
    let mut cleaned = String::with_capacity(data.len());
    for c in data.chars() {
        match c {
            '\n' | '\r' => continue,
            '=' => bits += 6,
            c if c.is_ascii_alphanumeric() || c == '+' || c == '/' => {
                bits += 6;
                cleaned.push(c);
            }
            _ => return None,
        }
    }
    if bits % 8 != 0 {
        return None;
    }
    BINARY_ENGINE.decode(cleaned).ok()
}

/// The key and value of a mapping holding exactly one pair.
fn single_pair(item: &Value) -> Option<(String, Value)> {
    let map = item.as_mapping()?.borrow();
    if map.len() != 1 {
        return None;
    }
    map.iter().next().map(|(k, v)| (k.clone(), v.clone()))
}

fn is_omap(value: &Value) -> bool {
    let seq = match value {
        Value::Null => return true,
        Value::Sequence(seq) => seq.borrow(),
        _ => return false,
    };
    let mut seen = HashSet::new();
    for item in seq.iter() {
        let Some((key, _)) = single_pair(item) else {
            return false;
        };
        if !seen.insert(key) {
            return false;
        }
    }
    true
}
