//! `str`, `seq` and `map`: the types every schema starts from.

use indexmap::IndexMap;

use super::{Kind, Type};
use crate::value::Value;

pub(super) fn str_type() -> Type {
    Type::new("tag:yaml.org,2002:str", Kind::Scalar).with_construct(|value| match value {
        Value::Null => Value::String(String::new()),
        other => other,
    })
}

pub(super) fn seq_type() -> Type {
    Type::new("tag:yaml.org,2002:seq", Kind::Sequence).with_construct(|value| match value {
        Value::Null => Value::sequence(Vec::new()),
        other => other,
    })
}

pub(super) fn map_type() -> Type {
    Type::new("tag:yaml.org,2002:map", Kind::Mapping).with_construct(|value| match value {
        Value::Null => Value::mapping(IndexMap::new()),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_nodes_become_empty_values() {
        assert_eq!(str_type().construct(Value::Null), Value::from(""));
        assert_eq!(seq_type().construct(Value::Null).len(), 0);
        assert!(map_type().construct(Value::Null).as_mapping().is_some());
    }

    #[test]
    fn test_content_passes_through() {
        assert_eq!(str_type().construct(Value::from("x")), Value::from("x"));
    }
}
