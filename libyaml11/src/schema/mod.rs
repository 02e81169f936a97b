//! Type resolvers and the schemas that group them.
//!
//! A [`Type`] pairs a tag with a predicate deciding whether a raw node
//! belongs to it and a constructor producing the final value. Implicit
//! types are tried in order on untagged plain scalars; explicit types are
//! looked up by tag and node kind.

mod default;
mod failsafe;
mod json;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

/// Prefix shared by every tag in the YAML type repository.
pub const YAML_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Tag of `<<` merge keys.
pub const MERGE_TAG: &str = "tag:yaml.org,2002:merge";

/// Node kind a type applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Plain, quoted and block scalars.
    Scalar,
    /// Block and flow sequences.
    Sequence,
    /// Block and flow mappings.
    Mapping,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Scalar => "scalar",
            Kind::Sequence => "sequence",
            Kind::Mapping => "mapping",
        })
    }
}

type ResolveFn = Box<dyn Fn(&Value) -> bool>;
type ConstructFn = Box<dyn Fn(Value) -> Value>;

/// A tag resolver: which nodes it accepts and what it builds from them.
pub struct Type {
    tag: String,
    kind: Kind,
    resolve: ResolveFn,
    construct: ConstructFn,
}

impl Type {
    /// A type that accepts every node of `kind` and keeps it unchanged.
    pub fn new(tag: impl Into<String>, kind: Kind) -> Self {
        Self {
            tag: tag.into(),
            kind,
            resolve: Box::new(|_| true),
            construct: Box::new(|value| value),
        }
    }

    /// Replace the acceptance predicate.
    pub fn with_resolve(mut self, resolve: impl Fn(&Value) -> bool + 'static) -> Self {
        self.resolve = Box::new(resolve);
        self
    }

    /// Replace the constructor.
    pub fn with_construct(mut self, construct: impl Fn(Value) -> Value + 'static) -> Self {
        self.construct = Box::new(construct);
        self
    }

    /// Canonical tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Node kind this type applies to.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Whether the raw node belongs to this type.
    pub fn resolve(&self, value: &Value) -> bool {
        (self.resolve)(value)
    }

    /// Build the final value from an accepted node.
    pub fn construct(&self, value: Value) -> Value {
        (self.construct)(value)
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("tag", &self.tag)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Outcome of looking up an explicit tag.
pub(crate) enum Lookup<'a> {
    /// Registered for the node's kind (or the node has no kind yet).
    Found(&'a Type),
    /// Registered, but for another kind.
    WrongKind(&'a Type),
    /// Not registered at all.
    Unknown,
}

/// An ordered list of implicit types plus tag maps for explicit ones.
#[derive(Clone)]
pub struct Schema {
    implicit: Vec<Rc<Type>>,
    by_kind: HashMap<Kind, HashMap<String, Rc<Type>>>,
    fallback: HashMap<String, Rc<Type>>,
}

impl Schema {
    /// A schema with no types; every explicit tag is unknown.
    pub fn empty() -> Self {
        Self {
            implicit: Vec::new(),
            by_kind: HashMap::new(),
            fallback: HashMap::new(),
        }
    }

    /// `str`, `seq` and `map`; everything stays a string.
    pub fn failsafe() -> Self {
        Self::empty()
            .with_explicit(failsafe::str_type())
            .with_explicit(failsafe::seq_type())
            .with_explicit(failsafe::map_type())
    }

    /// Failsafe plus implicit `null`, `bool`, `int` and `float`.
    pub fn json() -> Self {
        Self::failsafe()
            .with_implicit(json::null_type())
            .with_implicit(json::bool_type())
            .with_implicit(json::int_type())
            .with_implicit(json::float_type())
    }

    /// Same resolvers as [`Schema::json`].
    pub fn core() -> Self {
        Self::json()
    }

    /// Core plus implicit `timestamp` and `merge`, explicit `binary`,
    /// `omap`, `pairs` and `set`.
    pub fn default_safe() -> Self {
        Self::core()
            .with_implicit(default::timestamp_type())
            .with_implicit(default::merge_type())
            .with_explicit(default::binary_type())
            .with_explicit(default::omap_type())
            .with_explicit(default::pairs_type())
            .with_explicit(default::set_type())
    }

    /// Append an implicit type (tried after the existing ones). A type with
    /// the same tag and kind is replaced in place.
    pub fn with_implicit(mut self, ty: Type) -> Self {
        let ty = Rc::new(ty);
        match self
            .implicit
            .iter()
            .position(|t| t.tag == ty.tag && t.kind == ty.kind)
        {
            Some(i) => self.implicit[i] = ty.clone(),
            None => self.implicit.push(ty.clone()),
        }
        self.register(ty);
        self
    }

    /// Register a type reachable only through an explicit tag.
    pub fn with_explicit(mut self, ty: Type) -> Self {
        self.register(Rc::new(ty));
        self
    }

    fn register(&mut self, ty: Rc<Type>) {
        self.by_kind
            .entry(ty.kind)
            .or_default()
            .insert(ty.tag.clone(), ty.clone());
        self.fallback.insert(ty.tag.clone(), ty);
    }

    /// Implicit types in resolution order.
    pub fn implicit(&self) -> impl Iterator<Item = &Type> {
        self.implicit.iter().map(|t| t.as_ref())
    }

    /// Look up an explicit tag for a node of `kind` (`None` for an empty node).
    pub(crate) fn lookup(&self, kind: Option<Kind>, tag: &str) -> Lookup<'_> {
        let Some(kind) = kind else {
            return match self.fallback.get(tag) {
                Some(ty) => Lookup::Found(ty.as_ref()),
                None => Lookup::Unknown,
            };
        };
        if let Some(ty) = self.by_kind.get(&kind).and_then(|types| types.get(tag)) {
            return Lookup::Found(ty.as_ref());
        }
        match self.fallback.get(tag) {
            Some(ty) => Lookup::WrongKind(ty.as_ref()),
            None => Lookup::Unknown,
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::default_safe()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field(
                "implicit",
                &self.implicit.iter().map(|t| t.tag()).collect::<Vec<_>>(),
            )
            .field("explicit", &self.fallback.keys().collect::<Vec<_>>())
            .finish()
    }
}
