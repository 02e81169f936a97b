//! Node composition and tag resolution.

use std::cmp::Ordering;
use std::mem;

use crate::collection::{read_block_mapping, read_block_sequence, read_flow_collection};
use crate::error::{ErrorKind, Result};
use crate::options::NodePhase;
use crate::property::{read_alias, read_anchor_property, read_tag_property};
use crate::scalar::{
    read_block_scalar, read_double_quoted_scalar, read_plain_scalar, read_single_quoted_scalar,
};
use crate::schema::{Kind, Lookup};
use crate::state::State;
use crate::value::Value;

/// Non-specific tag of plain scalars; resolved by the implicit types.
const IMPLICIT_TAG: &str = "?";

/// Non-specific tag written `!`; leaves the node as read.
const VERBATIM_TAG: &str = "!";

/// Deepest node nesting accepted; the composer recurses once per level.
pub(crate) const MAX_DEPTH: usize = 64;

/// Where a node appears, which decides the styles it may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Context {
    /// Inside `[...]` or `{...}`.
    FlowIn,
    /// Implicit key of a block mapping.
    FlowOut,
    /// Entry of a block sequence.
    BlockIn,
    /// Value of a block mapping, or a document root.
    BlockOut,
}

impl Context {
    fn is_flow(self) -> bool {
        matches!(self, Context::FlowIn | Context::FlowOut)
    }
}

/// Compose one node (properties plus content) and resolve its tag.
///
/// `parent_indent` is the indentation of the enclosing node; content must be
/// indented deeper, except for a block sequence that is the value of a
/// mapping key at the same column. With `allow_to_seek` the node may start
/// on a later line. `allow_compact` permits a block collection to start on
/// the current line.
///
/// Returns whether anything was read: a tag, an anchor or content. On return
/// `state.result` holds the constructed value (null for an empty node).
pub(crate) fn compose_node(
    state: &mut State<'_>,
    parent_indent: isize,
    context: Context,
    allow_to_seek: bool,
    allow_compact: bool,
) -> Result<bool> {
    state.notify(NodePhase::Open);

    state.depth += 1;
    if state.depth > MAX_DEPTH {
        return Err(state.error(ErrorKind::NestingTooDeep));
    }

    state.tag = None;
    state.anchor = None;
    state.kind = None;
    state.result = Value::Null;

    let allow_block_styles = !context.is_flow();
    let allow_block_scalars = allow_block_styles;
    let mut allow_block_collections = allow_block_styles;
    let mut at_new_line = false;
    let mut has_content = false;
    let mut indent_status = Ordering::Greater;

    if allow_to_seek && state.skip_separation_space(true, -1)? > 0 {
        at_new_line = true;
        indent_status = state.line_indent.cmp(&parent_indent);
    }

    if indent_status == Ordering::Greater {
        while read_tag_property(state)? || read_anchor_property(state)? {
            if state.skip_separation_space(true, -1)? > 0 {
                at_new_line = true;
                allow_block_collections = allow_block_styles;
                indent_status = state.line_indent.cmp(&parent_indent);
            } else {
                allow_block_collections = false;
            }
        }
    }

    if allow_block_collections {
        allow_block_collections = at_new_line || allow_compact;
    }

    if indent_status == Ordering::Greater || context == Context::BlockOut {
        let flow_indent = if context.is_flow() {
            parent_indent
        } else {
            parent_indent + 1
        };
        let block_indent = state.column() as isize;

        if indent_status == Ordering::Greater {
            if allow_block_collections
                && (read_block_sequence(state, block_indent)?
                    || read_block_mapping(state, block_indent, flow_indent)?)
                || read_flow_collection(state, flow_indent)?
            {
                has_content = true;
            } else if allow_block_scalars && read_block_scalar(state, flow_indent)?
                || read_single_quoted_scalar(state, flow_indent)?
                || read_double_quoted_scalar(state, flow_indent)?
            {
                has_content = true;
            } else if read_alias(state)? {
                if state.tag.is_some() || state.anchor.is_some() {
                    return Err(state.error(ErrorKind::AliasWithProperties));
                }
                has_content = true;
            } else if read_plain_scalar(state, flow_indent, context == Context::FlowIn)? {
                has_content = true;
                if state.tag.is_none() {
                    state.tag = Some(IMPLICIT_TAG.to_string());
                }
            }
        } else if indent_status == Ordering::Equal {
            // A block sequence may sit at the same column as its mapping key.
            has_content = allow_block_collections && read_block_sequence(state, block_indent)?;
        }
    }

    // `&a` alone is an empty node; resolve it like an empty plain scalar.
    if !has_content && state.tag.is_none() && state.anchor.is_some() {
        state.tag = Some(IMPLICIT_TAG.to_string());
    }

    if let Some(tag) = state.tag.clone() {
        if tag == IMPLICIT_TAG {
            resolve_implicit(state)?;
        } else if tag != VERBATIM_TAG {
            resolve_explicit(state, tag)?;
        }
    }

    if let Some(anchor) = &state.anchor {
        state.anchor_map.insert(anchor.clone(), state.result.clone());
    }

    state.depth -= 1;
    state.notify(NodePhase::Close);
    Ok(state.tag.is_some() || state.anchor.is_some() || has_content)
}

/// Try the implicit types in order; the first that accepts the node wins.
fn resolve_implicit(state: &mut State<'_>) -> Result<()> {
    if let Some(found) = state.kind.filter(|kind| *kind != Kind::Scalar) {
        return Err(state.error(ErrorKind::UnacceptableKind {
            tag: IMPLICIT_TAG.to_string(),
            expected: Kind::Scalar,
            found,
        }));
    }

    let raw = mem::take(&mut state.result);
    match state.schema.implicit().find(|ty| ty.resolve(&raw)) {
        Some(ty) => {
            state.tag = Some(ty.tag().to_string());
            state.result = ty.construct(raw);
        }
        None => state.result = raw,
    }
    Ok(())
}

fn resolve_explicit(state: &mut State<'_>, tag: String) -> Result<()> {
    let raw = mem::take(&mut state.result);
    let kind = state.kind;

    let constructed = match state.schema.lookup(kind, &tag) {
        Lookup::Found(ty) if ty.resolve(&raw) => Ok(ty.construct(raw)),
        Lookup::Found(_) => Err(ErrorKind::CannotResolve(tag)),
        Lookup::WrongKind(ty) => Err(ErrorKind::UnacceptableKind {
            tag,
            expected: ty.kind(),
            found: kind.unwrap_or(ty.kind()),
        }),
        Lookup::Unknown => Err(ErrorKind::UnknownTag(tag)),
    };

    match constructed {
        Ok(value) => {
            state.result = value;
            Ok(())
        }
        Err(kind) => Err(state.error(kind)),
    }
}
