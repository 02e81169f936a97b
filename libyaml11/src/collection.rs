//! Flow collections, block sequences and block mappings.
//!
//! Collections are allocated and bound to their anchor before any child is
//! read, so an alias inside the collection can refer to it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::mem;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::composer::{compose_node, Context};
use crate::error::{ErrorKind, Result};
use crate::schema::{Kind, MERGE_TAG};
use crate::state::{is_white_space, is_ws_or_eol, Checkpoint, State};
use crate::value::{Mapping, Sequence, Value};

fn new_mapping() -> Mapping {
    Rc::new(RefCell::new(IndexMap::new()))
}

fn new_sequence() -> Sequence {
    Rc::new(RefCell::new(Vec::new()))
}

fn bind_anchor(state: &mut State<'_>, anchor: &Option<String>, value: Value) {
    if let Some(anchor) = anchor {
        state.anchor_map.insert(anchor.clone(), value);
    }
}

/// The string a key node is stored under.
fn key_text(state: &State<'_>, key: &Value) -> Result<String> {
    match key {
        Value::Mapping(_) => Err(state.error(ErrorKind::MappingKey)),
        Value::Sequence(items) => {
            let items = items.borrow();
            let mut parts = Vec::with_capacity(items.len());
            for item in items.iter() {
                match item {
                    Value::Sequence(_) => return Err(state.error(ErrorKind::NestedArrayKey)),
                    Value::Mapping(_) => return Err(state.error(ErrorKind::MappingKey)),
                    Value::Null => parts.push(String::new()),
                    other => parts.push(other.scalar_text().unwrap_or_default()),
                }
            }
            Ok(parts.join(","))
        }
        other => Ok(other.scalar_text().unwrap_or_default()),
    }
}

/// Copy the keys of `source` that `target` lacks, remembering them as
/// overridable.
fn merge_mappings(
    state: &State<'_>,
    target: &Mapping,
    source: &Value,
    overridable: &mut HashSet<String>,
) -> Result<()> {
    let Value::Mapping(source) = source else {
        return Err(state.error(ErrorKind::UnacceptableMergeSource));
    };
    if Rc::ptr_eq(target, source) {
        return Ok(());
    }

    let source = source.borrow();
    let mut target = target.borrow_mut();
    for (key, value) in source.iter() {
        if !target.contains_key(key) {
            target.insert(key.clone(), value.clone());
            overridable.insert(key.clone());
        }
    }
    Ok(())
}

/// Insert one key/value pair, handling `<<` merge keys and duplicates.
///
/// Keys that arrived through a merge may be overridden once by an explicit
/// key; any other repeated key is an error unless the loader is in JSON
/// mode. `start` relocates the duplicate-key error to the start of the entry.
pub(crate) fn store_mapping_pair(
    state: &mut State<'_>,
    target: &Mapping,
    overridable: &mut HashSet<String>,
    key_tag: Option<&str>,
    key: Value,
    value: Value,
    start: Option<Checkpoint>,
) -> Result<()> {
    let key = key_text(state, &key)?;

    if key_tag == Some(MERGE_TAG) {
        if let Value::Sequence(sources) = &value {
            let sources = sources.borrow().clone();
            for source in &sources {
                merge_mappings(state, target, source, overridable)?;
            }
        } else {
            merge_mappings(state, target, &value, overridable)?;
        }
        return Ok(());
    }

    let exists = target.borrow().contains_key(&key);
    if !state.json && exists && !overridable.contains(&key) {
        if let Some(start) = start {
            state.restore(start);
        }
        return Err(state.error(ErrorKind::DuplicateKey));
    }
    overridable.remove(&key);
    target.borrow_mut().insert(key, value);
    Ok(())
}

/// `[...]` or `{...}`, possibly spanning lines.
pub(crate) fn read_flow_collection(state: &mut State<'_>, node_indent: isize) -> Result<bool> {
    let (terminator, kind) = match state.ch() {
        '[' => (']', Kind::Sequence),
        '{' => ('}', Kind::Mapping),
        _ => return Ok(false),
    };

    let tag = state.tag.clone();
    let anchor = state.anchor.clone();
    let sequence = new_sequence();
    let mapping = new_mapping();
    let collection = match kind {
        Kind::Mapping => Value::Mapping(mapping.clone()),
        _ => Value::Sequence(sequence.clone()),
    };
    bind_anchor(state, &anchor, collection.clone());

    let mut overridable = HashSet::new();
    let mut read_next = true;
    let mut ch = state.advance();

    while ch != '\0' {
        state.skip_separation_space(true, node_indent)?;
        ch = state.ch();

        if ch == terminator {
            state.position += 1;
            state.tag = tag;
            state.anchor = anchor;
            state.kind = Some(kind);
            state.result = collection;
            return Ok(true);
        }
        if !read_next {
            return Err(state.error(ErrorKind::MissedComma));
        }

        let mut is_pair = false;
        let mut is_explicit_pair = false;
        if ch == '?' && is_ws_or_eol(state.char_at(state.position + 1)) {
            is_pair = true;
            is_explicit_pair = true;
            state.position += 1;
            state.skip_separation_space(true, node_indent)?;
        }

        let line = state.line;
        compose_node(state, node_indent, Context::FlowIn, false, true)?;
        let key_tag = state.tag.clone();
        let key = mem::take(&mut state.result);
        let mut value = Value::Null;
        state.skip_separation_space(true, node_indent)?;
        ch = state.ch();

        if (is_explicit_pair || state.line == line) && ch == ':' {
            is_pair = true;
            state.position += 1;
            state.skip_separation_space(true, node_indent)?;
            compose_node(state, node_indent, Context::FlowIn, false, true)?;
            value = mem::take(&mut state.result);
        }

        if kind == Kind::Mapping {
            store_mapping_pair(
                state,
                &mapping,
                &mut overridable,
                key_tag.as_deref(),
                key,
                value,
                None,
            )?;
        } else if is_pair {
            // `[a: 1]` is a sequence holding the single-pair mapping `{a: 1}`.
            let pair = new_mapping();
            let mut pair_overridable = HashSet::new();
            store_mapping_pair(
                state,
                &pair,
                &mut pair_overridable,
                key_tag.as_deref(),
                key,
                value,
                None,
            )?;
            sequence.borrow_mut().push(Value::Mapping(pair));
        } else {
            sequence.borrow_mut().push(key);
        }

        state.skip_separation_space(true, node_indent)?;
        ch = state.ch();
        if ch == ',' {
            read_next = true;
            ch = state.advance();
        } else {
            read_next = false;
        }
    }

    Err(state.error(ErrorKind::UnterminatedFlowCollection))
}

/// Entries introduced by `- ` at column `node_indent`.
pub(crate) fn read_block_sequence(state: &mut State<'_>, node_indent: isize) -> Result<bool> {
    let tag = state.tag.clone();
    let anchor = state.anchor.clone();
    let items = new_sequence();
    bind_anchor(state, &anchor, Value::Sequence(items.clone()));

    let mut detected = false;
    let mut ch = state.ch();

    while ch != '\0' {
        if ch != '-' || !is_ws_or_eol(state.char_at(state.position + 1)) {
            break;
        }
        detected = true;
        state.position += 1;

        if state.skip_separation_space(true, -1)? > 0 && state.line_indent <= node_indent {
            // `-` followed by nothing on its line and no deeper content.
            items.borrow_mut().push(Value::Null);
            ch = state.ch();
            continue;
        }

        let line = state.line;
        compose_node(state, node_indent, Context::BlockIn, false, true)?;
        let item = mem::take(&mut state.result);
        items.borrow_mut().push(item);
        state.skip_separation_space(true, -1)?;
        ch = state.ch();

        if (state.line == line || state.line_indent > node_indent) && ch != '\0' {
            return Err(state.error(ErrorKind::BadSequenceIndentation));
        } else if state.line_indent < node_indent {
            break;
        }
    }

    if !detected {
        return Ok(false);
    }
    state.tag = tag;
    state.anchor = anchor;
    state.kind = Some(Kind::Sequence);
    state.result = Value::Sequence(items);
    Ok(true)
}

/// `key: value` entries and `? key` / `: value` explicit pairs at column
/// `node_indent`.
///
/// Implicit keys are read in flow-out context at `flow_indent`. When the
/// first candidate key turns out not to be followed by `:`, the node just
/// composed is kept as the result: this is how plain and quoted scalars in
/// block context are read.
pub(crate) fn read_block_mapping(
    state: &mut State<'_>,
    node_indent: isize,
    flow_indent: isize,
) -> Result<bool> {
    let tag = state.tag.clone();
    let anchor = state.anchor.clone();
    let mapping = new_mapping();
    bind_anchor(state, &anchor, Value::Mapping(mapping.clone()));

    let mut overridable = HashSet::new();
    let mut key_tag: Option<String> = None;
    let mut key = Value::Null;
    let mut value = Value::Null;
    let mut at_explicit_key = false;
    let mut allow_compact;
    let mut detected = false;
    let mut ch = state.ch();

    while ch != '\0' {
        let following = state.char_at(state.position + 1);
        let line = state.line;
        let entry_start = state.checkpoint();

        if (ch == '?' || ch == ':') && is_ws_or_eol(following) {
            if ch == '?' {
                if at_explicit_key {
                    store_mapping_pair(
                        state,
                        &mapping,
                        &mut overridable,
                        key_tag.take().as_deref(),
                        mem::take(&mut key),
                        Value::Null,
                        None,
                    )?;
                }
                detected = true;
                at_explicit_key = true;
                allow_compact = true;
            } else if at_explicit_key {
                // `:` closing an explicit key.
                at_explicit_key = false;
                allow_compact = true;
            } else {
                return Err(state.error(ErrorKind::IncompleteExplicitPair));
            }
            state.position += 1;
            ch = following;
        } else if compose_node(state, flow_indent, Context::FlowOut, false, true)? {
            if state.line != line {
                if detected {
                    return Err(state.error(ErrorKind::MultilineImplicitKey));
                }
                state.tag = tag;
                state.anchor = anchor;
                return Ok(true);
            }

            ch = state.ch();
            while is_white_space(ch) {
                ch = state.advance();
            }

            if ch != ':' {
                if detected {
                    return Err(state.error(ErrorKind::MissingColon));
                }
                state.tag = tag;
                state.anchor = anchor;
                return Ok(true);
            }

            ch = state.advance();
            if !is_ws_or_eol(ch) {
                return Err(state.error(ErrorKind::MissingWhitespaceAfterColon));
            }
            if at_explicit_key {
                store_mapping_pair(
                    state,
                    &mapping,
                    &mut overridable,
                    key_tag.take().as_deref(),
                    mem::take(&mut key),
                    Value::Null,
                    None,
                )?;
            }
            detected = true;
            at_explicit_key = false;
            allow_compact = false;
            key_tag = state.tag.clone();
            key = mem::take(&mut state.result);
        } else {
            break;
        }

        if state.line == line || state.line_indent > node_indent {
            if compose_node(state, node_indent, Context::BlockOut, true, allow_compact)? {
                if at_explicit_key {
                    key = mem::take(&mut state.result);
                } else {
                    value = mem::take(&mut state.result);
                }
            }
            if !at_explicit_key {
                store_mapping_pair(
                    state,
                    &mapping,
                    &mut overridable,
                    key_tag.take().as_deref(),
                    mem::take(&mut key),
                    mem::take(&mut value),
                    Some(entry_start),
                )?;
            }
            state.skip_separation_space(true, -1)?;
            ch = state.ch();
        }

        if state.line_indent > node_indent && ch != '\0' {
            return Err(state.error(ErrorKind::BadMappingIndentation));
        } else if state.line_indent < node_indent {
            break;
        }
    }

    // A trailing `? key` with no value.
    if at_explicit_key {
        store_mapping_pair(
            state,
            &mapping,
            &mut overridable,
            key_tag.as_deref(),
            key,
            Value::Null,
            None,
        )?;
    }

    // The probe for a key reset the node's properties; give them back.
    state.tag = tag;
    state.anchor = anchor;
    if detected {
        state.kind = Some(Kind::Mapping);
        state.result = Value::Mapping(mapping);
    }
    Ok(detected)
}
