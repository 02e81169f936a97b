//! Node properties (`!tag`, `&anchor`) and `*alias` nodes.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ErrorKind, Result};
use crate::schema::YAML_TAG_PREFIX;
use crate::state::{is_flow_indicator, is_ws_or_eol, State};

/// `!`, `!!` or `!name!`.
pub(crate) static TAG_HANDLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:!|!!|![a-z\-]+!)$").expect("tag handle pattern compiles")
});

/// URI characters allowed in tag names and `%TAG` prefixes.
pub(crate) static TAG_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:!|[^,\[\]\{\}])",
        r"(?:%[0-9a-f]{2}|[0-9a-z\-#;/?:@&=+$,_.!~*'()\[\]])*$",
    ))
    .expect("tag uri pattern compiles")
});

/// Read a tag property into `state.tag`, expanding its handle.
pub(crate) fn read_tag_property(state: &mut State<'_>) -> Result<bool> {
    let mut ch = state.ch();
    if ch != '!' {
        return Ok(false);
    }
    if state.tag.is_some() {
        return Err(state.error(ErrorKind::DuplicateTag));
    }

    let mut is_verbatim = false;
    let mut is_named = false;
    let mut handle = String::from("!");

    ch = state.advance();
    if ch == '<' {
        is_verbatim = true;
        ch = state.advance();
    } else if ch == '!' {
        is_named = true;
        handle = String::from("!!");
        ch = state.advance();
    }

    let mut start = state.position;
    let name;

    if is_verbatim {
        // The first character is taken as-is, so `!<>>` names `>`.
        loop {
            ch = state.advance();
            if ch == '\0' || ch == '>' {
                break;
            }
        }
        if state.position >= state.length {
            return Err(state.error(ErrorKind::UnterminatedVerbatimTag));
        }
        name = state.slice(start, state.position);
        state.position += 1;
    } else {
        while ch != '\0' && !is_ws_or_eol(ch) {
            if ch == '!' {
                if is_named {
                    return Err(state.error(ErrorKind::ExclamationInTagSuffix));
                }
                handle = state.slice(start - 1, state.position + 1);
                if !TAG_HANDLE.is_match(&handle) {
                    return Err(state.error(ErrorKind::IllFormedNamedHandle));
                }
                is_named = true;
                start = state.position + 1;
            }
            ch = state.advance();
        }
        name = state.slice(start, state.position);
        if name.chars().any(is_flow_indicator) {
            return Err(state.error(ErrorKind::FlowIndicatorInTagSuffix));
        }
    }

    if !name.is_empty() && !TAG_URI.is_match(&name) {
        return Err(state.error(ErrorKind::IllFormedTagName(name)));
    }

    let tag = if is_verbatim {
        name
    } else if let Some(prefix) = state.tag_map.get(&handle) {
        format!("{}{}", prefix, name)
    } else if handle == "!" {
        format!("!{}", name)
    } else if handle == "!!" {
        format!("{}{}", YAML_TAG_PREFIX, name)
    } else {
        return Err(state.error(ErrorKind::UndeclaredTagHandle(handle)));
    };
    state.tag = Some(tag);
    Ok(true)
}

/// Characters after `&`/`*` up to a blank, a line break or a flow indicator.
fn read_name(state: &mut State<'_>) -> (usize, usize) {
    let start = state.position + 1;
    let mut ch = state.advance();
    while ch != '\0' && !is_ws_or_eol(ch) && !is_flow_indicator(ch) {
        ch = state.advance();
    }
    (start, state.position)
}

pub(crate) fn read_anchor_property(state: &mut State<'_>) -> Result<bool> {
    if state.ch() != '&' {
        return Ok(false);
    }
    if state.anchor.is_some() {
        return Err(state.error(ErrorKind::DuplicateAnchor));
    }

    let (start, end) = read_name(state);
    if start == end {
        return Err(state.error(ErrorKind::EmptyAnchorName));
    }
    state.anchor = Some(state.slice(start, end));
    Ok(true)
}

/// Resolve `*name` to the value its anchor is bound to.
pub(crate) fn read_alias(state: &mut State<'_>) -> Result<bool> {
    if state.ch() != '*' {
        return Ok(false);
    }

    let (start, end) = read_name(state);
    if start == end {
        return Err(state.error(ErrorKind::EmptyAliasName));
    }
    let alias = state.slice(start, end);
    let Some(value) = state.anchor_map.get(&alias).cloned() else {
        return Err(state.error(ErrorKind::UnidentifiedAlias(alias)));
    };
    state.result = value;
    state.skip_separation_space(true, -1)?;
    Ok(true)
}
