//! Scalar readers: plain, single-quoted, double-quoted and block.
//!
//! Each reader returns `Ok(false)` without touching the node when the
//! input does not start its style. On success the node's kind is
//! [`Kind::Scalar`] and its result is the string read.

use crate::error::{ErrorKind, Result};
use crate::schema::Kind;
use crate::state::{
    is_eol, is_flow_indicator, is_white_space, is_ws_or_eol, write_folded_lines, State,
};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomping {
    Clip,
    Strip,
    Keep,
}

fn finish(state: &mut State<'_>, text: String) {
    state.kind = Some(Kind::Scalar);
    state.result = Value::String(text);
}

pub(crate) fn read_plain_scalar(
    state: &mut State<'_>,
    node_indent: isize,
    within_flow_collection: bool,
) -> Result<bool> {
    let mut ch = state.ch();

    if is_ws_or_eol(ch)
        || is_flow_indicator(ch)
        || matches!(
            ch,
            '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`'
        )
    {
        return Ok(false);
    }

    if ch == '?' || ch == '-' {
        let following = state.char_at(state.position + 1);
        if is_ws_or_eol(following) || within_flow_collection && is_flow_indicator(following) {
            return Ok(false);
        }
    }

    let mut text = String::new();
    let mut capture_start = state.position;
    let mut capture_end = state.position;
    let mut pending_from_line = None;

    while ch != '\0' {
        if ch == ':' {
            let following = state.char_at(state.position + 1);
            if is_ws_or_eol(following) || within_flow_collection && is_flow_indicator(following) {
                break;
            }
        } else if ch == '#' {
            let preceding = state
                .position
                .checked_sub(1)
                .map(|i| state.char_at(i))
                .unwrap_or('\0');
            if is_ws_or_eol(preceding) {
                break;
            }
        } else if (state.position == state.line_start && state.test_document_separator())
            || within_flow_collection && is_flow_indicator(ch)
        {
            break;
        } else if is_eol(ch) {
            let saved = state.checkpoint();
            let from_line = state.line;
            state.skip_separation_space(false, -1)?;

            if state.line_indent >= node_indent {
                pending_from_line = Some(from_line);
                ch = state.ch();
                continue;
            }
            state.restore(saved);
            state.position = capture_end;
            break;
        }

        if let Some(from_line) = pending_from_line.take() {
            state.capture_segment(&mut text, capture_start, capture_end, false)?;
            write_folded_lines(&mut text, state.line - from_line);
            capture_start = state.position;
            capture_end = state.position;
        }

        if !is_white_space(ch) {
            capture_end = state.position + 1;
        }

        ch = state.advance();
    }

    state.capture_segment(&mut text, capture_start, capture_end, false)?;

    if text.is_empty() {
        return Ok(false);
    }
    finish(state, text);
    Ok(true)
}

pub(crate) fn read_single_quoted_scalar(state: &mut State<'_>, node_indent: isize) -> Result<bool> {
    if state.ch() != '\'' {
        return Ok(false);
    }

    let check_json = state.json;
    let mut text = String::new();
    state.position += 1;
    let mut capture_start = state.position;
    let mut capture_end = state.position;

    loop {
        let ch = state.ch();
        if ch == '\0' {
            break;
        }
        if ch == '\'' {
            state.capture_segment(&mut text, capture_start, state.position, check_json)?;
            if state.advance() == '\'' {
                capture_start = state.position;
                state.position += 1;
                capture_end = state.position;
            } else {
                finish(state, text);
                return Ok(true);
            }
        } else if is_eol(ch) {
            state.capture_segment(&mut text, capture_start, capture_end, check_json)?;
            let breaks = state.skip_separation_space(false, node_indent)?;
            write_folded_lines(&mut text, breaks);
            capture_start = state.position;
            capture_end = state.position;
        } else if state.position == state.line_start && state.test_document_separator() {
            return Err(state.error(ErrorKind::DocumentEndInQuotedScalar("single")));
        } else {
            state.position += 1;
            capture_end = state.position;
        }
    }

    Err(state.error(ErrorKind::StreamEndInQuotedScalar("single")))
}

fn simple_escape(c: char) -> Option<char> {
    Some(match c {
        '0' => '\u{00}',
        'a' => '\u{07}',
        'b' => '\u{08}',
        't' | '\t' => '\t',
        'n' => '\n',
        'v' => '\u{0B}',
        'f' => '\u{0C}',
        'r' => '\r',
        'e' => '\u{1B}',
        ' ' => ' ',
        '"' => '"',
        '/' => '/',
        '\\' => '\\',
        'N' => '\u{85}',
        '_' => '\u{A0}',
        'L' => '\u{2028}',
        'P' => '\u{2029}',
        _ => return None,
    })
}

fn escaped_hex_len(c: char) -> usize {
    match c {
        'x' => 2,
        'u' => 4,
        'U' => 8,
        _ => 0,
    }
}

/// Read `len` hex digits following the cursor, leaving the cursor on the
/// last one.
fn read_hex(state: &mut State<'_>, len: usize) -> Result<u32> {
    let mut value: u32 = 0;
    for _ in 0..len {
        let ch = state.advance();
        match ch.to_digit(16) {
            Some(digit) => value = (value << 4) | digit,
            None => return Err(state.error(ErrorKind::ExpectedHexCharacter)),
        }
    }
    Ok(value)
}

/// Decode a `\x`, `\u` or `\U` escape whose letter is under the cursor.
/// A high surrogate must be followed directly by a `\u` low surrogate.
fn read_hex_escape(state: &mut State<'_>, len: usize) -> Result<char> {
    let code = read_hex(state, len)?;

    if (0xD800..0xDC00).contains(&code) {
        let resume = state.position;
        if state.char_at(resume + 1) == '\\' && state.char_at(resume + 2) == 'u' {
            state.position += 2;
            let low = read_hex(state, 4)?;
            if (0xDC00..0xE000).contains(&low) {
                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                if let Some(c) = char::from_u32(combined) {
                    return Ok(c);
                }
            }
            state.position = resume;
        }
    }

    char::from_u32(code).ok_or_else(|| state.error(ErrorKind::InvalidCodePoint(code)))
}

pub(crate) fn read_double_quoted_scalar(state: &mut State<'_>, node_indent: isize) -> Result<bool> {
    if state.ch() != '"' {
        return Ok(false);
    }

    let check_json = state.json;
    let mut text = String::new();
    state.position += 1;
    let mut capture_start = state.position;
    let mut capture_end = state.position;

    loop {
        let ch = state.ch();
        if ch == '\0' {
            break;
        }
        if ch == '"' {
            state.capture_segment(&mut text, capture_start, state.position, check_json)?;
            state.position += 1;
            finish(state, text);
            return Ok(true);
        } else if ch == '\\' {
            state.capture_segment(&mut text, capture_start, state.position, check_json)?;
            let ch = state.advance();

            if is_eol(ch) {
                state.skip_separation_space(false, node_indent)?;
            } else if let Some(escaped) = simple_escape(ch) {
                text.push(escaped);
                state.position += 1;
            } else {
                let len = escaped_hex_len(ch);
                if len == 0 {
                    return Err(state.error(ErrorKind::UnknownEscape));
                }
                let decoded = read_hex_escape(state, len)?;
                text.push(decoded);
                state.position += 1;
            }

            capture_start = state.position;
            capture_end = state.position;
        } else if is_eol(ch) {
            state.capture_segment(&mut text, capture_start, capture_end, check_json)?;
            let breaks = state.skip_separation_space(false, node_indent)?;
            write_folded_lines(&mut text, breaks);
            capture_start = state.position;
            capture_end = state.position;
        } else if state.position == state.line_start && state.test_document_separator() {
            return Err(state.error(ErrorKind::DocumentEndInQuotedScalar("double")));
        } else {
            state.position += 1;
            capture_end = state.position;
        }
    }

    Err(state.error(ErrorKind::StreamEndInQuotedScalar("double")))
}

/// `|` literal and `>` folded scalars.
pub(crate) fn read_block_scalar(state: &mut State<'_>, node_indent: isize) -> Result<bool> {
    let folding = match state.ch() {
        '|' => false,
        '>' => true,
        _ => return Ok(false),
    };

    let mut text = String::new();
    let mut chomping = Chomping::Clip;
    let mut did_read_content = false;
    let mut detected_indent = false;
    let mut text_indent = node_indent;
    let mut empty_lines = 0usize;
    let mut at_more_indented = false;

    // Header: chomping and indentation indicators in either order.
    let mut ch = state.ch();
    while ch != '\0' {
        ch = state.advance();
        if ch == '+' || ch == '-' {
            if chomping != Chomping::Clip {
                return Err(state.error(ErrorKind::RepeatedChomping));
            }
            chomping = if ch == '+' {
                Chomping::Keep
            } else {
                Chomping::Strip
            };
        } else if let Some(width) = ch.to_digit(10) {
            if width == 0 {
                return Err(state.error(ErrorKind::ZeroIndentationWidth));
            }
            if detected_indent {
                return Err(state.error(ErrorKind::RepeatedIndentationWidth));
            }
            text_indent = node_indent + width as isize - 1;
            detected_indent = true;
        } else {
            break;
        }
    }

    if is_white_space(ch) {
        loop {
            ch = state.advance();
            if !is_white_space(ch) {
                break;
            }
        }
        if ch == '#' {
            loop {
                ch = state.advance();
                if is_eol(ch) || ch == '\0' {
                    break;
                }
            }
        }
    }

    while ch != '\0' {
        state.read_line_break()?;
        state.line_indent = 0;
        ch = state.ch();

        while (!detected_indent || state.line_indent < text_indent) && ch == ' ' {
            state.line_indent += 1;
            ch = state.advance();
        }

        if !detected_indent && state.line_indent > text_indent {
            text_indent = state.line_indent;
        }

        if is_eol(ch) {
            empty_lines += 1;
            continue;
        }

        // End of the scalar: a dedent or the end of the stream.
        if state.line_indent < text_indent || ch == '\0' {
            match chomping {
                Chomping::Keep => {
                    let breaks = if did_read_content {
                        1 + empty_lines
                    } else {
                        empty_lines
                    };
                    push_newlines(&mut text, breaks);
                }
                Chomping::Clip => {
                    if did_read_content {
                        text.push('\n');
                    }
                }
                Chomping::Strip => {}
            }
            break;
        }

        if folding {
            if is_white_space(ch) {
                // More-indented lines are kept verbatim.
                at_more_indented = true;
                let breaks = if did_read_content {
                    1 + empty_lines
                } else {
                    empty_lines
                };
                push_newlines(&mut text, breaks);
            } else if at_more_indented {
                at_more_indented = false;
                push_newlines(&mut text, empty_lines + 1);
            } else if empty_lines == 0 {
                if did_read_content {
                    text.push(' ');
                }
            } else {
                push_newlines(&mut text, empty_lines);
            }
        } else {
            let breaks = if did_read_content {
                1 + empty_lines
            } else {
                empty_lines
            };
            push_newlines(&mut text, breaks);
        }

        did_read_content = true;
        detected_indent = true;
        empty_lines = 0;
        let capture_start = state.position;

        while !is_eol(ch) && ch != '\0' {
            ch = state.advance();
        }

        state.capture_segment(&mut text, capture_start, state.position, false)?;
    }

    finish(state, text);
    Ok(true)
}

fn push_newlines(text: &mut String, count: usize) {
    text.extend(std::iter::repeat('\n').take(count));
}
