//! Document and stream drivers.
//!
//! A stream is a sequence of documents, each optionally preceded by
//! `%YAML`/`%TAG` directives and a `---` marker and optionally closed by
//! `...`. Tag handles and anchors never leak from one document into the
//! next.

use std::mem;
use std::sync::LazyLock;

use regex::Regex;

use crate::composer::{compose_node, Context};
use crate::error::{ErrorKind, Result};
use crate::options::LoadOptions;
use crate::property::{TAG_HANDLE, TAG_URI};
use crate::state::{is_eol, is_white_space, is_ws_or_eol, State};
use crate::value::Value;

static YAML_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\.([0-9]+)$").expect("version pattern compiles")
});

fn yaml_directive(state: &mut State<'_>, args: &[String]) -> Result<()> {
    if state.version.is_some() {
        return Err(state.error(ErrorKind::DuplicateYamlDirective));
    }
    let [version] = args else {
        return Err(state.error(ErrorKind::YamlDirectiveArity));
    };

    let parsed = YAML_VERSION.captures(version).and_then(|caps| {
        let major: u64 = caps[1].parse().ok()?;
        let minor: u64 = caps[2].parse().ok()?;
        Some((major, minor))
    });
    let Some((major, minor)) = parsed else {
        return Err(state.error(ErrorKind::IllFormedYamlVersion));
    };
    if major != 1 {
        return Err(state.error(ErrorKind::UnacceptableYamlVersion));
    }

    state.version = Some(version.clone());
    state.check_line_breaks = minor < 2;
    if minor != 1 && minor != 2 {
        state.warn(ErrorKind::UnsupportedYamlVersion);
    }
    Ok(())
}

fn tag_directive(state: &mut State<'_>, args: &[String]) -> Result<()> {
    let [handle, prefix] = args else {
        return Err(state.error(ErrorKind::TagDirectiveArity));
    };
    if !TAG_HANDLE.is_match(handle) {
        return Err(state.error(ErrorKind::IllFormedTagHandle));
    }
    if state.tag_map.contains_key(handle) {
        return Err(state.error(ErrorKind::DuplicateTagHandle(handle.clone())));
    }
    if !TAG_URI.is_match(prefix) {
        return Err(state.error(ErrorKind::IllFormedTagPrefix));
    }
    state.tag_map.insert(handle.clone(), prefix.clone());
    Ok(())
}

/// Read one `%NAME arg...` line. The cursor is on the `%`.
fn read_directive(state: &mut State<'_>) -> Result<(String, Vec<String>)> {
    let mut ch = state.advance();
    let start = state.position;
    while ch != '\0' && !is_ws_or_eol(ch) {
        ch = state.advance();
    }
    let name = state.slice(start, state.position);
    if name.is_empty() {
        return Err(state.error(ErrorKind::EmptyDirectiveName));
    }

    let mut args = Vec::new();
    while ch != '\0' {
        while is_white_space(ch) {
            ch = state.advance();
        }
        if ch == '#' {
            while ch != '\0' && !is_eol(ch) {
                ch = state.advance();
            }
            break;
        }
        if is_eol(ch) {
            break;
        }
        let start = state.position;
        while ch != '\0' && !is_ws_or_eol(ch) {
            ch = state.advance();
        }
        args.push(state.slice(start, state.position));
    }

    if ch != '\0' {
        state.read_line_break()?;
    }
    Ok((name, args))
}

/// Read directives, the root node and the end marker of one document.
pub(crate) fn read_document(state: &mut State<'_>) -> Result<()> {
    let document_start = state.position;
    let mut has_directives = false;

    state.version = None;
    state.check_line_breaks = state.legacy;
    state.tag_map.clear();
    state.anchor_map.clear();

    while state.ch() != '\0' {
        state.skip_separation_space(true, -1)?;
        if state.line_indent > 0 || state.ch() != '%' {
            break;
        }
        has_directives = true;

        let (name, args) = read_directive(state)?;
        tracing::debug!(target: "yaml.loader", directive = %name, ?args, "directive");
        match name.as_str() {
            "YAML" => yaml_directive(state, &args)?,
            "TAG" => tag_directive(state, &args)?,
            _ => state.warn(ErrorKind::UnknownDirective(name)),
        }
    }

    state.skip_separation_space(true, -1)?;

    if state.line_indent == 0
        && state.ch() == '-'
        && state.char_at(state.position + 1) == '-'
        && state.char_at(state.position + 2) == '-'
    {
        state.position += 3;
        state.skip_separation_space(true, -1)?;
    } else if has_directives {
        return Err(state.error(ErrorKind::DirectivesEndExpected));
    }

    let root_indent = state.line_indent - 1;
    compose_node(state, root_indent, Context::BlockOut, false, true)?;
    state.skip_separation_space(true, -1)?;

    if state.check_line_breaks && state.has_non_ascii_line_breaks(document_start, state.position)
    {
        state.warn(ErrorKind::NonAsciiLineBreaks);
    }

    let root = mem::take(&mut state.result);
    state.documents.push(root);

    if state.position == state.line_start && state.test_document_separator() {
        if state.ch() == '.' {
            state.position += 3;
            state.skip_separation_space(true, -1)?;
        }
        return Ok(());
    }

    if state.position + 1 < state.length {
        return Err(state.error(ErrorKind::EndOfStreamExpected));
    }
    Ok(())
}

/// Strip a BOM and make sure the text ends with a line break.
fn normalize(input: &str) -> String {
    let mut text = input.to_string();
    if !text.is_empty() {
        if !text.ends_with('\n') && !text.ends_with('\r') {
            text.push('\n');
        }
        if let Some(rest) = text.strip_prefix('\u{FEFF}') {
            text = rest.to_string();
        }
    }
    text
}

/// Load every document of the stream.
pub(crate) fn load_documents(input: &str, options: LoadOptions<'_>) -> Result<Vec<Value>> {
    let text = normalize(input);
    let null_at = text.chars().position(|c| c == '\0');
    let mut state = State::new(text, options);

    if let Some(position) = null_at {
        state.position = position;
        return Err(state.error(ErrorKind::NullByte));
    }

    while state.ch() == ' ' {
        state.line_indent += 1;
        state.position += 1;
    }

    while state.position + 1 < state.length {
        tracing::debug!(
            target: "yaml.loader",
            document = state.documents.len(),
            line = state.line + 1,
            "reading document"
        );
        read_document(&mut state)?;
    }

    Ok(state.documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use std::cell::RefCell;

    fn load(text: &str) -> Result<Vec<Value>> {
        load_documents(text, LoadOptions::new())
    }

    fn warnings_of(text: &str, legacy: bool) -> Vec<ErrorKind> {
        let warnings = RefCell::new(Vec::new());
        let options = LoadOptions::new()
            .legacy(legacy)
            .on_warning(|w: &LoadError| warnings.borrow_mut().push(w.kind().clone()));
        load_documents(text, options).unwrap();
        warnings.into_inner()
    }

    #[test]
    fn test_empty_streams() {
        assert!(load("").unwrap().is_empty());
        assert!(load("   ").unwrap().is_empty());
        assert!(load("\n").unwrap().is_empty());
        assert_eq!(load("# only a comment").unwrap(), vec![Value::Null]);
    }

    #[test]
    fn test_bom_and_missing_newline() {
        assert_eq!(load("\u{FEFF}a").unwrap(), vec![Value::from("a")]);
    }

    #[test]
    fn test_multiple_documents() {
        let docs = load("a\n---\nb\n...\n---\nc\n").unwrap();
        assert_eq!(docs, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    }

    #[test]
    fn test_null_byte() {
        let err = load("a: 1\0").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NullByte);
        assert_eq!(err.mark().unwrap().position(), 4);
    }

    #[test]
    fn test_directives() {
        let docs = load("%YAML 1.1\n%TAG !e! tag:example.com,2000:\n--- !e!x\n").unwrap_err();
        assert_eq!(
            docs.kind(),
            &ErrorKind::UnknownTag("tag:example.com,2000:x".to_string())
        );
        assert_eq!(
            load("%YAML 1.1\n%YAML 1.1\n---\n").unwrap_err().kind(),
            &ErrorKind::DuplicateYamlDirective
        );
        assert_eq!(
            load("%YAML 2.0\n---\n").unwrap_err().kind(),
            &ErrorKind::UnacceptableYamlVersion
        );
        assert_eq!(
            load("%YAML 1\n---\n").unwrap_err().kind(),
            &ErrorKind::IllFormedYamlVersion
        );
        assert_eq!(
            load("%TAG !\n---\n").unwrap_err().kind(),
            &ErrorKind::TagDirectiveArity
        );
        assert_eq!(
            load("%YAML 1.1\nfoo\n").unwrap_err().kind(),
            &ErrorKind::DirectivesEndExpected
        );
        assert_eq!(
            load("%TAG !e! a:\n%TAG !e! b:\n---\n").unwrap_err().kind(),
            &ErrorKind::DuplicateTagHandle("!e!".to_string())
        );
        assert_eq!(
            load("%TAG e! x:\n---\n").unwrap_err().kind(),
            &ErrorKind::IllFormedTagHandle
        );
        assert_eq!(
            load("%TAG !e! ,x\n---\n").unwrap_err().kind(),
            &ErrorKind::IllFormedTagPrefix
        );
    }

    #[test]
    fn test_tag_handles_reset_per_document() {
        let err = load("%TAG !e! tag:yaml.org,2002:\n--- !e!str a\n--- !e!str b\n").unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UndeclaredTagHandle("!e!".to_string())
        );
        let err = load("--- &a 1\n--- *a\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnidentifiedAlias("a".to_string()));
    }

    #[test]
    fn test_directive_warnings() {
        assert_eq!(
            warnings_of("%FOO bar\n--- x\n", false),
            vec![ErrorKind::UnknownDirective("FOO".to_string())]
        );
        assert_eq!(
            warnings_of("%YAML 1.3\n--- x\n", false),
            vec![ErrorKind::UnsupportedYamlVersion]
        );
    }

    #[test]
    fn test_non_ascii_line_breaks() {
        let text = "a\u{2028}b\n";
        assert!(warnings_of(text, false).is_empty());
        assert_eq!(
            warnings_of(text, true),
            vec![ErrorKind::NonAsciiLineBreaks]
        );
        assert_eq!(
            warnings_of(&format!("%YAML 1.1\n---\n{}", text), false),
            vec![ErrorKind::NonAsciiLineBreaks]
        );
        assert!(warnings_of(&format!("%YAML 1.2\n---\n{}", text), true).is_empty());
    }

    #[test]
    fn test_trailing_content() {
        let err = load("[a]\nb\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EndOfStreamExpected);
        assert_eq!(err.mark().unwrap().line(), 1);
    }
}
