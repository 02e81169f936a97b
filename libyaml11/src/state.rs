//! Parse state shared by every reader, plus the low-level cursor routines.
//!
//! The whole stream lives in one `Vec<char>` terminated by a `'\0'`
//! sentinel, so lookahead past the end reads `'\0'` instead of panicking.
//! Readers take `&mut State` and move the cursor; backtracking goes through
//! [`Checkpoint`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ErrorKind, LoadError, Mark, Result};
use crate::options::{ListenerFn, LoadOptions, NodeEvent, NodePhase, WarningFn};
use crate::schema::{Kind, Schema};
use crate::value::Value;

pub(crate) fn is_eol(c: char) -> bool {
    c == '\n' || c == '\r'
}

pub(crate) fn is_white_space(c: char) -> bool {
    c == '\t' || c == ' '
}

pub(crate) fn is_ws_or_eol(c: char) -> bool {
    is_white_space(c) || is_eol(c)
}

pub(crate) fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

fn is_non_printable(c: char) -> bool {
    matches!(c,
        '\u{00}'..='\u{08}'
        | '\u{0B}'
        | '\u{0C}'
        | '\u{0E}'..='\u{1F}'
        | '\u{7F}'..='\u{84}'
        | '\u{86}'..='\u{9F}'
        | '\u{FFFE}'
        | '\u{FFFF}')
}

fn is_json_character(c: char) -> bool {
    c == '\t' || c >= '\u{20}'
}

/// Saved cursor, for readers that look ahead and then give up.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    position: usize,
    line: usize,
    line_start: usize,
    line_indent: isize,
}

pub(crate) struct State<'a> {
    input: Vec<char>,
    source: Arc<str>,
    filename: Option<String>,
    pub(crate) schema: Schema,
    on_warning: Option<WarningFn<'a>>,
    listener: Option<ListenerFn<'a>>,
    pub(crate) legacy: bool,
    pub(crate) json: bool,

    /// Number of characters, excluding the sentinel.
    pub(crate) length: usize,
    pub(crate) position: usize,
    pub(crate) line: usize,
    pub(crate) line_start: usize,
    /// Leading spaces of the current line; signed so it compares against a
    /// root parent indentation of -1.
    pub(crate) line_indent: isize,

    pub(crate) documents: Vec<Value>,
    /// Nodes currently being composed.
    pub(crate) depth: usize,

    // Per document.
    pub(crate) version: Option<String>,
    pub(crate) check_line_breaks: bool,
    pub(crate) tag_map: HashMap<String, String>,
    pub(crate) anchor_map: HashMap<String, Value>,

    // Per node.
    pub(crate) tag: Option<String>,
    pub(crate) anchor: Option<String>,
    pub(crate) kind: Option<Kind>,
    pub(crate) result: Value,
}

impl<'a> State<'a> {
    /// `text` must already be normalized; the sentinel is appended here.
    pub(crate) fn new(text: String, options: LoadOptions<'a>) -> Self {
        let mut input: Vec<char> = text.chars().collect();
        let length = input.len();
        input.push('\0');
        Self {
            input,
            source: Arc::from(text),
            filename: options.filename,
            schema: options.schema,
            on_warning: options.on_warning,
            listener: options.listener,
            legacy: options.legacy,
            json: options.json,
            length,
            position: 0,
            line: 0,
            line_start: 0,
            line_indent: 0,
            documents: Vec::new(),
            depth: 0,
            version: None,
            check_line_breaks: false,
            tag_map: HashMap::new(),
            anchor_map: HashMap::new(),
            tag: None,
            anchor: None,
            kind: None,
            result: Value::Null,
        }
    }

    /// Character at `index`, or `'\0'` past the end.
    pub(crate) fn char_at(&self, index: usize) -> char {
        self.input.get(index).copied().unwrap_or('\0')
    }

    /// Character under the cursor.
    pub(crate) fn ch(&self) -> char {
        self.char_at(self.position)
    }

    /// Move one character forward and return the new current character.
    pub(crate) fn advance(&mut self) -> char {
        self.position += 1;
        self.ch()
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> String {
        self.input[start..end].iter().collect()
    }

    pub(crate) fn column(&self) -> usize {
        self.position.saturating_sub(self.line_start)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            position: self.position,
            line: self.line,
            line_start: self.line_start,
            line_indent: self.line_indent,
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.position;
        self.line = checkpoint.line;
        self.line_start = checkpoint.line_start;
        self.line_indent = checkpoint.line_indent;
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark::new(
            self.filename.clone(),
            self.source.clone(),
            self.position,
            self.line,
            self.column(),
        )
    }

    /// An error located at the cursor.
    pub(crate) fn error(&self, kind: ErrorKind) -> LoadError {
        LoadError::new(kind).with_mark(self.mark())
    }

    /// Report a non-fatal problem at the cursor.
    pub(crate) fn warn(&mut self, kind: ErrorKind) {
        let warning = self.error(kind);
        match self.on_warning.as_mut() {
            Some(callback) => callback(&warning),
            None => tracing::warn!(
                target: "yaml.loader",
                line = self.line + 1,
                column = self.column() + 1,
                "{}",
                warning.kind()
            ),
        }
    }

    /// Fire the listener, if any.
    pub(crate) fn notify(&mut self, phase: NodePhase) {
        if let Some(listener) = self.listener.as_mut() {
            let event = NodeEvent {
                phase,
                position: self.position,
                line: self.line,
                column: self.position.saturating_sub(self.line_start),
                tag: self.tag.as_deref(),
                anchor: self.anchor.as_deref(),
                kind: self.kind,
                result: &self.result,
            };
            listener(&event);
        }
    }

    /// Whether `start..end` contains NEL, LS or PS.
    pub(crate) fn has_non_ascii_line_breaks(&self, start: usize, end: usize) -> bool {
        self.input[start..end]
            .iter()
            .any(|c| matches!(c, '\u{85}' | '\u{2028}' | '\u{2029}'))
    }

    /// Consume `\n`, `\r\n` or `\r` and start a new line.
    pub(crate) fn read_line_break(&mut self) -> Result<()> {
        match self.ch() {
            '\n' => self.position += 1,
            '\r' => {
                self.position += 1;
                if self.ch() == '\n' {
                    self.position += 1;
                }
            }
            _ => return Err(self.error(ErrorKind::LineBreakExpected)),
        }
        self.line += 1;
        self.line_start = self.position;
        Ok(())
    }

    /// Skip blanks, line breaks and (optionally) comments, tracking the
    /// indentation of the last line reached. Returns the number of line
    /// breaks crossed. A non-negative `check_indent` warns when a new line is
    /// indented less than it.
    pub(crate) fn skip_separation_space(
        &mut self,
        allow_comments: bool,
        check_indent: isize,
    ) -> Result<usize> {
        let mut line_breaks = 0;
        let mut ch = self.ch();

        while ch != '\0' {
            while is_white_space(ch) {
                ch = self.advance();
            }

            if allow_comments && ch == '#' {
                loop {
                    ch = self.advance();
                    if ch == '\n' || ch == '\r' || ch == '\0' {
                        break;
                    }
                }
            }

            if !is_eol(ch) {
                break;
            }
            self.read_line_break()?;
            ch = self.ch();
            line_breaks += 1;
            self.line_indent = 0;
            while ch == ' ' {
                self.line_indent += 1;
                ch = self.advance();
            }
        }

        if check_indent != -1 && line_breaks != 0 && self.line_indent < check_indent {
            self.warn(ErrorKind::DeficientIndentation);
        }
        Ok(line_breaks)
    }

    /// `---` or `...` followed by a blank, a line break or the end.
    pub(crate) fn test_document_separator(&self) -> bool {
        let ch = self.ch();
        if (ch == '-' || ch == '.')
            && ch == self.char_at(self.position + 1)
            && ch == self.char_at(self.position + 2)
        {
            let after = self.char_at(self.position + 3);
            return after == '\0' || is_ws_or_eol(after);
        }
        false
    }

    /// Append `start..end` to `out`, rejecting characters the scalar style
    /// does not allow.
    pub(crate) fn capture_segment(
        &self,
        out: &mut String,
        start: usize,
        end: usize,
        check_json: bool,
    ) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        let segment = &self.input[start..end];
        if check_json {
            if !segment.iter().all(|&c| is_json_character(c)) {
                return Err(self.error(ErrorKind::InvalidJsonCharacter));
            }
        } else if segment.iter().any(|&c| is_non_printable(c)) {
            return Err(self.error(ErrorKind::NonPrintable));
        }
        out.extend(segment);
        Ok(())
    }
}

/// One line break folds into a space; `n` breaks keep `n - 1` newlines.
pub(crate) fn write_folded_lines(out: &mut String, count: usize) {
    if count == 1 {
        out.push(' ');
    } else if count > 1 {
        out.extend(std::iter::repeat('\n').take(count - 1));
    }
}
