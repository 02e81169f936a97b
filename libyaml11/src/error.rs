//! Error types for YAML loading.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::schema::Kind;

/// Result type for YAML loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Characters that end the line shown in a snippet.
const SNIPPET_STOP: &[char] = &['\0', '\r', '\n', '\u{85}', '\u{2028}', '\u{2029}'];

/// A position in the source text, attached to every error and warning.
///
/// Offsets count characters, not bytes. `line` and `column` are zero-based;
/// the [`Display`](fmt::Display) form is one-based for humans.
#[derive(Clone, PartialEq, Eq)]
pub struct Mark {
    name: Option<String>,
    buffer: Arc<str>,
    position: usize,
    line: usize,
    column: usize,
}

impl Mark {
    /// Create a new mark.
    pub fn new(
        name: Option<String>,
        buffer: Arc<str>,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            name,
            buffer,
            position,
            line,
            column,
        }
    }

    /// The filename given in the load options, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The full source text the mark points into.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Absolute character offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Zero-based line.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Zero-based column.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Render the offending line with a caret under the marked column.
    ///
    /// Long lines are elided with ` ... ` on either side so the result stays
    /// within roughly `max_length` characters.
    pub fn snippet(&self, indent: usize, max_length: usize) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let chars: Vec<char> = self.buffer.chars().collect();
        let position = self.position.min(chars.len());
        let half = (max_length / 2).saturating_sub(1);

        let mut head = "";
        let mut start = position;
        while start > 0 && !SNIPPET_STOP.contains(&chars[start - 1]) {
            start -= 1;
            if position - start > half {
                head = " ... ";
                start += 5;
                break;
            }
        }

        let mut tail = "";
        let mut end = position;
        while end < chars.len() && !SNIPPET_STOP.contains(&chars[end]) {
            end += 1;
            if end - position > half {
                tail = " ... ";
                end -= 5;
                break;
            }
        }

        let line: String = chars[start..end.max(start)].iter().collect();
        Some(format!(
            "{}{}{}{}\n{}^",
            " ".repeat(indent),
            head,
            line,
            tail,
            " ".repeat(indent + position - start + head.len()),
        ))
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mark")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("line", &self.line)
            .field("column", &self.column)
            .finish()
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "in \"{}\" ", name)?;
        }
        write!(f, "at line {}, column {}", self.line + 1, self.column + 1)?;
        if let Some(snippet) = self.snippet(4, 75) {
            write!(f, ":\n{}", snippet)?;
        }
        Ok(())
    }
}

/// What went wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // Stream and document structure.
    /// A NUL character appeared in the input.
    #[error("null byte is not allowed in input")]
    NullByte,

    /// `load` found more than one document.
    #[error("expected a single document in the stream, but found more")]
    MultipleDocuments,

    /// Directives were not followed by `---`.
    #[error("directives end mark is expected")]
    DirectivesEndExpected,

    /// Content after a document that is neither `---`/`...` nor the end.
    #[error("end of the stream or a document separator is expected")]
    EndOfStreamExpected,

    /// A line break was required here.
    #[error("a line break is expected")]
    LineBreakExpected,

    // Directives.
    /// `%` with no name.
    #[error("directive name must not be less than one character in length")]
    EmptyDirectiveName,

    /// A second `%YAML` directive in one document.
    #[error("duplication of %YAML directive")]
    DuplicateYamlDirective,

    /// `%YAML` with the wrong number of arguments.
    #[error("YAML directive accepts exactly one argument")]
    YamlDirectiveArity,

    /// `%YAML` argument is not `major.minor`.
    #[error("ill-formed argument of the YAML directive")]
    IllFormedYamlVersion,

    /// `%YAML` major version other than 1.
    #[error("unacceptable YAML version of the document")]
    UnacceptableYamlVersion,

    /// `%TAG` with the wrong number of arguments.
    #[error("TAG directive accepts exactly two arguments")]
    TagDirectiveArity,

    /// `%TAG` handle fails the handle grammar.
    #[error("ill-formed tag handle (first argument) of the TAG directive")]
    IllFormedTagHandle,

    /// `%TAG` handle already declared in this document.
    #[error("there is a previously declared suffix for \"{0}\" tag handle")]
    DuplicateTagHandle(String),

    /// `%TAG` prefix fails the URI grammar.
    #[error("ill-formed tag prefix (second argument) of the TAG directive")]
    IllFormedTagPrefix,

    // Node properties.
    /// Two tags on one node.
    #[error("duplication of a tag property")]
    DuplicateTag,

    /// Two anchors on one node.
    #[error("duplication of an anchor property")]
    DuplicateAnchor,

    /// `!<...` never closed.
    #[error("unexpected end of the stream within a verbatim tag")]
    UnterminatedVerbatimTag,

    /// `!name!` handle with illegal characters.
    #[error("named tag handle cannot contain such characters")]
    IllFormedNamedHandle,

    /// A third `!` in a tag.
    #[error("tag suffix cannot contain exclamation marks")]
    ExclamationInTagSuffix,

    /// `,[]{}` in a tag suffix.
    #[error("tag suffix cannot contain flow indicator characters")]
    FlowIndicatorInTagSuffix,

    /// Tag name fails the URI grammar.
    #[error("tag name cannot contain such characters: {0}")]
    IllFormedTagName(String),

    /// Named handle without a `%TAG` declaration.
    #[error("undeclared tag handle \"{0}\"")]
    UndeclaredTagHandle(String),

    /// `&` with no name.
    #[error("name of an anchor node must contain at least one character")]
    EmptyAnchorName,

    /// `*` with no name.
    #[error("name of an alias node must contain at least one character")]
    EmptyAliasName,

    /// `*name` with no matching anchor.
    #[error("unidentified alias \"{0}\"")]
    UnidentifiedAlias(String),

    /// Alias carrying a tag or anchor.
    #[error("alias node should not have any properties")]
    AliasWithProperties,

    // Scalars.
    /// Document marker inside a quoted scalar.
    #[error("unexpected end of the document within a {0} quoted scalar")]
    DocumentEndInQuotedScalar(&'static str),

    /// Input ended inside a quoted scalar.
    #[error("unexpected end of the stream within a {0} quoted scalar")]
    StreamEndInQuotedScalar(&'static str),

    /// Non-hex digit inside `\x`, `\u` or `\U`.
    #[error("expected hexadecimal character")]
    ExpectedHexCharacter,

    /// Unknown `\` escape.
    #[error("unknown escape sequence")]
    UnknownEscape,

    /// Escape naming a surrogate or a value past U+10FFFF.
    #[error("invalid Unicode code point U+{0:04X}")]
    InvalidCodePoint(u32),

    /// Control character inside a quoted scalar in JSON mode.
    #[error("expected valid JSON character")]
    InvalidJsonCharacter,

    /// Control character in scalar content.
    #[error("the stream contains non-printable characters")]
    NonPrintable,

    /// Two chomping indicators in a block scalar header.
    #[error("repeat of a chomping mode identifier")]
    RepeatedChomping,

    /// Indentation indicator `0`.
    #[error("bad explicit indentation width of a block scalar; it cannot be less than one")]
    ZeroIndentationWidth,

    /// Two indentation indicators in a block scalar header.
    #[error("repeat of an indentation width identifier")]
    RepeatedIndentationWidth,

    // Collections.
    /// Nodes nested past the composer's limit.
    #[error("maximum nesting depth exceeded")]
    NestingTooDeep,

    /// Sequence entry at the wrong indentation.
    #[error("bad indentation of a sequence entry")]
    BadSequenceIndentation,

    /// Mapping entry at the wrong indentation.
    #[error("bad indentation of a mapping entry")]
    BadMappingIndentation,

    /// `:` without a preceding `?` key.
    #[error("incomplete explicit mapping pair; a key node is missed; or followed by a non-tabulated empty line")]
    IncompleteExplicitPair,

    /// `key:value` without a space in a block mapping.
    #[error("a whitespace character is expected after the key-value separator within a block mapping")]
    MissingWhitespaceAfterColon,

    /// A key with no `:` after it.
    #[error("can not read an implicit mapping pair; a colon is missed")]
    MissingColon,

    /// Implicit key spanning lines.
    #[error("can not read a block mapping entry; a multiline key may not be an implicit key")]
    MultilineImplicitKey,

    /// Flow entries not separated by `,`.
    #[error("missed comma between flow collection entries")]
    MissedComma,

    /// Input ended inside `[...]`/`{...}`.
    #[error("unexpected end of the stream within a flow collection")]
    UnterminatedFlowCollection,

    /// Sequence nested inside a sequence key.
    #[error("nested arrays are not supported inside keys")]
    NestedArrayKey,

    /// Mapping used as a key.
    #[error("mappings are not supported as keys")]
    MappingKey,

    /// Same key twice in one mapping.
    #[error("duplicated mapping key")]
    DuplicateKey,

    /// `<<` value that is not a mapping or a sequence of mappings.
    #[error("cannot merge mappings; the provided source object is unacceptable")]
    UnacceptableMergeSource,

    // Tag resolution.
    /// Explicit tag with no registered type.
    #[error("unknown tag !<{0}>")]
    UnknownTag(String),

    /// Explicit tag registered for another node kind.
    #[error("unacceptable node kind for !<{tag}> tag; it should be \"{expected}\", not \"{found}\"")]
    UnacceptableKind {
        tag: String,
        expected: Kind,
        found: Kind,
    },

    /// The type's resolver rejected the node.
    #[error("cannot resolve a node with !<{0}> explicit tag")]
    CannotResolve(String),

    // Warnings.
    /// `%FOO` directive.
    #[error("unknown document directive \"{0}\"")]
    UnknownDirective(String),

    /// `%YAML 1.x` with x other than 1 or 2.
    #[error("unsupported YAML version of the document")]
    UnsupportedYamlVersion,

    /// Continuation line indented less than its node.
    #[error("deficient indentation")]
    DeficientIndentation,

    /// NEL, LS or PS in a document read with line-break checking on.
    #[error("non-ASCII line breaks are interpreted as content")]
    NonAsciiLineBreaks,
}

/// Error (or warning) raised while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    kind: ErrorKind,
    mark: Option<Mark>,
}

impl LoadError {
    /// Create an error without a location.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, mark: None }
    }

    /// Attach a location.
    pub fn with_mark(self, mark: Mark) -> Self {
        Self {
            kind: self.kind,
            mark: Some(mark),
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Where it went wrong.
    pub fn mark(&self) -> Option<&Mark> {
        self.mark.as_ref()
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mark {
            Some(mark) => write!(f, "{} {}", self.kind, mark),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<ErrorKind> for LoadError {
    fn from(kind: ErrorKind) -> Self {
        LoadError::new(kind)
    }
}
