//! Loader configuration.

use std::fmt;

use crate::error::LoadError;
use crate::schema::{Kind, Schema};
use crate::value::Value;

pub(crate) type WarningFn<'a> = Box<dyn FnMut(&LoadError) + 'a>;
pub(crate) type ListenerFn<'a> = Box<dyn FnMut(&NodeEvent<'_>) + 'a>;

/// Whether a node is about to be composed or has just been composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePhase {
    Open,
    Close,
}

/// Snapshot of the loader handed to a [`LoadOptions::listener`].
///
/// On `Open` the tag, anchor, kind and result describe the parent context
/// (they are reset right after); on `Close` they describe the node just read.
#[derive(Debug)]
pub struct NodeEvent<'a> {
    pub phase: NodePhase,
    /// Character offset of the cursor.
    pub position: usize,
    /// Zero-based line of the cursor.
    pub line: usize,
    /// Zero-based column of the cursor.
    pub column: usize,
    pub tag: Option<&'a str>,
    pub anchor: Option<&'a str>,
    pub kind: Option<Kind>,
    pub result: &'a Value,
}

/// Options accepted by the `*_with_options` loaders.
///
/// ```
/// use libyaml11::{load_with_options, LoadOptions, Schema};
///
/// let options = LoadOptions::new()
///     .filename("config.yaml")
///     .schema(Schema::failsafe());
/// let value = load_with_options("port: 80", options).unwrap().unwrap();
/// assert_eq!(value.get("port").unwrap().as_str(), Some("80"));
/// ```
pub struct LoadOptions<'a> {
    pub(crate) filename: Option<String>,
    pub(crate) schema: Schema,
    pub(crate) on_warning: Option<WarningFn<'a>>,
    pub(crate) listener: Option<ListenerFn<'a>>,
    pub(crate) legacy: bool,
    pub(crate) json: bool,
}

impl<'a> LoadOptions<'a> {
    /// Default schema, no callbacks, strict duplicate keys.
    pub fn new() -> Self {
        Self {
            filename: None,
            schema: Schema::default(),
            on_warning: None,
            listener: None,
            legacy: false,
            json: false,
        }
    }

    /// Name reported in error marks.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Types used for tag resolution.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Receive warnings instead of having them logged.
    pub fn on_warning(mut self, callback: impl FnMut(&LoadError) + 'a) -> Self {
        self.on_warning = Some(Box::new(callback));
        self
    }

    /// Observe every node as it is opened and closed.
    pub fn listener(mut self, callback: impl FnMut(&NodeEvent<'_>) + 'a) -> Self {
        self.listener = Some(Box::new(callback));
        self
    }

    /// Warn about NEL/LS/PS line breaks in documents without a `%YAML 1.2`
    /// directive.
    pub fn legacy(mut self, legacy: bool) -> Self {
        self.legacy = legacy;
        self
    }

    /// Let later duplicate keys override earlier ones and require JSON
    /// characters in quoted scalars.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for LoadOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoadOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("filename", &self.filename)
            .field("schema", &self.schema)
            .field("on_warning", &self.on_warning.is_some())
            .field("listener", &self.listener.is_some())
            .field("legacy", &self.legacy)
            .field("json", &self.json)
            .finish()
    }
}
