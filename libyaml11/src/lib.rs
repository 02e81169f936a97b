//! YAML 1.1 loader.
//!
//! Turns YAML text into native [`Value`]s: directives, anchors and aliases,
//! tags, merge keys and multi-document streams, with the type set of the
//! YAML 1.1 type repository.
//!
//! # Loading Pipeline
//!
//! There is no separate token stream. A single cursor walks the text and
//! the readers build values directly:
//!
//! 1. **Stream driver**: Normalizes the input and splits it into documents,
//!    applying `%YAML` and `%TAG` directives.
//!
//! 2. **Node composer**: Reads a node's properties, dispatches to the scalar
//!    and collection readers by indentation and context, and resolves the
//!    node's tag against the [`Schema`].
//!
//! 3. **Readers**: Plain, quoted and block scalars; flow collections, block
//!    sequences and block mappings. Collections call back into the composer
//!    for their children.
//!
//! # Example
//!
//! ```
//! use libyaml11::load;
//!
//! let value = load("name: demo\nports: [80, 443]\n").unwrap().unwrap();
//! assert_eq!(value.get("name").unwrap().as_str(), Some("demo"));
//! assert_eq!(value.get("ports").unwrap().len(), 2);
//! ```

mod collection;
mod composer;
mod document;
mod error;
mod options;
mod property;
mod scalar;
mod schema;
mod state;
mod value;

pub use error::{ErrorKind, LoadError, Mark, Result};
pub use options::{LoadOptions, NodeEvent, NodePhase};
pub use schema::{Kind, Schema, Type, MERGE_TAG, YAML_TAG_PREFIX};
pub use value::{Mapping, Sequence, Value};

/// Load a stream holding at most one document.
///
/// Returns `None` for a stream without documents.
pub fn load(input: &str) -> Result<Option<Value>> {
    load_with_options(input, LoadOptions::new())
}

/// Load a stream holding at most one document, with options.
pub fn load_with_options(input: &str, options: LoadOptions<'_>) -> Result<Option<Value>> {
    let mut documents = document::load_documents(input, options)?;
    match documents.len() {
        0 => Ok(None),
        1 => Ok(documents.pop()),
        _ => Err(LoadError::new(ErrorKind::MultipleDocuments)),
    }
}

/// Load every document of a stream.
pub fn load_all(input: &str) -> Result<Vec<Value>> {
    load_all_with_options(input, LoadOptions::new())
}

pub fn load_all_with_options(input: &str, options: LoadOptions<'_>) -> Result<Vec<Value>> {
    document::load_documents(input, options)
}

/// Load every document of a stream and hand each to `callback` in order.
///
/// Nothing is passed to `callback` when loading fails.
pub fn load_all_each(
    input: &str,
    options: LoadOptions<'_>,
    mut callback: impl FnMut(Value),
) -> Result<()> {
    for document in document::load_documents(input, options)? {
        callback(document);
    }
    Ok(())
}
