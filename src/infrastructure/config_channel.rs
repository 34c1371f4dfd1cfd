//! Configuration documents crossing the host/guest boundary
//!
//! Documents are YAML. `serde_yaml` keeps mapping keys in document order
//! and round-trips strings, booleans, numbers, sequences and nested
//! mappings; comments are not preserved.

use crate::step::{ExecutionId, StepError};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Key under which a document carries its execution identifier
pub const EXECUTION_ID_KEY: &str = "execution_id";

/// Where a configuration document is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// YAML text supplied directly
    Inline(String),
    /// A file on disk
    Path(PathBuf),
    /// The process's standard input
    Stdin,
}

impl ConfigSource {
    /// Picks a source in priority order: inline text, explicit path,
    /// standard input when no positional argument was given, otherwise the
    /// positional path
    #[must_use]
    pub fn resolve(
        inline: Option<String>,
        path: Option<PathBuf>,
        positional: Option<PathBuf>,
    ) -> Self {
        match (inline, path, positional) {
            (Some(text), _, _) => Self::Inline(text),
            (None, Some(path), _) => Self::Path(path),
            (None, None, None) => Self::Stdin,
            (None, None, Some(path)) => Self::Path(path),
        }
    }
}

/// Where a configuration document is written to
pub enum ConfigSink<'a> {
    /// A file, fully overwritten
    Path(&'a Path),
    /// An open stream, flushed but left open for the caller
    Stream(&'a mut dyn Write),
}

/// Reads a configuration document
///
/// When `default_id` is given and the document has no `execution_id`, the
/// default is inserted. An existing value is never overwritten.
///
/// # Errors
///
/// Returns [`StepError::Io`] if the source cannot be read and
/// [`StepError::Document`] if it is not a YAML mapping.
pub fn read(source: &ConfigSource, default_id: Option<&ExecutionId>) -> Result<Value, StepError> {
    match source {
        ConfigSource::Inline(text) => parse(text, default_id),
        ConfigSource::Path(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                StepError::Io(format!("cannot read config '{}': {e}", path.display()))
            })?;
            parse(&text, default_id)
        }
        ConfigSource::Stdin => read_from(io::stdin().lock(), default_id),
    }
}

/// Reads a configuration document from an arbitrary reader
///
/// # Errors
///
/// See [`read`].
pub fn read_from(mut reader: impl Read, default_id: Option<&ExecutionId>) -> Result<Value, StepError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse(&text, default_id)
}

/// Parses YAML text into a configuration document
///
/// # Errors
///
/// See [`read`].
pub fn parse(text: &str, default_id: Option<&ExecutionId>) -> Result<Value, StepError> {
    let mut document: Value = serde_yaml::from_str(text)?;
    if document.is_null() {
        document = Value::Mapping(Mapping::new());
    }

    let Value::Mapping(ref mut mapping) = document else {
        return Err(StepError::Document(
            "configuration document must be a mapping".to_string(),
        ));
    };

    if let Some(id) = default_id {
        let key = Value::String(EXECUTION_ID_KEY.to_string());
        if !mapping.contains_key(&key) {
            mapping.insert(key, Value::String(id.to_string()));
        }
    }

    Ok(document)
}

/// Serializes a configuration value to a sink
///
/// # Errors
///
/// Returns [`StepError::Document`] if the value cannot be serialized and
/// [`StepError::Io`] if the sink cannot be written.
pub fn write<T: Serialize + ?Sized>(value: &T, sink: ConfigSink<'_>) -> Result<(), StepError> {
    let text = serde_yaml::to_string(value)?;
    match sink {
        ConfigSink::Path(path) => fs::write(path, text).map_err(|e| {
            StepError::Io(format!("cannot write config '{}': {e}", path.display()))
        }),
        ConfigSink::Stream(stream) => {
            stream.write_all(text.as_bytes())?;
            stream.flush()?;
            Ok(())
        }
    }
}
