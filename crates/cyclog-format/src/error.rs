//! Error types for catalog loading, format parsing, and argument packing.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use cyclog_core::FormatId;

/// A format string uses syntax the decoders cannot reproduce.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FormatParseError {
    /// The string ends in the middle of a conversion.
    #[error("incomplete conversion starting at byte {0}")]
    Incomplete(usize),
    /// The conversion character is not supported.
    #[error("unsupported conversion '%{conv}' at byte {pos}")]
    Unsupported {
        /// The conversion character.
        conv: char,
        /// Byte offset of the `%`.
        pos: usize,
    },
    /// Width or precision taken from the argument list.
    #[error("dynamic width or precision ('*') at byte {0} is not supported")]
    DynamicWidth(usize),
}

/// Failure to load a format catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {}", path.display())]
    Read {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The catalog is not valid JSON or does not match the schema.
    #[error("invalid catalog JSON")]
    Json(#[from] serde_json::Error),
    /// Two entries share an id.
    #[error("duplicate format id {0}")]
    DuplicateId(FormatId),
    /// An entry's format string could not be parsed.
    #[error("format id {id} has an unsupported format string")]
    BadFormat {
        /// The entry's id.
        id: FormatId,
        /// What was wrong with its format string.
        #[source]
        source: FormatParseError,
    },
}

/// Arguments do not fit the format they are being packed for.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PackError {
    /// Wrong number of arguments.
    #[error("format takes {expected} arguments, got {got}")]
    ArgCount {
        /// Arguments the format consumes.
        expected: usize,
        /// Arguments supplied.
        got: usize,
    },
    /// An argument's type does not match its conversion.
    #[error("argument {index} does not match conversion '%{conv}'")]
    ArgType {
        /// 0-based argument index.
        index: usize,
        /// The conversion character.
        conv: char,
    },
    /// A string argument contains a NUL byte and would be truncated.
    #[error("string argument {index} contains a NUL byte")]
    InteriorNul {
        /// 0-based argument index.
        index: usize,
    },
}
