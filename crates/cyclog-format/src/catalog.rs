//! Format catalogs.
//!
//! A catalog maps each [`FormatId`] a producer emits to the printf format
//! string and source location of the log statement. It is stored as JSON:
//!
//! ```json
//! {
//!   "formats": [
//!     { "id": 0, "format": "x=%d", "file": "main.cc", "line": 12, "level": "NOTICE" }
//!   ]
//! }
//! ```
//!
//! `file`, `line` and `level` are optional.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use cyclog_core::FormatId;
use cyclog_replay::DecoderRegistry;

use crate::decoder::CatalogDecoder;
use crate::error::CatalogError;
use crate::format_string::FormatString;

/// One log statement as it appears in the catalog file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Format id the producer writes for this statement.
    pub id: u32,
    /// printf format string.
    pub format: String,
    /// Source file of the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Source line of the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Severity name, e.g. `NOTICE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl CatalogEntry {
    /// `file:line LEVEL: ` for entries that carry a location, else empty.
    pub fn origin_prefix(&self) -> String {
        let mut prefix = String::new();
        if let Some(file) = &self.file {
            prefix.push_str(file);
            if let Some(line) = self.line {
                prefix.push(':');
                prefix.push_str(&line.to_string());
            }
        }
        if let Some(level) = &self.level {
            if !prefix.is_empty() {
                prefix.push(' ');
            }
            prefix.push_str(level);
        }
        if !prefix.is_empty() {
            prefix.push_str(": ");
        }
        prefix
    }
}

/// Top-level shape of a catalog file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    /// All statements, in any order.
    pub formats: Vec<CatalogEntry>,
}

/// A validated catalog with every format string parsed.
#[derive(Clone, Debug, Default)]
pub struct FormatCatalog {
    entries: IndexMap<FormatId, (CatalogEntry, FormatString)>,
}

impl FormatCatalog {
    /// Build from deserialized entries.
    ///
    /// Fails on duplicate ids and on format strings the decoders cannot
    /// reproduce.
    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut entries = IndexMap::with_capacity(file.formats.len());
        for entry in file.formats {
            let id = FormatId(entry.id);
            if entries.contains_key(&id) {
                return Err(CatalogError::DuplicateId(id));
            }
            let parsed = FormatString::parse(&entry.format)
                .map_err(|source| CatalogError::BadFormat { id, source })?;
            entries.insert(id, (entry, parsed));
        }
        tracing::debug!(formats = entries.len(), "format catalog loaded");
        Ok(Self { entries })
    }

    /// Parse a catalog from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::from_file(serde_json::from_str(json)?)
    }

    /// Read and parse a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Look up an entry and its parsed format.
    pub fn get(&self, id: FormatId) -> Option<(&CatalogEntry, &FormatString)> {
        self.entries.get(&id).map(|(e, f)| (e, f))
    }

    /// Number of formats.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = FormatId> + '_ {
        self.entries.keys().copied()
    }

    /// Register one [`CatalogDecoder`] per entry.
    ///
    /// With `origin`, each rendered message is prefixed by its source
    /// location and level.
    pub fn into_registry(self, origin: bool) -> DecoderRegistry {
        let mut registry = DecoderRegistry::new();
        for (id, (entry, format)) in self.entries {
            let prefix = if origin { entry.origin_prefix() } else { String::new() };
            registry.register(id, CatalogDecoder::new(format).with_prefix(prefix));
        }
        registry
    }
}
