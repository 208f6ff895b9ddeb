//! Catalog-driven printf-style payload decoders for cyclog.
//!
//! A producer identifies each log statement by a [`FormatId`] and records
//! only its dynamic arguments. This crate turns a catalog of the original
//! format strings into [`DecodeRoutine`]s that unpack those arguments and
//! render the message, so a stream can be replayed without generated code.
//!
//! # Payload layout
//!
//! ```text
//! [nibbles: ceil(n/2) bytes] [packed non-string args] [str0 \0] [str1 \0] ...
//! ```
//!
//! `n` is the number of non-string arguments. Each nibble (low half first)
//! gives the packed width of one argument; see [`pack`] for the encoding.
//!
//! [`FormatId`]: cyclog_core::FormatId
//! [`DecodeRoutine`]: cyclog_core::DecodeRoutine

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod decoder;
pub mod error;
pub mod format_string;
pub mod pack;
pub mod printf;

pub use catalog::{CatalogEntry, CatalogFile, FormatCatalog};
pub use decoder::CatalogDecoder;
pub use error::{CatalogError, FormatParseError, PackError};
pub use format_string::{ArgKind, Conversion, FormatString, Length, Piece};
pub use pack::{pack_args, unpack_args, ArgValue};
