//! Core types and traits for the cyclog binary log replay engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! pieces shared between the replay engine and the format decoders plugged
//! into it: the format identifier, the decode error kinds, and the
//! [`ByteSource`] / [`DecodeRoutine`] traits that form the dispatch contract.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;

pub use error::DecodeError;
pub use id::FormatId;
pub use traits::{ByteSource, DecodeRoutine};
