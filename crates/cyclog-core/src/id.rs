//! Strongly-typed identifiers.

use std::fmt;

/// Identifies the format-specific decoder that produced a log message.
///
/// Assigned by the producer's format catalog at build time. The same
/// catalog must be used on both sides: `FormatId(n)` always names the same
/// binary payload layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatId(pub u32);

impl FormatId {
    /// Reconstruct an id from its predecessor and a wire delta.
    ///
    /// Wrapping: an encoder reaches a smaller id by emitting the
    /// two's-complement distance.
    #[inline]
    pub fn apply_delta(self, delta: u32) -> Self {
        Self(self.0.wrapping_add(delta))
    }

    /// The wire delta that takes `self` to `next`.
    #[inline]
    pub fn delta_to(self, next: FormatId) -> u32 {
        next.0.wrapping_sub(self.0)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FormatId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
