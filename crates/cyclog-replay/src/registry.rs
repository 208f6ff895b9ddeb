//! Format id → decode routine dispatch table.

use indexmap::IndexMap;

use cyclog_core::{ByteSource, DecodeError, DecodeRoutine, FormatId};

/// Maps each [`FormatId`] to the routine that decodes its payload.
///
/// Built by the hosting program from the same format catalog the producer
/// used. The replay engine only performs lookups; it never needs to know
/// what a payload looks like.
///
/// # Examples
///
/// ```
/// use cyclog_replay::{ByteSource, DecodeError, DecoderRegistry, FormatId};
///
/// let mut registry = DecoderRegistry::new();
/// registry.register_fn(FormatId(3), |_id, _src: &mut dyn ByteSource| {
///     Ok::<_, DecodeError>("PING".to_string())
/// });
/// assert!(registry.contains(FormatId(3)));
/// assert!(registry.lookup(FormatId(4)).is_err());
/// ```
#[derive(Default)]
pub struct DecoderRegistry {
    routines: IndexMap<FormatId, Box<dyn DecodeRoutine>>,
}

impl DecoderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `routine` under `id`, returning any routine it replaces.
    pub fn register(
        &mut self,
        id: FormatId,
        routine: impl DecodeRoutine + 'static,
    ) -> Option<Box<dyn DecodeRoutine>> {
        self.routines.insert(id, Box::new(routine))
    }

    /// Register a closure as the routine for `id`.
    pub fn register_fn<F>(&mut self, id: FormatId, f: F) -> Option<Box<dyn DecodeRoutine>>
    where
        F: Fn(FormatId, &mut dyn ByteSource) -> Result<String, DecodeError> + 'static,
    {
        self.register(id, f)
    }

    /// Find the routine for `id`.
    ///
    /// A missing id is [`DecodeError::UnknownFormat`]: without the routine
    /// the payload length is unknown and the stream cannot be advanced.
    pub fn lookup(&self, id: FormatId) -> Result<&dyn DecodeRoutine, DecodeError> {
        self.routines
            .get(&id)
            .map(|r| r.as_ref())
            .ok_or(DecodeError::UnknownFormat { format_id: id })
    }

    /// Whether `id` has a routine.
    pub fn contains(&self, id: FormatId) -> bool {
        self.routines.contains_key(&id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = FormatId> + '_ {
        self.routines.keys().copied()
    }

    /// Number of registered routines.
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("ids", &self.routines.keys().collect::<Vec<_>>())
            .finish()
    }
}
