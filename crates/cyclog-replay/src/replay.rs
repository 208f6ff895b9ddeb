//! The replay loop.
//!
//! [`Replayer`] walks a stream entry by entry: classify, decode the framing
//! for that kind, dispatch message payloads through the
//! [`DecoderRegistry`], and fold each message into the running
//! [`ReplayState`]. Any decode error is fatal; the loop never tries to
//! resynchronize past a payload of unknown length.

use std::io::BufRead;

use cyclog_core::{ByteSource, DecodeError, DecodeRoutine};

use crate::codec::{decode_checkpoint, decode_metadata};
use crate::config::{ConfigError, ReplayConfig};
use crate::cursor::ByteCursor;
use crate::entry::{classify, EntryKind};
use crate::error::ReplayError;
use crate::registry::DecoderRegistry;
use crate::types::{
    Checkpoint, RenderedMessage, ReplayEvent, ReplayPhase, ReplayState, ReplaySummary,
};

const NANOS_PER_SECOND: f64 = 1.0e9;

/// Drives a single forward scan over a log stream.
///
/// # Examples
///
/// ```
/// use cyclog_replay::{
///     ByteSource, DecodeError, DecoderRegistry, FormatId, ReplayConfig, ReplayEvent, Replayer,
///     StreamWriter,
/// };
///
/// let mut writer = StreamWriter::new(Vec::new());
/// writer.write_message(FormatId(3), 100, &[]).unwrap();
/// writer.write_message(FormatId(3), 150, &[]).unwrap();
/// let bytes = writer.into_inner();
///
/// let mut registry = DecoderRegistry::new();
/// registry.register_fn(FormatId(3), |_id, _src: &mut dyn ByteSource| {
///     Ok::<_, DecodeError>("PING".to_string())
/// });
///
/// let mut replayer =
///     Replayer::from_reader(bytes.as_slice(), &registry, ReplayConfig::default()).unwrap();
/// let mut lines = Vec::new();
/// let summary = replayer
///     .run(|event| {
///         if let ReplayEvent::Message(msg) = event {
///             lines.push(cyclog_replay::render_line(msg));
///         }
///     })
///     .unwrap();
///
/// assert_eq!(summary.messages_emitted, 2);
/// assert_eq!(lines[1], "   1) +     50.00 ns: PING");
/// ```
pub struct Replayer<'r, S> {
    source: S,
    registry: &'r DecoderRegistry,
    config: ReplayConfig,
    state: ReplayState,
    phase: ReplayPhase,
    cycles_per_second: f64,
    checkpoints: u64,
    pad_bytes: u64,
    stopped_by_limit: bool,
}

impl<'r, R: BufRead> Replayer<'r, ByteCursor<R>> {
    /// Replay from a buffered reader.
    pub fn from_reader(
        reader: R,
        registry: &'r DecoderRegistry,
        config: ReplayConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(ByteCursor::new(reader), registry, config)
    }
}

impl<'r, S: ByteSource> Replayer<'r, S> {
    /// Create a replayer positioned at the start of `source`.
    pub fn new(
        source: S,
        registry: &'r DecoderRegistry,
        config: ReplayConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            source,
            registry,
            cycles_per_second: config.time_conversion.initial_rate(),
            config,
            state: ReplayState::default(),
            phase: ReplayPhase::Scanning,
            checkpoints: 0,
            pad_bytes: 0,
            stopped_by_limit: false,
        })
    }

    /// Current state machine phase.
    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    /// The running delta chain.
    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    /// Conversion rate currently applied to elapsed cycles.
    pub fn cycles_per_second(&self) -> f64 {
        self.cycles_per_second
    }

    /// Totals so far.
    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            messages_emitted: self.state.messages_emitted,
            checkpoints: self.checkpoints,
            pad_bytes: self.pad_bytes,
            bytes_consumed: self.source.offset(),
            stopped_by_limit: self.stopped_by_limit,
        }
    }

    /// Consume the replayer and return its byte source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Decode the next entry.
    ///
    /// Returns `Ok(None)` once the stream ends at an entry boundary or the
    /// message limit is reached. The first error moves the replayer to
    /// [`ReplayPhase::Failed`]; every later call returns `Ok(None)`.
    pub fn next_event(&mut self) -> Result<Option<ReplayEvent>, ReplayError> {
        if self.phase.is_terminal() {
            return Ok(None);
        }

        let entry_offset = self.source.offset();
        let kind = match classify(&mut self.source) {
            Ok(Some(kind)) => kind,
            Ok(None) => {
                self.phase = ReplayPhase::Done;
                return Ok(None);
            }
            Err(e) => return Err(self.fail(e, entry_offset)),
        };

        let result = match kind {
            EntryKind::Message => {
                self.phase = ReplayPhase::EmittingMessage;
                self.emit_message().map(ReplayEvent::Message)
            }
            EntryKind::Checkpoint => {
                self.phase = ReplayPhase::EmittingCheckpoint;
                self.emit_checkpoint().map(ReplayEvent::Checkpoint)
            }
            EntryKind::Invalid { byte: 0 } => {
                self.phase = ReplayPhase::SkippingPad;
                self.skip_padding().map(|len| ReplayEvent::Padding {
                    offset: entry_offset,
                    len,
                })
            }
            EntryKind::Invalid { byte } => Err(DecodeError::UnrecognizedTag { tag: byte }),
        };

        match result {
            Ok(event) => {
                self.phase = if self.limit_reached() {
                    self.stopped_by_limit = true;
                    ReplayPhase::Done
                } else {
                    ReplayPhase::Scanning
                };
                Ok(Some(event))
            }
            Err(e) => Err(self.fail(e, entry_offset)),
        }
    }

    /// Drive the scan to completion, handing every event to `sink`.
    pub fn run<F>(&mut self, mut sink: F) -> Result<ReplaySummary, ReplayError>
    where
        F: FnMut(&ReplayEvent),
    {
        while let Some(event) = self.next_event()? {
            sink(&event);
        }
        Ok(self.summary())
    }

    /// Iterate over the remaining events.
    pub fn events(&mut self) -> Events<'_, 'r, S> {
        Events { replayer: self }
    }

    fn limit_reached(&self) -> bool {
        self.config
            .message_limit
            .is_some_and(|limit| self.state.messages_emitted >= limit)
    }

    fn emit_message(&mut self) -> Result<RenderedMessage, DecodeError> {
        let meta = decode_metadata(
            &mut self.source,
            self.state.last_format_id,
            self.state.last_timestamp,
        )?;
        let routine = self.registry.lookup(meta.format_id)?;
        let text = routine.decode(meta.format_id, &mut self.source)?;

        let elapsed_cycles = meta.timestamp - self.state.last_timestamp;
        let msg = RenderedMessage {
            index: self.state.messages_emitted,
            format_id: meta.format_id,
            timestamp: meta.timestamp,
            elapsed_cycles,
            elapsed_ns: elapsed_cycles as f64 * NANOS_PER_SECOND / self.cycles_per_second,
            text,
        };
        self.state.advance(&meta);
        Ok(msg)
    }

    fn emit_checkpoint(&mut self) -> Result<Checkpoint, DecodeError> {
        let cp = decode_checkpoint(&mut self.source)?;
        self.checkpoints += 1;
        tracing::info!(
            cycle_counter = cp.cycle_counter,
            unix_time = cp.unix_time,
            cycles_per_second = cp.cycles_per_second,
            "checkpoint"
        );

        if self.config.time_conversion.follows_checkpoints() {
            if cp.has_usable_rate() {
                self.cycles_per_second = cp.cycles_per_second;
            } else {
                tracing::warn!(
                    cycles_per_second = cp.cycles_per_second,
                    keeping = self.cycles_per_second,
                    "checkpoint rate unusable, keeping previous rate"
                );
            }
        }
        Ok(cp)
    }

    fn skip_padding(&mut self) -> Result<u64, DecodeError> {
        let start = self.source.offset();
        let mut len = 0u64;
        while self.source.peek()? == Some(0) {
            self.source.consume_u8()?;
            len += 1;
        }
        self.pad_bytes += len;
        tracing::debug!(offset = start, len, "skipped padding");
        Ok(len)
    }

    fn fail(&mut self, source: DecodeError, entry_offset: u64) -> ReplayError {
        self.phase = ReplayPhase::Failed;
        ReplayError {
            source,
            entry_offset,
            last_format_id: self.state.last_format_id,
            last_timestamp: self.state.last_timestamp,
            messages_emitted: self.state.messages_emitted,
        }
    }
}

/// Iterator adapter over replay events.
///
/// Yields at most one error, after which it is exhausted.
pub struct Events<'a, 'r, S> {
    replayer: &'a mut Replayer<'r, S>,
}

impl<S: ByteSource> Iterator for Events<'_, '_, S> {
    type Item = Result<ReplayEvent, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.replayer.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeConversion;
    use crate::types::Checkpoint;
    use crate::writer::StreamWriter;
    use cyclog_core::FormatId;

    /// Registry where every id in `ids` renders as `"fmt<id>"` and reads
    /// one payload byte.
    fn one_byte_registry(ids: &[u32]) -> DecoderRegistry {
        let mut registry = DecoderRegistry::new();
        for &id in ids {
            registry.register_fn(FormatId(id), |id, src: &mut dyn ByteSource| {
                let b = src.consume_u8()?;
                Ok(format!("fmt{id}:{b}"))
            });
        }
        registry
    }

    fn checkpoint(rate: f64) -> Checkpoint {
        Checkpoint {
            cycle_counter: 0,
            unix_time: 0,
            cycles_per_second: rate,
        }
    }

    fn messages(replayer: &mut Replayer<'_, ByteCursor<&[u8]>>) -> Vec<RenderedMessage> {
        replayer
            .events()
            .filter_map(|e| match e.unwrap() {
                ReplayEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_stream_is_done() {
        let registry = DecoderRegistry::new();
        let mut replayer =
            Replayer::from_reader(&[0u8; 0][..], &registry, ReplayConfig::default()).unwrap();
        assert_eq!(replayer.phase(), ReplayPhase::Scanning);
        assert!(replayer.next_event().unwrap().is_none());
        assert_eq!(replayer.phase(), ReplayPhase::Done);
        assert_eq!(replayer.summary(), ReplaySummary::default());
    }

    #[test]
    fn messages_are_indexed_and_timed() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_message(FormatId(1), 10, &[7]).unwrap();
        writer.write_message(FormatId(2), 40, &[8]).unwrap();
        let bytes = writer.into_inner();

        let registry = one_byte_registry(&[1, 2]);
        let mut replayer =
            Replayer::from_reader(bytes.as_slice(), &registry, ReplayConfig::default()).unwrap();
        let msgs = messages(&mut replayer);

        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].index, 0);
        assert_eq!(msgs[0].text, "fmt1:7");
        assert_eq!(msgs[0].elapsed_cycles, 10);
        assert_eq!(msgs[1].index, 1);
        assert_eq!(msgs[1].text, "fmt2:8");
        assert_eq!(msgs[1].elapsed_cycles, 30);
        assert!((msgs[1].elapsed_ns - 30.0).abs() < 1e-9);
        assert_eq!(replayer.state().last_format_id, FormatId(2));
        assert_eq!(replayer.state().last_timestamp, 40);
    }

    #[test]
    fn fixed_conversion_ignores_checkpoints() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_checkpoint(&checkpoint(2.0e9)).unwrap();
        writer.write_message(FormatId(1), 100, &[0]).unwrap();
        let bytes = writer.into_inner();

        let registry = one_byte_registry(&[1]);
        let mut replayer =
            Replayer::from_reader(bytes.as_slice(), &registry, ReplayConfig::default()).unwrap();
        let msgs = messages(&mut replayer);
        assert!((msgs[0].elapsed_ns - 100.0).abs() < 1e-9);
        assert_eq!(replayer.summary().checkpoints, 1);
    }

    #[test]
    fn checkpoint_conversion_adopts_usable_rates() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_message(FormatId(1), 100, &[0]).unwrap();
        writer.write_checkpoint(&checkpoint(2.0e9)).unwrap();
        writer.write_message(FormatId(1), 300, &[0]).unwrap();
        writer.write_checkpoint(&checkpoint(f64::NAN)).unwrap();
        writer.write_message(FormatId(1), 500, &[0]).unwrap();
        let bytes = writer.into_inner();

        let registry = one_byte_registry(&[1]);
        let config = ReplayConfig {
            time_conversion: TimeConversion::Checkpoint {
                fallback_cycles_per_second: 1.0e9,
            },
            ..Default::default()
        };
        let mut replayer = Replayer::from_reader(bytes.as_slice(), &registry, config).unwrap();
        let msgs = messages(&mut replayer);

        assert!((msgs[0].elapsed_ns - 100.0).abs() < 1e-9);
        assert!((msgs[1].elapsed_ns - 100.0).abs() < 1e-9);
        // NaN rate is ignored; 2 GHz still applies.
        assert!((msgs[2].elapsed_ns - 100.0).abs() < 1e-9);
        assert_eq!(replayer.cycles_per_second(), 2.0e9);
    }

    #[test]
    fn padding_is_reported_with_offset_and_length() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_message(FormatId(1), 1, &[0]).unwrap();
        writer.write_padding(5).unwrap();
        let bytes = writer.into_inner();

        let registry = one_byte_registry(&[1]);
        let mut replayer =
            Replayer::from_reader(bytes.as_slice(), &registry, ReplayConfig::default()).unwrap();
        let events: Vec<_> = replayer.events().collect::<Result<_, _>>().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ReplayEvent::Padding { offset: 4, len: 5 });
        assert_eq!(replayer.summary().pad_bytes, 5);
        assert_eq!(replayer.summary().bytes_consumed, 9);
    }

    #[test]
    fn nonzero_invalid_tag_fails_with_context() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_message(FormatId(1), 77, &[0]).unwrap();
        let mut bytes = writer.into_inner();
        bytes.push(0x03);

        let registry = one_byte_registry(&[1]);
        let mut replayer =
            Replayer::from_reader(bytes.as_slice(), &registry, ReplayConfig::default()).unwrap();
        assert!(replayer.next_event().unwrap().is_some());

        let err = replayer.next_event().unwrap_err();
        assert!(matches!(err.kind(), DecodeError::UnrecognizedTag { tag: 0x03 }));
        assert_eq!(err.entry_offset, 4);
        assert_eq!(err.last_format_id, FormatId(1));
        assert_eq!(err.last_timestamp, 77);
        assert_eq!(err.messages_emitted, 1);
        assert_eq!(replayer.phase(), ReplayPhase::Failed);
        assert!(replayer.next_event().unwrap().is_none());
    }

    #[test]
    fn truncated_payload_fails() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_message(FormatId(1), 1, &[]).unwrap();
        let bytes = writer.into_inner();

        let registry = one_byte_registry(&[1]);
        let mut replayer =
            Replayer::from_reader(bytes.as_slice(), &registry, ReplayConfig::default()).unwrap();
        let err = replayer.next_event().unwrap_err();
        assert!(matches!(err.kind(), DecodeError::TruncatedStream { .. }));
        assert_eq!(replayer.summary().messages_emitted, 0);
    }

    #[test]
    fn iterator_yields_single_error() {
        let bytes = [0xFFu8, 0x01, 0x02];
        let registry = DecoderRegistry::new();
        let mut replayer =
            Replayer::from_reader(&bytes[..], &registry, ReplayConfig::default()).unwrap();
        let results: Vec<_> = replayer.events().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn read_error_fails_the_replay() {
        use std::io::{self, BufReader, Read};

        struct BrokenReader;

        impl Read for BrokenReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "device gone"))
            }
        }

        let registry = DecoderRegistry::new();
        let mut replayer = Replayer::new(
            ByteCursor::new(BufReader::new(BrokenReader)),
            &registry,
            ReplayConfig::default(),
        )
        .unwrap();
        let err = replayer.next_event().unwrap_err();
        assert!(matches!(err.kind(), DecodeError::Io(_)));
        assert_eq!(err.entry_offset, 0);
        assert_eq!(replayer.phase(), ReplayPhase::Failed);
        assert!(replayer.next_event().unwrap().is_none());
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let registry = DecoderRegistry::new();
        let config = ReplayConfig {
            message_limit: Some(0),
            ..Default::default()
        };
        assert!(Replayer::from_reader(&[0u8; 0][..], &registry, config).is_err());
    }
}
