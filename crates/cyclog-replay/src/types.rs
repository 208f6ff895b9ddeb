//! Data types produced and threaded through a replay.

use cyclog_core::FormatId;

/// Absolute header values of one message, reconstructed from its deltas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedMetadata {
    /// Format identifier selecting the payload decoder.
    pub format_id: FormatId,
    /// Cycle counter value at which the message was recorded.
    pub timestamp: u64,
    /// Bytes the header occupied on the wire (header byte plus deltas).
    pub encoded_len: usize,
}

/// A periodic calibration record.
///
/// Checkpoints sit outside the message delta chain: decoding one never
/// changes the previous format id or timestamp.
///
/// # Examples
///
/// ```
/// use cyclog_replay::Checkpoint;
///
/// let cp = Checkpoint {
///     cycle_counter: 1_000,
///     unix_time: 1_700_000_000,
///     cycles_per_second: 2.4e9,
/// };
/// assert!(cp.has_usable_rate());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Checkpoint {
    /// Producer's cycle counter when the checkpoint was written.
    pub cycle_counter: u64,
    /// Wall-clock seconds since the Unix epoch at the same instant.
    pub unix_time: u64,
    /// Cycle counter frequency measured by the producer.
    pub cycles_per_second: f64,
}

impl Checkpoint {
    /// Whether `cycles_per_second` can be used as a conversion rate.
    pub fn has_usable_rate(&self) -> bool {
        self.cycles_per_second.is_finite() && self.cycles_per_second > 0.0
    }
}

/// The replay loop's running context.
///
/// Initialized to zero before the first entry and advanced after every
/// message. Never reset mid-stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayState {
    /// Format id of the last decoded message.
    pub last_format_id: FormatId,
    /// Timestamp of the last decoded message.
    pub last_timestamp: u64,
    /// Messages emitted so far in this run.
    pub messages_emitted: u64,
}

impl ReplayState {
    /// Fold a decoded message into the chain.
    pub fn advance(&mut self, meta: &DecodedMetadata) {
        self.last_format_id = meta.format_id;
        self.last_timestamp = meta.timestamp;
        self.messages_emitted += 1;
    }
}

/// A message after payload decoding.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedMessage {
    /// 0-based ordinal of this message in the run.
    pub index: u64,
    /// The message's absolute format id.
    pub format_id: FormatId,
    /// The message's absolute timestamp.
    pub timestamp: u64,
    /// Raw cycle distance from the previous message.
    pub elapsed_cycles: u64,
    /// `elapsed_cycles` converted to nanoseconds.
    pub elapsed_ns: f64,
    /// Output of the format decoder.
    pub text: String,
}

/// One step of replay output.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplayEvent {
    /// A decoded log message.
    Message(RenderedMessage),
    /// A calibration checkpoint.
    Checkpoint(Checkpoint),
    /// A run of zero pad bytes that was skipped.
    Padding {
        /// Offset of the first pad byte.
        offset: u64,
        /// Number of pad bytes.
        len: u64,
    },
}

/// Where the replay state machine currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayPhase {
    /// Positioned at an entry boundary, about to classify.
    Scanning,
    /// Inside a message entry.
    EmittingMessage,
    /// Inside a checkpoint entry.
    EmittingCheckpoint,
    /// Consuming zero pad bytes.
    SkippingPad,
    /// Stream ended or the message limit was reached.
    Done,
    /// A fatal decode error stopped the scan.
    Failed,
}

impl ReplayPhase {
    /// Whether no further events will be produced.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Totals reported once a replay stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Messages decoded and emitted.
    pub messages_emitted: u64,
    /// Checkpoints seen.
    pub checkpoints: u64,
    /// Pad bytes skipped.
    pub pad_bytes: u64,
    /// Total bytes consumed from the stream.
    pub bytes_consumed: u64,
    /// `true` if the scan stopped at the message limit rather than at the
    /// end of the stream.
    pub stopped_by_limit: bool,
}
