//! Stream-level replay properties.
//!
//! Each test builds a stream with `StreamBuilder`, replays it through a
//! registry of mock routines, and checks what was emitted and where the
//! state machine stopped.

use cyclog_replay::{
    render_line, DecodeError, DecoderRegistry, FormatId, RenderedMessage, ReplayConfig,
    ReplayError, ReplayEvent, ReplayPhase, ReplaySummary, Replayer, TimeConversion,
};
use cyclog_test_utils::{fixed_text, text_payload, FixedLenDecoder, LengthPrefixedText, StreamBuilder};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────

fn ping_registry() -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();
    registry.register_fn(FormatId(3), fixed_text("PING"));
    registry
}

struct Outcome {
    messages: Vec<RenderedMessage>,
    events: Vec<ReplayEvent>,
    summary: ReplaySummary,
    phase: ReplayPhase,
    error: Option<ReplayError>,
}

fn replay(bytes: &[u8], registry: &DecoderRegistry, config: ReplayConfig) -> Outcome {
    let mut replayer = Replayer::from_reader(bytes, registry, config).unwrap();
    let mut events = Vec::new();
    let mut error = None;
    loop {
        match replayer.next_event() {
            Ok(Some(event)) => events.push(event),
            Ok(None) => break,
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }
    let messages = events
        .iter()
        .filter_map(|e| match e {
            ReplayEvent::Message(m) => Some(m.clone()),
            _ => None,
        })
        .collect();
    Outcome {
        messages,
        events,
        summary: replayer.summary(),
        phase: replayer.phase(),
        error,
    }
}

// ── End-to-end ──────────────────────────────────────────────────

#[test]
fn checkpoint_then_two_pings() {
    let bytes = StreamBuilder::new()
        .checkpoint(1e9)
        .message(3, 100, &[])
        .raw_message(0, 50, &[])
        .build();

    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());

    assert!(out.error.is_none());
    assert_eq!(out.phase, ReplayPhase::Done);
    assert_eq!(out.summary.messages_emitted, 2);
    assert_eq!(out.summary.checkpoints, 1);
    assert!(matches!(out.events[0], ReplayEvent::Checkpoint(cp) if cp.cycles_per_second == 1e9));

    let lines: Vec<_> = out.messages.iter().map(render_line).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("   0) +"));
    assert!(lines[0].ends_with("ns: PING"));
    assert_eq!(lines[1], "   1) +     50.00 ns: PING");
    assert!((out.messages[1].elapsed_ns - 50.0).abs() < 1e-9);
}

// ── Monotonicity ────────────────────────────────────────────────

#[test]
fn backwards_timestamp_halts_before_emitting() {
    let bytes = StreamBuilder::new()
        .message(3, 100, &[])
        .raw_message(0, u64::MAX - 9, &[]) // 100 + delta wraps to 90
        .message(3, 200, &[])
        .build();

    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());

    assert_eq!(out.messages.len(), 1);
    assert_eq!(out.phase, ReplayPhase::Failed);
    let err = out.error.expect("expected a failure");
    assert!(matches!(
        err.kind(),
        DecodeError::NonMonotonicTimestamp { previous: 100, .. }
    ));
    assert_eq!(err.last_timestamp, 100);
    assert_eq!(err.messages_emitted, 1);
}

#[test]
fn equal_timestamps_are_allowed() {
    let bytes = StreamBuilder::new()
        .message(3, 100, &[])
        .message(3, 100, &[])
        .build();
    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());
    assert!(out.error.is_none());
    assert_eq!(out.messages[1].elapsed_cycles, 0);
}

// ── Padding ─────────────────────────────────────────────────────

#[test]
fn zero_run_between_messages_is_skipped() {
    let bytes = StreamBuilder::new()
        .message(3, 10, &[])
        .padding(37)
        .message(3, 20, &[])
        .build();

    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());

    assert!(out.error.is_none());
    assert_eq!(out.summary.messages_emitted, 2);
    assert_eq!(out.summary.pad_bytes, 37);
    assert_eq!(out.messages[1].timestamp, 20);
}

#[test]
fn trailing_padding_ends_cleanly() {
    let bytes = StreamBuilder::new().message(3, 10, &[]).padding(4096).build();
    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());
    assert!(out.error.is_none());
    assert_eq!(out.phase, ReplayPhase::Done);
    assert_eq!(out.summary.bytes_consumed, bytes.len() as u64);
}

#[test]
fn nonzero_garbage_after_padding_is_fatal() {
    let bytes = StreamBuilder::new()
        .message(3, 10, &[])
        .padding(3)
        .raw(&[0x0C])
        .message(3, 20, &[])
        .build();

    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());

    assert_eq!(out.messages.len(), 1);
    let err = out.error.expect("expected a failure");
    assert!(matches!(err.kind(), DecodeError::UnrecognizedTag { tag: 0x0C }));
    assert_eq!(err.entry_offset, 3 + 3);
}

// ── Unknown format ──────────────────────────────────────────────

#[test]
fn unknown_format_halts_scan() {
    let bytes = StreamBuilder::new()
        .message(3, 10, &[])
        .message(4, 20, &[])
        .message(3, 30, &[])
        .build();

    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());

    assert_eq!(out.messages.len(), 1);
    assert_eq!(out.phase, ReplayPhase::Failed);
    let err = out.error.expect("expected a failure");
    assert!(matches!(
        err.kind(),
        DecodeError::UnknownFormat { format_id: FormatId(4) }
    ));
    // The third message was never reached.
    assert!(out.summary.bytes_consumed < bytes.len() as u64);
}

// ── Message limit ───────────────────────────────────────────────

#[test]
fn limit_stops_after_exactly_k_messages() {
    let mut builder = StreamBuilder::new();
    for i in 0..10u64 {
        builder = builder.message(3, i * 10, &[]);
    }
    let bytes = builder.build();

    let config = ReplayConfig {
        message_limit: Some(4),
        ..Default::default()
    };
    let out = replay(&bytes, &ping_registry(), config);

    assert!(out.error.is_none());
    assert_eq!(out.phase, ReplayPhase::Done);
    assert_eq!(out.messages.len(), 4);
    assert!(out.summary.stopped_by_limit);
    assert_eq!(out.messages.last().map(|m| m.index), Some(3));
}

#[test]
fn limit_larger_than_stream_runs_to_end() {
    let bytes = StreamBuilder::new().message(3, 1, &[]).build();
    let config = ReplayConfig {
        message_limit: Some(100),
        ..Default::default()
    };
    let out = replay(&bytes, &ping_registry(), config);
    assert_eq!(out.messages.len(), 1);
    assert!(!out.summary.stopped_by_limit);
}

// ── Checkpoint pass-through ─────────────────────────────────────

#[test]
fn checkpoint_does_not_perturb_delta_chain() {
    let mut registry = DecoderRegistry::new();
    registry.register(FormatId(7), LengthPrefixedText);
    registry.register(FormatId(9), FixedLenDecoder::new("raw", 2));

    let with_checkpoint = StreamBuilder::new()
        .message(7, 1_000, &text_payload("before"))
        .checkpoint(3.0e9)
        .raw_message(2, 500, &[0xAB, 0xCD])
        .build();
    let without = StreamBuilder::new()
        .message(7, 1_000, &text_payload("before"))
        .raw_message(2, 500, &[0xAB, 0xCD])
        .build();

    let a = replay(&with_checkpoint, &registry, ReplayConfig::default());
    let b = replay(&without, &registry, ReplayConfig::default());

    assert!(a.error.is_none() && b.error.is_none());
    assert_eq!(a.messages, b.messages);
    assert_eq!(a.messages[1].format_id, FormatId(9));
    assert_eq!(a.messages[1].timestamp, 1_500);
    assert_eq!(a.messages[1].text, "raw abcd");
}

#[test]
fn checkpoint_rate_applies_when_configured() {
    let bytes = StreamBuilder::new()
        .checkpoint(2.0e9)
        .message(3, 400, &[])
        .build();
    let config = ReplayConfig {
        time_conversion: TimeConversion::Checkpoint {
            fallback_cycles_per_second: 1.0e9,
        },
        ..Default::default()
    };
    let out = replay(&bytes, &ping_registry(), config);
    assert!((out.messages[0].elapsed_ns - 200.0).abs() < 1e-9);
}

// ── Truncation ──────────────────────────────────────────────────

#[test]
fn truncated_checkpoint_is_fatal() {
    let mut bytes = StreamBuilder::new().message(3, 1, &[]).checkpoint(1e9).build();
    bytes.truncate(bytes.len() - 3);
    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());
    assert_eq!(out.messages.len(), 1);
    assert!(matches!(
        out.error.map(|e| e.source),
        Some(DecodeError::TruncatedStream { .. })
    ));
}

#[test]
fn failure_message_carries_context() {
    let bytes = StreamBuilder::new().message(3, 5, &[]).message(8, 6, &[]).build();
    let out = replay(&bytes, &ping_registry(), ReplayConfig::default());
    let err = out.error.expect("expected a failure");
    let text = err.to_string();
    assert!(text.contains("last format id 3"), "{text}");
    assert!(text.contains("last timestamp 5"), "{text}");

    // The cause is reachable through the source chain, not repeated in the
    // top-level message.
    let cause = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(cause.as_deref(), Some("no decoder registered for format id 8"));
    assert!(!text.contains("no decoder registered"), "{text}");
}

// ── Properties ──────────────────────────────────────────────────

proptest! {
    /// Any sequence of (format, non-decreasing timestamp) pairs survives
    /// building and replaying, with pads and checkpoints sprinkled in.
    #[test]
    fn replay_reproduces_written_sequence(
        steps in prop::collection::vec((0u32..16, 0u64..100_000, 0usize..4, any::<bool>()), 1..80)
    ) {
        let mut registry = DecoderRegistry::new();
        for id in 0..16 {
            registry.register(FormatId(id), LengthPrefixedText);
        }

        let mut builder = StreamBuilder::new();
        let mut expected = Vec::new();
        let mut ts = 0u64;
        for (i, &(fmt, step, pad, checkpoint)) in steps.iter().enumerate() {
            ts += step;
            let text = format!("m{i}");
            builder = builder.message(fmt, ts, &text_payload(&text)).padding(pad);
            if checkpoint {
                builder = builder.checkpoint(1e9);
            }
            expected.push((FormatId(fmt), ts, text));
        }
        let bytes = builder.build();

        let out = replay(&bytes, &registry, ReplayConfig::default());
        prop_assert!(out.error.is_none());
        let got: Vec<_> = out
            .messages
            .into_iter()
            .map(|m| (m.format_id, m.timestamp, m.text))
            .collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(out.summary.bytes_consumed, bytes.len() as u64);
    }
}
