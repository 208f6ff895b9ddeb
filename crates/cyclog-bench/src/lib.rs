//! Synthetic log streams for benchmarking cyclog.
//!
//! - [`reference_profile`]: 10K messages over a small catalog, with periodic
//!   checkpoints and padding
//! - [`header_only_profile`]: 100K payload-free messages, isolating framing
//! - [`synthetic_stream`]: deterministic stream for a profile and seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cyclog_core::FormatId;
use cyclog_format::{pack_args, ArgValue, CatalogEntry, CatalogFile, FormatCatalog};
use cyclog_replay::{Checkpoint, StreamWriter};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Format strings of the benchmark catalog, indexed by format id.
pub const BENCH_FORMATS: &[&str] = &[
    "tick",
    "request %s took %u us",
    "queue depth %d (limit %d)",
    "ratio %.3f over %llu samples",
    "peer %s:%hu state %c",
];

/// Shape of a synthetic stream.
#[derive(Clone, Copy, Debug)]
pub struct StreamProfile {
    /// Number of messages.
    pub messages: usize,
    /// Formats drawn from, starting at id 0. At most `BENCH_FORMATS.len()`.
    pub formats: usize,
    /// A checkpoint after every this many messages (0 = none).
    pub checkpoint_every: usize,
    /// A pad run after every this many messages (0 = none).
    pub pad_every: usize,
    /// Largest timestamp step between messages.
    pub max_step: u64,
}

/// 10K messages across every benchmark format.
pub fn reference_profile() -> StreamProfile {
    StreamProfile {
        messages: 10_000,
        formats: BENCH_FORMATS.len(),
        checkpoint_every: 1_000,
        pad_every: 250,
        max_step: 5_000,
    }
}

/// 100K messages using only the argument-free `tick` format.
pub fn header_only_profile() -> StreamProfile {
    StreamProfile {
        messages: 100_000,
        formats: 1,
        checkpoint_every: 0,
        pad_every: 0,
        max_step: 1 << 20,
    }
}

/// Catalog holding the first `formats` entries of [`BENCH_FORMATS`].
pub fn bench_catalog(formats: usize) -> FormatCatalog {
    let file = CatalogFile {
        formats: BENCH_FORMATS
            .iter()
            .take(formats)
            .enumerate()
            .map(|(id, format)| CatalogEntry {
                id: id as u32,
                format: (*format).to_string(),
                file: Some("bench.cc".into()),
                line: Some(id as u32 + 1),
                level: Some("NOTICE".into()),
            })
            .collect(),
    };
    FormatCatalog::from_file(file).expect("benchmark formats are valid")
}

fn sample_args(rng: &mut ChaCha8Rng, id: u32) -> Vec<ArgValue> {
    let word = |rng: &mut ChaCha8Rng| -> String {
        let len = 3 + (rng.next_u32() % 10) as usize;
        (0..len)
            .map(|_| char::from(b'a' + (rng.next_u32() % 26) as u8))
            .collect()
    };
    match id {
        1 => vec![
            ArgValue::Str(format!("/{}", word(rng))),
            ArgValue::Uint(u64::from(rng.next_u32() % 100_000)),
        ],
        2 => vec![
            ArgValue::Int(i64::from(rng.next_u32() % 2_000) - 1_000),
            ArgValue::Int(1_024),
        ],
        3 => vec![
            ArgValue::Float(f64::from(rng.next_u32()) / f64::from(u32::MAX)),
            ArgValue::Uint(rng.next_u64() >> 20),
        ],
        4 => vec![
            ArgValue::Str(word(rng)),
            ArgValue::Uint(u64::from(rng.next_u32() % 65_536)),
            ArgValue::Uint(u64::from(b'A' + (rng.next_u32() % 4) as u8)),
        ],
        _ => Vec::new(),
    }
}

/// Build a deterministic stream for `profile` with the given seed.
///
/// Every message decodes with the registry from
/// `bench_catalog(profile.formats)`.
pub fn synthetic_stream(profile: &StreamProfile, seed: u64) -> Vec<u8> {
    let catalog = bench_catalog(profile.formats);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut writer = StreamWriter::new(Vec::with_capacity(profile.messages * 16));
    let mut timestamp = 0u64;

    for i in 0..profile.messages {
        let id = (rng.next_u32() as usize % profile.formats.max(1)) as u32;
        timestamp += rng.next_u64() % profile.max_step.max(1);

        let payload = match catalog.get(FormatId(id)) {
            Some((_, fmt)) => pack_args(fmt, &sample_args(&mut rng, id))
                .expect("sample args match their format"),
            None => Vec::new(),
        };
        writer
            .write_message(FormatId(id), timestamp, &payload)
            .expect("Vec writes are infallible");

        let n = i + 1;
        if profile.checkpoint_every > 0 && n % profile.checkpoint_every == 0 {
            let cp = Checkpoint {
                cycle_counter: timestamp,
                unix_time: 1_700_000_000 + n as u64,
                cycles_per_second: 2.4e9,
            };
            writer
                .write_checkpoint(&cp)
                .expect("Vec writes are infallible");
        }
        if profile.pad_every > 0 && n % profile.pad_every == 0 {
            writer
                .write_padding(1 + (rng.next_u32() % 64) as usize)
                .expect("Vec writes are infallible");
        }
    }
    writer.into_inner()
}
