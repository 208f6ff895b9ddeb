//! Human-readable rendering of replay events.

use crate::types::{Checkpoint, RenderedMessage};

/// Render a message as `"   3) +     50.00 ns: text"`.
pub fn render_line(msg: &RenderedMessage) -> String {
    format!("{:4}) +{:10.2} ns: {}", msg.index, msg.elapsed_ns, msg.text)
}

/// Render a checkpoint notice.
pub fn render_checkpoint(cp: &Checkpoint) -> String {
    format!("Found a checkpoint. CyclesPerSec={:.6}", cp.cycles_per_second)
}
