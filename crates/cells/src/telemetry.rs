//! Telemetry utilities for formatting and emitting per-frame counters.
//! Kept independent of handler internals; callers pass in counters explicitly.
use serde_json::json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub created: usize,
    pub updated: usize,
    pub discarded: usize,
    pub messages: usize,
    pub elapsed_ms: u64,
}

pub fn frame_stats_json(stats: &FrameStats) -> String {
    json!({
        "frame_created": stats.created,
        "frame_updated": stats.updated,
        "frame_discarded": stats.discarded,
        "frame_messages": stats.messages,
        "frame_elapsed_ms": stats.elapsed_ms,
    })
    .to_string()
}

pub fn maybe_emit(enabled: bool, json_line: &str) {
    if enabled {
        log::info!(target: "cells::telemetry", "{json_line}");
    }
}
