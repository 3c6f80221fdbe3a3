// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Capture counters shared between the render thread and the owner.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by the render-finish listener.
#[derive(Debug, Default)]
pub struct CaptureStats {
    captures: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    last_blit_micros: AtomicU64,
}

/// A point-in-time copy of [`CaptureStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStatsSnapshot {
    /// Blits recorded successfully.
    pub captures: u64,
    /// Notifications that wanted a capture but had no usable target.
    pub skipped: u64,
    /// Blits abandoned because of a GPU error.
    pub failed: u64,
    /// Time spent recording the most recent successful blit, in microseconds.
    pub last_blit_micros: u64,
}

impl CaptureStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_capture(&self, micros: u64) {
        self.captures.fetch_add(1, Ordering::Relaxed);
        self.last_blit_micros.store(micros, Ordering::Relaxed);
    }

    pub(crate) fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> CaptureStatsSnapshot {
        CaptureStatsSnapshot {
            captures: self.captures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            last_blit_micros: self.last_blit_micros.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = CaptureStats::new();
        stats.record_capture(120);
        stats.record_capture(80);
        stats.record_skip();
        stats.record_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.captures, 2);
        assert_eq!(snap.skipped, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.last_blit_micros, 80);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(CaptureStats::new().snapshot()).unwrap();
        assert_eq!(json["captures"], 0);
        assert_eq!(json["last_blit_micros"], 0);
    }
}
