use serde::Serialize;
use std::time::{Duration, Instant};
use xwrap_codec::ReaderStats;

/// Statistics gathered while reading one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReadMetrics {
    /// Bytes consumed from the request body
    pub bytes_read: u64,
    /// Elements parsed
    pub elements: usize,
    /// Deepest element nesting reached
    pub max_depth: usize,
    /// Whether a surrogate type was substituted
    pub wrapped: bool,
    /// Whether the empty-body path answered without reading
    pub empty_body: bool,
    /// Wall-clock time spent in the pipeline
    pub duration: Duration,
}

/// Measures wall-clock duration of one pipeline run
pub(crate) struct ReadMeasurement {
    start: Instant,
}

impl ReadMeasurement {
    /// Begin a new measurement window.
    pub(crate) fn begin() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Finish after a document was read.
    pub(crate) fn finish(self, stats: ReaderStats, wrapped: bool) -> ReadMetrics {
        ReadMetrics {
            bytes_read: stats.bytes_read,
            elements: stats.elements,
            max_depth: stats.max_depth,
            wrapped,
            empty_body: false,
            duration: self.start.elapsed(),
        }
    }

    /// Finish after the empty-body short-circuit.
    pub(crate) fn finish_empty(self) -> ReadMetrics {
        ReadMetrics {
            empty_body: true,
            duration: self.start.elapsed(),
            ..ReadMetrics::default()
        }
    }
}
