use flow_core::BucketPayload;

use crate::types::{IngestError, Result};

pub fn is_telemetry_line(line: &str, marker: &str) -> bool {
    line.contains(marker)
}

/// The final whitespace-delimited token of a log line.
pub fn payload_token(line: &str) -> &str {
    line.split_whitespace().next_back().unwrap_or_default()
}

/// Decodes the trailing JSON payload of a telemetry line. `line_number` is
/// 1-based and only used for error reporting.
pub fn decode_bucket(line: &str, line_number: usize) -> Result<BucketPayload> {
    serde_json::from_str(payload_token(line)).map_err(|source| IngestError::Decode {
        line: line_number,
        source,
    })
}

/// Yields the decoded bucket of every telemetry line, in line order.
///
/// Lines without the marker are skipped without being inspected. Iteration
/// should stop at the first error; the caller owns that decision.
pub struct TelemetryBuckets<'m, I> {
    lines: I,
    marker: &'m str,
    lines_read: usize,
    telemetry_lines: usize,
}

impl<'m, I> TelemetryBuckets<'m, I> {
    pub fn new(lines: I, marker: &'m str) -> Self {
        Self {
            lines,
            marker,
            lines_read: 0,
            telemetry_lines: 0,
        }
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn telemetry_lines(&self) -> usize {
        self.telemetry_lines
    }
}

impl<I, S> Iterator for TelemetryBuckets<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<BucketPayload>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            self.lines_read += 1;
            let line = line.as_ref();
            if !is_telemetry_line(line, self.marker) {
                continue;
            }
            self.telemetry_lines += 1;
            return Some(decode_bucket(line, self.lines_read));
        }
        None
    }
}

/// Decodes every telemetry line up front. Fails on the first malformed payload.
pub fn buckets_from_lines<I, S>(lines: I, marker: &str) -> Result<Vec<BucketPayload>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TelemetryBuckets::new(lines.into_iter(), marker).collect()
}
