//! FIP Data Writers
//!
//! Append-only sinks for per-frame region activity:
//! - **CSV:** One text row per frame, background column first
//! - **Binary:** Fixed-width little-endian records with a JSON sidecar
//!
//! Both sinks are opened once per run, flush after every record, and fail
//! fast when the number of regions changes mid-stream.

pub mod binary;
pub mod csv;

pub use binary::FipBinaryWriter;
pub use csv::FipCsvWriter;

use fip_common::{FipError, FipResult};

/// Locks the region count of a stream to its first record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RegionCount {
    expected: Option<usize>,
}

impl RegionCount {
    pub(crate) fn new(expected: Option<usize>) -> Self {
        Self { expected }
    }

    /// Accept `count` if it matches the locked count, locking it if unset.
    pub(crate) fn check(&mut self, count: usize) -> FipResult<usize> {
        if count == 0 {
            return Err(FipError::invalid_input("no regions defined for the writer"));
        }
        match self.expected {
            None => {
                self.expected = Some(count);
                Ok(count)
            }
            Some(expected) if expected == count => Ok(count),
            Some(expected) => Err(FipError::invalid_input(format!(
                "number of regions in the input stream ({count}) does not match \
                 the number of regions in the first frame ({expected})"
            ))),
        }
    }
}
