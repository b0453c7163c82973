//! Binary activity writer.
//!
//! Each record is `frame_number: i64`, `frame_time: i64`, then one `f64`
//! per region, all little-endian. A JSON sidecar next to the data file
//! describes the layout and the regions.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fip_common::error::FipResult;
use fip_processing_core::activity::ActivityCollection;
use fip_rig_model::frame::{CameraSource, FipFrame};
use fip_rig_model::geometry::Circle;

use crate::RegionCount;

/// Sidecar schema version.
pub const BINARY_SCHEMA_VERSION: &str = "1.0";

/// Contents of the `<file>.json` sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryStreamHeader {
    pub schema_version: String,
    /// Wall-clock time the file was opened (RFC 3339).
    pub created_at: String,
    pub source: Option<CameraSource>,
    pub region_count: usize,
    /// Regions in column order; the first is the background.
    pub circles: Vec<Circle>,
    /// Human-readable record layout.
    pub record_layout: String,
    pub record_size_bytes: usize,
}

impl BinaryStreamHeader {
    fn new(source: Option<CameraSource>, circles: Vec<Circle>) -> Self {
        let region_count = circles.len();
        Self {
            schema_version: BINARY_SCHEMA_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            source,
            region_count,
            circles,
            record_layout: format!("frame_number:i64le,frame_time:i64le,values:f64le[{region_count}]"),
            record_size_bytes: record_size(region_count),
        }
    }
}

/// Bytes per record for `region_count` regions.
pub fn record_size(region_count: usize) -> usize {
    16 + 8 * region_count
}

/// Sidecar path for a data file: `data.bin` -> `data.bin.json`.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// Writes fixed-width binary activity records.
pub struct FipBinaryWriter {
    path: PathBuf,
    regions: RegionCount,
    writer: Option<BufWriter<File>>,
    records_written: u64,
}

impl FipBinaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            regions: RegionCount::new(None),
            writer: None,
            records_written: 0,
        }
    }

    pub fn with_expected_region_count(mut self, count: usize) -> Self {
        self.regions = RegionCount::new(Some(count));
        self
    }

    fn open(&self, frame: &FipFrame, activities: &ActivityCollection) -> FipResult<BufWriter<File>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let header = BinaryStreamHeader::new(frame.source, activities.circles());
        std::fs::write(sidecar_path(&self.path), serde_json::to_string_pretty(&header)?)?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        tracing::info!(
            path = %self.path.display(),
            region_count = header.region_count,
            "Opened binary activity file"
        );
        Ok(BufWriter::new(file))
    }

    /// Append one frame's activities.
    pub fn write(&mut self, frame: &FipFrame, activities: &ActivityCollection) -> FipResult<()> {
        let region_count = self.regions.check(activities.len())?;

        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open(frame, activities)?,
        };
        let writer = self.writer.insert(writer);

        let mut record = Vec::with_capacity(record_size(region_count));
        record.extend_from_slice(&frame.frame_number.to_le_bytes());
        record.extend_from_slice(&frame.frame_time.to_le_bytes());
        for value in activities.values() {
            record.extend_from_slice(&value.to_le_bytes());
        }

        writer.write_all(&record)?;
        writer.flush()?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&mut self) -> FipResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FipBinaryWriter {
    fn drop(&mut self) {
        let _ = self.flush();
        if self.writer.is_some() {
            tracing::info!(
                path = %self.path.display(),
                records = self.records_written,
                "Closed binary activity file"
            );
        }
    }
}

/// Decode records written by [`FipBinaryWriter`]: `(frame_number, frame_time, values)`.
pub fn read_records(bytes: &[u8], region_count: usize) -> Vec<(i64, i64, Vec<f64>)> {
    bytes
        .chunks_exact(record_size(region_count))
        .map(|record| {
            let word = |i: usize| -> [u8; 8] {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&record[i * 8..(i + 1) * 8]);
                buf
            };
            let values = (0..region_count)
                .map(|j| f64::from_le_bytes(word(2 + j)))
                .collect();
            (
                i64::from_le_bytes(word(0)),
                i64::from_le_bytes(word(1)),
                values,
            )
        })
        .collect()
}
