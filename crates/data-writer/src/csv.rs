//! CSV activity writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use fip_common::error::{FipError, FipResult};
use fip_processing_core::activity::ActivityCollection;
use fip_rig_model::frame::FipFrame;

use crate::RegionCount;

/// Writes one CSV row per frame: metadata columns, then the background
/// region, then the remaining regions.
///
/// The file is created lazily on the first record so the header can be
/// sized from that record's region count.
pub struct FipCsvWriter {
    path: PathBuf,
    overwrite: bool,
    regions: RegionCount,
    writer: Option<BufWriter<File>>,
    records_written: u64,
}

impl FipCsvWriter {
    /// Number of metadata columns before the region values.
    pub const METADATA_COLUMNS: usize = 3;

    /// Create a writer for `path`, which must have a `.csv` extension.
    pub fn new(path: impl Into<PathBuf>) -> FipResult<Self> {
        let path = path.into();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(FipError::invalid_configuration(format!(
                "file extension must be .csv: {}",
                path.display()
            )));
        }
        Ok(Self {
            path,
            overwrite: true,
            regions: RegionCount::new(None),
            writer: None,
            records_written: 0,
        })
    }

    /// Fix the region count up front instead of taking it from the first
    /// record.
    pub fn with_expected_region_count(mut self, count: usize) -> Self {
        self.regions = RegionCount::new(Some(count));
        self
    }

    /// Refuse to replace an existing file.
    pub fn no_overwrite(mut self) -> Self {
        self.overwrite = false;
        self
    }

    /// Header row for a stream with `region_count` regions.
    pub fn header(region_count: usize) -> String {
        let mut columns = vec![
            "FrameNumber".to_string(),
            "FrameTime".to_string(),
            "CameraSource".to_string(),
            "Background".to_string(),
        ];
        columns.extend((1..region_count).map(|i| format!("Region{i}")));
        columns.join(",")
    }

    fn open(&mut self, region_count: usize) -> FipResult<BufWriter<File>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options.open(&self.path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", Self::header(region_count))?;
        tracing::info!(path = %self.path.display(), region_count, "Opened CSV activity file");
        Ok(writer)
    }

    /// Append one frame's activities.
    pub fn write(&mut self, frame: &FipFrame, activities: &ActivityCollection) -> FipResult<()> {
        let region_count = self.regions.check(activities.len())?;

        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open(region_count)?,
        };
        let writer = self.writer.insert(writer);

        let mut values = Vec::with_capacity(Self::METADATA_COLUMNS + region_count);
        values.push(frame.frame_number.to_string());
        values.push(frame.frame_time.to_string());
        values.push(frame.source.map(|s| s.to_string()).unwrap_or_default());
        values.extend(activities.values().iter().map(|v| v.to_string()));

        writeln!(writer, "{}", values.join(","))?;
        writer.flush()?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of rows written, excluding the header.
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

impl Drop for FipCsvWriter {
    fn drop(&mut self) {
        let _ = self.flush();
        if self.writer.is_some() {
            tracing::info!(
                path = %self.path.display(),
                records = self.records_written,
                "Closed CSV activity file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fip_processing_core::activity::RegionActivityReducer;
    use fip_processing_core::reduce::ReduceOperation;
    use fip_rig_model::frame::{CameraSource, Frame};
    use fip_rig_model::geometry::Circle;
    use std::sync::Arc;

    fn record(regions: usize, number: i64) -> (FipFrame, ActivityCollection) {
        let image = Arc::new(Frame::filled_f64(20, 20, 2.0).unwrap());
        let circles = (0..regions)
            .map(|i| Circle::new(3.0 + 4.0 * i as f64, 10.0, 1.0))
            .collect();
        let mut reducer = RegionActivityReducer::new(circles, ReduceOperation::Sum).unwrap();
        let activities = reducer.process(&image).unwrap();
        (
            FipFrame::new(image, CameraSource::Green, number, number * 1000),
            activities,
        )
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let err = FipCsvWriter::new("activity.txt").err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(
            FipCsvWriter::header(3),
            "FrameNumber,FrameTime,CameraSource,Background,Region1,Region2"
        );
        assert_eq!(
            FipCsvWriter::header(1),
            "FrameNumber,FrameTime,CameraSource,Background"
        );
    }

    #[test]
    fn test_csv_writer_rows() {
        let dir = std::env::temp_dir().join("fip_test_csv_writer");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("green.csv");

        {
            let mut writer = FipCsvWriter::new(&path).unwrap();
            for n in 0..3 {
                let (frame, activities) = record(3, n);
                writer.write(&frame, &activities).unwrap();
            }
            assert_eq!(writer.records_written(), 3);

            let (frame, activities) = record(2, 3);
            let err = writer.write(&frame, &activities).unwrap_err();
            assert!(err.is_input());
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4); // 1 header + 3 rows
        assert_eq!(lines[0], FipCsvWriter::header(3));
        // Radius-1 disk holds 5 pixels of value 2.
        assert_eq!(lines[2], "1,1000,Green,10,10,10");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_expected_count_checked_before_open() {
        let dir = std::env::temp_dir().join("fip_test_csv_expected");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("red.csv");

        let mut writer = FipCsvWriter::new(&path)
            .unwrap()
            .with_expected_region_count(4);
        let (frame, activities) = record(2, 0);
        assert!(writer.write(&frame, &activities).is_err());
        assert!(!path.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
