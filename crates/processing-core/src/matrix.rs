//! Buffering activity streams into region x time matrices.
//!
//! Windows follow count/skip semantics: a new window opens every
//! `skip_size` collections and closes once it holds `buffer_size` of them.
//! With `skip_size == buffer_size` windows tile the stream; smaller skips
//! overlap, larger skips leave gaps.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use fip_common::{FipError, FipResult};

use crate::activity::ActivityCollection;

/// A dense region x time matrix of first-channel activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMatrix {
    /// Number of regions.
    pub rows: usize,
    /// Number of frames.
    pub cols: usize,
    /// Row-major: `data[region * cols + frame]`.
    pub data: Vec<f64>,
}

impl ActivityMatrix {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    /// One region's trace across the window.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        Some(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Build a matrix from a full window of collections.
    pub fn from_window(window: &[ActivityCollection]) -> FipResult<Self> {
        let Some(first) = window.first() else {
            return Err(FipError::invalid_input("activity window is empty"));
        };
        if window.iter().any(|c| c.is_empty()) {
            return Err(FipError::invalid_input(
                "one or more collections have no regions",
            ));
        }
        let rows = first.len();
        if window.iter().any(|c| c.len() != rows) {
            return Err(FipError::invalid_input(
                "not all collections have the same number of regions",
            ));
        }

        let cols = window.len();
        let mut data = vec![0.0; rows * cols];
        for (i, collection) in window.iter().enumerate() {
            for (j, activity) in collection.iter().enumerate() {
                data[j * cols + i] = activity.value();
            }
        }
        Ok(Self { rows, cols, data })
    }
}

/// Push-based count/skip buffer over activity collections.
#[derive(Debug)]
pub struct ActivityBuffer {
    buffer_size: usize,
    skip_size: usize,
    seen: usize,
    open: VecDeque<Vec<ActivityCollection>>,
}

impl ActivityBuffer {
    pub fn new(buffer_size: usize, skip_size: usize) -> FipResult<Self> {
        if buffer_size == 0 || skip_size == 0 {
            return Err(FipError::invalid_configuration(format!(
                "buffer size ({buffer_size}) and skip size ({skip_size}) must be at least 1"
            )));
        }
        Ok(Self {
            buffer_size,
            skip_size,
            seen: 0,
            open: VecDeque::new(),
        })
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn skip_size(&self) -> usize {
        self.skip_size
    }

    /// Feed one collection. Returns the matrix of a window that just filled.
    ///
    /// With `skip_size <= buffer_size` at most one window completes per push.
    ///
    /// A collection with no regions, or with a region count that differs
    /// from the open windows, is rejected on arrival and leaves the
    /// buffer unchanged.
    pub fn push(&mut self, collection: ActivityCollection) -> FipResult<Option<ActivityMatrix>> {
        if collection.is_empty() {
            return Err(FipError::invalid_input("collection has no regions"));
        }
        let open_rows = self
            .open
            .iter()
            .find_map(|window| window.first())
            .map(ActivityCollection::len);
        if let Some(rows) = open_rows.filter(|rows| *rows != collection.len()) {
            return Err(FipError::invalid_input(format!(
                "collection has {} regions, open windows have {rows}",
                collection.len()
            )));
        }

        if self.seen % self.skip_size == 0 {
            self.open.push_back(Vec::with_capacity(self.buffer_size));
        }
        self.seen += 1;

        for window in self.open.iter_mut() {
            window.push(collection.clone());
        }

        match self.open.front() {
            Some(window) if window.len() == self.buffer_size => {
                let window = self.open.pop_front().unwrap_or_default();
                ActivityMatrix::from_window(&window).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Drop any partially filled windows.
    pub fn reset(&mut self) {
        self.seen = 0;
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::CircleActivity;
    use fip_rig_model::frame::Frame;
    use fip_rig_model::geometry::Circle;
    use std::sync::Arc;

    fn collection(values: &[f64]) -> ActivityCollection {
        let image = Arc::new(Frame::filled_f64(1, 1, 0.0).unwrap());
        let activities = values
            .iter()
            .map(|v| CircleActivity {
                circle: Circle::new(0.0, 0.0, 1.0),
                activity: vec![*v],
                image: Arc::clone(&image),
            })
            .collect();
        ActivityCollection::new(image, activities)
    }

    #[test]
    fn test_tiling_windows() {
        let mut buffer = ActivityBuffer::new(3, 3).unwrap();
        assert_eq!(buffer.push(collection(&[1.0, 10.0])).unwrap(), None);
        assert_eq!(buffer.push(collection(&[2.0, 20.0])).unwrap(), None);
        let matrix = buffer.push(collection(&[3.0, 30.0])).unwrap().unwrap();

        assert_eq!(matrix.rows, 2);
        assert_eq!(matrix.cols, 3);
        assert_eq!(matrix.row(0).unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(matrix.row(1).unwrap(), &[10.0, 20.0, 30.0]);
        assert_eq!(matrix.get(1, 2), Some(30.0));
        assert_eq!(matrix.get(2, 0), None);

        assert_eq!(buffer.push(collection(&[4.0, 40.0])).unwrap(), None);
    }

    #[test]
    fn test_overlapping_windows() {
        let mut buffer = ActivityBuffer::new(2, 1).unwrap();
        assert!(buffer.push(collection(&[1.0])).unwrap().is_none());
        let first = buffer.push(collection(&[2.0])).unwrap().unwrap();
        let second = buffer.push(collection(&[3.0])).unwrap().unwrap();
        assert_eq!(first.data, vec![1.0, 2.0]);
        assert_eq!(second.data, vec![2.0, 3.0]);
    }

    #[test]
    fn test_gapped_windows() {
        let mut buffer = ActivityBuffer::new(1, 2).unwrap();
        let emitted: Vec<Option<ActivityMatrix>> = (0..4)
            .map(|i| buffer.push(collection(&[i as f64])).unwrap())
            .collect();
        assert_eq!(emitted[0].as_ref().unwrap().data, vec![0.0]);
        assert!(emitted[1].is_none());
        assert_eq!(emitted[2].as_ref().unwrap().data, vec![2.0]);
        assert!(emitted[3].is_none());
    }

    #[test]
    fn test_shape_errors() {
        let mut buffer = ActivityBuffer::new(2, 2).unwrap();
        buffer.push(collection(&[1.0, 2.0])).unwrap();
        let err = buffer.push(collection(&[1.0])).unwrap_err();
        assert!(err.is_input());

        let mut buffer = ActivityBuffer::new(1, 1).unwrap();
        assert!(buffer.push(collection(&[])).unwrap_err().is_input());

        assert!(ActivityBuffer::new(0, 1).unwrap_err().is_configuration());
    }

    #[test]
    fn test_mismatch_rejected_on_arrival() {
        let mut buffer = ActivityBuffer::new(3, 1).unwrap();
        buffer.push(collection(&[1.0, 10.0])).unwrap();

        // Reported immediately, not when the window fills.
        assert!(buffer.push(collection(&[2.0])).unwrap_err().is_input());
        assert!(buffer.push(collection(&[])).unwrap_err().is_input());

        // The rejected pushes left the windows untouched.
        assert!(buffer.push(collection(&[2.0, 20.0])).unwrap().is_none());
        let matrix = buffer.push(collection(&[3.0, 30.0])).unwrap().unwrap();
        assert_eq!(matrix.row(0).unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(matrix.row(1).unwrap(), &[10.0, 20.0, 30.0]);
    }
}
