//! Diagnostics sink for raw numeric dumps.
//!
//! Dumps are a side channel: they carry no algorithmic state, and a sink may
//! drop the data entirely. The subtractor emits per-block snapshots of the
//! adaptation gains and filter coefficients through this port.

use std::cell::RefCell;
use std::rc::Rc;

/// Sink for named raw float dumps emitted during processing.
pub trait DataDumper {
    /// Records `data` under `name`. Called repeatedly with the same name for
    /// successive snapshots of the same quantity.
    fn dump_raw(&mut self, name: &str, data: &[f32]);
}

/// Discards every dump.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDataDumper;

impl DataDumper for NullDataDumper {
    fn dump_raw(&mut self, _name: &str, _data: &[f32]) {}
}

/// Keeps every dump in memory, in arrival order.
///
/// Clones share the same storage, so a test can hand one handle to the
/// subtractor and inspect the dumps through another.
#[derive(Debug, Default, Clone)]
pub struct RecordingDataDumper {
    records: Rc<RefCell<Vec<(String, Vec<f32>)>>>,
}

impl RecordingDataDumper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded snapshots for `name`, oldest first.
    pub fn records(&self, name: &str) -> Vec<Vec<f32>> {
        self.records
            .borrow()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
            .collect()
    }

    /// Returns every dump name in arrival order, including repeats.
    pub fn names(&self) -> Vec<String> {
        self.records.borrow().iter().map(|(n, _)| n.clone()).collect()
    }
}

impl DataDumper for RecordingDataDumper {
    fn dump_raw(&mut self, name: &str, data: &[f32]) {
        self.records
            .borrow_mut()
            .push((name.to_owned(), data.to_vec()));
    }
}
