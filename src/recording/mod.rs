//! Recording: capture intercepted traffic for the running test case

mod recorder;

pub use recorder::{normalize_exchange, snapshot_timestamp, Recorder};
