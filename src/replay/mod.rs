//! Replay: serve recorded responses as stubs

mod replayer;

pub use replayer::Replayer;
