//! Stubtape - record backend traffic once, replay it in every later test run
//!
//! In record mode the intercepted API calls of each test case are written to a
//! JSON fixture next to the test. In replay mode those fixtures become exact
//! stubs, so the suite runs without a live backend.

#![deny(unsafe_code)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod hosts;
pub mod network;
pub mod recording;
pub mod replay;
pub mod storage;

pub use error::{Result, StubtapeError};
