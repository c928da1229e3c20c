//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - Test fixtures and PDF builders
//! - A recording engine double for driving the executor without MuPDF
//! - Custom assertions

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod recording_engine;

pub use assertions::*;
pub use fixtures::*;
pub use recording_engine::*;
