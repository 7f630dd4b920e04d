//! Integration test utilities for the feed relay and viewer
//!
//! This crate provides helpers for running a relay over a temporary message
//! log and driving it end to end.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
