//! Test fixtures for slipway unit tests.
//!
//! Only available when compiling tests.

pub mod fixtures;
