//! OCR text-extraction collaborator interface.
//!
//! The recognizer itself (on-device vision framework) is a black box
//! owned by the host app. This crate defines the payloads it hands the
//! matching engine: structured recognizer output, JSON parsing for it,
//! flattening into a single extracted string with a confidence, and a
//! mock scanner for engine tests.

pub mod extraction;

pub use extraction::*;
