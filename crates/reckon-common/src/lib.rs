//! Common utilities and data structures for Reckon.
//!
//! This crate provides foundational types used across the Reckon crates:
//! - `Span`: Source code location tracking
//! - `SourceMap`: Byte offset to line/column resolution for error messages

mod source_map;
mod span;

pub use source_map::{LineCol, SourceMap};
pub use span::{BytePos, Span};
