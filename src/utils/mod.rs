//! Shared utility functions.
//!
//! - `html`: XML escaping for annotated text

pub mod html;
