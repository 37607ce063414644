//! G-Code line parsing
//!
//! This module provides:
//! - Comment stripping (parenthetical and semicolon style)
//! - Word tokenization into letter/value pairs
//! - Detection of lines the VM flags as invalid input

pub mod parser;

pub use parser::*;
