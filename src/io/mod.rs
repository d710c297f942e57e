//! File I/O utilities.
//!
//! Reading device captures and reading/writing JSON preference profiles.

pub mod files;

pub use files::{read_capture, read_profile, write_file, write_profile};
