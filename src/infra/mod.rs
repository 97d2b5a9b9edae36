//! Infrastructure layer
//!
//! Handles all I/O operations: directory resolution and file access.
//! This module is the only place where side effects occur.

pub mod dirs;
pub mod filesystem;
