//! Common utilities for docwalk
//!
//! This crate provides the error taxonomy shared by the workflow library and the CLI.

pub mod error;

pub use error::{DocwalkError, Result};
