//! The `utils` module provides shared pieces used across `atc-watch`:
//! the error types for each boundary and the logging bootstrap.

pub mod error;
pub mod logging;
