//! Noor Core: shared error taxonomy and configuration.

pub mod config;
pub mod error;

pub use config::{DataPaths, NoorConfig, SearchSettings};
pub use error::{Error, Result};
