//! Configuration Module
//!
//! Loads settings from TOML files and the environment (`.env` included).

mod types;

pub use types::*;
