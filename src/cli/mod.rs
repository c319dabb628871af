//! CLI-specific utilities for osm-osw
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod progress;

pub use progress::ProgressManager;
