//! opsearch library
//!
//! Debounced, cancellable client for the operator registry search API.

pub mod cli;
pub mod config;
pub mod controller;
pub mod logging;
pub mod search;

pub use controller::{ControllerOptions, SearchController, SearchState};
pub use search::{ResultRecord, SearchBackend, SearchError};
