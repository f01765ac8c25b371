// Library surface for the binary, headless integration tests and editor hosts.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod language_stats;
pub mod logging;
pub mod metrics;
pub mod rate;
pub mod runtime;
pub mod session;
pub mod store;
pub mod time_series;
pub mod timer;
pub mod tracker;

pub use error::{Error, Result};
pub use tracker::{Command, Tracker};
