#![forbid(unsafe_code)]

//! Control an emulated game from an external decision agent.
//!
//! The emulator connects over TCP, streams a progress line and a bundle of
//! frames every window, and receives one line of inputs back. The
//! [`session::ControlLoop`] decides what goes back, within a carried-over
//! time budget, and records every episode for later analysis.

pub mod agent;
pub mod config;
pub mod errors;
pub mod frames;
pub mod models;
pub mod recorder;
pub mod session;
pub mod transport;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
