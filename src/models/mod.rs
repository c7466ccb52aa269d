//! Domain model module declarations.

pub mod game;
pub mod input;
pub mod outcome;
pub mod progress;
pub mod session;
