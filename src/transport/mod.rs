//! Line-framed transport to the emulator process.
//!
//! Three message shapes travel over one TCP connection:
//!
//! | Shape  | Framing                                               |
//! |--------|-------------------------------------------------------|
//! | string | UTF-8 text terminated by `\n`                         |
//! | number | decimal integer as a string line                      |
//! | blob   | raw bytes, length sent as a number line just before   |
//!
//! - `listener`: binds the port and waits for the emulator to connect.
//! - `channel`: [`EmulatorChannel`] read/write primitives over any async stream.

pub mod channel;
pub mod listener;

pub use channel::{EmulatorChannel, MAX_BLOB_BYTES, MAX_LINE_BYTES};
pub use listener::EmulatorListener;
