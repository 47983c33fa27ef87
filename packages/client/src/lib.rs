//! Relaycast participant client.
//!
//! Plays the broadcaster or viewer side of a session over the relay's
//! signaling channel. Media is delegated to a [`media::MediaEngine`].

pub mod driver;
pub mod error;
pub mod formatter;
pub mod media;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::{ClientOptions, Role, run_client};
