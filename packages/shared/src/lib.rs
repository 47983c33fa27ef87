//! Utilities shared by the relay server and the participant client.

pub mod logger;
pub mod time;
