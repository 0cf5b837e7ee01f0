//! Arena Shooter Server Library
//!
//! Authoritative simulation for a top-down multiplayer arena shooter:
//! hitscan combat, pickups, bots that fill empty seats, and a fixed 60 Hz
//! tick that broadcasts a full snapshot to every client over TCP.

pub mod config;
pub mod game;
pub mod net;
pub mod util;
