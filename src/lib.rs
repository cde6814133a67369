//! Claimline Server Library
//!
//! Authoritative core of a real-time multiplayer territory-capture game.
//! Players move continuously inside a circular arena, each owning a closed
//! polygonal territory; leaving it draws a deadly trail, and closing a loop
//! merges the enclosed area back into the territory. The simulation runs a
//! fixed 60 Hz tick per room and projects compact flat-array snapshots for
//! the transport layer to broadcast.

pub mod config;
pub mod game;
pub mod health;
pub mod lobby;
pub mod net;
pub mod util;
