//! Side-scrolling arcade shooter core.
//!
//! The library holds the whole simulation: entities, per-frame rules, the
//! screen state machine and the draw routines. Terminal I/O, keyboard capture
//! and the frame clock live in the binary.

pub mod audio;
pub mod compute;
pub mod config;
pub mod entities;
pub mod input;
pub mod render;
pub mod state;

pub use config::{ConfigError, GameConfig};
pub use state::{Game, Screen};
