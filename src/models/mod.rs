//! Core data models for the match tracker.

mod color;
mod game;
mod ids;
mod stats;

pub use color::*;
pub use game::*;
pub use ids::*;
pub use stats::*;
