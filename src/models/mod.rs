//! Core data models for club standings.

mod game;
mod ids;
mod month;
mod roster;
mod stats;

pub use game::*;
pub use ids::*;
pub use month::*;
pub use roster::*;
pub use stats::*;
