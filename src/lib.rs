//! # Club Standings
//!
//! Monthly standings for a small chess club, computed from chess.com game
//! archives on every request.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (games, roster, months, standings)
//! - **fetch**: chess.com client behind the `GameSource` trait
//! - **calculate**: Dedup, month grouping and standings computation
//! - **aggregate**: Concurrent per-player fetch feeding the calculation engine
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod aggregate;
pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;

pub use models::*;
