//! Core 3-D pipe growth library.
//!
//! A single path of unit segments grows through a bounded lattice, one
//! segment per tick, turning in a random free direction each time and
//! restarting from a fresh cell when it gets stuck.
//!
//! Main components:
//! - [`lattice`] — directions, bounding box and cell/world conversion.
//! - [`occupancy`] — the append-only set of filled cells.
//! - [`sampler`] — randomized choice of the next free direction.
//! - [`relocation`] — bounded search for a fresh start cell.
//! - [`engine`] — the tick-driven growth state machine.
//! - [`config`] — session configuration and its validation.
//! - [`error`] — configuration and growth errors.
//! - [`types`] — shared type aliases and small value types.

pub mod config;
pub mod engine;
pub mod error;
pub mod lattice;
pub mod occupancy;
pub mod relocation;
pub mod sampler;
pub mod types;
