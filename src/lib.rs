//! Falling-sand particle simulation core.
//!
//! Particles live on a `width` x `height` cell grid but move in fixed-point
//! sub-cell units ([`core::SUBUNITS_PER_CELL`] per cell), which buys smooth
//! acceleration without floating-point state. Collisions are resolved against
//! a bit-packed occupancy grid, one bit per cell.
//!
//! The host drives the engine: set a gravity vector (e.g. from a pointer
//! position), call [`core::Simulation::tick`] at a fixed cadence, then read
//! particle positions, colors and cell occupancy to draw a frame. Window
//! setup, shaders and input mapping stay outside this crate; the `python`
//! cargo feature exposes the same surface to a Python host.

pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod python;
