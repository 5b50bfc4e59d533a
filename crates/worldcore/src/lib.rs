//! Core types shared by every terrain generation system in OpenTerra.
//!
//! This crate provides the foundational pieces used across the pipeline:
//! - Row-major grid fields
//! - Chunk coordinates and deterministic chunk seeds
//! - Pipeline stage ordering and validation
//! - The error taxonomy for generation failures

pub mod coords;
pub mod error;
pub mod grid;
pub mod pipeline;

pub use coords::*;
pub use error::*;
pub use grid::*;
pub use pipeline::*;

// Re-export commonly used types
pub use glam::{IVec2, Vec2, Vec3};
