//! Procedural terrain generation pipeline for OpenTerra.
//!
//! A deterministic, chunked computation that turns a compact set of
//! intent parameters into fully attributed terrain: heightmap and erosion,
//! drainage, rivers, lakes, ocean connectivity, hydrology, climate,
//! biomes, and surface materials. Everything is a pure function of
//! `(world seed, settings, world coordinates)`.

pub mod biome;
pub mod climate;
pub mod debug;
pub mod drainage;
pub mod fields;
pub mod heightmap;
pub mod hydrology;
pub mod intent;
pub mod lakes;
pub mod material;
pub mod noise;
pub mod ocean;
pub mod rivers;
pub mod settings;
pub mod wetland;

pub use biome::*;
pub use climate::*;
pub use drainage::*;
pub use fields::*;
pub use heightmap::*;
pub use hydrology::*;
pub use intent::*;
pub use lakes::*;
pub use material::*;
pub use noise::*;
pub use ocean::*;
pub use rivers::*;
pub use settings::*;
pub use wetland::*;
