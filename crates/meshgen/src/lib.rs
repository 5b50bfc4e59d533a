//! CPU mesh construction and renderer contracts for OpenTerra.
//!
//! Everything here stops at data the renderer collaborator consumes:
//! vertex/index buffers as `Pod` slices, and the per-frame uniform block.
//! No GPU resource is created in this crate.

pub mod lake;
pub mod river;
pub mod terrain;
pub mod uniforms;
pub mod vertex;
pub mod water;

pub use lake::*;
pub use river::*;
pub use terrain::*;
pub use uniforms::*;
pub use vertex::*;
pub use water::*;
