//! # Cairn Prelude
//!
//! A convenient way to import the types a typical host application needs.
//!
//! ```rust
//! use cairn::prelude::*;
//! ```

// Re-export the engine context and frame types
pub use crate::engine::{DrawCommand, Engine, FrameStage, TrackKind};
pub use crate::error::EngineError;

// Re-export handles and scene types
pub use crate::arena::Handle;
pub use crate::scene::{Animation, Camera, FogMode, Lighting, Material, Node, Scene};

// Re-export geometry generation
pub use crate::gfx::geometry::{
    generate_capsule, generate_cube, generate_cylinder, generate_plane, generate_sphere,
    generate_torus, GeometryData,
};

// Re-export particles and spatial queries
pub use crate::particles::Emitter;
pub use crate::spatial::{Aabb, Ray, RayHit};

// Re-export common external dependencies
pub use cgmath::{InnerSpace, Vector3, Zero};
