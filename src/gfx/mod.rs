//! # Graphics Module
//!
//! Everything that touches the GPU: mesh geometry and OBJ loading, vertex
//! layouts, texture and mip-chain handling, uniform buffer plumbing, the
//! pipeline cache, and the renderer that executes a recorded frame as
//! shadow, main, particle and post-process passes.

pub mod geometry;
pub mod pipelines;
pub mod renderer;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use renderer::Renderer;
pub use texture::TextureResource;
pub use vertex::{ParticleInstance, Vertex3D};
