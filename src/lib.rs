// src/lib.rs
//! Cairn 3D Engine
//!
//! A compact scene renderer built on wgpu and winit: primitive and OBJ
//! meshes with Blinn-Phong shading, shadow mapping, fog and bloom, a
//! parent-linked scene graph, keyframe animation, billboard particles,
//! and ray picking. All state lives in an explicit [`Engine`] context;
//! frames follow a begin/draw/end protocol.

pub mod arena;
pub mod engine;
pub mod error;
pub mod gfx;
pub mod input;
pub mod math;
pub mod particles;
pub mod prelude;
pub mod scene;
pub mod spatial;
pub mod timing;

pub use arena::Handle;
pub use engine::{DrawCommand, Engine, FrameStage, TrackKind};
pub use error::EngineError;
