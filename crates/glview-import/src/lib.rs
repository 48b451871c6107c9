//! glview Import - GLB decoding
//!
//! Turns the bytes of a `.glb` file into CPU-side meshes, materials and
//! RGBA8 textures with every node transform baked into the vertices.
//! [`DecodeJob`] runs that work on a background thread and reports
//! progress over a channel so the UI thread never blocks.

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod glb;
mod job;
mod types;

pub use glb::decode_glb;
pub use job::{DecodeEvent, DecodeJob, LoadProgress, STREAM_CHUNK_BYTES};
pub use types::{
    AlphaMode, ImportResult, ImportedMaterial, ImportedMesh, ImportedTexture, MeshBounds,
    ModelStats,
};
