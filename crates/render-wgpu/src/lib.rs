//! wgpu render backend for the rainglass scene.
//!
//! Draws a Preetham sky, a textured ground disk and a sphere, then a quad
//! whose GLSL comes from the shader registry and refracts an offscreen copy
//! of the background.
//!
//! # Invariants
//! - Each frame renders the offscreen target before the screen.
//! - The viewport quad is never drawn into the texture it samples.
//! - Parameter uniforms are only written when the frame loop uploads them.

mod gpu;
pub mod mesh;
mod shaders;
pub mod texture;

pub use gpu::{RenderError, ViewportShaders, WgpuFrame, WgpuRenderer};
pub use texture::{ColorSpace, SurfaceMaps, TextureImage};
