//! Renderer-agnostic frame sequencing for rainglass.
//!
//! Each frame renders the background into an offscreen target, then renders
//! background plus the refractive viewport quad to the screen. GPU backends
//! implement [`FrameBackend`]; [`TraceBackend`] records calls for headless use.
//!
//! # Invariants
//! - Within a frame the offscreen pass always precedes the screen pass.
//! - Parameter uniforms are uploaded once per change, never per frame.
//! - The loop is driven from outside; a tick never schedules the next one.

mod camera;
mod context;
mod frame;
mod trace;

pub use camera::OrbitCamera;
pub use context::{AppContext, InitError};
pub use frame::{
    FRAME_PASSES, FrameBackend, FrameLoop, FrameStats, FrameUniforms, Layer, OFFSCREEN_PASS,
    ParamUniforms, RenderPass, RenderTarget, SCREEN_PASS,
};
pub use trace::{TraceBackend, TraceError, TraceEvent};

pub fn crate_info() -> &'static str {
    "rainglass-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
