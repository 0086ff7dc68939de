use crate::camera::OrbitCamera;
use glam::{Mat4, Vec2, Vec3};
use rainglass_common::{ParamError, ParamKey, ParameterSink, SceneParams, SkyModel};
use std::fmt;
use std::time::Duration;

/// Where a pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// Offscreen colour target later sampled by the viewport quad.
    Offscreen,
    /// The visible surface.
    Screen,
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderTarget::Offscreen => f.write_str("offscreen"),
            RenderTarget::Screen => f.write_str("screen"),
        }
    }
}

/// Groups of scene content a pass may draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Sky, ground and sphere.
    Background,
    /// The refractive quad that samples the offscreen target.
    Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPass {
    pub target: RenderTarget,
    pub layers: &'static [Layer],
}

impl RenderPass {
    pub fn draws(&self, layer: Layer) -> bool {
        self.layers.contains(&layer)
    }
}

/// The quad is left out so it never samples the texture it is drawn into.
pub const OFFSCREEN_PASS: RenderPass = RenderPass {
    target: RenderTarget::Offscreen,
    layers: &[Layer::Background],
};

pub const SCREEN_PASS: RenderPass = RenderPass {
    target: RenderTarget::Screen,
    layers: &[Layer::Background, Layer::Viewport],
};

/// Passes of one frame, in submission order.
pub const FRAME_PASSES: [RenderPass; 2] = [OFFSCREEN_PASS, SCREEN_PASS];

/// Values that change every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view_proj: Mat4,
    pub inv_view_proj: Mat4,
    pub camera_position: Vec3,
    /// Seconds since the loop started.
    pub time: f32,
}

/// Values derived from the GUI parameters; re-uploaded only after a change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamUniforms {
    pub sky: SkyModel,
    pub exposure: f32,
    pub ior: f32,
    pub rain_intensity: f32,
    /// Physical size of the screen target in pixels.
    pub resolution: Vec2,
}

/// Receives uniform updates and draw requests for one frame.
pub trait FrameBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    fn upload_params(&mut self, params: &ParamUniforms) -> Result<(), Self::Error>;

    fn upload_frame(&mut self, frame: &FrameUniforms) -> Result<(), Self::Error>;

    fn render(&mut self, pass: &RenderPass) -> Result<(), Self::Error>;
}

/// Summary of one `tick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub dt: Duration,
    pub elapsed: Duration,
    pub params_uploaded: bool,
    pub passes: usize,
}

/// The steady-state run loop, one iteration per call to [`FrameLoop::tick`].
///
/// The caller decides when the next frame happens (a window redraw, a CLI
/// loop, a test); nothing here schedules itself.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    params: SceneParams,
    camera: OrbitCamera,
    resolution: Vec2,
    dirty: bool,
    frames: u64,
    elapsed: Duration,
}

impl FrameLoop {
    pub fn new(params: SceneParams, width: u32, height: u32) -> Self {
        let mut camera = OrbitCamera::default();
        camera.set_viewport(width, height);
        Self {
            params,
            camera,
            resolution: Vec2::new(width.max(1) as f32, height.max(1) as f32),
            dirty: true,
            frames: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the next tick will re-upload parameter uniforms.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        self.resolution = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        self.dirty = true;
    }

    pub fn param_uniforms(&self) -> ParamUniforms {
        ParamUniforms {
            sky: SkyModel::from_params(&self.params.sky),
            exposure: self.params.exposure,
            ior: self.params.ior,
            rain_intensity: self.params.rain_intensity,
            resolution: self.resolution,
        }
    }

    pub fn frame_uniforms(&self) -> FrameUniforms {
        let view_proj = self.camera.view_projection();
        FrameUniforms {
            view_proj,
            inv_view_proj: view_proj.inverse(),
            camera_position: self.camera.position(),
            time: self.elapsed.as_secs_f32(),
        }
    }

    /// Render one frame: offscreen target first, then the screen.
    ///
    /// If any backend call fails the error is returned and pending parameter
    /// changes stay queued for the next tick.
    pub fn tick<B: FrameBackend>(
        &mut self,
        dt: Duration,
        backend: &mut B,
    ) -> Result<FrameStats, B::Error> {
        let _span = tracing::debug_span!("frame", frame = self.frames).entered();
        self.frames += 1;
        self.elapsed += dt;

        let params_uploaded = self.dirty;
        if self.dirty {
            backend.upload_params(&self.param_uniforms())?;
            self.dirty = false;
            tracing::trace!("parameter uniforms uploaded");
        }

        backend.upload_frame(&self.frame_uniforms())?;
        for pass in &FRAME_PASSES {
            backend.render(pass)?;
        }

        Ok(FrameStats {
            frame: self.frames,
            dt,
            elapsed: self.elapsed,
            params_uploaded,
            passes: FRAME_PASSES.len(),
        })
    }
}

impl ParameterSink for FrameLoop {
    fn apply_parameter(&mut self, key: ParamKey, value: f32) -> Result<(), ParamError> {
        if self.params.set(key, value)? {
            self.dirty = true;
            tracing::debug!(%key, value, "parameter changed");
        }
        Ok(())
    }
}
