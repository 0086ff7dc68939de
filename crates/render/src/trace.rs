use crate::frame::{FrameBackend, FrameUniforms, Layer, ParamUniforms, RenderPass, RenderTarget};
use std::fmt;

/// Errors from the trace backend.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("{target} pass requested before the offscreen pass of this frame")]
    PassOrder { target: RenderTarget },
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Params {
        ior: f32,
        rain_intensity: f32,
        exposure: f32,
        sun: [f32; 3],
    },
    Frame {
        time: f32,
        eye: [f32; 3],
    },
    Pass {
        target: RenderTarget,
        layers: Vec<Layer>,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Params {
                ior,
                rain_intensity,
                exposure,
                sun,
            } => write!(
                f,
                "params ior={ior:.3} rain={rain_intensity:.2} exposure={exposure:.4} sun=({:.3}, {:.3}, {:.3})",
                sun[0], sun[1], sun[2]
            ),
            TraceEvent::Frame { time, eye } => write!(
                f,
                "frame t={time:.3}s eye=({:.2}, {:.2}, {:.2})",
                eye[0], eye[1], eye[2]
            ),
            TraceEvent::Pass { target, layers } => write!(f, "  pass {target} {layers:?}"),
        }
    }
}

/// Headless backend that records every call as text.
///
/// Used by the CLI and tests in place of a GPU. Enforces the same pass
/// ordering rule as the GPU backend.
#[derive(Debug, Default)]
pub struct TraceBackend {
    events: Vec<TraceEvent>,
    offscreen_ready: bool,
}

impl TraceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Count of passes recorded for `target`.
    pub fn pass_count(&self, target: RenderTarget) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Pass { target: t, .. } if *t == target))
            .count()
    }

    /// All events, one per line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&event.to_string());
            out.push('\n');
        }
        out
    }
}

impl FrameBackend for TraceBackend {
    type Error = TraceError;

    fn upload_params(&mut self, params: &ParamUniforms) -> Result<(), TraceError> {
        self.events.push(TraceEvent::Params {
            ior: params.ior,
            rain_intensity: params.rain_intensity,
            exposure: params.exposure,
            sun: params.sky.sun_direction.to_array(),
        });
        Ok(())
    }

    fn upload_frame(&mut self, frame: &FrameUniforms) -> Result<(), TraceError> {
        self.offscreen_ready = false;
        self.events.push(TraceEvent::Frame {
            time: frame.time,
            eye: frame.camera_position.to_array(),
        });
        Ok(())
    }

    fn render(&mut self, pass: &RenderPass) -> Result<(), TraceError> {
        match pass.target {
            RenderTarget::Offscreen => self.offscreen_ready = true,
            RenderTarget::Screen if !self.offscreen_ready => {
                return Err(TraceError::PassOrder {
                    target: pass.target,
                });
            }
            RenderTarget::Screen => {}
        }
        self.events.push(TraceEvent::Pass {
            target: pass.target,
            layers: pass.layers.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameLoop, SCREEN_PASS};
    use rainglass_common::{ParamKey, ParameterSink, SceneParams};
    use std::time::Duration;

    #[test]
    fn records_two_passes_per_frame() {
        let mut fl = FrameLoop::new(SceneParams::default(), 640, 480);
        let mut backend = TraceBackend::new();
        for _ in 0..4 {
            fl.tick(Duration::from_millis(16), &mut backend).unwrap();
        }
        assert_eq!(backend.pass_count(RenderTarget::Offscreen), 4);
        assert_eq!(backend.pass_count(RenderTarget::Screen), 4);

        let text = backend.render_text();
        assert!(text.starts_with("params ior=1.000"));
        assert!(text.contains("pass offscreen [Background]"));
        assert!(text.contains("pass screen [Background, Viewport]"));
    }

    #[test]
    fn screen_before_offscreen_is_rejected() {
        let mut backend = TraceBackend::new();
        let err = backend.render(&SCREEN_PASS).unwrap_err();
        assert!(matches!(
            err,
            TraceError::PassOrder {
                target: RenderTarget::Screen
            }
        ));
    }

    #[test]
    fn gui_change_shows_up_once() {
        let mut fl = FrameLoop::new(SceneParams::default(), 640, 480);
        let mut backend = TraceBackend::new();
        fl.tick(Duration::from_millis(16), &mut backend).unwrap();
        fl.apply_parameter(ParamKey::Elevation, 90.0).unwrap();
        fl.tick(Duration::from_millis(16), &mut backend).unwrap();
        fl.tick(Duration::from_millis(16), &mut backend).unwrap();

        let params: Vec<_> = backend
            .events()
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Params { sun, .. } => Some(*sun),
                _ => None,
            })
            .collect();
        assert_eq!(params.len(), 2);
        assert!((params[1][1] - 1.0).abs() < 1e-5);
    }
}
