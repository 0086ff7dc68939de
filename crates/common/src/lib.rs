//! Shared types for rainglass: GUI-bound scene parameters, the daylight
//! model and startup configuration.
//!
//! # Invariants
//! - Parameter values are always inside their key's range; rejected writes
//!   leave state untouched.
//! - Nothing here touches the GPU.

pub mod config;
pub mod params;
pub mod sky;

pub use config::{ConfigError, SceneConfig, ShaderNames};
pub use params::{IorPreset, ParamError, ParamKey, ParameterSink, SceneParams, SkyParams};
pub use sky::{SkyModel, sun_direction, sun_intensity};

pub fn crate_info() -> &'static str {
    "rainglass-common v0.1.0"
}
