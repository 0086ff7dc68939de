use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Identifies one GUI-bound scene parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    RainIntensity,
    Ior,
    Turbidity,
    Rayleigh,
    MieCoefficient,
    MieDirectionalG,
    Elevation,
    Azimuth,
    Exposure,
}

impl ParamKey {
    pub const ALL: [ParamKey; 9] = [
        ParamKey::RainIntensity,
        ParamKey::Ior,
        ParamKey::Turbidity,
        ParamKey::Rayleigh,
        ParamKey::MieCoefficient,
        ParamKey::MieDirectionalG,
        ParamKey::Elevation,
        ParamKey::Azimuth,
        ParamKey::Exposure,
    ];

    /// Keys shown in the daylight section of the GUI, in display order.
    pub const DAYLIGHT: [ParamKey; 7] = [
        ParamKey::Turbidity,
        ParamKey::Rayleigh,
        ParamKey::MieCoefficient,
        ParamKey::MieDirectionalG,
        ParamKey::Elevation,
        ParamKey::Azimuth,
        ParamKey::Exposure,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamKey::RainIntensity => "rain_intensity",
            ParamKey::Ior => "ior",
            ParamKey::Turbidity => "turbidity",
            ParamKey::Rayleigh => "rayleigh",
            ParamKey::MieCoefficient => "mie_coefficient",
            ParamKey::MieDirectionalG => "mie_directional_g",
            ParamKey::Elevation => "elevation",
            ParamKey::Azimuth => "azimuth",
            ParamKey::Exposure => "exposure",
        }
    }

    /// Human-readable label for widgets.
    pub fn label(self) -> &'static str {
        match self {
            ParamKey::RainIntensity => "Rain",
            ParamKey::Ior => "Index Of Refraction",
            ParamKey::Turbidity => "turbidity",
            ParamKey::Rayleigh => "rayleigh",
            ParamKey::MieCoefficient => "mieCoefficient",
            ParamKey::MieDirectionalG => "mieDirectionalG",
            ParamKey::Elevation => "elevation",
            ParamKey::Azimuth => "azimuth",
            ParamKey::Exposure => "exposure",
        }
    }

    /// Accepted values, inclusive on both ends.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            ParamKey::RainIntensity => 0.0..=1.0,
            ParamKey::Ior => 1.0..=2.0,
            ParamKey::Turbidity => 0.0..=20.0,
            ParamKey::Rayleigh => 0.0..=4.0,
            ParamKey::MieCoefficient => 0.0..=0.1,
            ParamKey::MieDirectionalG => 0.0..=1.0,
            ParamKey::Elevation => 0.0..=90.0,
            ParamKey::Azimuth => -180.0..=180.0,
            ParamKey::Exposure => 0.0..=1.0,
        }
    }

    /// Slider step.
    pub fn step(self) -> f32 {
        match self {
            ParamKey::RainIntensity => 0.01,
            ParamKey::Ior => 0.001,
            ParamKey::Turbidity | ParamKey::Elevation | ParamKey::Azimuth => 0.1,
            ParamKey::Rayleigh | ParamKey::MieCoefficient | ParamKey::MieDirectionalG => 0.001,
            ParamKey::Exposure => 0.0001,
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamKey {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamKey::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ParamError::UnknownKey(s.to_string()))
    }
}

/// Errors from parameter updates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("{key} = {value} is outside {min}..={max}")]
    OutOfRange {
        key: ParamKey,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{key} must be a finite number")]
    NotFinite { key: ParamKey },
    #[error("unknown parameter: {0}")]
    UnknownKey(String),
}

/// Refraction presets offered by the GUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IorPreset {
    Air,
    Ice,
    Water,
    Glass,
}

impl IorPreset {
    pub const ALL: [IorPreset; 4] = [IorPreset::Air, IorPreset::Ice, IorPreset::Water, IorPreset::Glass];

    pub fn value(self) -> f32 {
        match self {
            IorPreset::Air => 1.0,
            IorPreset::Ice => 1.309,
            IorPreset::Water => 1.325,
            IorPreset::Glass => 1.5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IorPreset::Air => "Air",
            IorPreset::Ice => "Ice",
            IorPreset::Water => "Water",
            IorPreset::Glass => "Glass",
        }
    }

    /// Preset whose value matches `ior`, if any.
    pub fn from_value(ior: f32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| (p.value() - ior).abs() < 1e-4)
    }
}

/// Preetham sky controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkyParams {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Sun elevation above the horizon, degrees.
    pub elevation: f32,
    /// Sun azimuth, degrees.
    pub azimuth: f32,
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 3.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.7,
            elevation: 30.0,
            azimuth: 30.0,
        }
    }
}

/// Every value the GUI can change. Uniform state derives from this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneParams {
    pub rain_intensity: f32,
    pub ior: f32,
    pub sky: SkyParams,
    /// Tone mapping exposure.
    pub exposure: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            rain_intensity: 0.0,
            ior: IorPreset::Air.value(),
            sky: SkyParams::default(),
            exposure: 0.5,
        }
    }
}

impl SceneParams {
    pub fn get(&self, key: ParamKey) -> f32 {
        match key {
            ParamKey::RainIntensity => self.rain_intensity,
            ParamKey::Ior => self.ior,
            ParamKey::Turbidity => self.sky.turbidity,
            ParamKey::Rayleigh => self.sky.rayleigh,
            ParamKey::MieCoefficient => self.sky.mie_coefficient,
            ParamKey::MieDirectionalG => self.sky.mie_directional_g,
            ParamKey::Elevation => self.sky.elevation,
            ParamKey::Azimuth => self.sky.azimuth,
            ParamKey::Exposure => self.exposure,
        }
    }

    /// Set one value after validating it. Returns whether the value changed.
    pub fn set(&mut self, key: ParamKey, value: f32) -> Result<bool, ParamError> {
        check(key, value)?;
        let slot = match key {
            ParamKey::RainIntensity => &mut self.rain_intensity,
            ParamKey::Ior => &mut self.ior,
            ParamKey::Turbidity => &mut self.sky.turbidity,
            ParamKey::Rayleigh => &mut self.sky.rayleigh,
            ParamKey::MieCoefficient => &mut self.sky.mie_coefficient,
            ParamKey::MieDirectionalG => &mut self.sky.mie_directional_g,
            ParamKey::Elevation => &mut self.sky.elevation,
            ParamKey::Azimuth => &mut self.sky.azimuth,
            ParamKey::Exposure => &mut self.exposure,
        };
        let changed = *slot != value;
        *slot = value;
        Ok(changed)
    }

    /// Check every value against its range.
    pub fn validate(&self) -> Result<(), ParamError> {
        ParamKey::ALL
            .into_iter()
            .try_for_each(|key| check(key, self.get(key)))
    }
}

fn check(key: ParamKey, value: f32) -> Result<(), ParamError> {
    if !value.is_finite() {
        return Err(ParamError::NotFinite { key });
    }
    let range = key.range();
    if !range.contains(&value) {
        return Err(ParamError::OutOfRange {
            key,
            value,
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(())
}

/// Write path from a UI layer into rendering state.
pub trait ParameterSink {
    fn apply_parameter(&mut self, key: ParamKey, value: f32) -> Result<(), ParamError>;
}

impl ParameterSink for SceneParams {
    fn apply_parameter(&mut self, key: ParamKey, value: f32) -> Result<(), ParamError> {
        self.set(key, value).map(|_| ())
    }
}
