//! Preetham daylight model: the per-frame constants computed on the CPU.
//!
//! The per-pixel scattering integral runs in the sky shader; everything that
//! only depends on the sun and the GUI controls is evaluated here once per
//! parameter change.

use crate::params::SkyParams;
use glam::{DVec3, Vec3};

/// Rayleigh total scattering coefficient for the primaries (680, 550, 450 nm).
const TOTAL_RAYLEIGH: DVec3 = DVec3::new(
    5.804542996261093e-6,
    1.3562911419845635e-5,
    3.0265902468824876e-5,
);

/// Mie scattering constant for the same wavelengths.
const MIE_CONST: DVec3 = DVec3::new(
    1.8399918514433978e14,
    2.7798023919660528e14,
    4.0790479543861094e14,
);

/// Angle past which the sun no longer contributes (slightly below horizon).
const CUTOFF_ANGLE: f64 = 1.6110731556870734;
const STEEPNESS: f64 = 1.5;
/// Extraterrestrial sun energy.
const SUN_ENERGY: f64 = 1000.0;

/// Unit vector toward the sun.
///
/// `elevation` is measured up from the horizon and `azimuth` around +Y from
/// +Z, both in degrees.
pub fn sun_direction(elevation_deg: f32, azimuth_deg: f32) -> Vec3 {
    let phi = (90.0 - elevation_deg).to_radians();
    let theta = azimuth_deg.to_radians();
    Vec3::new(
        phi.sin() * theta.sin(),
        phi.cos(),
        phi.sin() * theta.cos(),
    )
}

/// Sun irradiance for a given cosine of the zenith angle.
pub fn sun_intensity(zenith_cos: f32) -> f32 {
    let zenith_angle = (zenith_cos as f64).clamp(-1.0, 1.0).acos();
    let falloff = 1.0 - (-(CUTOFF_ANGLE - zenith_angle) / STEEPNESS).exp();
    (SUN_ENERGY * falloff.max(0.0)) as f32
}

fn total_mie(turbidity: f64) -> DVec3 {
    let c = 0.2 * turbidity * 10e-18;
    0.434 * c * MIE_CONST
}

/// Constants consumed by the sky shader and the sun light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyModel {
    pub sun_direction: Vec3,
    pub sun_intensity: f32,
    pub sun_fade: f32,
    pub beta_rayleigh: Vec3,
    pub beta_mie: Vec3,
    pub mie_directional_g: f32,
}

impl SkyModel {
    pub fn from_params(params: &SkyParams) -> Self {
        let sun = sun_direction(params.elevation, params.azimuth);
        let sun_fade = 1.0 - (1.0 - (sun.y as f64 / 450_000.0).exp()).clamp(0.0, 1.0);
        let rayleigh_coefficient = params.rayleigh as f64 - (1.0 - sun_fade);
        let beta_rayleigh = TOTAL_RAYLEIGH * rayleigh_coefficient;
        let beta_mie = total_mie(params.turbidity as f64) * params.mie_coefficient as f64;

        Self {
            sun_direction: sun,
            sun_intensity: sun_intensity(sun.y),
            sun_fade: sun_fade as f32,
            beta_rayleigh: beta_rayleigh.as_vec3(),
            beta_mie: beta_mie.as_vec3(),
            mie_directional_g: params.mie_directional_g,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn sun_direction_spherical_coords() {
        assert!(approx(sun_direction(90.0, 0.0), Vec3::Y));
        assert!(approx(sun_direction(0.0, 0.0), Vec3::Z));
        assert!(approx(sun_direction(0.0, 90.0), Vec3::X));
        assert!(approx(sun_direction(0.0, -90.0), -Vec3::X));
        let d = sun_direction(30.0, 30.0);
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!((d.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sun_intensity_falls_toward_horizon() {
        let zenith = sun_intensity(1.0);
        assert!(zenith > 650.0 && zenith < 670.0, "zenith intensity {zenith}");
        let low = sun_intensity(0.0);
        assert!(low > 0.0 && low < zenith);
        assert_eq!(sun_intensity(-1.0), 0.0);
    }

    #[test]
    fn default_sky_is_finite_and_scales_with_controls() {
        let params = SkyParams::default();
        let sky = SkyModel::from_params(&params);
        assert!(sky.beta_rayleigh.is_finite());
        assert!(sky.beta_mie.is_finite());
        assert!(sky.beta_mie.x > 0.0);
        assert!((sky.sun_fade - 1.0).abs() < 1e-4);

        let hazier = SkyModel::from_params(&SkyParams {
            turbidity: params.turbidity * 2.0,
            ..params
        });
        assert!(hazier.beta_mie.x > sky.beta_mie.x);

        let no_mie = SkyModel::from_params(&SkyParams {
            mie_coefficient: 0.0,
            ..params
        });
        assert_eq!(no_mie.beta_mie, Vec3::ZERO);
    }
}
