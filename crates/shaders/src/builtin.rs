//! Shader sources shipped with the binary.

/// Vertex stage of the viewport quad.
pub const BASIC_VS: &str = include_str!("../../../data/shaders/basic.vs");

/// Fragment stage of the viewport quad: refraction plus rain drops.
pub const FLAT_FS: &str = include_str!("../../../data/shaders/flat.fs");

pub const SOURCES: &[(&str, &str)] = &[("basic.vs", BASIC_VS), ("flat.fs", FLAT_FS)];
