//! Built-in WGSL for the sky and the lit scene meshes.
//!
//! The viewport quad is not here: its GLSL comes from the shader registry.

/// Bindings shared by every pipeline (group 0). Must match `FrameBlock` and
/// `SkyBlock` in `gpu.rs`, and the `Frame` block of the quad's vertex stage.
const COMMON: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    sun_direction: vec4<f32>,
    // x: exposure, y: hemisphere intensity, z: sun intensity, w: time
    light: vec4<f32>,
};

struct Sky {
    // xyz: beta, w: sun energy
    beta_rayleigh: vec4<f32>,
    // xyz: beta, w: sun fade
    beta_mie: vec4<f32>,
    // x: mie directional g
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(0) @binding(1)
var<uniform> sky: Sky;

fn rrt_and_odt_fit(v: vec3<f32>) -> vec3<f32> {
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (0.983729 * v + 0.4329510) + 0.238081;
    return a / b;
}

// ACES filmic fit, scaled by exposure.
fn tone_map(color: vec3<f32>) -> vec3<f32> {
    let aces_input = mat3x3<f32>(
        vec3<f32>(0.59719, 0.07600, 0.02840),
        vec3<f32>(0.35458, 0.90834, 0.13383),
        vec3<f32>(0.04823, 0.01566, 0.83777),
    );
    let aces_output = mat3x3<f32>(
        vec3<f32>(1.60475, -0.10208, -0.00327),
        vec3<f32>(-0.53108, 1.10813, -0.07276),
        vec3<f32>(-0.07367, -0.00605, 1.07602),
    );
    var c = color * (frame.light.x / 0.6);
    c = aces_input * c;
    c = rrt_and_odt_fit(c);
    c = aces_output * c;
    return clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
}
"#;

/// Preetham sky on a full-screen triangle at the far plane.
const SKY_BODY: &str = r#"
const PI: f32 = 3.141592653589793;
const UP: vec3<f32> = vec3<f32>(0.0, 1.0, 0.0);
const RAYLEIGH_ZENITH_LENGTH: f32 = 8400.0;
const MIE_ZENITH_LENGTH: f32 = 1250.0;
const SUN_ANGULAR_DIAMETER_COS: f32 = 0.999956676946448;
const THREE_OVER_SIXTEEN_PI: f32 = 0.05968310365946075;
const ONE_OVER_FOUR_PI: f32 = 0.07957747154594767;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_sky(@builtin(vertex_index) index: u32) -> SkyOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let ndc = uv * 2.0 - 1.0;
    var out: SkyOutput;
    out.clip_position = vec4<f32>(ndc, 1.0, 1.0);
    out.ndc = ndc;
    return out;
}

fn rayleigh_phase(cos_theta: f32) -> f32 {
    return THREE_OVER_SIXTEEN_PI * (1.0 + cos_theta * cos_theta);
}

fn hg_phase(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let inverse = 1.0 / pow(1.0 - 2.0 * g * cos_theta + g2, 1.5);
    return ONE_OVER_FOUR_PI * ((1.0 - g2) * inverse);
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let far = frame.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let direction = normalize(far.xyz / far.w - frame.camera_position.xyz);

    let sun = normalize(frame.sun_direction.xyz);
    let sun_e = sky.beta_rayleigh.w;
    let sun_fade = sky.beta_mie.w;
    let beta_r = sky.beta_rayleigh.xyz;
    let beta_m = sky.beta_mie.xyz;
    let beta_sum = max(beta_r + beta_m, vec3<f32>(1e-12));

    // Optical length along the view ray.
    let zenith_angle = acos(max(0.0, dot(UP, direction)));
    let inverse = 1.0 / (cos(zenith_angle) + 0.15 * pow(93.885 - zenith_angle * 180.0 / PI, -1.253));
    let s_r = RAYLEIGH_ZENITH_LENGTH * inverse;
    let s_m = MIE_ZENITH_LENGTH * inverse;
    let extinction = exp(-(beta_r * s_r + beta_m * s_m));

    // In-scattering.
    let cos_theta = dot(direction, sun);
    let beta_r_theta = beta_r * rayleigh_phase(cos_theta * 0.5 + 0.5);
    let beta_m_theta = beta_m * hg_phase(cos_theta, sky.params.x);
    let scatter = sun_e * ((beta_r_theta + beta_m_theta) / beta_sum);
    var lin = pow(scatter * (1.0 - extinction), vec3<f32>(1.5));
    lin *= mix(
        vec3<f32>(1.0),
        pow(scatter * extinction, vec3<f32>(0.5)),
        clamp(pow(1.0 - dot(UP, sun), 5.0), 0.0, 1.0),
    );

    // Night sky and sun disk.
    var l0 = vec3<f32>(0.1) * extinction;
    let sundisk = smoothstep(SUN_ANGULAR_DIAMETER_COS, SUN_ANGULAR_DIAMETER_COS + 0.00002, cos_theta);
    l0 += sun_e * 19000.0 * extinction * sundisk;

    let tex_color = (lin + l0) * 0.04 + vec3<f32>(0.0, 0.0003, 0.00075);
    let color = pow(tex_color, vec3<f32>(1.0 / (1.2 + 1.2 * sun_fade)));
    return vec4<f32>(tone_map(color), 1.0);
}
"#;

/// Physically based meshes lit by a hemisphere light and the sun.
///
/// Light intensities use the legacy scale where irradiance is premultiplied
/// by PI, so the Lambert term carries no 1/PI.
const LIT_BODY: &str = r#"
const PI: f32 = 3.141592653589793;
const HEMI_SKY: vec3<f32> = vec3<f32>(1.0, 1.0, 1.0);
const HEMI_GROUND: vec3<f32> = vec3<f32>(0.0908, 0.0908, 0.0908);

struct Material {
    base_color: vec4<f32>,
    // x: roughness, y: metalness, z: normal scale, w: ao intensity
    surface: vec4<f32>,
};

@group(1) @binding(0)
var albedo_texture: texture_2d<f32>;

@group(1) @binding(1)
var material_sampler: sampler;

@group(1) @binding(2)
var<uniform> material: Material;

@group(1) @binding(3)
var normal_texture: texture_2d<f32>;

// r: ambient occlusion, g: roughness, b: metalness
@group(1) @binding(4)
var arm_texture: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) world_position: vec3<f32>,
};

@vertex
fn vs_lit(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = frame.view_proj * vec4<f32>(vertex.position, 1.0);
    out.world_normal = vertex.normal;
    out.uv = vertex.uv;
    out.world_position = vertex.position;
    return out;
}

// Tangent frame from screen-space derivatives; the meshes carry no tangents.
fn perturb_normal(position: vec3<f32>, n: vec3<f32>, uv: vec2<f32>, map_n: vec3<f32>) -> vec3<f32> {
    let q0 = dpdx(position);
    let q1 = dpdy(position);
    let st0 = dpdx(uv);
    let st1 = dpdy(uv);
    let q1_perp = cross(q1, n);
    let q0_perp = cross(n, q0);
    let t = q1_perp * st0.x + q0_perp * st1.x;
    let b = q1_perp * st0.y + q0_perp * st1.y;
    let det = max(dot(t, t), dot(b, b));
    let scale = select(inverseSqrt(det), 0.0, det == 0.0);
    return normalize(t * (map_n.x * scale) + b * (map_n.y * scale) + n * map_n.z);
}

fn distribution_ggx(n_dot_h: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / (PI * denom * denom);
}

fn visibility_smith(n_dot_l: f32, n_dot_v: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let g_v = n_dot_l * sqrt(n_dot_v * n_dot_v * (1.0 - a2) + a2);
    let g_l = n_dot_v * sqrt(n_dot_l * n_dot_l * (1.0 - a2) + a2);
    return 0.5 / max(g_v + g_l, 1e-5);
}

@fragment
fn fs_lit(in: VertexOutput, @builtin(front_facing) front_facing: bool) -> @location(0) vec4<f32> {
    let albedo = textureSample(albedo_texture, material_sampler, in.uv).rgb * material.base_color.rgb;
    let arm = textureSample(arm_texture, material_sampler, in.uv).rgb;
    let tangent_n = textureSample(normal_texture, material_sampler, in.uv).xyz * 2.0 - 1.0;

    let ao = mix(1.0, arm.r, material.surface.w);
    let roughness = clamp(material.surface.x * arm.g, 0.04, 1.0);
    let metalness = clamp(material.surface.y * arm.b, 0.0, 1.0);

    // Double sided. GL-convention normal map: green points toward -v here.
    let geometric_n = normalize(in.world_normal) * select(-1.0, 1.0, front_facing);
    let map_n = vec3<f32>(tangent_n.x, -tangent_n.y, tangent_n.z) * vec3<f32>(material.surface.zz, 1.0);
    let n = perturb_normal(in.world_position, geometric_n, in.uv, map_n);

    let v = normalize(frame.camera_position.xyz - in.world_position);
    let l = normalize(frame.sun_direction.xyz);
    let h = normalize(l + v);
    let n_dot_l = max(dot(n, l), 0.0);
    let n_dot_v = max(dot(n, v), 1e-4);
    let n_dot_h = max(dot(n, h), 0.0);
    let v_dot_h = max(dot(v, h), 0.0);

    let diffuse_color = albedo * (1.0 - metalness);
    let f0 = mix(vec3<f32>(0.04), albedo, metalness);
    let fresnel = f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - v_dot_h, 5.0);
    let alpha = roughness * roughness;
    let specular = fresnel * distribution_ggx(n_dot_h, alpha) * visibility_smith(n_dot_l, n_dot_v, alpha);

    let direct = (diffuse_color + specular * PI) * n_dot_l * frame.light.z;
    let hemi = mix(HEMI_GROUND, HEMI_SKY, 0.5 * n.y + 0.5) * frame.light.y;
    let ambient = diffuse_color * hemi * ao;
    return vec4<f32>(tone_map(direct + ambient), 1.0);
}
"#;

pub fn sky_shader() -> String {
    format!("{COMMON}{SKY_BODY}")
}

pub fn lit_shader() -> String {
    format!("{COMMON}{LIT_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_share_frame_bindings() {
        for src in [sky_shader(), lit_shader()] {
            assert!(src.contains("@group(0) @binding(0)"));
            assert!(src.contains("fn tone_map"));
        }
        assert!(sky_shader().contains("fn vs_sky"));
        assert!(lit_shader().contains("fn fs_lit"));
        assert!(lit_shader().contains("var normal_texture"));
        assert!(lit_shader().contains("var arm_texture"));
    }
}
