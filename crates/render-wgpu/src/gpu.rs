use crate::mesh::{self, GpuMesh, MeshVertex};
use crate::shaders;
use crate::texture::{
    self, ColorSpace, DEPTH_FORMAT, GRASS_FALLBACK, OffscreenTarget, SurfaceMaps, TextureImage,
};
use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use rainglass_render::{FrameBackend, FrameUniforms, Layer, ParamUniforms, RenderPass, RenderTarget};
use std::f32::consts::PI;
use wgpu::util::DeviceExt;

/// Background colour behind everything (#2c2c2c, linear).
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0252,
    g: 0.0252,
    b: 0.0252,
    a: 1.0,
};
const HEMISPHERE_INTENSITY: f32 = 0.5;
const SUN_LIGHT_INTENSITY: f32 = 1.0;

/// Errors from the wgpu backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to compile {label}: {message}")]
    ShaderCompile { label: &'static str, message: String },
    #[error("{target} pass requested before the offscreen pass of this frame")]
    PassOrder { target: RenderTarget },
    #[error("frame uniforms uploaded before any parameter uniforms")]
    ParamsNotUploaded,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FrameBlock {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    sun_direction: [f32; 4],
    light: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SkyBlock {
    beta_rayleigh: [f32; 4],
    beta_mie: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportBlock {
    resolution: [f32; 2],
    ior: f32,
    rain: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MaterialBlock {
    base_color: [f32; 4],
    /// x: roughness, y: metalness, z: normal scale, w: ao intensity.
    surface: [f32; 4],
}

impl MaterialBlock {
    /// White, fully rough, dielectric. Maps scale these values.
    const STANDARD: Self = Self {
        base_color: [1.0; 4],
        surface: [1.0, 0.0, 1.0, 1.0],
    };
}

impl FrameBlock {
    fn new(frame: &FrameUniforms, params: &ParamUniforms) -> Self {
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            inv_view_proj: frame.inv_view_proj.to_cols_array_2d(),
            camera_position: frame.camera_position.extend(1.0).to_array(),
            sun_direction: params.sky.sun_direction.extend(0.0).to_array(),
            light: [
                params.exposure,
                HEMISPHERE_INTENSITY,
                SUN_LIGHT_INTENSITY,
                frame.time,
            ],
        }
    }
}

impl SkyBlock {
    fn new(params: &ParamUniforms) -> Self {
        let sky = &params.sky;
        Self {
            beta_rayleigh: sky.beta_rayleigh.extend(sky.sun_intensity).to_array(),
            beta_mie: sky.beta_mie.extend(sky.sun_fade).to_array(),
            params: [sky.mie_directional_g, 0.0, 0.0, 0.0],
        }
    }
}

/// Frame block for `frame`; parameter uniforms must already be known.
fn frame_block(
    frame: &FrameUniforms,
    params: Option<&ParamUniforms>,
) -> Result<FrameBlock, RenderError> {
    params
        .map(|params| FrameBlock::new(frame, params))
        .ok_or(RenderError::ParamsNotUploaded)
}

impl ViewportBlock {
    fn new(params: &ParamUniforms) -> Self {
        Self {
            resolution: params.resolution.to_array(),
            ior: params.ior,
            rain: params.rain_intensity,
        }
    }
}

/// GLSL text for the two stages of the viewport quad.
pub struct ViewportShaders<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

struct Material {
    bind_group: wgpu::BindGroup,
}

/// wgpu renderer for the rainglass scene.
pub struct WgpuRenderer {
    sky_pipeline: wgpu::RenderPipeline,
    lit_pipeline: wgpu::RenderPipeline,
    viewport_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    sky_buffer: wgpu::Buffer,
    viewport_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    viewport_layout: wgpu::BindGroupLayout,
    viewport_bind_group: wgpu::BindGroup,
    viewport_sampler: wgpu::Sampler,
    ground: GpuMesh,
    ground_material: Material,
    sphere: GpuMesh,
    sphere_material: Material,
    quad: GpuMesh,
    offscreen: OffscreenTarget,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    params: Option<ParamUniforms>,
}

impl WgpuRenderer {
    /// Build every pipeline and the static scene.
    ///
    /// Missing ground maps fall back to a flat grass colour, a flat normal
    /// and neutral occlusion/roughness/metalness.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        viewport_shaders: ViewportShaders<'_>,
        ground_maps: SurfaceMaps,
    ) -> Result<Self, RenderError> {
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: std::mem::size_of::<FrameBlock>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sky_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sky_uniform_buffer"),
            size: std::mem::size_of::<SkyBlock>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let viewport_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("viewport_uniform_buffer"),
            size: std::mem::size_of::<ViewportBlock>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: sky_buffer.as_entire_binding(),
                },
            ],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2),
                texture_entry(3),
                texture_entry(4),
            ],
        });
        let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("viewport_bind_group_layout"),
            entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
        });

        // Sky
        let sky_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::sky_shader().into()),
        });
        let sky_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky_pipeline_layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });
        let sky_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sky_pipeline"),
            layout: Some(&sky_layout),
            vertex: wgpu::VertexState {
                module: &sky_module,
                entry_point: Some("vs_sky"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sky_module,
                entry_point: Some("fs_sky"),
                compilation_options: Default::default(),
                targets: &[Some(color_target(surface_format))],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::LessEqual)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Lit meshes
        let lit_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::lit_shader().into()),
        });
        let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lit_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let lit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lit_pipeline"),
            layout: Some(&lit_layout),
            vertex: wgpu::VertexState {
                module: &lit_module,
                entry_point: Some("vs_lit"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &MeshVertex::ATTRIBUTES,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &lit_module,
                entry_point: Some("fs_lit"),
                compilation_options: Default::default(),
                targets: &[Some(color_target(surface_format))],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // The ground is double sided.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Viewport quad, compiled from the registry's GLSL
        let quad_vs = compile_glsl(
            device,
            "viewport_vertex_shader",
            viewport_shaders.vertex,
            wgpu::naga::ShaderStage::Vertex,
        )?;
        let quad_fs = compile_glsl(
            device,
            "viewport_fragment_shader",
            viewport_shaders.fragment,
            wgpu::naga::ShaderStage::Fragment,
        )?;
        let viewport_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("viewport_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &viewport_layout],
            push_constant_ranges: &[],
        });
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let viewport_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("viewport_pipeline"),
            layout: Some(&viewport_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &quad_vs,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &MeshVertex::QUAD_ATTRIBUTES,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &quad_fs,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                targets: &[Some(color_target(surface_format))],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile {
                label: "viewport_pipeline",
                message: err.to_string(),
            });
        }

        // Static scene
        let ground = GpuMesh::upload(
            device,
            "ground",
            &mesh::circle(5.0, 32).transformed(Quat::from_rotation_x(-PI / 2.0), Vec3::ZERO),
        );
        let sphere = GpuMesh::upload(
            device,
            "sphere",
            &mesh::uv_sphere(0.5, 32, 16).transformed(Quat::IDENTITY, Vec3::new(0.0, 1.0, 0.0)),
        );
        let quad = GpuMesh::upload(
            device,
            "viewport_quad",
            &mesh::plane(2.0, 2.0).transformed(Quat::IDENTITY, Vec3::new(0.0, 1.0, 1.0)),
        );

        let repeat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let ground_material = Material::new(
            device,
            queue,
            &material_layout,
            &repeat_sampler,
            ground_maps.with_fallbacks(GRASS_FALLBACK),
            "ground",
        );
        let sphere_material = Material::new(
            device,
            queue,
            &material_layout,
            &repeat_sampler,
            SurfaceMaps::default().with_fallbacks([255; 4]),
            "sphere",
        );

        let viewport_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("viewport_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let offscreen = OffscreenTarget::new(device, surface_format, width, height);
        let viewport_bind_group = create_viewport_bind_group(
            device,
            &viewport_layout,
            &viewport_buffer,
            &offscreen,
            &viewport_sampler,
        );
        let depth_texture = texture::create_depth_texture(device, width, height);

        tracing::info!(?surface_format, width, height, "scene pipelines ready");

        Ok(Self {
            sky_pipeline,
            lit_pipeline,
            viewport_pipeline,
            frame_buffer,
            sky_buffer,
            viewport_buffer,
            frame_bind_group,
            viewport_layout,
            viewport_bind_group,
            viewport_sampler,
            ground,
            ground_material,
            sphere,
            sphere_material,
            quad,
            offscreen,
            depth_texture,
            surface_format,
            params: None,
        })
    }

    /// Recreate size-dependent targets.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = texture::create_depth_texture(device, width, height);
        self.offscreen = OffscreenTarget::new(device, self.surface_format, width, height);
        self.viewport_bind_group = create_viewport_bind_group(
            device,
            &self.viewport_layout,
            &self.viewport_buffer,
            &self.offscreen,
            &self.viewport_sampler,
        );
        tracing::debug!(width, height, "render targets resized");
    }

    /// Start recording one frame that will end on `surface_view`.
    pub fn begin_frame<'a>(
        &'a mut self,
        device: &wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_view: &'a wgpu::TextureView,
    ) -> WgpuFrame<'a> {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });
        WgpuFrame {
            renderer: self,
            queue,
            surface_view,
            encoder,
            offscreen_ready: false,
        }
    }

    fn draw_layers(&self, pass: &mut wgpu::RenderPass<'_>, layers: &RenderPass) {
        if layers.draws(Layer::Background) {
            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            pass.set_pipeline(&self.sky_pipeline);
            pass.draw(0..3, 0..1);

            pass.set_pipeline(&self.lit_pipeline);
            pass.set_bind_group(1, &self.ground_material.bind_group, &[]);
            self.ground.draw(pass);
            pass.set_bind_group(1, &self.sphere_material.bind_group, &[]);
            self.sphere.draw(pass);
        }

        if layers.draws(Layer::Viewport) {
            pass.set_pipeline(&self.viewport_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(1, &self.viewport_bind_group, &[]);
            self.quad.draw(pass);
        }
    }
}

/// One frame being recorded; implements the frame sequencing backend.
pub struct WgpuFrame<'a> {
    renderer: &'a mut WgpuRenderer,
    queue: &'a wgpu::Queue,
    surface_view: &'a wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    offscreen_ready: bool,
}

impl WgpuFrame<'_> {
    /// Submit everything recorded for this frame.
    pub fn submit(self) {
        self.queue.submit(std::iter::once(self.encoder.finish()));
    }
}

impl FrameBackend for WgpuFrame<'_> {
    type Error = RenderError;

    fn upload_params(&mut self, params: &ParamUniforms) -> Result<(), RenderError> {
        self.queue.write_buffer(
            &self.renderer.sky_buffer,
            0,
            bytemuck::bytes_of(&SkyBlock::new(params)),
        );
        self.queue.write_buffer(
            &self.renderer.viewport_buffer,
            0,
            bytemuck::bytes_of(&ViewportBlock::new(params)),
        );
        self.renderer.params = Some(*params);
        Ok(())
    }

    fn upload_frame(&mut self, frame: &FrameUniforms) -> Result<(), RenderError> {
        self.offscreen_ready = false;
        let block = frame_block(frame, self.renderer.params.as_ref())?;
        self.queue
            .write_buffer(&self.renderer.frame_buffer, 0, bytemuck::bytes_of(&block));
        Ok(())
    }

    fn render(&mut self, pass: &RenderPass) -> Result<(), RenderError> {
        let renderer = &*self.renderer;
        let view = match pass.target {
            RenderTarget::Offscreen => &renderer.offscreen.view,
            RenderTarget::Screen if !self.offscreen_ready => {
                return Err(RenderError::PassOrder {
                    target: pass.target,
                });
            }
            RenderTarget::Screen => self.surface_view,
        };

        {
            let mut render_pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(match pass.target {
                    RenderTarget::Offscreen => "offscreen_pass",
                    RenderTarget::Screen => "screen_pass",
                }),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &renderer.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            renderer.draw_layers(&mut render_pass, pass);
        }

        if pass.target == RenderTarget::Offscreen {
            self.offscreen_ready = true;
        }
        Ok(())
    }
}

impl Material {
    /// `maps` is `[albedo, normal, arm]`.
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        maps: [TextureImage; 3],
        label: &str,
    ) -> Self {
        let [albedo, normal, arm] = maps;
        let albedo = albedo.upload(device, queue, &format!("{label}_albedo"), ColorSpace::Srgb);
        let normal = normal.upload(device, queue, &format!("{label}_normal"), ColorSpace::Linear);
        let arm = arm.upload(device, queue, &format!("{label}_arm"), ColorSpace::Linear);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_material_buffer")),
            contents: bytemuck::bytes_of(&MaterialBlock::STANDARD),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}_material_bind_group")),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&albedo),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&normal),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&arm),
                },
            ],
        });
        Self { bind_group }
    }
}

fn compile_glsl(
    device: &wgpu::Device,
    label: &'static str,
    source: &str,
    stage: wgpu::naga::ShaderStage,
) -> Result<wgpu::ShaderModule, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: source.into(),
            stage,
            defines: Default::default(),
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(RenderError::ShaderCompile {
            label,
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

fn create_viewport_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    target: &OffscreenTarget,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("viewport_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&target.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn color_target(format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    }
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainglass_common::SceneParams;
    use glam::Mat4;
    use rainglass_render::FrameLoop;

    #[test]
    fn uniform_blocks_match_shader_layouts() {
        // std140 / WGSL uniform layout sizes.
        assert_eq!(std::mem::size_of::<FrameBlock>(), 176);
        assert_eq!(std::mem::size_of::<SkyBlock>(), 48);
        assert_eq!(std::mem::size_of::<ViewportBlock>(), 16);
        assert_eq!(std::mem::size_of::<MaterialBlock>(), 32);
    }

    #[test]
    fn blocks_carry_params() {
        let mut fl = FrameLoop::new(SceneParams::default(), 1280, 720);
        fl.resize(1280, 720);
        let params = fl.param_uniforms();
        let frame = fl.frame_uniforms();

        let viewport = ViewportBlock::new(&params);
        assert_eq!(viewport.resolution, [1280.0, 720.0]);
        assert_eq!(viewport.ior, 1.0);

        let block = FrameBlock::new(&frame, &params);
        assert_eq!(block.light[0], 0.5);
        assert_eq!(block.sun_direction[3], 0.0);
        assert_eq!(Mat4::from_cols_array_2d(&block.view_proj), frame.view_proj);

        let sky = SkyBlock::new(&params);
        assert_eq!(sky.beta_rayleigh[3], params.sky.sun_intensity);
        assert_eq!(sky.params[0], 0.7);
    }

    #[test]
    fn frame_block_requires_params() {
        let fl = FrameLoop::new(SceneParams::default(), 640, 480);
        let frame = fl.frame_uniforms();
        assert!(matches!(
            frame_block(&frame, None),
            Err(RenderError::ParamsNotUploaded)
        ));

        let params = fl.param_uniforms();
        let block = frame_block(&frame, Some(&params)).unwrap();
        assert_eq!(block.light[3], frame.time);
    }

    #[test]
    fn standard_material_is_rough_dielectric() {
        let m = MaterialBlock::STANDARD;
        assert_eq!(m.base_color, [1.0; 4]);
        // Roughness and metalness multiply the ARM map channels.
        assert_eq!(m.surface, [1.0, 0.0, 1.0, 1.0]);
    }
}
