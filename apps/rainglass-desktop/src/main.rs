use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use rainglass_common::{IorPreset, ParamKey, ParameterSink, SceneConfig, SceneParams};
use rainglass_render::AppContext;
use rainglass_render_wgpu::{SurfaceMaps, ViewportShaders, WgpuRenderer};
use rainglass_shaders::AnyFetcher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const MAX_FRAME_DT: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "rainglass-desktop", about = "Rain on glass over a daylight scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory or http(s) URL that shader names resolve against
    #[arg(long)]
    shader_base: Option<String>,

    /// Serve the shader sources compiled into the binary
    #[arg(long)]
    builtin_shaders: bool,

    /// Directory holding textures
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

/// Application state.
struct AppState {
    ctx: AppContext<AnyFetcher>,
    show_controls: bool,
    dragging: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(ctx: AppContext<AnyFetcher>) -> Self {
        Self {
            ctx,
            show_controls: true,
            dragging: false,
            last_frame: Instant::now(),
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed && key == KeyCode::F1 {
            self.show_controls = !self.show_controls;
        }
    }

    fn apply(&mut self, changes: Vec<(ParamKey, f32)>) {
        for (key, value) in changes {
            if let Err(e) = self.ctx.frame.apply_parameter(key, value) {
                tracing::warn!("rejected {key} = {value}: {e}");
            }
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_controls {
            return;
        }

        let params = *self.ctx.frame.params();
        let mut changes = Vec::new();

        egui::Window::new("Weather Phenomena Controls")
            .default_pos([16.0, 16.0])
            .resizable(false)
            .show(ctx, |ui| {
                param_slider(ui, &params, ParamKey::RainIntensity, &mut changes);
                ior_combo(ui, params.ior, &mut changes);

                egui::CollapsingHeader::new("Daylight")
                    .default_open(false)
                    .show(ui, |ui| {
                        for key in ParamKey::DAYLIGHT {
                            param_slider(ui, &params, key, &mut changes);
                        }
                    });

                ui.separator();
                ui.small("F1: Toggle Controls | LMB: Orbit | Wheel: Zoom");
            });

        self.apply(changes);
    }
}

fn param_slider(
    ui: &mut egui::Ui,
    params: &SceneParams,
    key: ParamKey,
    changes: &mut Vec<(ParamKey, f32)>,
) {
    let mut value = params.get(key);
    let slider = egui::Slider::new(&mut value, key.range())
        .step_by(key.step() as f64)
        .text(key.label());
    if ui.add(slider).changed() {
        changes.push((key, value));
    }
}

fn ior_combo(ui: &mut egui::Ui, ior: f32, changes: &mut Vec<(ParamKey, f32)>) {
    let current = IorPreset::from_value(ior);
    let selected = current.map_or_else(|| format!("{ior:.3}"), |p| p.label().to_string());
    egui::ComboBox::from_label(ParamKey::Ior.label())
        .selected_text(selected)
        .show_ui(ui, |ui| {
            for preset in IorPreset::ALL {
                if ui
                    .selectable_label(current == Some(preset), preset.label())
                    .clicked()
                {
                    changes.push((ParamKey::Ior, preset.value()));
                }
            }
        });
}

/// Everything that exists only once a window is up.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(ctx: AppContext<AnyFetcher>) -> Self {
        Self {
            state: AppState::new(ctx),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let scene = &self.state.ctx.config;
        let attrs = Window::default_attributes()
            .with_title("Rainglass")
            .with_inner_size(PhysicalSize::new(scene.window_width, scene.window_height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("rainglass_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no texture formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let vertex = self.state.ctx.vertex_source()?;
        let fragment = self.state.ctx.fragment_source()?;
        let ground = SurfaceMaps::load_ground(&scene.data_dir);
        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            ViewportShaders {
                vertex: &vertex,
                fragment: &fragment,
            },
            ground,
        )
        .context("building scene pipelines")?;
        self.state.ctx.frame.resize(config.width, config.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        gpu.config.width = new_size.width.max(1);
        gpu.config.height = new_size.height.max(1);
        gpu.surface.configure(&gpu.device, &gpu.config);
        gpu.renderer
            .resize(&gpu.device, gpu.config.width, gpu.config.height);
        self.state
            .ctx
            .frame
            .resize(gpu.config.width, gpu.config.height);
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).min(MAX_FRAME_DT);
        self.state.last_frame = now;

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut frame = gpu.renderer.begin_frame(&gpu.device, &gpu.queue, &view);
        match self.state.ctx.frame.tick(dt, &mut frame) {
            Ok(_) => frame.submit(),
            Err(e) => {
                tracing::error!("frame {} failed: {e}", self.state.ctx.frame.frames());
                return;
            }
        }

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });

        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("GPU initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            let release = matches!(
                event,
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    ..
                }
            );
            // Releases always reach the scene so a drag cannot get stuck.
            if response.consumed && !release {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.resize(new_size);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.dragging = btn_state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.state.ctx.frame.camera_mut().zoom(notches);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.dragging {
                self.state
                    .ctx
                    .frame
                    .camera_mut()
                    .rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("rainglass-desktop starting");

    let mut config =
        SceneConfig::load_or_default(cli.config.as_deref()).context("loading scene config")?;
    if let Some(base) = cli.shader_base {
        config.shader_base = base;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let fetcher = if cli.builtin_shaders {
        AnyFetcher::builtin(&config.shader_base)
    } else {
        AnyFetcher::for_base(&config.shader_base)?
    };
    let ctx = pollster::block_on(AppContext::init(config, fetcher))
        .context("loading viewport shaders")?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(ctx);
    event_loop.run_app(&mut app)?;

    Ok(())
}
