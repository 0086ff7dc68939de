use crate::frame::FrameLoop;
use rainglass_common::{ParamError, SceneConfig};
use rainglass_shaders::{ShaderError, ShaderRegistry, SourceFetcher};
use std::sync::Arc;

/// Errors that abort application startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("invalid initial parameters: {0}")]
    Params(#[from] ParamError),
}

/// Everything the driver owns for the lifetime of the process.
pub struct AppContext<F> {
    pub config: SceneConfig,
    pub registry: ShaderRegistry<F>,
    pub frame: FrameLoop,
}

impl<F: SourceFetcher> AppContext<F> {
    /// Load both viewport shader stages, then build the frame loop.
    ///
    /// The vertex stage is loaded before the fragment stage; the first
    /// failure aborts startup.
    pub async fn init(config: SceneConfig, fetcher: F) -> Result<Self, InitError> {
        config.params.validate()?;

        let registry = ShaderRegistry::new(config.shader_base.clone(), fetcher);
        registry.load_from_file(&config.shaders.vertex).await?;
        registry.load_from_file(&config.shaders.fragment).await?;

        let frame = FrameLoop::new(config.params, config.window_width, config.window_height);
        tracing::info!(
            base = %config.shader_base,
            vertex = %config.shaders.vertex,
            fragment = %config.shaders.fragment,
            "application context ready"
        );

        Ok(Self {
            config,
            registry,
            frame,
        })
    }
}

impl<F> AppContext<F> {
    pub fn vertex_source(&self) -> Result<Arc<str>, ShaderError> {
        self.registry.get(&self.config.shaders.vertex)
    }

    pub fn fragment_source(&self) -> Result<Arc<str>, ShaderError> {
        self.registry.get(&self.config.shaders.fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainglass_common::{ParamKey, ParameterSink};
    use rainglass_shaders::{MemoryFetcher, builtin};

    fn config() -> SceneConfig {
        SceneConfig {
            shader_base: "shaders".into(),
            ..SceneConfig::default()
        }
    }

    #[test]
    fn init_loads_both_stages() {
        let ctx = pollster::block_on(AppContext::init(config(), MemoryFetcher::builtin("shaders")))
            .unwrap();
        assert_eq!(&*ctx.vertex_source().unwrap(), builtin::BASIC_VS);
        assert_eq!(&*ctx.fragment_source().unwrap(), builtin::FLAT_FS);
        assert_eq!(ctx.registry.len(), 2);
        assert!(ctx.frame.is_dirty());
    }

    #[test]
    fn init_aborts_on_missing_fragment() {
        let fetcher = MemoryFetcher::new().with("shaders/basic.vs", builtin::BASIC_VS);
        let err = pollster::block_on(AppContext::init(config(), fetcher))
            .err()
            .unwrap();
        match err {
            InitError::Shader(ShaderError::Fetch { name, .. }) => assert_eq!(name, "flat.fs"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn init_stops_at_first_failure() {
        // Neither stage exists; the error names the vertex stage.
        let err = pollster::block_on(AppContext::init(config(), MemoryFetcher::new()))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            InitError::Shader(ShaderError::Fetch { ref name, .. }) if name == "basic.vs"
        ));
    }

    #[test]
    fn init_rejects_invalid_params() {
        let mut cfg = config();
        cfg.params.rain_intensity = 4.0;
        let err = pollster::block_on(AppContext::init(cfg, MemoryFetcher::builtin("shaders")))
            .err()
            .unwrap();
        assert!(matches!(err, InitError::Params(_)));
    }

    #[test]
    fn initial_params_flow_into_frame_loop() {
        let mut cfg = config();
        cfg.params.ior = 1.5;
        let mut ctx =
            pollster::block_on(AppContext::init(cfg, MemoryFetcher::builtin("shaders"))).unwrap();
        assert_eq!(ctx.frame.param_uniforms().ior, 1.5);
        ctx.frame.apply_parameter(ParamKey::Ior, 1.0).unwrap();
        assert_eq!(ctx.frame.params().ior, 1.0);
    }
}
