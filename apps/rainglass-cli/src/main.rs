use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rainglass_common::{ParamKey, ParameterSink, SceneConfig};
use rainglass_render::{AppContext, RenderTarget, TraceBackend};
use rainglass_shaders::{AnyFetcher, ShaderRegistry};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Fixed step used by `simulate`.
const SIMULATED_DT: Duration = Duration::from_micros(16_667);

#[derive(Parser)]
#[command(name = "rainglass-cli", about = "CLI tool for rainglass shaders and frames")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Load shader sources and print their size and SHA-256
    Shaders {
        /// Directory or http(s) URL names resolve against
        #[arg(long, default_value = "./data/shaders/")]
        dir: String,
        /// Use the sources compiled into the binary
        #[arg(long, conflicts_with = "dir")]
        builtin: bool,
        /// Shader names, e.g. basic.vs
        #[arg(default_values = ["basic.vs", "flat.fs"])]
        names: Vec<String>,
    },
    /// Run frames headlessly and print each backend call
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Parameter override, e.g. --set ior=1.5
        #[arg(long = "set", value_parser = parse_override)]
        overrides: Vec<(ParamKey, f32)>,
        /// Scene configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Use the shader sources compiled into the binary
        #[arg(long)]
        builtin_shaders: bool,
    },
}

fn parse_override(s: &str) -> Result<(ParamKey, f32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    let key: ParamKey = key.trim().parse().map_err(|e| format!("{e}"))?;
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value for {key}: {e}"))?;
    Ok((key, value))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("rainglass-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", rainglass_common::crate_info());
            println!("shaders: {}", rainglass_shaders::crate_info());
            println!("render: {}", rainglass_render::crate_info());
        }
        Commands::Shaders {
            dir,
            builtin,
            names,
        } => {
            let fetcher = if builtin {
                AnyFetcher::builtin(&dir)
            } else {
                AnyFetcher::for_base(&dir)?
            };
            let registry = ShaderRegistry::new(dir, fetcher);

            let mut failed = 0;
            for name in &names {
                match pollster::block_on(registry.load_from_file(name))
                    .and_then(|()| registry.entry(name))
                {
                    Ok(entry) => println!(
                        "{}\t{} bytes\tsha256:{}",
                        entry.name(),
                        entry.len(),
                        entry.digest_hex()
                    ),
                    Err(e) => {
                        eprintln!("{name}: {e}");
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} shader(s) failed to load", names.len());
            }
        }
        Commands::Simulate {
            frames,
            overrides,
            config,
            builtin_shaders,
        } => {
            let config =
                SceneConfig::load_or_default(config.as_deref()).context("loading scene config")?;
            let fetcher = if builtin_shaders {
                AnyFetcher::builtin(&config.shader_base)
            } else {
                AnyFetcher::for_base(&config.shader_base)?
            };
            let mut ctx = pollster::block_on(AppContext::init(config, fetcher))
                .context("loading viewport shaders")?;

            for (key, value) in overrides {
                ctx.frame
                    .apply_parameter(key, value)
                    .with_context(|| format!("--set {key}={value}"))?;
            }

            let mut backend = TraceBackend::new();
            let mut uploads = 0;
            for _ in 0..frames {
                let stats = ctx.frame.tick(SIMULATED_DT, &mut backend)?;
                if stats.params_uploaded {
                    uploads += 1;
                }
            }

            print!("{}", backend.render_text());
            println!(
                "{frames} frame(s): {} offscreen pass(es), {} screen pass(es), {uploads} parameter upload(s)",
                backend.pass_count(RenderTarget::Offscreen),
                backend.pass_count(RenderTarget::Screen),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_parse_key_value() {
        assert_eq!(parse_override("ior=1.5").unwrap(), (ParamKey::Ior, 1.5));
        assert_eq!(
            parse_override(" rain_intensity = 0.25 ").unwrap(),
            (ParamKey::RainIntensity, 0.25)
        );
        assert!(parse_override("ior").is_err());
        assert!(parse_override("fog=1").is_err());
        assert!(parse_override("ior=wet").is_err());
    }
}
