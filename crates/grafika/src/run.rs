use anyhow::{bail, Context, Result};
use renderer::{compile_program, Renderer};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config::Settings;
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Defaults, then the configuration file, then `args`.
pub fn resolve_settings(args: &RunArgs) -> Result<Settings> {
    let default_path = if args.config.is_some() {
        None
    } else {
        let paths = AppPaths::discover()?;
        tracing::debug!(config = %paths.config_dir().display(), "resolved grafika paths");
        Some(paths.config_file())
    };
    let mut settings = Settings::load(args.config.as_deref(), default_path.as_deref())?;
    settings.apply_overrides(args);
    settings.validate()?;
    Ok(settings)
}

pub fn run(args: RunArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;
    let config = settings.to_renderer_config()?;
    tracing::info!(
        texture_a = %config.textures[0].display(),
        texture_b = %config.textures[1].display(),
        geometry = %config.geometry,
        mode = %config.initial_mode,
        "starting grafika"
    );
    Renderer::new(config).run().context("grafika window session failed")
}

pub fn print_config(args: RunArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;
    print!("{}", settings.to_toml()?);
    Ok(())
}

pub fn check_shaders(args: RunArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;
    let sources = settings.shader_sources()?;
    match compile_program(&sources.vertex, &sources.fragment) {
        Ok(_) => {
            println!("shader program compiled and linked");
            Ok(())
        }
        Err(err) => {
            println!("{err}");
            bail!("shader check failed")
        }
    }
}
