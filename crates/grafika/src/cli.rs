use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use renderer::{GeometryPolicy, RenderMode};

#[derive(Parser, Debug)]
#[command(
    name = "grafika",
    author,
    version,
    about = "Textured shape viewer (keys 1-3 pick shapes, scroll fades to black)"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// TOML configuration file (defaults to `config.toml` in the user config directory).
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Image sampled by the square (texture slot A).
    #[arg(long, value_name = "PATH", global = true)]
    pub texture_a: Option<PathBuf>,

    /// Image sampled by the triangles (texture slot B).
    #[arg(long, value_name = "PATH", global = true)]
    pub texture_b: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, global = true)]
    pub size: Option<(u32, u32)>,

    /// Window title.
    #[arg(long, value_name = "TEXT", global = true)]
    pub title: Option<String>,

    /// Replace the built-in vertex shader with a GLSL file.
    #[arg(long, value_name = "PATH", global = true)]
    pub vertex_shader: Option<PathBuf>,

    /// Replace the built-in fragment shader with a GLSL file.
    #[arg(long, value_name = "PATH", global = true)]
    pub fragment_shader: Option<PathBuf>,

    /// Geometry buffer policy: `cached` or `transient`.
    #[arg(long, value_name = "POLICY", value_parser = parse_geometry, global = true)]
    pub geometry: Option<GeometryPolicy>,

    /// Prefer immediate or mailbox presentation over vsync.
    #[arg(long, global = true)]
    pub no_vsync: bool,

    /// Exit when the shader program fails to compile or link.
    #[arg(long, global = true)]
    pub strict_shaders: bool,

    /// Initial render mode: 1 (square), 2 (triangle) or 3 (square + inverted triangle).
    #[arg(long, value_name = "1|2|3", value_parser = parse_mode, global = true)]
    pub mode: Option<RenderMode>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration as TOML and exit.
    Config,
    /// Compile and link the configured shaders without opening a window.
    CheckShaders,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}' in size '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}' in size '{trimmed}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("window size must be non-zero, got {width}x{height}"));
    }
    Ok((width, height))
}

pub fn parse_mode(value: &str) -> Result<RenderMode, String> {
    let trimmed = value.trim();
    trimmed
        .parse::<u8>()
        .ok()
        .and_then(RenderMode::from_digit)
        .ok_or_else(|| format!("unknown render mode '{trimmed}'; expected 1, 2, or 3"))
}

pub fn parse_geometry(value: &str) -> Result<GeometryPolicy, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accepts_either_separator() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_size(" 640X480 "), Ok((640, 480)));
    }

    #[test]
    fn size_rejects_zero_and_garbage() {
        assert!(parse_size("0x800").is_err());
        assert!(parse_size("1000").is_err());
        assert!(parse_size("widexhigh").is_err());
    }

    #[test]
    fn mode_accepts_only_one_to_three() {
        assert_eq!(parse_mode("3"), Ok(RenderMode::SquareAndInvertedTriangle));
        assert!(parse_mode("0").is_err());
        assert!(parse_mode("4").is_err());
        assert!(parse_mode("square").is_err());
    }

    #[test]
    fn flags_and_subcommands_parse() {
        let cli = Cli::try_parse_from([
            "grafika",
            "--texture-a",
            "a.png",
            "--geometry",
            "transient",
            "--no-vsync",
            "--mode",
            "2",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.texture_a, Some(PathBuf::from("a.png")));
        assert_eq!(cli.run.geometry, Some(GeometryPolicy::Transient));
        assert!(cli.run.no_vsync);
        assert_eq!(cli.run.mode, Some(RenderMode::Triangle));

        let cli = Cli::try_parse_from(["grafika", "check-shaders", "--strict-shaders"]).unwrap();
        assert!(matches!(cli.command, Some(Command::CheckShaders)));
        assert!(cli.run.strict_shaders);
    }
}
