mod cli;
mod config;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config) => run::print_config(cli.run),
        Some(Command::CheckShaders) => run::check_shaders(cli.run),
        None => run::run(cli.run),
    }
}
