use anyhow::{Context, Result};
use bracetopia_app::{
    Cli, PrintRenderer, TerminalRenderer, cli,
    renderer::{Renderer, RendererContext},
};
use bracetopia_core::World;
use clap::Parser;
use tracing::info;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = cli::exit_code(err.kind());
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing();

    let config = cli.to_config();
    let mut world = World::new(config).context("failed to initialize bracetopia world")?;

    let renderer: Box<dyn Renderer> = match cli.count {
        Some(count) => Box::new(PrintRenderer::new(count)),
        None => Box::new(TerminalRenderer::new(cli.cycle_delay())),
    };

    info!(renderer = renderer.name(), "Starting bracetopia");
    renderer.run(RendererContext { world: &mut world })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
