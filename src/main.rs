use clap::Parser;
use deepoverlay::cli::{run, Cli};
use deepoverlay::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format())?;

    tracing::debug!("DeepOverlay {}", deepoverlay::VERSION);

    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())?;

    Ok(())
}
