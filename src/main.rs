use clap::Parser;
use std::path::PathBuf;

use design_studio_lib::RunOptions;

/// Restyle a photo of your room and refine the design by chatting.
#[derive(Debug, Parser)]
#[command(name = "design-studio", version, about)]
struct Cli {
    /// Room photo to upload on start
    image: Option<PathBuf>,

    /// Directory for settings.json and logs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Image model to call
    #[arg(long)]
    model: Option<String>,

    /// API key for this run (otherwise settings.json, then API_KEY / GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Store --api-key in settings.json
    #[arg(long, requires = "api_key")]
    remember_key: bool,

    /// Log at debug level for every crate
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    design_studio_lib::run(RunOptions {
        data_dir: cli.data_dir,
        model: cli.model,
        api_key: cli.api_key,
        remember_key: cli.remember_key,
        verbose: cli.verbose,
        image: cli.image,
    })
}
