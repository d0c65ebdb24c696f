use anyhow::Context;
use clap::Parser;
use gh_upload::config::DEFAULT_CONFIG_PATH;
use gh_upload::github::HttpTransport;
use std::path::PathBuf;

/// Publish every file under a directory to a GitHub repository branch.
#[derive(clap::Parser)]
struct Args {
    /// Configuration file (JSON, or TOML with a `.toml` extension).
    #[clap(long, default_value(DEFAULT_CONFIG_PATH))]
    config: PathBuf,
    /// Directory whose files are uploaded.
    #[clap(long, default_value("."))]
    root: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let transport = HttpTransport::new()?;
    gh_upload::run(&args.config, &args.root, &transport).context("upload aborted")?;
    Ok(())
}
