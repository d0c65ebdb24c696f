use anyhow::Context;
use std::path::Path;

pub mod config;
pub mod encode;
pub mod github;
pub mod path;
pub mod select;
pub mod upload;

use config::load_config;
use github::Transport;
use select::{FileFilter, select_files};
use upload::{UploadSummary, Uploader};

/// Runs one synchronization pass of `root` using the config at `config_path`.
///
/// Configuration problems are returned before the tree is walked or any
/// request is sent. Individual file failures only show up in the summary.
pub fn run<T: Transport + ?Sized>(
    config_path: &Path,
    root: &Path,
    transport: &T,
) -> anyhow::Result<UploadSummary> {
    let config = load_config(config_path).context("cannot load configuration")?;
    log::info!(
        "uploading {} to {}@{}",
        root.display(),
        config.full_repo_name(),
        config.branch
    );

    let config_name = config_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let filter = FileFilter::new(config.hidden, &config_name);
    let candidates: Vec<_> = select_files(root, &filter).collect();
    println!("Found {} files to upload", candidates.len());

    let summary = Uploader::new(&config, transport).upload_all(candidates);
    println!("Uploaded {}/{} files", summary.succeeded, summary.total());
    Ok(summary)
}
