use crate::path::local_to_remote;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Files that ship next to the uploader and never belong in the repository.
const BUNDLED_FILE_NAMES: &[&str] = &[
    env!("CARGO_PKG_NAME"),
    concat!(env!("CARGO_PKG_NAME"), ".exe"),
    "gh_upload.rs",
    "cacert.pem",
    "libcurl-x64.dll",
];

const BACKUP_EXTENSIONS: &[&str] = &["bak"];

/// A local file selected for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub local_path: PathBuf,
    pub remote_path: String,
}

#[derive(Clone, Debug)]
pub struct FileFilter {
    pub hidden: bool,
    pub excluded_names: Vec<String>,
    pub excluded_extensions: Vec<String>,
}

impl FileFilter {
    /// Filter with the always-excluded names, including the config file itself.
    pub fn new(hidden: bool, config_file_name: &str) -> Self {
        let mut excluded_names: Vec<String> =
            BUNDLED_FILE_NAMES.iter().map(|name| name.to_string()).collect();
        excluded_names.push(config_file_name.to_string());
        Self {
            hidden,
            excluded_names,
            excluded_extensions: BACKUP_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    fn prunes_dir(&self, entry: &DirEntry) -> bool {
        !self.hidden && entry.depth() > 0 && is_hidden(entry)
    }

    fn accepts_file(&self, entry: &DirEntry) -> bool {
        if !is_regular_file(entry) {
            return false;
        }
        if !self.hidden && is_hidden(entry) {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if self.excluded_names.iter().any(|excluded| *excluded == name) {
            return false;
        }
        let extension = entry.path().extension().and_then(OsStr::to_str);
        !extension.is_some_and(|ext| self.excluded_extensions.iter().any(|excluded| excluded == ext))
    }
}

/// Links are followed for files only; linked directories are not descended.
fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Lazily walks `root` and yields every regular file that passes `filter`.
///
/// Traversal order is whatever the platform directory iteration produces.
pub fn select_files<'a>(root: &'a Path, filter: &'a FileFilter) -> impl Iterator<Item = Candidate> + 'a {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(move |entry| !(entry.file_type().is_dir() && filter.prunes_dir(entry)))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                log::warn!("skipping unreadable entry: {error}");
                None
            }
        })
        .filter(move |entry| filter.accepts_file(entry))
        .filter_map(move |entry| {
            let remote_path = local_to_remote(root, entry.path())?;
            Some(Candidate {
                local_path: entry.into_path(),
                remote_path,
            })
        })
}
