use std::ffi::OsStr;
use std::path::{Component, Path};

/// Converts a `/`-separated local path into the escaped remote path.
///
/// A leading `./` is dropped and every segment is percent-encoded on its own,
/// so the separators survive while `/`-free segments get escaped.
pub fn normalize(local: &str) -> String {
    let local = local.strip_prefix("./").unwrap_or(local);
    local
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Remote path for `path` found while walking `root`.
///
/// Returns `None` when `path` is the root itself or lies outside of it.
pub fn local_to_remote(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(encode_segment(name)),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Escapes the raw bytes of a file name, so non-UTF-8 names keep their identity.
#[cfg(unix)]
fn encode_segment(name: &OsStr) -> String {
    use std::os::unix::ffi::OsStrExt;
    urlencoding::encode_binary(name.as_bytes()).into_owned()
}

#[cfg(not(unix))]
fn encode_segment(name: &OsStr) -> String {
    urlencoding::encode(&name.to_string_lossy()).into_owned()
}
