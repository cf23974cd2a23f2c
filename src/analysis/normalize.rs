// Rewrites parsed file paths to portable repository-relative form

use crate::parser::ParsedFile;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Rewrite every path to be relative to `root`, with forward slashes
pub fn normalize_paths(files: &mut [ParsedFile], root: &Path) {
    for file in files.iter_mut() {
        let relative = relative_path(Path::new(&file.path), root);
        debug!("normalized {} -> {}", file.path, relative);
        file.path = relative;
    }
}

/// `path` relative to `base`, using `/` separators.
///
/// Canonical paths are tried first; when either side cannot be resolved or
/// the path lies outside `base`, a lexical relative path with `..`
/// components is computed instead.
pub fn relative_path(path: &Path, base: &Path) -> String {
    if let (Ok(path), Ok(base)) = (path.canonicalize(), base.canonicalize()) {
        if let Ok(stripped) = path.strip_prefix(&base) {
            return to_slash(stripped);
        }
    }
    to_slash(&lexical_relative(path, base))
}

fn lexical_relative(path: &Path, base: &Path) -> PathBuf {
    let path = absolute(path);
    let base = absolute(base);
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();

    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &path[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

/// Absolute, lexically cleaned form of a path (no symlink resolution)
fn absolute(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

fn to_slash(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
