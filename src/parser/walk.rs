// Directory discovery for source parsers

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Options controlling how a directory tree is walked
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Directory names skipped entirely
    pub exclude_dirs: Vec<String>,
    /// Visit directory entries sorted by file name instead of filesystem order
    pub sort_files: bool,
    pub follow_links: bool,
    /// Parse discovered files on the rayon pool
    pub parallel: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            sort_files: true,
            follow_links: false,
            parallel: true,
        }
    }
}

impl WalkOptions {
    /// Walk everything, in raw filesystem order, on one thread
    pub fn unfiltered() -> Self {
        Self {
            exclude_dirs: Vec::new(),
            sort_files: false,
            follow_links: false,
            parallel: false,
        }
    }
}

/// Only version-control metadata is skipped unless more names are configured
pub fn default_exclude_dirs() -> Vec<String> {
    vec![".git".to_string()]
}

/// Whether a file name ends with one of the given suffixes
pub fn matches_extension(file_name: &str, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| file_name.ends_with(ext))
}

/// Collect every file under `root` whose name ends with one of `extensions`
pub fn discover_files(root: &Path, extensions: &[&str], options: &WalkOptions) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(root).follow_links(options.follow_links);
    if options.sort_files {
        walker = walker.sort_by_file_name();
    }

    let mut files = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| !is_excluded(e, options))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if matches_extension(&name, extensions) {
            files.push(path.to_path_buf());
        }
    }

    files
}

fn is_excluded(entry: &DirEntry, options: &WalkOptions) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    options.exclude_dirs.iter().any(|d| *d == name)
}
