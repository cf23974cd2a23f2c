//! Commit history read from a local git repository via the `git` CLI.
//!
//! History is optional: a directory that is not a repository root, a missing
//! `git` binary, or a failing command all produce an empty [`RepoHistory`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

const RECORD_SEP: char = '\u{1e}';
const FIELD_SEP: char = '\u{1f}';

/// Per-file change counts within one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub path: String,
    pub insertions: u64,
    pub deletions: u64,
    /// insertions + deletions
    pub lines: u64,
}

/// One commit and the files it touched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    pub email: String,
    /// Committer date, ISO 8601
    pub date: String,
    pub message: String,
    pub files: Vec<FileStat>,
}

/// A file ranked by the number of commits touching it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotspot {
    pub file: String,
    pub touches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoHistory {
    pub commits: Vec<CommitRecord>,
    pub hotspots: Vec<Hotspot>,
}

impl RepoHistory {
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.hotspots.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct HistoryOptions {
    pub commit_limit: usize,
    pub hotspot_limit: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            commit_limit: 10,
            hotspot_limit: 10,
        }
    }
}

/// Latest commits and hotspots for the repository rooted at `root`
pub fn describe_repo(root: &Path, options: &HistoryOptions) -> RepoHistory {
    if !root.join(".git").exists() {
        debug!("{} is not a git repository root, skipping history", root.display());
        return RepoHistory::default();
    }

    match read_history(root, options) {
        Ok(history) => history,
        Err(e) => {
            warn!("git history unavailable: {}", e);
            RepoHistory::default()
        }
    }
}

fn read_history(root: &Path, options: &HistoryOptions) -> Result<RepoHistory> {
    let format = format!("--format={RECORD_SEP}%H{FIELD_SEP}%an{FIELD_SEP}%ae{FIELD_SEP}%cI{FIELD_SEP}%B{FIELD_SEP}");
    let limit = options.commit_limit.to_string();
    let log = run_git(root, &["log", "-n", &limit, "--numstat", &format])?;
    let commits = parse_log(&log);

    let touched = run_git(root, &["log", "--name-only", "--format="])?;
    let hotspots = rank_hotspots(&touched, options.hotspot_limit);

    debug!(commits = commits.len(), hotspots = hotspots.len(), "read git history");
    Ok(RepoHistory { commits, hotspots })
}

fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .map_err(|e| Error::history(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::history(format!("git {} failed: {}", args[0], stderr.trim())));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `git log --numstat` output written with record/unit separators
pub fn parse_log(output: &str) -> Vec<CommitRecord> {
    output
        .split(RECORD_SEP)
        .filter(|chunk| !chunk.trim().is_empty())
        .filter_map(parse_commit)
        .collect()
}

fn parse_commit(chunk: &str) -> Option<CommitRecord> {
    let mut fields = chunk.splitn(6, FIELD_SEP);
    let hash = fields.next()?.trim().to_string();
    let author = fields.next()?.to_string();
    let email = fields.next()?.to_string();
    let date = fields.next()?.to_string();
    let message = fields.next()?.trim().to_string();
    let stats = fields.next().unwrap_or("");

    if hash.is_empty() {
        return None;
    }

    Some(CommitRecord {
        hash,
        author,
        email,
        date,
        message,
        files: stats.lines().filter_map(parse_numstat).collect(),
    })
}

/// `insertions<TAB>deletions<TAB>path`; binary files report `-`
fn parse_numstat(line: &str) -> Option<FileStat> {
    let mut parts = line.splitn(3, '\t');
    let insertions = parts.next()?.trim();
    let deletions = parts.next()?.trim();
    let path = parts.next()?.trim();
    if path.is_empty() {
        return None;
    }

    let insertions = insertions.parse().unwrap_or(0);
    let deletions = deletions.parse().unwrap_or(0);
    Some(FileStat {
        path: path.to_string(),
        insertions,
        deletions,
        lines: insertions + deletions,
    })
}

/// Count how many commits touched each path in `git log --name-only` output
pub fn rank_hotspots(output: &str, limit: usize) -> Vec<Hotspot> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        *counts.entry(line).or_insert(0) += 1;
    }

    let mut ranked: Vec<Hotspot> = counts
        .into_iter()
        .map(|(file, touches)| Hotspot {
            file: file.to_string(),
            touches,
        })
        .collect();
    ranked.sort_by(|a, b| b.touches.cmp(&a.touches).then_with(|| a.file.cmp(&b.file)));
    ranked.truncate(limit);
    ranked
}
