//! Dotfile-hiding filesystem view
//!
//! A facade over the filesystem rooted at the served directory. Paths
//! containing a hidden segment resolve to NotFound, so hidden entries
//! are indistinguishable from missing ones, and directory enumeration
//! re-applies the same filter to every child name.

use std::io;
use std::path::{Path, PathBuf};

/// Filesystem view rooted at the served directory
#[derive(Debug, Clone)]
pub struct ServeRoot {
    root: PathBuf,
    hide_dotfiles: bool,
}

/// A resolved filesystem entry
#[derive(Debug)]
pub struct OpenEntry {
    pub path: PathBuf,
    pub name: String,
    pub metadata: std::fs::Metadata,
}

/// Metadata of a directory child, as exposed to listings
#[derive(Debug, Clone)]
pub struct ChildEntry {
    pub name: String,
    pub is_dir: bool,
}

impl ServeRoot {
    pub fn new(root: impl Into<PathBuf>, hide_dotfiles: bool) -> Self {
        Self {
            root: root.into(),
            hide_dotfiles,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a cleaned URL path to an on-disk path, applying the dotfile
    /// filter and the root traversal guard.
    pub fn resolve(&self, url_path: &str) -> io::Result<PathBuf> {
        if self.hide_dotfiles && contains_dot_segment(url_path) {
            return Err(not_found());
        }

        // Cleaned paths never carry "..", but resolve also guards
        // callers handing in raw paths, independent of the dotfile
        // setting. A lexical starts_with check would not catch this:
        // join keeps the ".." component.
        if url_path.split('/').any(|segment| segment == "..") {
            return Err(not_found());
        }

        let full_path = self.root.join(url_path.trim_start_matches('/'));

        if !full_path.starts_with(&self.root) {
            return Err(not_found());
        }

        Ok(full_path)
    }

    /// Resolve and stat an entry
    pub async fn open(&self, url_path: &str) -> io::Result<OpenEntry> {
        let path = self.resolve(url_path)?;
        let metadata = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());

        Ok(OpenEntry {
            path,
            name,
            metadata,
        })
    }

    /// Enumerate the visible children of a directory, sorted by name
    pub async fn read_dir(&self, url_path: &str) -> io::Result<Vec<ChildEntry>> {
        let path = self.resolve(url_path)?;
        let mut entries = tokio::fs::read_dir(&path).await?;
        let mut children = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.hide_dotfiles && name.starts_with('.') {
                continue;
            }

            let is_dir = entry.file_type().await?.is_dir();
            children.push(ChildEntry { name, is_dir });
        }

        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

fn not_found() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "no such file or directory")
}

fn contains_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

/// Normalize a request path: percent-decode, force a leading slash and
/// resolve `.`/`..` segments against a stack so the result never
/// escapes the root.
pub fn clean_path(raw: &str) -> String {
    let decoded = percent_encoding::percent_decode_str(raw).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}
