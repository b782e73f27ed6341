// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::episode::Episode;
use crate::error::StateError;

use super::{ProcessedSet, ProcessedStore};

/// Derives the processed set from the subdirectories of the posts root.
///
/// Creating a post directory is what records it, so `record` is a no-op.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    posts_dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(posts_dir: &Path) -> Self {
        Self {
            posts_dir: posts_dir.to_path_buf(),
        }
    }
}

impl ProcessedStore for DirectoryStore {
    fn describe(&self) -> String {
        format!("post directories in {}", self.posts_dir.display())
    }

    fn load(&mut self) -> Result<ProcessedSet, StateError> {
        scan_posts_dir(&self.posts_dir).map(ProcessedSet::new)
    }

    fn record(&mut self, _slug: &str, _episode: &Episode) -> Result<(), StateError> {
        Ok(())
    }
}

/// List the names of the post directories, creating the root if it is missing.
///
/// Plain files and hidden entries are ignored.
pub fn scan_posts_dir(posts_dir: &Path) -> Result<HashSet<String>, StateError> {
    let mut slugs = HashSet::new();

    if !posts_dir.exists() {
        std::fs::create_dir_all(posts_dir).map_err(|e| StateError::CreateDirectoryFailed {
            path: posts_dir.to_path_buf(),
            source: e,
        })?;
        return Ok(slugs);
    }

    let read_failed = |e: std::io::Error| StateError::ReadDirectoryFailed {
        path: posts_dir.to_path_buf(),
        source: e,
    };

    for entry in std::fs::read_dir(posts_dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;

        if !entry.file_type().map_err(read_failed)?.is_dir() {
            continue;
        }

        if let Some(name) = entry.file_name().to_str()
            && !name.starts_with('.')
        {
            slugs.insert(name.to_string());
        }
    }

    debug!(posts_dir = %posts_dir.display(), count = slugs.len(), "scanned post directories");
    Ok(slugs)
}
