// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::episode::Episode;
use crate::error::StateError;

use super::{ProcessedSet, ProcessedStore};

/// One materialized episode in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub slug: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub identifier: String,
    pub processed_at: String,
}

/// A ledger line: a post written by this tool, or a bare guid from an older
/// state file. Both forms survive a rewrite unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerRecord {
    Post(LedgerEntry),
    LegacyGuid(String),
}

/// On-disk ledger format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFile {
    #[serde(default)]
    pub processed_episodes: Vec<LedgerRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
}

/// Keeps the processed set in a JSON file, rewritten after every recorded episode
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    ledger: LedgerFile,
}

impl LedgerStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ledger: LedgerFile::default(),
        }
    }
}

impl ProcessedStore for LedgerStore {
    fn describe(&self) -> String {
        format!("ledger {}", self.path.display())
    }

    fn load(&mut self) -> Result<ProcessedSet, StateError> {
        self.ledger = read_ledger(&self.path)?;
        debug!(
            path = %self.path.display(),
            count = self.ledger.processed_episodes.len(),
            "loaded ledger"
        );

        let mut slugs = HashSet::new();
        let mut guids = HashSet::new();
        for record in &self.ledger.processed_episodes {
            match record {
                LedgerRecord::Post(entry) => slugs.insert(entry.slug.clone()),
                LedgerRecord::LegacyGuid(guid) => guids.insert(guid.clone()),
            };
        }

        Ok(ProcessedSet::new(slugs).with_guids(guids))
    }

    fn record(&mut self, slug: &str, episode: &Episode) -> Result<(), StateError> {
        let now = Utc::now().to_rfc3339();
        self.ledger
            .processed_episodes
            .push(LedgerRecord::Post(LedgerEntry {
                slug: slug.to_string(),
                identifier: episode.identifier.clone(),
                processed_at: now.clone(),
            }));
        self.ledger.last_run = Some(now);
        write_ledger(&self.path, &self.ledger)
    }
}

/// Read a ledger file; a missing file is an empty ledger
pub fn read_ledger(path: &Path) -> Result<LedgerFile, StateError> {
    if !path.exists() {
        return Ok(LedgerFile::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| StateError::LedgerReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| StateError::LedgerParseFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write the ledger as pretty-printed JSON, creating parent directories
pub fn write_ledger(path: &Path, ledger: &LedgerFile) -> Result<(), StateError> {
    let write_failed = |e: std::io::Error| StateError::LedgerWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(write_failed)?;
    }

    let json = serde_json::to_string_pretty(ledger)?;
    std::fs::write(path, json).map_err(write_failed)
}
