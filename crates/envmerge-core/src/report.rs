//! Run report for a merge
//!
//! Records what happened to each resource folder so a run can be reviewed
//! after the fact or saved next to the merged output.

use crate::error::Result;
use crate::policy::MergeStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of merging one resource folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderReport {
    /// Folder name under Resources
    pub name: String,
    /// Strategy the folder was merged with
    pub strategy: MergeStrategy,
    /// Metadata files written (file-based) or read (record-based)
    pub metadata_files: usize,
    /// Content files copied
    pub files_copied: usize,
    /// Content files skipped because the destination already existed
    pub files_skipped: usize,
    /// Documents whose items made it into the merged data.xml
    pub documents_merged: usize,
    /// Items in the merged data.xml
    pub items_merged: usize,
    /// Per-file problems that did not stop the run
    pub issues: Vec<(PathBuf, String)>,
}

impl FolderReport {
    /// Create an empty report for a folder
    pub fn new(name: impl Into<String>, strategy: MergeStrategy) -> Self {
        Self {
            name: name.into(),
            strategy,
            metadata_files: 0,
            files_copied: 0,
            files_skipped: 0,
            documents_merged: 0,
            items_merged: 0,
            issues: Vec::new(),
        }
    }

    /// Record a recoverable problem with a file
    pub fn add_issue(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        self.issues.push((path.into(), message.into()));
    }

    /// True if nothing went wrong
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Report for a whole merge run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    /// When the merge started
    pub started_at: DateTime<Utc>,
    /// When the merge finished
    pub finished_at: Option<DateTime<Utc>>,
    /// First input environment
    pub environment1: PathBuf,
    /// Second input environment
    pub environment2: PathBuf,
    /// Output environment
    pub output: PathBuf,
    /// Merged folders, in processing order
    pub folders: Vec<FolderReport>,
    /// Folders present in only one environment
    pub unmatched: Vec<String>,
}

impl MergeReport {
    /// Start a report for a run
    pub fn start(environment1: PathBuf, environment2: PathBuf, output: PathBuf) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            environment1,
            environment2,
            output,
            folders: Vec::new(),
            unmatched: Vec::new(),
        }
    }

    /// Mark the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Find a folder report by name
    pub fn find_folder(&self, name: &str) -> Option<&FolderReport> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// Total number of issues across all folders
    pub fn total_issues(&self) -> usize {
        self.folders.iter().map(|f| f.issues.len()).sum()
    }

    /// Total number of content files copied
    pub fn total_files_copied(&self) -> usize {
        self.folders.iter().map(|f| f.files_copied).sum()
    }

    /// Save the report as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
