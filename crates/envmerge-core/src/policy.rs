//! Folder classification policy
//!
//! Maps a resource subfolder name to the strategy used to merge it. The
//! table is plain data so it can be loaded from and saved to JSON.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Folders merged file by file unless a policy file says otherwise
pub const DEFAULT_FILE_BASED_FOLDERS: &[&str] = &[
    "Assets",
    "Documents",
    "Fonts",
    "Workspaces",
    "ViewPreferences",
    "ThreeDModels",
    "FoldingSettings",
];

/// How a resource subfolder is merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Files on disk: renumber metadata, copy everything else
    FileBased,
    /// Item lists: union the items of every metadata document
    RecordBased,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::FileBased => write!(f, "file-based"),
            MergeStrategy::RecordBased => write!(f, "record-based"),
        }
    }
}

/// Name -> strategy table with a fallback for unknown folders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderPolicy {
    /// Explicit strategies, keyed by exact folder name
    #[serde(default)]
    pub folders: BTreeMap<String, MergeStrategy>,
    /// Strategy for folders not in the table
    #[serde(default = "default_fallback")]
    pub fallback: MergeStrategy,
}

fn default_fallback() -> MergeStrategy {
    MergeStrategy::RecordBased
}

impl Default for FolderPolicy {
    fn default() -> Self {
        DEFAULT_FILE_BASED_FOLDERS
            .iter()
            .fold(Self::empty(), |policy, name| {
                policy.with_folder(*name, MergeStrategy::FileBased)
            })
    }
}

impl FolderPolicy {
    /// A policy with no entries; everything gets the fallback
    pub fn empty() -> Self {
        Self {
            folders: BTreeMap::new(),
            fallback: default_fallback(),
        }
    }

    /// Set the strategy for a folder name
    pub fn with_folder(mut self, name: impl Into<String>, strategy: MergeStrategy) -> Self {
        self.folders.insert(name.into(), strategy);
        self
    }

    /// Set the strategy for folders not in the table
    pub fn with_fallback(mut self, strategy: MergeStrategy) -> Self {
        self.fallback = strategy;
        self
    }

    /// Strategy for a folder name (case-sensitive)
    pub fn classify(&self, name: &str) -> MergeStrategy {
        self.folders.get(name).copied().unwrap_or(self.fallback)
    }

    /// Load a policy from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the policy to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_file_based() {
        let policy = FolderPolicy::default();
        for name in DEFAULT_FILE_BASED_FOLDERS {
            assert_eq!(policy.classify(name), MergeStrategy::FileBased);
        }
    }

    #[test]
    fn test_unknown_is_record_based() {
        let policy = FolderPolicy::default();
        assert_eq!(policy.classify("Layers"), MergeStrategy::RecordBased);
        // Names are case-sensitive
        assert_eq!(policy.classify("fonts"), MergeStrategy::RecordBased);
    }

    #[test]
    fn test_custom_table() {
        let policy = FolderPolicy::empty()
            .with_folder("Layers", MergeStrategy::FileBased)
            .with_fallback(MergeStrategy::FileBased);

        assert_eq!(policy.classify("Layers"), MergeStrategy::FileBased);
        assert_eq!(policy.classify("Fonts"), MergeStrategy::FileBased);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"folders": {"Fonts": "file_based", "Layers": "record_based"}}"#;
        let policy: FolderPolicy = serde_json::from_str(json).unwrap();

        assert_eq!(policy.classify("Fonts"), MergeStrategy::FileBased);
        assert_eq!(policy.classify("Layers"), MergeStrategy::RecordBased);
        assert_eq!(policy.fallback, MergeStrategy::RecordBased);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("policy.json");

        FolderPolicy::default().save(&path).unwrap();
        let loaded = FolderPolicy::load(&path).unwrap();

        assert_eq!(loaded, FolderPolicy::default());
    }
}
