//! Top-level merge of two environments

use crate::error::{Error, Result};
use crate::file_merge::merge_file_folder;
use crate::policy::{FolderPolicy, MergeStrategy};
use crate::record_merge::merge_record_folder;
use crate::report::{FolderReport, MergeReport};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Name of the folder holding the mergeable resources of an environment
pub const RESOURCES_DIR: &str = "Resources";

/// Merges the Resources folders of two environments into a third
#[derive(Debug, Clone, Default)]
pub struct EnvironmentMerger {
    policy: FolderPolicy,
}

impl EnvironmentMerger {
    /// Create a merger using the given classification policy
    pub fn new(policy: FolderPolicy) -> Self {
        Self { policy }
    }

    /// The classification policy in use
    pub fn policy(&self) -> &FolderPolicy {
        &self.policy
    }

    /// Merge `env1` and `env2` into `output`
    ///
    /// Only folders present under both `Resources` directories are merged;
    /// on name collisions `env1` wins. `output` is created if needed.
    pub fn merge(&self, env1: &Path, env2: &Path, output: &Path) -> Result<MergeReport> {
        for env in [env1, env2] {
            if !env.is_dir() {
                return Err(Error::MissingInput(env.to_path_buf()));
            }
        }

        let env1_resources = env1.join(RESOURCES_DIR);
        let env2_resources = env2.join(RESOURCES_DIR);
        if !env1_resources.is_dir() && !env2_resources.is_dir() {
            return Err(Error::MissingResourcesFolder {
                env1: env1.to_path_buf(),
                env2: env2.to_path_buf(),
            });
        }

        let mut report = MergeReport::start(
            env1.to_path_buf(),
            env2.to_path_buf(),
            output.to_path_buf(),
        );

        let env1_folders = list_subfolders(&env1_resources)?;
        let mut pending = list_subfolders(&env2_resources)?;
        let output_resources = output.join(RESOURCES_DIR);

        for name in env1_folders {
            let Some(position) = pending.iter().position(|n| *n == name) else {
                debug!("{} only exists in {}, skipping", name, env1.display());
                report.unmatched.push(name);
                continue;
            };
            pending.remove(position);

            let folder = self.merge_folder(
                &name,
                &env1_resources.join(&name),
                &env2_resources.join(&name),
                &output_resources.join(&name),
            )?;
            report.folders.push(folder);
        }

        for name in pending {
            debug!("{} only exists in {}, skipping", name, env2.display());
            report.unmatched.push(name);
        }

        report.finish();
        info!("Merge is done");
        Ok(report)
    }

    /// Merge a single resource folder that exists in both environments
    pub fn merge_folder(
        &self,
        name: &str,
        env1_dir: &Path,
        env2_dir: &Path,
        destination: &Path,
    ) -> Result<FolderReport> {
        let strategy = self.policy.classify(name);
        info!("Merging {} ({})", name, strategy);

        fs::create_dir_all(destination).map_err(|e| Error::FileWrite {
            path: destination.to_path_buf(),
            source: e,
        })?;

        let mut folder = match strategy {
            MergeStrategy::FileBased => merge_file_folder(env1_dir, env2_dir, destination)?,
            MergeStrategy::RecordBased => merge_record_folder(env1_dir, env2_dir, destination)?,
        };
        folder.name = name.to_string();

        info!(
            "Finished {}: {} metadata files, {} copied, {} skipped, {} items, {} issues",
            name,
            folder.metadata_files,
            folder.files_copied,
            folder.files_skipped,
            folder.items_merged,
            folder.issues.len()
        );
        Ok(folder)
    }
}

/// Names of the directories directly inside `dir`, sorted
///
/// A missing directory has no subfolders.
fn list_subfolders(dir: &Path) -> Result<Vec<String>> {
    let read_error = |e: std::io::Error| Error::FileRead {
        path: dir.to_path_buf(),
        source: e,
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_error(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(read_error)?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names)
}
