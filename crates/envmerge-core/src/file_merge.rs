//! Merging of file-based resource folders
//!
//! Metadata files from the top level of both sources are renumbered into one
//! contiguous series. Every other file is copied with first-source-wins
//! precedence; files already present in the output are left alone, so an
//! interrupted run can be resumed.

use crate::error::{Error, Result};
use crate::metadata::{list_files, locate_metadata_files, renumbered_name};
use crate::policy::MergeStrategy;
use crate::report::FolderReport;
use crate::walker::{collect_first_wins, TreeWalker};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Merge one file-based folder from both environments into `destination`
///
/// `destination` must already exist. The report is named after it.
pub fn merge_file_folder(env1_dir: &Path, env2_dir: &Path, destination: &Path) -> Result<FolderReport> {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut report = FolderReport::new(name, MergeStrategy::FileBased);

    report.metadata_files = write_renumbered_metadata(env1_dir, env2_dir, destination)?;

    let entries = collect_first_wins([
        TreeWalker::new(env1_dir, destination).exclude_metadata(true),
        TreeWalker::new(env2_dir, destination).exclude_metadata(true),
    ])?;

    let total = entries.len();
    info!("{} files found", total);

    for (i, entry) in entries.iter().enumerate() {
        if entry.destination.exists() {
            report.files_skipped += 1;
            continue;
        }

        fs::copy(&entry.source, &entry.destination).map_err(|e| Error::Copy {
            from: entry.source.clone(),
            to: entry.destination.clone(),
            source: e,
        })?;
        report.files_copied += 1;
        debug!("{}/{}", i + 1, total);
    }

    Ok(report)
}

/// Copy every metadata file of both sources under its position-based name
///
/// Declared indices only decide the order; the output series is always
/// `data.xml`, `data0000002.xml`, `data0000003.xml`, ... Existing files with
/// those names are overwritten.
pub fn write_renumbered_metadata(env1_dir: &Path, env2_dir: &Path, destination: &Path) -> Result<usize> {
    let mut files = list_files(env1_dir)?;
    files.extend(list_files(env2_dir)?);

    let metadata = locate_metadata_files(&files);

    for (position, file) in metadata.iter().enumerate() {
        let target = destination.join(renumbered_name(position));
        fs::copy(&file.path, &target).map_err(|e| Error::Copy {
            from: file.path.clone(),
            to: target.clone(),
            source: e,
        })?;
    }

    Ok(metadata.len())
}
