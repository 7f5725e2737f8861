//! Merging of record-based resource folders
//!
//! Every metadata file of both sources is an item list. The first one is the
//! merge target; the items of all the others are appended to it in order and
//! the result is written as a single `data.xml`.

use crate::error::Result;
use crate::metadata::{list_files, locate_metadata_files, renumbered_name};
use crate::policy::MergeStrategy;
use crate::report::FolderReport;
use crate::xml::ItemListDocument;
use std::path::Path;
use tracing::{info, warn};

/// Merge one record-based folder from both environments into `destination`
///
/// Malformed documents are recorded in the report: a malformed target
/// abandons the folder, any other malformed document is skipped. I/O
/// failures are returned as errors.
pub fn merge_record_folder(
    env1_dir: &Path,
    env2_dir: &Path,
    destination: &Path,
) -> Result<FolderReport> {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut report = FolderReport::new(name, MergeStrategy::RecordBased);

    let mut files = list_files(env1_dir)?;
    files.extend(list_files(env2_dir)?);
    let metadata = locate_metadata_files(&files);
    report.metadata_files = metadata.len();

    let Some((first, rest)) = metadata.split_first() else {
        return Ok(report);
    };

    let mut target = match ItemListDocument::load(&first.path) {
        Ok(doc) => doc,
        Err(e) if e.is_recoverable() => {
            warn!("data.xml for {} is wrong: {}", report.name, e);
            report.add_issue(&first.path, e.to_string());
            return Ok(report);
        }
        Err(e) => return Err(e),
    };
    report.documents_merged = 1;

    for file in rest {
        let doc = match ItemListDocument::load(&file.path) {
            Ok(doc) => doc,
            Err(e) if e.is_recoverable() => {
                warn!("data.xml for {} is wrong: {}", report.name, e);
                report.add_issue(&file.path, e.to_string());
                continue;
            }
            Err(e) => return Err(e),
        };

        let imported = target.import_items(&doc);
        report.documents_merged += 1;
        info!("imported {} items from {}", imported, file.path.display());
    }

    report.items_merged = target.item_count();
    target.save(destination.join(renumbered_name(0)))?;

    Ok(report)
}
