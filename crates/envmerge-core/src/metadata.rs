//! Locator for numbered `data*.xml` metadata files

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const METADATA_STEM: &str = "data";
const METADATA_EXTENSION: &str = ".xml";

/// A metadata file and the index declared by its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFile {
    /// Full path to the file
    pub path: PathBuf,
    /// 0 for `data.xml`, N for `dataN.xml`
    pub index: i32,
}

/// Check whether a file name passes the metadata pre-filter
///
/// The extension must be exactly `.xml` and the name must contain `data`
/// somewhere. Candidates whose index cannot be parsed are still candidates:
/// they are neither metadata nor content.
pub fn is_metadata_candidate(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext == &METADATA_EXTENSION[1..])
        && file_name.contains(METADATA_STEM)
}

/// Extract the metadata index from a file name
///
/// Examples:
/// - "data.xml" -> Some(0)
/// - "data0000123.xml" -> Some(123)
/// - "data0.xml" -> None (zero suffix is dropped)
/// - "userdata.xml" -> None (suffix "user" does not parse)
pub fn metadata_index(file_name: &str) -> Option<i32> {
    if !is_metadata_candidate(file_name) {
        return None;
    }

    let suffix = file_name
        .replace(METADATA_STEM, "")
        .replace(METADATA_EXTENSION, "");

    if suffix.is_empty() {
        return Some(0);
    }

    match suffix.trim().parse::<i32>() {
        Ok(index) if index > 0 => Some(index),
        _ => None,
    }
}

/// Pick the metadata files out of a list of files and order them
///
/// Files are ordered by ascending index. Equal indices keep the order in
/// which they were given, so files from the first environment stay ahead of
/// files from the second. Nothing is deduplicated.
pub fn locate_metadata_files<I, P>(files: I) -> Vec<MetadataFile>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut located: Vec<MetadataFile> = files
        .into_iter()
        .filter_map(|file| {
            let path = file.as_ref();
            let index = path.file_name().and_then(|n| n.to_str()).and_then(metadata_index)?;
            Some(MetadataFile {
                path: path.to_path_buf(),
                index,
            })
        })
        .collect();

    // sort_by_key is stable
    located.sort_by_key(|m| m.index);
    located
}

/// Output name for the metadata file at a given position of the merged list
pub fn renumbered_name(position: usize) -> String {
    if position == 0 {
        format!("{}{}", METADATA_STEM, METADATA_EXTENSION)
    } else {
        format!("{}{:07}{}", METADATA_STEM, position + 1, METADATA_EXTENSION)
    }
}

/// List the files directly inside a directory, sorted by name
///
/// A missing directory has no files.
pub fn list_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let read_error = |e: std::io::Error| Error::FileRead {
        path: dir.to_path_buf(),
        source: e,
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_error(e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(read_error)?;
        // Follows symlinks, like the tree walker
        if entry.path().is_file() {
            files.push(entry.path());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
