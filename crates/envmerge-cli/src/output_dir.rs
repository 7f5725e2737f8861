//! Output directory selection

use envmerge_core::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Pick and create the directory the merged environment is written to
///
/// Without a request a UUID-named directory is created in the working
/// directory. If the requested directory exists, the number of sibling
/// directories starting with the same name is appended to it.
pub fn create_output_dir(requested: Option<&Path>) -> Result<PathBuf> {
    let path = match requested {
        None => PathBuf::from(Uuid::new_v4().to_string()),
        Some(path) if !path.exists() => path.to_path_buf(),
        Some(path) => {
            let candidate = numbered_sibling(path)?;
            if candidate.exists() {
                return Err(Error::OutputPathConflict(candidate));
            }
            candidate
        }
    };

    fs::create_dir_all(&path).map_err(|e| Error::FileWrite {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

fn numbered_sibling(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::OutputPathConflict(path.to_path_buf()))?
        .to_string_lossy()
        .into_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut count = 0;
    for entry in fs::read_dir(parent).map_err(|e| Error::FileRead {
        path: parent.to_path_buf(),
        source: e,
    })? {
        let entry = entry?;
        if entry.path().is_dir() && entry.file_name().to_string_lossy().starts_with(&name) {
            count += 1;
        }
    }

    let mut numbered = OsString::from(&name);
    numbered.push(count.to_string());
    Ok(path.with_file_name(numbered))
}
