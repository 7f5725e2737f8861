//! Recursive tree walker mapping source files onto an output subtree

use crate::error::{Error, Result};
use crate::metadata::is_metadata_candidate;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A source file and the path it will be copied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// File inside the source subtree
    pub source: PathBuf,
    /// Same relative path under the destination root
    pub destination: PathBuf,
}

/// Lazy walk over every file of a source subtree
///
/// Directories are not yielded; instead the matching destination directory
/// is created when the walk reaches them, so empty directories are mirrored
/// as well. Entries come out depth-first, sorted by file name.
pub struct TreeWalker {
    source: PathBuf,
    destination: PathBuf,
    exclude_metadata: bool,
    entries: walkdir::IntoIter,
}

impl TreeWalker {
    /// Walk `source`, rebasing every file onto `destination`
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let entries = WalkDir::new(&source)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        Self {
            source,
            destination: destination.into(),
            exclude_metadata: false,
            entries,
        }
    }

    /// Skip metadata files lying directly in the source root
    ///
    /// Files named like metadata in nested directories are ordinary content.
    pub fn exclude_metadata(mut self, exclude: bool) -> Self {
        self.exclude_metadata = exclude;
        self
    }

    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        self.exclude_metadata
            && entry.depth() == 1
            && entry.file_name().to_str().is_some_and(is_metadata_candidate)
    }
}

impl Iterator for TreeWalker {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(Error::WalkDir(e))),
            };

            let relative = match entry.path().strip_prefix(&self.source) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };
            let destination = self.destination.join(relative);

            if entry.file_type().is_dir() {
                if let Err(source) = fs::create_dir_all(&destination) {
                    return Some(Err(Error::FileWrite {
                        path: destination,
                        source,
                    }));
                }
                continue;
            }

            if self.is_excluded(&entry) {
                continue;
            }

            return Some(Ok(WalkEntry {
                source: entry.into_path(),
                destination,
            }));
        }
    }
}

/// Destination paths already taken by an earlier walk
///
/// The first walk to claim a path owns it; this is how environment 1 wins
/// collisions over environment 2.
#[derive(Debug, Default)]
pub struct DestinationClaims {
    claimed: HashSet<PathBuf>,
}

impl DestinationClaims {
    /// Create an empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a destination; false if it was already claimed
    pub fn claim(&mut self, destination: &Path) -> bool {
        if self.claimed.contains(destination) {
            return false;
        }
        self.claimed.insert(destination.to_path_buf())
    }

    /// Number of claimed destinations
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// True if nothing has been claimed
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// Walk each source in turn and keep the first entry for every destination
pub fn collect_first_wins<I>(walkers: I) -> Result<Vec<WalkEntry>>
where
    I: IntoIterator<Item = TreeWalker>,
{
    let mut claims = DestinationClaims::new();
    let mut entries = Vec::new();

    for walker in walkers {
        for entry in walker {
            let entry = entry?;
            if claims.claim(&entry.destination) {
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}
