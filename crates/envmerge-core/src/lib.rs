//! envmerge-core: Core library for merging two environment directories
//!
//! This library provides functionality to:
//! - Locate and renumber indexed `data*.xml` metadata files
//! - Walk resource folders and copy files with first-source-wins precedence
//! - Classify resource folders as file-based or record-based
//! - Union the item lists of record-based metadata documents
//! - Merge whole environments and report what happened per folder

pub mod error;
pub mod file_merge;
pub mod metadata;
pub mod orchestrator;
pub mod policy;
pub mod record_merge;
pub mod report;
pub mod walker;
pub mod xml;

pub use error::{Error, Result};
pub use file_merge::merge_file_folder;
pub use metadata::{locate_metadata_files, metadata_index, renumbered_name, MetadataFile};
pub use orchestrator::{EnvironmentMerger, RESOURCES_DIR};
pub use policy::{FolderPolicy, MergeStrategy};
pub use record_merge::merge_record_folder;
pub use report::{FolderReport, MergeReport};
pub use walker::{TreeWalker, WalkEntry};
pub use xml::{ItemListDocument, ItemNode};
