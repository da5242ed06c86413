//! Output directory reconciliation for Bindery.
//!
//! The [`Reconciler`] owns one target directory for the duration of a build.
//! It tracks every generated file in a manifest persisted inside the
//! directory, and on the next run deletes exactly the files that were
//! generated before but not this time. Files it never recorded (anything a
//! user placed in the directory) are never touched, regardless of age.
//!
//! The manifest file doubles as the ownership sentinel: a directory carrying
//! one is "ours", a non-empty directory without one triggers a one-time
//! warning on the diagnostic channel before being adopted.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Well-known manifest/sentinel filename inside the output directory.
pub const MANIFEST_NAME: &str = ".bindery-build";

/// Output reconciliation error.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl OutputError {
    fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Owner of one output directory for one build run.
///
/// The manifest read/merge/write sequence is single-writer: one reconciler
/// per target directory per run. Concurrent builds of the same directory
/// are unsupported; no lock is taken and the last writer wins.
#[derive(Debug)]
pub struct Reconciler {
    root: PathBuf,
    previous: BTreeSet<String>,
    current: BTreeSet<String>,
    warned_foreign: bool,
}

impl Reconciler {
    /// Take ownership of `root`, creating it if absent.
    ///
    /// An existing non-empty directory without a manifest is adopted with a
    /// one-time warning; the sentinel written here keeps the warning from
    /// repeating on later runs.
    pub fn setup(root: impl Into<PathBuf>) -> Result<Self, OutputError> {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_NAME);
        let mut warned_foreign = false;

        if root.is_dir() {
            let previous = read_manifest(&manifest_path)?;
            if previous.is_none() && !is_empty_dir(&root)? {
                tracing::warn!(path = %root.display(), "outputting to an existing directory");
                warned_foreign = true;
            }
            if previous.is_none() {
                // Sentinel the directory so the warning is one-shot.
                write_manifest(&manifest_path, &BTreeSet::new())?;
            }
            return Ok(Self {
                root,
                previous: previous.unwrap_or_default(),
                current: BTreeSet::new(),
                warned_foreign,
            });
        }

        std::fs::create_dir_all(&root)
            .map_err(|source| OutputError::io("create directory", &root, source))?;
        write_manifest(&manifest_path, &BTreeSet::new())?;

        Ok(Self {
            root,
            previous: BTreeSet::new(),
            current: BTreeSet::new(),
            warned_foreign,
        })
    }

    /// The owned output directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether setup warned about a pre-existing foreign directory.
    #[must_use]
    pub fn warned_foreign(&self) -> bool {
        self.warned_foreign
    }

    /// Write a generated file at `rel` (relative to the root), creating
    /// parent directories as needed, and record it in the manifest.
    pub fn write(&mut self, rel: &str, contents: impl AsRef<[u8]>) -> Result<(), OutputError> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| OutputError::io("create directory", parent, source))?;
        }
        std::fs::write(&path, contents)
            .map_err(|source| OutputError::io("write", &path, source))?;
        self.record(rel);
        Ok(())
    }

    /// Record a generated file written through other means (e.g. an archive
    /// writer holding the file handle itself).
    pub fn record(&mut self, rel: &str) {
        self.current.insert(rel.to_owned());
    }

    /// Forget recorded paths below `prefix`, for intermediate trees that
    /// are packaged and removed before the run completes.
    pub fn forget_prefix(&mut self, prefix: &str) {
        self.current.retain(|path| !path.starts_with(prefix));
    }

    /// Delete stale artifacts and persist the new manifest.
    ///
    /// Every path from the previous run's manifest that was not generated
    /// again is deleted; already-missing files are ignored. Returns the
    /// output directory path.
    pub fn finalize(self) -> Result<PathBuf, OutputError> {
        for stale in self.previous.difference(&self.current) {
            let path = self.root.join(stale);
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(OutputError::io("delete", &path, source)),
            }
        }

        write_manifest(&self.root.join(MANIFEST_NAME), &self.current)?;
        Ok(self.root)
    }
}

/// Read the manifest if present. `Ok(None)` means no sentinel.
fn read_manifest(path: &Path) -> Result<Option<BTreeSet<String>>, OutputError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(
            text.lines()
                .filter(|line| !line.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        )),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(OutputError::io("read", path, source)),
    }
}

/// Persist the manifest: sorted relative paths, one per line.
fn write_manifest(path: &Path, entries: &BTreeSet<String>) -> Result<(), OutputError> {
    let mut text = String::new();
    for entry in entries {
        text.push_str(entry);
        text.push('\n');
    }
    std::fs::write(path, text).map_err(|source| OutputError::io("write", path, source))
}

/// Whether the directory contains anything besides the sentinel.
fn is_empty_dir(root: &Path) -> Result<bool, OutputError> {
    let entries =
        std::fs::read_dir(root).map_err(|source| OutputError::io("read", root, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| OutputError::io("read", root, source))?;
        if entry.file_name() != MANIFEST_NAME {
            return Ok(false);
        }
    }
    Ok(true)
}
