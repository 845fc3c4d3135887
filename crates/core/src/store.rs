//! Report folder persistence.
//!
//! Every write replaces the whole document: contents go to a temporary file in the
//! target directory which is then renamed over the target. Writers to the same path are
//! serialized through a per-path mutex; different paths never block each other.
//! Documents written together in one batch are staged first and rolled back as a group
//! if any of them cannot be put in place.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Logical folder a report lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folder {
    /// TrainPlayer's flat report exports.
    Import,
    /// Work event lists and CSVs written for TrainPlayer.
    Export,
    /// The host's JSON train manifests.
    Manifest,
    /// The host's operations folder, home of the railroad data document.
    Operations,
}

/// Read/write access to named documents in the report folders.
pub trait ReportStore: Send + Sync {
    /// Resolve the on-disk path of a named document.
    fn path_for(&self, folder: Folder, name: &str) -> PathBuf;

    /// Read a UTF-8 document, returning `None` when it does not exist.
    fn read_text(&self, folder: Folder, name: &str) -> Result<Option<String>, PipelineError>;

    /// Replace several documents of one folder as a group, returning the paths written
    /// in input order. On error every document keeps its previous contents.
    fn write_all(
        &self,
        folder: Folder,
        documents: &[(&str, &str)],
    ) -> Result<Vec<PathBuf>, PipelineError>;

    /// Replace a document with new contents, returning the path written.
    fn write_text(
        &self,
        folder: Folder,
        name: &str,
        contents: &str,
    ) -> Result<PathBuf, PipelineError> {
        let mut paths = self.write_all(folder, &[(name, contents)])?;
        Ok(paths.pop().unwrap_or_else(|| self.path_for(folder, name)))
    }

    /// Read and decode a JSON document.
    fn read_json<T: DeserializeOwned>(
        &self,
        folder: Folder,
        name: &str,
    ) -> Result<Option<T>, PipelineError> {
        let Some(contents) = self.read_text(folder, name)? else {
            return Ok(None);
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| PipelineError::Document {
                path: self.path_for(folder, name),
                source,
            })
    }

    /// Encode a value as pretty JSON and replace the named document with it.
    fn write_json<T: Serialize>(
        &self,
        folder: Folder,
        name: &str,
        value: &T,
    ) -> Result<PathBuf, PipelineError> {
        let serialized = self.encode_json(folder, name, value)?;
        self.write_text(folder, name, &serialized)
    }

    /// Pretty JSON for a document that will be written under `name`.
    fn encode_json<T: Serialize>(
        &self,
        folder: Folder,
        name: &str,
        value: &T,
    ) -> Result<String, PipelineError> {
        serde_json::to_string_pretty(value).map_err(|source| PipelineError::Document {
            path: self.path_for(folder, name),
            source,
        })
    }
}

/// Directories backing each [`Folder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    /// Where TrainPlayer writes its reports.
    pub import: PathBuf,
    /// Where work event lists are written.
    pub export: PathBuf,
    /// The host's JSON manifest folder.
    pub manifest: PathBuf,
    /// The host's operations folder.
    pub operations: PathBuf,
}

impl FolderLayout {
    /// Directory for a logical folder.
    pub fn dir(&self, folder: Folder) -> &Path {
        match folder {
            Folder::Import => &self.import,
            Folder::Export => &self.export,
            Folder::Manifest => &self.manifest,
            Folder::Operations => &self.operations,
        }
    }
}

#[derive(Default)]
struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// [`ReportStore`] over plain directories. Clones share one lock registry.
#[derive(Clone)]
pub struct FolderStore {
    layout: Arc<FolderLayout>,
    locks: Arc<PathLocks>,
}

impl FolderStore {
    /// Store over the given directories.
    pub fn new(layout: FolderLayout) -> Self {
        Self {
            layout: Arc::new(layout),
            locks: Arc::new(PathLocks::default()),
        }
    }

    /// Directories backing the store.
    pub fn layout(&self) -> &FolderLayout {
        &self.layout
    }

    /// Whether the directory backing `folder` exists.
    pub fn folder_exists(&self, folder: Folder) -> bool {
        self.layout.dir(folder).is_dir()
    }
}

impl ReportStore for FolderStore {
    fn path_for(&self, folder: Folder, name: &str) -> PathBuf {
        self.layout.dir(folder).join(name)
    }

    fn read_text(&self, folder: Folder, name: &str) -> Result<Option<String>, PipelineError> {
        let path = self.path_for(folder, name);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PipelineError::Persistence { path, source }),
        }
    }

    fn write_all(
        &self,
        folder: Folder,
        documents: &[(&str, &str)],
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let paths: Vec<PathBuf> = documents
            .iter()
            .map(|(name, _)| self.path_for(folder, name))
            .collect();

        // Sorted acquisition keeps overlapping batches from deadlocking.
        let mut lock_order: Vec<&PathBuf> = paths.iter().collect();
        lock_order.sort();
        lock_order.dedup();
        let locks: Vec<Arc<Mutex<()>>> = lock_order
            .iter()
            .map(|path| self.locks.lock_for(path))
            .collect();
        let _guards: Vec<_> = locks.iter().map(|lock| lock.lock()).collect();

        let mut staged = Vec::with_capacity(documents.len());
        let mut previous = Vec::with_capacity(documents.len());
        for ((_, contents), path) in documents.iter().zip(&paths) {
            let persistence = |source| PipelineError::Persistence {
                path: path.clone(),
                source,
            };
            staged.push(stage_file(path, contents.as_bytes()).map_err(persistence)?);
            previous.push(previous_contents(path).map_err(persistence)?);
        }

        for (index, (file, path)) in staged.into_iter().zip(&paths).enumerate() {
            if let Err(err) = file.persist(path) {
                restore(&paths[..index], &previous[..index]);
                return Err(PipelineError::Persistence {
                    path: path.clone(),
                    source: err.error,
                });
            }
        }

        for ((_, contents), path) in documents.iter().zip(&paths) {
            debug!(path = %path.display(), bytes = contents.len(), "document written");
        }
        Ok(paths)
    }
}

fn stage_file(path: &Path, contents: &[u8]) -> io::Result<NamedTempFile> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(contents)?;
    staged.flush()?;
    Ok(staged)
}

fn previous_contents(path: &Path) -> io::Result<Option<Vec<u8>>> {
    if !path.is_file() {
        return Ok(None);
    }
    fs::read(path).map(Some)
}

fn restore(paths: &[PathBuf], previous: &[Option<Vec<u8>>]) {
    for (path, contents) in paths.iter().zip(previous) {
        let result = match contents {
            Some(contents) => stage_file(path, contents)
                .and_then(|file| file.persist(path).map(|_| ()).map_err(|err| err.error)),
            None => fs::remove_file(path),
        };
        if let Err(err) = result {
            warn!(path = %path.display(), "failed to restore document: {err}");
        }
    }
}

/// Make a train name safe to embed in a file name.
pub fn sanitize_component(input: &str) -> String {
    let result: String = input
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    if result.is_empty() {
        "train".to_string()
    } else {
        result
    }
}

#[cfg(test)]
pub(crate) fn test_store(root: &Path) -> FolderStore {
    FolderStore::new(FolderLayout {
        import: root.join("reports"),
        export: root.join("reports"),
        manifest: root.join("operations").join("jsonManifests"),
        operations: root.join("operations"),
    })
}
