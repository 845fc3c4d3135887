//! Read-only view of the host's built trains.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    error::PipelineError,
    export::convert::value_to_string,
    models::HostManifest,
};

const MANIFEST_PREFIX: &str = "train-";
const MANIFEST_EXTENSION: &str = "json";

/// A train the host has built, with a manifest on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTrain {
    /// Train name.
    pub name: String,
    /// Build date exactly as the manifest records it.
    pub built_at: String,
    /// Manifest file the train was read from.
    pub manifest_path: PathBuf,
}

/// Access to the host's built trains and their manifests.
pub trait HostSource: Send + Sync {
    /// Every train currently built.
    fn built_trains(&self) -> Result<Vec<BuiltTrain>, PipelineError>;

    /// The manifest document for one train.
    fn manifest(&self, train: &BuiltTrain) -> Result<HostManifest, PipelineError>;
}

/// Whether `path` names a host manifest (`train-<name>.json`).
pub fn is_train_manifest(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(MANIFEST_PREFIX));
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION));
    has_prefix && is_json
}

/// [`HostSource`] over the host's manifest folder. Clones share one cache.
#[derive(Clone)]
pub struct ManifestFolder {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    root: PathBuf,
    cache: Option<Vec<BuiltTrain>>,
}

impl ManifestFolder {
    /// Folder of `train-*.json` manifests; nothing is scanned until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                root: root.into(),
                cache: None,
            })),
        }
    }

    /// The manifest folder.
    pub fn root(&self) -> PathBuf {
        self.inner.read().root.clone()
    }

    /// Drop the cached train list so the next query rescans the folder.
    pub fn refresh(&self) {
        self.inner.write().cache = None;
    }
}

impl HostSource for ManifestFolder {
    fn built_trains(&self) -> Result<Vec<BuiltTrain>, PipelineError> {
        let mut inner = self.inner.write();
        if inner.cache.is_none() {
            inner.cache = Some(discover_trains(&inner.root)?);
        }
        Ok(inner.cache.clone().unwrap_or_default())
    }

    fn manifest(&self, train: &BuiltTrain) -> Result<HostManifest, PipelineError> {
        read_manifest(&train.manifest_path)
    }
}

fn read_manifest(path: &Path) -> Result<HostManifest, PipelineError> {
    let contents = fs::read_to_string(path).map_err(|source| PipelineError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| PipelineError::Document {
        path: path.to_path_buf(),
        source,
    })
}

fn discover_trains(root: &Path) -> Result<Vec<BuiltTrain>, PipelineError> {
    if !root.is_dir() {
        debug!(root = %root.display(), "manifest folder missing");
        return Ok(Vec::new());
    }

    let mut trains = Vec::new();
    for entry in WalkDir::new(root)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
    {
        let path = entry.path();
        if !is_train_manifest(path) {
            continue;
        }
        match read_manifest(path) {
            Ok(manifest) => trains.push(built_train(path, &manifest)),
            Err(err) => warn!(path = %path.display(), "Skipping manifest: {err}"),
        }
    }
    Ok(trains)
}

fn built_train(path: &Path, manifest: &HostManifest) -> BuiltTrain {
    let name = manifest
        .train_name
        .as_ref()
        .map(value_to_string)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy())
                .unwrap_or_default()
                .trim_start_matches(MANIFEST_PREFIX)
                .to_string()
        });

    BuiltTrain {
        name,
        built_at: manifest.date.as_ref().map(value_to_string).unwrap_or_default(),
        manifest_path: path.to_path_buf(),
    }
}

/// Built trains as the host reported them at one moment.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    /// Trains built at capture time.
    pub built_trains: Vec<BuiltTrain>,
}

impl HostContext {
    /// Snapshot the host's current state.
    pub fn capture<H: HostSource + ?Sized>(host: &H) -> Result<Self, PipelineError> {
        Ok(Self {
            built_trains: host.built_trains()?,
        })
    }

    /// The most recently built train. Build dates are ISO-style strings, so the
    /// lexicographic maximum is the newest.
    pub fn newest(&self) -> Option<&BuiltTrain> {
        self.built_trains
            .iter()
            .max_by(|a, b| a.built_at.cmp(&b.built_at))
    }

    /// Look up a built train by name.
    pub fn find(&self, name: &str) -> Result<&BuiltTrain, PipelineError> {
        self.built_trains
            .iter()
            .find(|train| train.name == name)
            .ok_or_else(|| PipelineError::UnknownTrain(name.to_string()))
    }
}

#[cfg(test)]
pub(crate) fn write_manifest(dir: &Path, file_stem: &str, body: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{file_stem}.json"));
    fs::write(&path, body)?;
    Ok(path)
}
