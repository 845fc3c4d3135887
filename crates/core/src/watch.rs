//! Build notifications from the host's manifest folder.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{event::EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::host::is_train_manifest;

/// Events emitted while watching for built trains.
#[derive(Debug)]
pub enum BuildEvent {
    /// A train manifest was written.
    TrainBuilt {
        /// Manifest that changed.
        path: PathBuf,
    },
    /// The watcher reported an error.
    Error(anyhow::Error),
}

/// Paths in a filesystem event that announce a built train.
pub fn built_manifests(event: &notify::Event) -> Vec<PathBuf> {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| is_train_manifest(path))
        .cloned()
        .collect()
}

/// Keeps the OS watcher alive; dropping it stops the events.
pub struct ManifestWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl ManifestWatcher {
    /// Watch `root` and forward build events to `sender`.
    pub fn spawn(root: impl AsRef<Path>, sender: mpsc::Sender<BuildEvent>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create manifest folder {}", root.display()))?;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let events: Vec<BuildEvent> = match res {
                Ok(event) => built_manifests(&event)
                    .into_iter()
                    .map(|path| BuildEvent::TrainBuilt { path })
                    .collect(),
                Err(err) => vec![BuildEvent::Error(err.into())],
            };
            for event in events {
                if sender.blocking_send(event).is_err() {
                    debug!("build event receiver closed");
                    return;
                }
            }
        })
        .context("failed to create manifest watcher")?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
        info!(root = %root.display(), "watching for built trains");

        Ok(Self {
            _watcher: watcher,
            root,
        })
    }

    /// Folder being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn create_and_modify_of_manifests_count() {
        let created = event(EventKind::Create(CreateKind::File), "/ops/train-Local.json");
        assert_eq!(built_manifests(&created), vec![PathBuf::from("/ops/train-Local.json")]);

        let modified = event(EventKind::Modify(ModifyKind::Any), "/ops/train-Drag.json");
        assert_eq!(built_manifests(&modified).len(), 1);
    }

    #[test]
    fn other_events_are_ignored() {
        let removed = event(EventKind::Remove(RemoveKind::File), "/ops/train-Local.json");
        assert!(built_manifests(&removed).is_empty());

        let unrelated = event(EventKind::Create(CreateKind::File), "/ops/notes.json");
        assert!(built_manifests(&unrelated).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reports_new_manifest() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::channel(16);
        let watcher = ManifestWatcher::spawn(dir.path(), tx)?;
        assert_eq!(watcher.root(), dir.path());

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        std::fs::write(dir.path().join("train-Local.json"), "{}")?;

        let received = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .context("no build event")?;
        match received {
            Some(BuildEvent::TrainBuilt { path }) => {
                assert!(path.ends_with("train-Local.json"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }
}
