#![warn(clippy::all, missing_docs)]

//! Core of the o2o TrainPlayer interchange.
//!
//! Imports TrainPlayer's flat layout reports into the host's railroad data document,
//! and exports the host's built-train manifests as work event lists TrainPlayer can
//! replay. The command-line front end lives in the `o2o-cli` crate.

pub mod config;
pub mod error;
pub mod export;
pub mod host;
pub mod import;
pub mod models;
pub mod report;
pub mod store;
pub mod translate;
pub mod watch;

pub use config::AppConfig;
pub use error::PipelineError;
pub use export::{export_built_train, reset_work_events, ExportReport};
pub use host::{BuiltTrain, HostContext, HostSource, ManifestFolder};
pub use import::{import_railroad_data, load_railroad_data, ImportOutcome};
pub use models::RailroadData;
pub use store::{Folder, FolderStore, ReportStore};
pub use watch::{BuildEvent, ManifestWatcher};
