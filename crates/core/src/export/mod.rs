//! Built-train export: host manifest → work event list JSON + CSV.

pub mod convert;
pub mod csv;

use std::{path::PathBuf, time::Duration, time::Instant};

use tracing::info;

use crate::{
    config::ExportSettings,
    error::PipelineError,
    host::{BuiltTrain, HostSource},
    models::{HostManifest, TrackWorkEvents, WorkEventList, WorkLocation},
    store::{sanitize_component, Folder, ReportStore},
};

const WORK_EVENTS_PREFIX: &str = "o2o Work Events";

/// File stem for a train's work events, e.g. `o2o Work Events - Local 12`.
pub fn work_events_name(train: &str) -> String {
    format!("{WORK_EVENTS_PREFIX} - {}", sanitize_component(train))
}

/// What an export wrote.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Train the events were exported for.
    pub train: String,
    /// Work event list JSON.
    pub json_path: PathBuf,
    /// CSV rendering of the same list.
    pub csv_path: PathBuf,
    /// Locomotive plus car events written.
    pub events: usize,
    /// Time spent converting and writing.
    pub elapsed: Duration,
}

/// Export one built train as fetched from the host.
pub fn export_built_train<S, H>(
    store: &S,
    host: &H,
    train: &BuiltTrain,
    settings: &ExportSettings,
) -> Result<ExportReport, PipelineError>
where
    S: ReportStore,
    H: HostSource + ?Sized,
{
    let manifest = host.manifest(train)?;
    export_manifest(store, &manifest, &train.name, settings)
}

/// Convert a manifest and write both the JSON list and its CSV rendering.
pub fn export_manifest<S: ReportStore>(
    store: &S,
    manifest: &HostManifest,
    train: &str,
    settings: &ExportSettings,
) -> Result<ExportReport, PipelineError> {
    let started = Instant::now();

    let list = convert::work_events(manifest, settings);
    let (json_path, csv_path) = write_work_events(store, train, &list)?;

    let elapsed = started.elapsed();
    info!(
        train,
        events = list.event_count(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Manifest export complete"
    );

    Ok(ExportReport {
        train: train.to_string(),
        json_path,
        csv_path,
        events: list.event_count(),
        elapsed,
    })
}

fn write_work_events<S: ReportStore>(
    store: &S,
    train: &str,
    list: &WorkEventList,
) -> Result<(PathBuf, PathBuf), PipelineError> {
    let stem = work_events_name(train);
    let json_name = format!("{stem}.json");
    let csv_name = format!("{stem}.csv");
    let json = store.encode_json(Folder::Export, &json_name, list)?;
    let csv_text = csv::render(list);

    // One batch: the JSON and CSV on disk always come from the same list.
    let mut paths = store
        .write_all(
            Folder::Export,
            &[(json_name.as_str(), json.as_str()), (csv_name.as_str(), csv_text.as_str())],
        )?
        .into_iter();
    let json_path = paths.next().unwrap_or_else(|| store.path_for(Folder::Export, &json_name));
    let csv_path = paths.next().unwrap_or_else(|| store.path_for(Folder::Export, &csv_name));
    Ok((json_path, csv_path))
}

/// Placeholder list written before a train's first export.
pub fn placeholder_work_events(train: &str, settings: &ExportSettings) -> WorkEventList {
    WorkEventList {
        railroad_name: String::new(),
        railroad_description: settings.railroad_description.clone(),
        train_name: train.to_string(),
        train_description: String::new(),
        train_comment: String::new(),
        division: settings.division.clone(),
        date: String::new(),
        locations: vec![WorkLocation {
            location_name: "Location Name".to_string(),
            tracks: vec![TrackWorkEvents {
                track_name: "Track Name".to_string(),
                length: 1,
                locos: Vec::new(),
                cars: Vec::new(),
            }],
        }],
    }
}

/// Overwrite a train's work events with the placeholder list.
pub fn reset_work_events<S: ReportStore>(
    store: &S,
    train: &str,
    settings: &ExportSettings,
) -> Result<PathBuf, PipelineError> {
    let (json_path, _) = write_work_events(store, train, &placeholder_work_events(train, settings))?;
    info!(train, path = %json_path.display(), "Work events reset");
    Ok(json_path)
}
