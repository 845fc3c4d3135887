mod cli;

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

use o2o_core::{
    config::{self, AppConfig, ExportSettings},
    export_built_train, import_railroad_data, reset_work_events, BuildEvent, ExportReport,
    FolderStore, HostContext, HostSource, ImportOutcome, ManifestFolder, ManifestWatcher,
    PipelineError,
};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => {
            config::ensure_default_config()?;
            AppConfig::load()?
        }
    };

    let layout = config.layout();
    let host = ManifestFolder::new(&layout.manifest);
    let store = FolderStore::new(layout);

    match cli.command {
        Command::Import => import(&store, &config),
        Command::Export { train } => export(&store, &host, &config.export, train.as_deref()),
        Command::Watch => watch(store, host, config.export.clone()).await,
        Command::Trains => list_trains(&host),
        Command::Reset { train } => {
            let path = reset_work_events(&store, &train, &config.export)?;
            println!("Reset {}", path.display());
            Ok(())
        }
    }
}

fn import(store: &FolderStore, config: &AppConfig) -> Result<()> {
    let outcome = import_railroad_data(store, &config.import)?;
    match outcome {
        ImportOutcome::Complete => println!("TrainPlayer railroad imported"),
        ImportOutcome::Partial {
            files_read,
            persisted: true,
        } => println!("TrainPlayer railroad imported from {files_read} of 3 reports"),
        ImportOutcome::Partial {
            files_read,
            persisted: false,
        } => println!(
            "TrainPlayer railroad not imported: {files_read} of 3 reports found, {} required",
            config.import.min_source_files
        ),
    }
    Ok(())
}

fn export(
    store: &FolderStore,
    host: &ManifestFolder,
    settings: &ExportSettings,
    train: Option<&str>,
) -> Result<()> {
    let context = HostContext::capture(host)?;
    let built = match train {
        Some(name) => context.find(name)?,
        None => context.newest().context("no built trains found")?,
    };
    let report = export_built_train(store, host, built, settings)?;
    print_report(&report);
    Ok(())
}

fn list_trains(host: &ManifestFolder) -> Result<()> {
    let trains = host.built_trains()?;
    if trains.is_empty() {
        println!("No built trains in {}", host.root().display());
    }
    for train in trains {
        println!("{:<24} {}", train.name, train.built_at);
    }
    Ok(())
}

fn print_report(report: &ExportReport) {
    println!(
        "Exported {} ({} events) in {:.3}s",
        report.train,
        report.events,
        report.elapsed.as_secs_f64()
    );
    println!("  {}", report.json_path.display());
    println!("  {}", report.csv_path.display());
}

async fn watch(store: FolderStore, host: ManifestFolder, settings: ExportSettings) -> Result<()> {
    let (build_tx, mut build_rx) = mpsc::channel(16);
    let _watcher = ManifestWatcher::spawn(host.root(), build_tx)?;

    loop {
        tokio::select! {
            event = build_rx.recv() => match event {
                Some(BuildEvent::TrainBuilt { path }) => {
                    let store = store.clone();
                    let host = host.clone();
                    let settings = settings.clone();
                    tokio::spawn(async move {
                        let job = tokio::task::spawn_blocking(move || {
                            export_manifest_at(&store, &host, &settings, &path)
                        });
                        match job.await {
                            Ok(Ok(report)) => print_report(&report),
                            Ok(Err(err)) => error!("Manifest export failed: {err}"),
                            Err(err) => error!("Manifest export task error: {err}"),
                        }
                    });
                }
                Some(BuildEvent::Error(err)) => warn!("Manifest watcher error: {err:#}"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("stopping manifest watcher");
                break;
            }
        }
    }
    Ok(())
}

fn export_manifest_at(
    store: &FolderStore,
    host: &ManifestFolder,
    settings: &ExportSettings,
    path: &Path,
) -> Result<ExportReport, PipelineError> {
    host.refresh();
    let context = HostContext::capture(host)?;
    let train = context
        .built_trains
        .iter()
        .find(|train| train.manifest_path == path)
        .ok_or_else(|| PipelineError::UnknownTrain(path.display().to_string()))?;
    export_built_train(store, host, train, settings)
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("o2o.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(std::sync::Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
