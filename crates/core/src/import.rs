//! Builds `tpRailroadData.json` from the three TrainPlayer reports.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    config::ImportSettings,
    error::PipelineError,
    models::{Industry, Locale, RailroadData, UNDEFINED_LOCATION},
    report::ReportSet,
    store::{Folder, ReportStore},
    translate::{car_loads, industry_from_record, locale_from_record, InventoryItem, StockKind},
};

/// Name of the railroad data document in the operations folder.
pub const RAILROAD_DATA_FILE: &str = "tpRailroadData.json";

/// Result of an import run that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// All three reports were read and the document replaced.
    Complete,
    /// Some reports were missing or had no records. The document is only replaced
    /// when at least the configured minimum number of reports was read.
    Partial {
        /// Reports that contributed records.
        files_read: usize,
        /// Whether the document was replaced.
        persisted: bool,
    },
}

impl ImportOutcome {
    /// Number of reports read during the run.
    pub fn files_read(&self) -> usize {
        match self {
            ImportOutcome::Complete => 3,
            ImportOutcome::Partial { files_read, .. } => *files_read,
        }
    }

    /// Whether the railroad data document was replaced.
    pub fn persisted(&self) -> bool {
        match self {
            ImportOutcome::Complete => true,
            ImportOutcome::Partial { persisted, .. } => *persisted,
        }
    }
}

/// Read the reports, assemble the railroad data and replace the persisted document.
///
/// Nothing is written unless every record translates cleanly and enough reports were
/// found, so a failed run leaves the previous document in place.
pub fn import_railroad_data<S: ReportStore>(
    store: &S,
    settings: &ImportSettings,
) -> Result<ImportOutcome, PipelineError> {
    let reports = ReportSet::read(store)?;
    let files_read = reports.files_read;

    if files_read < settings.min_source_files {
        warn!(
            files_read,
            required = settings.min_source_files,
            "TrainPlayer railroad not imported"
        );
        return Ok(ImportOutcome::Partial {
            files_read,
            persisted: false,
        });
    }

    let data = assemble(&reports, Utc::now())?;
    let path = store.write_json(Folder::Operations, RAILROAD_DATA_FILE, &data)?;
    info!(
        path = %path.display(),
        locales = data.locales.len(),
        industries = data.industries.len(),
        "TrainPlayer railroad data imported"
    );

    if files_read == 3 {
        Ok(ImportOutcome::Complete)
    } else {
        Ok(ImportOutcome::Partial {
            files_read,
            persisted: true,
        })
    }
}

/// Load the last persisted railroad data document, if any.
pub fn load_railroad_data<S: ReportStore>(store: &S) -> Result<Option<RailroadData>, PipelineError> {
    store.read_json(Folder::Operations, RAILROAD_DATA_FILE)
}

/// Assemble the railroad data document from parsed reports.
pub fn assemble(
    reports: &ReportSet,
    generated_date: DateTime<Utc>,
) -> Result<RailroadData, PipelineError> {
    let locales = collect_locales(reports)?;
    let locations = locales
        .iter()
        .map(|locale| locale.location.clone())
        .collect();

    let industries = reports
        .industries
        .records
        .iter()
        .map(industry_from_record)
        .collect::<Result<Vec<Industry>, _>>()?;

    let inventory = reports
        .inventory
        .records
        .iter()
        .map(InventoryItem::from_record)
        .collect::<Result<Vec<_>, _>>()?;

    let mut roads = BTreeSet::new();
    let mut car_aar = BTreeSet::new();
    let mut car_kernel = BTreeSet::new();
    let mut loco_types = BTreeSet::new();
    let mut loco_models = BTreeSet::new();
    let mut loco_consists = BTreeSet::new();

    for item in &inventory {
        roads.insert(item.identity.road.clone());
        match item.kind {
            StockKind::Car => {
                car_aar.insert(item.type_code.clone());
                if !item.group.is_empty() {
                    car_kernel.insert(item.group.clone());
                }
            }
            StockKind::Engine => {
                loco_types.insert(item.type_code.clone());
                loco_models.insert(item.loco_model());
                if !item.group.is_empty() {
                    loco_consists.insert(item.group.clone());
                }
            }
            StockKind::Tender => {}
        }
    }

    let car_loads = car_loads(&car_aar, &industries);

    Ok(RailroadData {
        export_date: reports.locations.export_date().to_string(),
        railroad_name: reports.locations.railroad_name().to_string(),
        railroad_description: reports.locations.railroad_description().to_string(),
        generated_date,
        locations,
        locales,
        industries,
        roads,
        car_aar,
        car_loads,
        car_kernel,
        loco_types,
        loco_models,
        loco_consists,
    })
}

/// One locale per location, sentinel first. The first line naming a location wins.
fn collect_locales(reports: &ReportSet) -> Result<Vec<Locale>, PipelineError> {
    let mut locales = vec![Locale::undefined()];
    let mut seen: HashSet<String> = HashSet::from([UNDEFINED_LOCATION.to_string()]);

    for record in &reports.locations.records {
        let locale = locale_from_record(record)?;
        if seen.insert(locale.location.clone()) {
            locales.push(locale);
        } else {
            debug!(
                location = %locale.location,
                track = %locale.attributes.track,
                line = record.line(),
                "location already defined, keeping first"
            );
        }
    }

    Ok(locales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{LocoModel, TrackType},
        store::test_store,
    };
    use anyhow::Result;
    use proptest::prelude::*;
    use std::{fs, path::Path};
    use tempfile::tempdir;

    const LOCATIONS: &str = "03/01/2022
Pacific Lines
A small switching layout
TP-ID;Location;Track;Label;Type;Spaces
1;Yard1;T1;Label;class yard;10
2;Yard1;T2;Label;industry;5
3;Mill Town;Mill;Flour Mill;industry;4
4;East Staging;S1;Staging;staging;20
";

    const INDUSTRIES: &str = "03/01/2022
ID;Location;Track;Label;AAR;S/R;Load;Staging;ViaIn
10;Mill Town;Mill;Flour Mill;XM;R;Grain;East Staging;Yard1
11;Mill Town;Mill;Flour Mill;XM;S;Flour;East Staging;Yard1
12;Nowhere;Dock;Dock;FM;R;Lumber;East Staging;Yard1
";

    const INVENTORY: &str = "03/01/2022
CarID;Model;Type;Location;Track;Load;Kernel
SP1234;40ft Boxcar;XM;Yard1;T1;E;K1
SP1235;40ft Boxcar;XM;Yard1;T1;E;K1
UP-77;Gondola;GB;Yard1;T1;E;
ABC1234;SomeLongModelNameExceeding11Chars;E8;Yard1;T1;;KernelX
ABC1235;SomeLongModelNameExceeding11CharsB;E8;Yard1;T1;;KernelX
ABC1236;Tender;ET;Yard1;T1;;TenderConsist
BN55;GP9;ED;Yard1;T1;;
";

    fn write_reports(root: &Path, reports: &[(&str, &str)]) -> Result<()> {
        let dir = root.join("reports");
        fs::create_dir_all(&dir)?;
        for (name, body) in reports {
            fs::write(dir.join(name), body)?;
        }
        Ok(())
    }

    fn all_reports(root: &Path) -> Result<()> {
        write_reports(
            root,
            &[
                ("TrainPlayer Report - Locations.txt", LOCATIONS),
                ("TrainPlayer Report - Industries.txt", INDUSTRIES),
                ("TrainPlayer Report - Inventory.txt", INVENTORY),
            ],
        )
    }

    #[test]
    fn imports_complete_railroad() -> Result<()> {
        let dir = tempdir()?;
        all_reports(dir.path())?;
        let store = test_store(dir.path());

        let outcome = import_railroad_data(&store, &ImportSettings::default())?;
        assert_eq!(outcome, ImportOutcome::Complete);
        assert_eq!(outcome.files_read(), 3);

        let data = load_railroad_data(&store)?.expect("railroad data written");
        assert_eq!(data.export_date, "03/01/2022");
        assert_eq!(data.railroad_name, "Pacific Lines");
        assert_eq!(data.railroad_description, "A small switching layout");

        assert_eq!(data.locales[0], Locale::undefined());
        let yard = data
            .locales
            .iter()
            .filter(|locale| locale.location == "Yard1")
            .collect::<Vec<_>>();
        assert_eq!(yard.len(), 1);
        assert_eq!(yard[0].attributes.track, "T1");
        assert_eq!(yard[0].attributes.track_type, TrackType::Yard);
        assert_eq!(data.locales.len(), 4);
        assert!(data.locations.contains(UNDEFINED_LOCATION));
        assert_eq!(data.locations.len(), 4);

        assert_eq!(data.industries.len(), 3);
        assert_eq!(data.industries_at("Mill Town").count(), 2);

        let roads: Vec<&str> = data.roads.iter().map(String::as_str).collect();
        assert_eq!(roads, ["ABC", "BN", "SP", "UP"]);

        let aar: Vec<&str> = data.car_aar.iter().map(String::as_str).collect();
        assert_eq!(aar, ["GB", "XM"]);
        assert_eq!(data.car_loads.keys().collect::<Vec<_>>(), ["GB", "XM"]);
        assert!(data.car_loads["GB"].is_empty());
        assert_eq!(data.car_loads["XM"].len(), 2);
        assert_eq!(data.car_kernel.iter().collect::<Vec<_>>(), ["K1"]);

        assert_eq!(data.loco_types.iter().collect::<Vec<_>>(), ["E8", "ED"]);
        assert!(data.loco_models.contains(&LocoModel {
            model: "SomeLongMod".to_string(),
            type_code: "E8".to_string(),
        }));
        assert_eq!(data.loco_models.len(), 2);
        assert_eq!(data.loco_consists.iter().collect::<Vec<_>>(), ["KernelX"]);
        Ok(())
    }

    #[test]
    fn tenders_stay_out_of_loco_collections() -> Result<()> {
        let dir = tempdir()?;
        all_reports(dir.path())?;
        let reports = ReportSet::read(&test_store(dir.path()))?;
        let data = assemble(&reports, Utc::now())?;

        assert!(!data.loco_types.contains("ET"));
        assert!(data.loco_models.iter().all(|model| model.type_code != "ET"));
        assert!(!data.loco_consists.contains("TenderConsist"));
        assert!(data.roads.contains("ABC"));
        Ok(())
    }

    #[test]
    fn missing_industries_keeps_previous_document() -> Result<()> {
        let dir = tempdir()?;
        all_reports(dir.path())?;
        let store = test_store(dir.path());
        import_railroad_data(&store, &ImportSettings::default())?;
        let before = store.read_text(Folder::Operations, RAILROAD_DATA_FILE)?;

        fs::remove_file(
            dir.path()
                .join("reports")
                .join("TrainPlayer Report - Industries.txt"),
        )?;
        let outcome = import_railroad_data(&store, &ImportSettings::default())?;

        assert_eq!(
            outcome,
            ImportOutcome::Partial {
                files_read: 2,
                persisted: false
            }
        );
        assert_eq!(store.read_text(Folder::Operations, RAILROAD_DATA_FILE)?, before);
        Ok(())
    }

    #[test]
    fn header_only_reports_keep_previous_document() -> Result<()> {
        let dir = tempdir()?;
        all_reports(dir.path())?;
        let store = test_store(dir.path());
        import_railroad_data(&store, &ImportSettings::default())?;
        let before = store.read_text(Folder::Operations, RAILROAD_DATA_FILE)?;

        write_reports(
            dir.path(),
            &[
                ("TrainPlayer Report - Industries.txt", "03/02/2022\nkey\n"),
                ("TrainPlayer Report - Inventory.txt", "03/02/2022\nkey\n\n"),
            ],
        )?;
        let outcome = import_railroad_data(&store, &ImportSettings::default())?;

        assert_eq!(
            outcome,
            ImportOutcome::Partial {
                files_read: 1,
                persisted: false
            }
        );
        assert_eq!(store.read_text(Folder::Operations, RAILROAD_DATA_FILE)?, before);
        let data = load_railroad_data(&store)?.expect("previous document kept");
        assert_eq!(data.roads.len(), 4);
        Ok(())
    }

    #[test]
    fn lower_minimum_allows_partial_document() -> Result<()> {
        let dir = tempdir()?;
        write_reports(
            dir.path(),
            &[
                ("TrainPlayer Report - Locations.txt", LOCATIONS),
                ("TrainPlayer Report - Inventory.txt", INVENTORY),
            ],
        )?;
        let store = test_store(dir.path());

        let settings = ImportSettings {
            min_source_files: 2,
        };
        let outcome = import_railroad_data(&store, &settings)?;
        assert_eq!(
            outcome,
            ImportOutcome::Partial {
                files_read: 2,
                persisted: true
            }
        );

        let data = load_railroad_data(&store)?.expect("railroad data written");
        assert!(data.industries.is_empty());
        assert!(data.car_loads.values().all(|loads| loads.is_empty()));
        Ok(())
    }

    #[test]
    fn bad_track_type_aborts_without_writing() -> Result<()> {
        let dir = tempdir()?;
        all_reports(dir.path())?;
        let store = test_store(dir.path());
        import_railroad_data(&store, &ImportSettings::default())?;
        let before = store.read_text(Folder::Operations, RAILROAD_DATA_FILE)?;

        write_reports(
            dir.path(),
            &[(
                "TrainPlayer Report - Locations.txt",
                "03/01/2022\nPacific Lines\n\nkey\n1;Yard1;T1;Label;siding;10\n",
            )],
        )?;
        let result = import_railroad_data(&store, &ImportSettings::default());

        assert!(matches!(result, Err(PipelineError::UnknownTrackType(_))));
        assert_eq!(store.read_text(Folder::Operations, RAILROAD_DATA_FILE)?, before);
        Ok(())
    }

    #[test]
    fn document_round_trips() -> Result<()> {
        let dir = tempdir()?;
        all_reports(dir.path())?;
        let reports = ReportSet::read(&test_store(dir.path()))?;
        let data = assemble(&reports, Utc::now())?;

        let encoded = serde_json::to_string_pretty(&data)?;
        let decoded: RailroadData = serde_json::from_str(&encoded)?;
        assert_eq!(decoded, data);

        let value: serde_json::Value = serde_json::from_str(&encoded)?;
        for key in [
            "trainplayerDate",
            "railroadName",
            "railroadDescription",
            "date",
            "locations",
            "locales",
            "industries",
            "roads",
            "carAAR",
            "carLoads",
            "carKernel",
            "locoTypes",
            "locoModels",
            "locoConsists",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        Ok(())
    }

    #[test]
    fn sentinel_leads_even_without_locations() -> Result<()> {
        let dir = tempdir()?;
        let reports = ReportSet::read(&test_store(dir.path()))?;
        assert_eq!(reports.files_read, 0);
        let data = assemble(&reports, Utc::now())?;
        assert_eq!(data.locales, vec![Locale::undefined()]);
        Ok(())
    }

    proptest! {
        #[test]
        fn sets_hold_each_value_once(
            lines in proptest::collection::vec(
                ("[A-C]{1,2}[0-9]{1,3}", "[A-Z]{2}|E[0-9A-Z]|ET", "[A-Z]?"),
                0..24,
            )
        ) {
            let mut inventory = String::from("date\nkey\n");
            for (id, code, group) in &lines {
                inventory.push_str(&format!("{id};Model Name Here;{code};;;;{group}\n"));
            }
            let reports = ReportSet {
                locations: crate::report::FlatReport::empty(crate::report::ReportKind::Locations),
                industries: crate::report::FlatReport::empty(crate::report::ReportKind::Industries),
                inventory: crate::report::FlatReport::parse(
                    crate::report::ReportKind::Inventory,
                    &inventory,
                ),
                files_read: 1,
            };
            let data = assemble(&reports, Utc::now()).expect("inventory translates");
            let encoded = serde_json::to_value(&data).expect("document encodes");

            for key in ["locations", "roads", "carAAR", "carKernel", "locoTypes", "locoConsists"] {
                let values = encoded[key].as_array().expect("set encodes as array");
                let unique: HashSet<_> = values.iter().map(|v| v.to_string()).collect();
                prop_assert_eq!(unique.len(), values.len());
            }
            prop_assert!(data.loco_types.iter().all(|code| !code.starts_with("ET")));
            prop_assert_eq!(
                data.car_loads.keys().collect::<Vec<_>>(),
                data.car_aar.iter().collect::<Vec<_>>()
            );
        }
    }
}
