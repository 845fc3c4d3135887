//! Translation of raw report fields into railroad vocabulary.
//!
//! Every function here is pure: one record in, at most one domain value out.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::PipelineError,
    models::{Industry, IndustryAttributes, Locale, LocaleAttributes, LocoModel, TrackType},
    report::RawRecord,
};

/// Longest model name the host accepts.
pub const MODEL_NAME_LIMIT: usize = 11;

impl TrackType {
    /// Map a TrainPlayer track type onto the host's track types.
    pub fn from_trainplayer(tp_type: &str) -> Result<Self, PipelineError> {
        match tp_type {
            "industry" => Ok(TrackType::Spur),
            "interchange" => Ok(TrackType::Interchange),
            "staging" => Ok(TrackType::Staging),
            "class yard" => Ok(TrackType::Yard),
            other => Err(PipelineError::UnknownTrackType(other.to_string())),
        }
    }
}

/// Category of an inventory item, decided by its type code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockKind {
    /// Freight car.
    Car,
    /// Locomotive.
    Engine,
    /// Locomotive tender; skipped on import.
    Tender,
}

impl StockKind {
    /// `ET…` codes are tenders, other `E…` codes engines, anything else a car AAR code.
    pub fn classify(type_code: &str) -> Option<Self> {
        if type_code.is_empty() {
            None
        } else if type_code.starts_with("ET") {
            Some(StockKind::Tender)
        } else if type_code.starts_with('E') {
            Some(StockKind::Engine)
        } else {
            Some(StockKind::Car)
        }
    }
}

/// Road name and number split from a compound car id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarIdentity {
    /// Reporting mark.
    pub road: String,
    /// Road number; empty when the id has no digits.
    pub number: String,
}

static CAR_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<road>\D*?)[\s-]*(?P<number>\d.*)?$").expect("invalid car id regex")
});

/// Split a compound id such as `SP1234` or `UP-844` into road and number.
pub fn parse_car_id(car_id: &str) -> CarIdentity {
    let car_id = car_id.trim();
    match CAR_ID_RE.captures(car_id) {
        Some(caps) => CarIdentity {
            road: caps
                .name("road")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            number: caps
                .name("number")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        },
        None => CarIdentity {
            road: car_id.to_string(),
            number: String::new(),
        },
    }
}

/// Truncate a model name to [`MODEL_NAME_LIMIT`] characters.
pub fn truncate_model(model: &str) -> String {
    model.chars().take(MODEL_NAME_LIMIT).collect()
}

/// Locations line → locale.
/// Format: `TP-ID; Location; Track; Label; Type; Spaces`.
pub fn locale_from_record(record: &RawRecord) -> Result<Locale, PipelineError> {
    let fields = record.checked_fields()?;
    Ok(Locale {
        location: fields[1].clone(),
        attributes: LocaleAttributes {
            id: fields[0].clone(),
            track: fields[2].clone(),
            track_type: TrackType::from_trainplayer(&fields[4])?,
            capacity: fields[5].clone(),
        },
    })
}

/// Industries line → industry.
/// Format: `ID; Location; Track; Label; AAR; S/R; Load; Staging; ViaIn`.
pub fn industry_from_record(record: &RawRecord) -> Result<Industry, PipelineError> {
    let fields = record.checked_fields()?;
    Ok(Industry {
        location: fields[1].clone(),
        attributes: IndustryAttributes {
            id: fields[0].clone(),
            track: fields[2].clone(),
            label: fields[3].clone(),
            aar: fields[4].clone(),
            send_receive: fields[5].clone(),
            load: fields[6].clone(),
            staging: fields[7].clone(),
            via_in: fields[8].clone(),
        },
    })
}

/// One inventory line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    /// Road and number.
    pub identity: CarIdentity,
    /// Model, truncated for engines.
    pub model: String,
    /// TrainPlayer type code.
    pub type_code: String,
    /// Category from the type code.
    pub kind: StockKind,
    /// Kernel for cars, consist for engines.
    pub group: String,
}

impl InventoryItem {
    /// Inventory line → classified item.
    /// Format: `CarID; Model; Type; …; Kernel/Consist` (group at index 6).
    pub fn from_record(record: &RawRecord) -> Result<Self, PipelineError> {
        let fields = record.checked_fields()?;
        let car_id = &fields[0];
        let type_code = &fields[2];
        let kind = StockKind::classify(type_code).ok_or_else(|| PipelineError::UnknownTypeCode {
            car_id: car_id.clone(),
            code: type_code.clone(),
        })?;

        Ok(Self {
            identity: parse_car_id(car_id),
            model: fields[1].clone(),
            type_code: type_code.clone(),
            /// Category from the type code.
            kind,
            group: fields[6].clone(),
        })
    }

    /// Model/type pair recorded for engines.
    pub fn loco_model(&self) -> LocoModel {
        LocoModel {
            model: truncate_model(&self.model),
            type_code: self.type_code.clone(),
        }
    }
}

/// Load names by AAR code. Every code in `car_aar` gets an entry, empty if no industry
/// handles it.
pub fn car_loads(
    car_aar: &BTreeSet<String>,
    industries: &[Industry],
) -> BTreeMap<String, BTreeSet<String>> {
    car_aar
        .iter()
        .map(|aar| {
            let loads = industries
                .iter()
                .filter(|industry| &industry.attributes.aar == aar)
                .map(|industry| industry.attributes.load.clone())
                .filter(|load| !load.is_empty())
                .collect();
            (aar.clone(), loads)
        })
        .collect()
}
