//! The railroad data document built from the TrainPlayer reports.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location name used for stock the reports cannot place.
pub const UNDEFINED_LOCATION: &str = "Undefined";

/// Host track types a TrainPlayer track maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrackType {
    /// Industry spur.
    Spur,
    /// Interchange with another railroad.
    Interchange,
    /// Staging track.
    Staging,
    /// Yard track.
    Yard,
}

/// Per-track attributes recorded for a locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleAttributes {
    /// TrainPlayer track id.
    #[serde(rename = "ID")]
    pub id: String,
    /// Track label.
    pub track: String,
    /// Host track type.
    #[serde(rename = "type")]
    pub track_type: TrackType,
    /// Track capacity in cars.
    pub capacity: String,
}

/// A named location with the attributes of the track that defined it.
///
/// Serialized as a two element array `[location, {attributes}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, LocaleAttributes)", into = "(String, LocaleAttributes)")]
pub struct Locale {
    /// Location name.
    pub location: String,
    /// Attributes of the defining track.
    pub attributes: LocaleAttributes,
}

impl Locale {
    /// Placeholder locale that always heads the locale list.
    pub fn undefined() -> Self {
        Self {
            location: UNDEFINED_LOCATION.to_string(),
            attributes: LocaleAttributes {
                id: "00".to_string(),
                track: "~".to_string(),
                track_type: TrackType::Yard,
                capacity: "100".to_string(),
            },
        }
    }
}

impl From<(String, LocaleAttributes)> for Locale {
    fn from((location, attributes): (String, LocaleAttributes)) -> Self {
        Self {
            /// Location name.
            location,
            /// Attributes of the defining track.
            attributes,
        }
    }
}

impl From<Locale> for (String, LocaleAttributes) {
    fn from(locale: Locale) -> Self {
        (locale.location, locale.attributes)
    }
}

/// Industry attributes exactly as TrainPlayer reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryAttributes {
    /// TrainPlayer industry id.
    #[serde(rename = "ID")]
    pub id: String,
    /// Track the industry sits on.
    pub track: String,
    /// Industry label.
    pub label: String,
    /// AAR code of the cars this industry ships or receives.
    #[serde(rename = "type")]
    pub aar: String,
    /// Whether the industry ships or receives.
    #[serde(rename = "s/r")]
    pub send_receive: String,
    /// Load name.
    pub load: String,
    /// Staging track for the industry.
    pub staging: String,
    /// Inbound routing.
    #[serde(rename = "viain")]
    pub via_in: String,
}

/// An industry attached to a location by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(String, IndustryAttributes)",
    into = "(String, IndustryAttributes)"
)]
pub struct Industry {
    /// Location name.
    pub location: String,
    /// Industry attributes.
    pub attributes: IndustryAttributes,
}

impl From<(String, IndustryAttributes)> for Industry {
    fn from((location, attributes): (String, IndustryAttributes)) -> Self {
        Self {
            /// Location name.
            location,
            /// Industry attributes.
            attributes,
        }
    }
}

impl From<Industry> for (String, IndustryAttributes) {
    fn from(industry: Industry) -> Self {
        (industry.location, industry.attributes)
    }
}

/// Locomotive model paired with its type code, serialized as `[model, type]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct LocoModel {
    /// Model name, at most 11 characters.
    pub model: String,
    /// Locomotive type code.
    pub type_code: String,
}

impl From<(String, String)> for LocoModel {
    fn from((model, type_code): (String, String)) -> Self {
        Self { model, type_code }
    }
}

impl From<LocoModel> for (String, String) {
    fn from(model: LocoModel) -> Self {
        (model.model, model.type_code)
    }
}

/// Railroad attributes assembled from one import run.
///
/// Field names on the wire are fixed literals; the document is read by tooling that
/// knows nothing about this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailroadData {
    /// Date line of the reports.
    #[serde(rename = "trainplayerDate")]
    pub export_date: String,
    /// Railroad name from the locations report.
    #[serde(rename = "railroadName")]
    pub railroad_name: String,
    /// Railroad description from the locations report.
    #[serde(rename = "railroadDescription")]
    pub railroad_description: String,
    /// When this document was assembled.
    #[serde(rename = "date")]
    pub generated_date: DateTime<Utc>,
    /// Every location name.
    pub locations: BTreeSet<String>,
    /// Locales, the undefined placeholder first.
    pub locales: Vec<Locale>,
    /// Industries in report order.
    pub industries: Vec<Industry>,
    /// Reporting marks seen in the inventory.
    pub roads: BTreeSet<String>,
    /// AAR codes of the cars.
    #[serde(rename = "carAAR")]
    pub car_aar: BTreeSet<String>,
    /// Loads seen per AAR code.
    #[serde(rename = "carLoads")]
    pub car_loads: BTreeMap<String, BTreeSet<String>>,
    /// Kernel names.
    #[serde(rename = "carKernel")]
    pub car_kernel: BTreeSet<String>,
    /// Locomotive type codes.
    #[serde(rename = "locoTypes")]
    pub loco_types: BTreeSet<String>,
    /// Locomotive models with their type codes.
    #[serde(rename = "locoModels")]
    pub loco_models: BTreeSet<LocoModel>,
    /// Consist names.
    #[serde(rename = "locoConsists")]
    pub loco_consists: BTreeSet<String>,
}

impl RailroadData {
    /// Look up the locale recorded for a location.
    pub fn locale(&self, location: &str) -> Option<&Locale> {
        self.locales.iter().find(|locale| locale.location == location)
    }

    /// Industries attached to a location, in report order.
    pub fn industries_at<'a>(&'a self, location: &'a str) -> impl Iterator<Item = &'a Industry> {
        self.industries
            .iter()
            .filter(move |industry| industry.location == location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn locale_serializes_as_pair() -> anyhow::Result<()> {
        let value = serde_json::to_value(Locale::undefined())?;
        assert_eq!(
            value,
            json!(["Undefined", {"ID": "00", "track": "~", "type": "Yard", "capacity": "100"}])
        );
        Ok(())
    }

    #[test]
    fn industry_uses_report_keys() -> anyhow::Result<()> {
        let industry = Industry {
            location: "Mill Town".to_string(),
            attributes: IndustryAttributes {
                id: "12".to_string(),
                track: "Mill".to_string(),
                label: "Flour Mill".to_string(),
                aar: "XM".to_string(),
                send_receive: "R".to_string(),
                load: "Grain".to_string(),
                staging: "Yard".to_string(),
                via_in: "Yard".to_string(),
            },
        };
        let value = serde_json::to_value(&industry)?;
        assert_eq!(value[0], json!("Mill Town"));
        assert_eq!(value[1]["s/r"], json!("R"));
        assert_eq!(value[1]["viain"], json!("Yard"));
        assert_eq!(value[1]["type"], json!("XM"));

        let back: Industry = serde_json::from_value(value)?;
        assert_eq!(back, industry);
        Ok(())
    }

    #[test]
    fn loco_model_serializes_as_pair() -> anyhow::Result<()> {
        let model = LocoModel::from(("SomeLongMod".to_string(), "E8".to_string()));
        assert_eq!(serde_json::to_value(&model)?, json!(["SomeLongMod", "E8"]));
        Ok(())
    }
}
