//! Shape of the host's JSON train manifest.
//!
//! The host writes scalars loosely (numbers for some lengths, strings for others, nulls
//! for unset values), so everything that is not structural is kept as a raw
//! [`Value`] and flattened to text during conversion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Manifest for one built train.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostManifest {
    /// Railroad the train runs on.
    #[serde(default)]
    pub railroad: Option<Value>,
    /// Train name as shown to the user.
    #[serde(rename = "userName", default)]
    pub train_name: Option<Value>,
    /// Train description.
    #[serde(default)]
    pub description: Option<Value>,
    /// Train comment.
    #[serde(default)]
    pub comment: Option<Value>,
    /// When the train was built.
    #[serde(default)]
    pub date: Option<Value>,
    /// Stops in route order.
    #[serde(default)]
    pub locations: Vec<ManifestStop>,
}

/// Work the train performs at one location on its route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestStop {
    /// Location name.
    #[serde(rename = "userName", default)]
    pub name: Option<Value>,
    /// Train length leaving the stop.
    #[serde(default)]
    pub length: Option<TrainLength>,
    /// Engine moves at this stop.
    #[serde(default)]
    pub engines: Movements,
    /// Car moves at this stop.
    #[serde(default)]
    pub cars: Movements,
}

/// Train length on departure from a stop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainLength {
    /// Length value.
    #[serde(default)]
    pub length: Option<Value>,
    /// Unit the length is measured in.
    #[serde(default)]
    pub unit: Option<Value>,
}

/// Rolling stock picked up (`add`) and set out (`remove`) at a stop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Movements {
    /// Picked up here.
    #[serde(default)]
    pub add: Vec<ManifestRollingStock>,
    /// Set out here.
    #[serde(default)]
    pub remove: Vec<ManifestRollingStock>,
}

/// A location reference, optionally narrowed to a track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestPlace {
    /// Location name.
    #[serde(rename = "userName", default)]
    pub name: Option<Value>,
    /// Track within the location, if any.
    #[serde(default)]
    pub track: Option<ManifestTrack>,
}

/// A track reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestTrack {
    /// Track name.
    #[serde(rename = "userName", default)]
    pub name: Option<Value>,
}

/// One car or engine entry. Engines leave the car-only fields unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRollingStock {
    /// Reporting mark.
    #[serde(default)]
    pub road: Option<Value>,
    /// Road number.
    #[serde(default)]
    pub number: Option<Value>,
    /// Car or engine type.
    #[serde(default)]
    pub car_type: Option<Value>,
    /// Engine model.
    #[serde(default)]
    pub model: Option<Value>,
    /// Length.
    #[serde(default)]
    pub length: Option<Value>,
    /// Weight.
    #[serde(default)]
    pub weight: Option<Value>,
    /// Owner.
    #[serde(default)]
    pub owner: Option<Value>,
    /// Color.
    #[serde(default)]
    pub color: Option<Value>,
    /// Free-form comment.
    #[serde(default)]
    pub comment: Option<Value>,
    /// Consist the engine belongs to.
    #[serde(default)]
    pub consist: Option<Value>,
    /// Kernel the car belongs to.
    #[serde(default)]
    pub kernel: Option<Value>,
    /// Number of cars in the kernel.
    #[serde(default)]
    pub kernel_size: Option<Value>,
    /// Load name.
    #[serde(default)]
    pub load: Option<Value>,
    /// Load type, e.g. `Load` or `Empty`.
    #[serde(default)]
    pub load_type: Option<Value>,
    /// Whether the load is hazardous.
    #[serde(default)]
    pub hazardous: Option<Value>,
    /// Where the car is now.
    #[serde(default)]
    pub location: Option<ManifestPlace>,
    /// Where the train takes it.
    #[serde(default)]
    pub destination: Option<ManifestPlace>,
    /// Where it is ultimately headed.
    #[serde(default)]
    pub final_destination: Option<ManifestPlace>,
    /// Where it goes once emptied.
    #[serde(default)]
    pub return_when_empty: Option<ManifestPlace>,
    /// Message printed on pick up.
    #[serde(default)]
    pub add_comment: Option<Value>,
    /// Message printed on set out.
    #[serde(default)]
    pub remove_comment: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_mixed_scalars_and_missing_sections() -> anyhow::Result<()> {
        let manifest: HostManifest = serde_json::from_str(
            r#"{
                "railroad": "Pacific Lines",
                "userName": "Local 12",
                "date": "2022-03-01T10:00:00",
                "locations": [
                    {
                        "userName": "Yard1",
                        "length": {"length": 240, "unit": "feet"},
                        "cars": {
                            "add": [
                                {"road": "SP", "number": 1234, "carType": "XM", "length": "40",
                                 "hazardous": false,
                                 "location": {"userName": "Yard1", "track": {"userName": "T1"}},
                                 "destination": {"userName": "Mill Town"}}
                            ]
                        }
                    }
                ]
            }"#,
        )?;

        assert_eq!(manifest.locations.len(), 1);
        let stop = &manifest.locations[0];
        assert!(stop.engines.add.is_empty());
        assert_eq!(stop.cars.add.len(), 1);
        let car = &stop.cars.add[0];
        assert_eq!(car.number, Some(Value::from(1234)));
        assert!(car
            .destination
            .as_ref()
            .is_some_and(|place| place.track.is_none()));
        assert!(manifest.description.is_none());
        Ok(())
    }
}
