//! Work event list handed to the TrainPlayer o2o scripts.

use serde::{Deserialize, Serialize};

/// Action a work event asks the crew to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetTo {
    /// `PU`: the car joins the train.
    PickUp,
    /// `SO`: the car leaves the train.
    SetOut,
    /// `H`: the car stays where it is.
    Hold,
}

impl SetTo {
    /// Code written into the `setTo` column.
    pub fn code(self) -> &'static str {
        match self {
            SetTo::PickUp => "PU",
            SetTo::SetOut => "SO",
            SetTo::Hold => "H",
        }
    }
}

/// Header plus the single location the list describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEventList {
    /// Railroad name.
    pub railroad_name: String,
    /// Railroad description.
    pub railroad_description: String,
    /// Train name.
    pub train_name: String,
    /// Train description.
    pub train_description: String,
    /// Train comment.
    pub train_comment: String,
    /// Division the train works.
    pub division: String,
    /// When the train was built.
    pub date: String,
    /// Always exactly one entry; kept as a list to match the host manifest layout.
    pub locations: Vec<WorkLocation>,
}

impl WorkEventList {
    /// The one location carried by the list.
    pub fn location(&self) -> Option<&WorkLocation> {
        self.locations.first()
    }

    /// Number of locomotive and car events across every track.
    pub fn event_count(&self) -> usize {
        self.locations
            .iter()
            .flat_map(|location| location.tracks.iter())
            .map(|track| track.locos.len() + track.cars.len())
            .sum()
    }
}

/// The location a work event list covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLocation {
    /// Location heading, the train name.
    pub location_name: String,
    /// One entry per stop.
    pub tracks: Vec<TrackWorkEvents>,
}

/// Events grouped under one track heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackWorkEvents {
    /// Track heading.
    pub track_name: String,
    /// Train length at this point.
    pub length: i64,
    /// Locomotive events.
    pub locos: Vec<LocoEvent>,
    /// Car events.
    pub cars: Vec<CarEvent>,
}

/// One locomotive movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocoEvent {
    /// `setTo` code, see [`SetTo::code`].
    pub set_to: String,
    /// Reporting mark.
    pub road: String,
    /// Road number.
    pub number: String,
    /// Type.
    pub car_type: String,
    /// Engine model.
    pub model: String,
    /// Length.
    pub length: String,
    /// Weight.
    pub weight: String,
    /// Consist name.
    pub consist: String,
    /// Owner.
    pub owner: String,
    /// Current track.
    pub track: String,
    /// Current location.
    pub location: String,
    /// Destination location.
    pub destination: String,
    /// Free-form comment.
    pub comment: String,
}

/// One car movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarEvent {
    /// `setTo` code, see [`SetTo::code`].
    pub set_to: String,
    /// Reporting mark.
    pub road: String,
    /// Road number.
    pub number: String,
    /// Type.
    pub car_type: String,
    /// Length.
    pub length: String,
    /// Weight.
    pub weight: String,
    /// Load name.
    pub load: String,
    /// Short load type: `L`, `E` or `O`.
    pub load_type: String,
    /// Hazardous load.
    pub hazardous: bool,
    /// Color.
    pub color: String,
    /// Kernel name.
    pub kernel: String,
    /// Cars in the kernel.
    pub kernel_size: String,
    /// Owner.
    pub owner: String,
    /// Current track.
    pub track: String,
    /// Current location.
    pub location: String,
    /// Destination location.
    pub destination: String,
    /// Destination as `Location, Track`.
    #[serde(rename = "dest&Track")]
    pub dest_and_track: String,
    /// Final destination location.
    pub final_dest: String,
    /// Final destination as `Location, Track`.
    #[serde(rename = "fd&Track")]
    pub fd_and_track: String,
    /// Free-form comment.
    pub comment: String,
    /// Set out message.
    pub set_out_msg: String,
    /// Pick up message.
    pub pickup_msg: String,
    /// Return-when-empty location.
    pub rwe: String,
}
