//! Shared domain models.

pub mod manifest;
pub mod railroad;
pub mod work_events;

pub use manifest::{
    HostManifest, ManifestPlace, ManifestRollingStock, ManifestStop, ManifestTrack, Movements,
    TrainLength,
};
pub use railroad::{
    Industry, IndustryAttributes, Locale, LocaleAttributes, LocoModel, RailroadData, TrackType,
    UNDEFINED_LOCATION,
};
pub use work_events::{
    CarEvent, LocoEvent, SetTo, TrackWorkEvents, WorkEventList, WorkLocation,
};
