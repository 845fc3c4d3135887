//! Host manifest → work event list.

use serde_json::Value;

use crate::{
    config::ExportSettings,
    models::{
        CarEvent, HostManifest, LocoEvent, ManifestPlace, ManifestRollingStock, ManifestStop,
        SetTo, TrackWorkEvents, WorkEventList, WorkLocation,
    },
};

/// Flatten a loosely typed manifest scalar to text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Value::Number(num) => num.to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(_) => String::new(),
    }
}

fn text(value: &Option<Value>) -> String {
    value.as_ref().map(value_to_string).unwrap_or_default()
}

fn truthy(value: &Option<Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn length_of(stop: &ManifestStop) -> i64 {
    match stop.length.as_ref().and_then(|length| length.length.as_ref()) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// `Empty` → `E`, `Load` → `L`, anything else → `O`.
pub fn short_load_type(load_type: &str) -> &'static str {
    if load_type.eq_ignore_ascii_case("empty") {
        "E"
    } else if load_type.eq_ignore_ascii_case("load") {
        "L"
    } else {
        "O"
    }
}

/// Location and track names of a manifest place; either may be empty.
#[derive(Debug, Default, PartialEq, Eq)]
struct Place {
    location: String,
    track: String,
}

impl Place {
    fn from_manifest(place: &Option<ManifestPlace>) -> Self {
        let Some(place) = place else {
            return Self::default();
        };
        Self {
            location: text(&place.name),
            track: place
                .track
                .as_ref()
                .map(|track| text(&track.name))
                .unwrap_or_default(),
        }
    }

    fn is_empty(&self) -> bool {
        self.location.is_empty()
    }

    fn location_or(&self, standin: &str) -> String {
        if self.is_empty() {
            standin.to_string()
        } else {
            self.location.clone()
        }
    }

    /// `Location, Track`, or just the location when no track is set.
    fn with_track_or(&self, standin: &str) -> String {
        if self.is_empty() {
            standin.to_string()
        } else if self.track.is_empty() {
            self.location.clone()
        } else {
            format!("{}, {}", self.location, self.track)
        }
    }
}

/// Work for an entry: held when it is already at its destination track.
fn set_to(listed: SetTo, current: &Place, destination: &Place) -> SetTo {
    if !current.is_empty() && current == destination {
        SetTo::Hold
    } else {
        listed
    }
}

fn loco_event(listed: SetTo, rs: &ManifestRollingStock, settings: &ExportSettings) -> LocoEvent {
    let current = Place::from_manifest(&rs.location);
    let destination = Place::from_manifest(&rs.destination);
    LocoEvent {
        set_to: set_to(listed, &current, &destination).code().to_string(),
        road: text(&rs.road),
        number: text(&rs.number),
        car_type: text(&rs.car_type),
        model: text(&rs.model),
        length: text(&rs.length),
        weight: text(&rs.weight),
        consist: text(&rs.consist),
        owner: text(&rs.owner),
        track: current.track.clone(),
        location: current.location.clone(),
        destination: destination.location_or(&settings.destination_standin),
        comment: text(&rs.comment),
    }
}

fn car_event(listed: SetTo, rs: &ManifestRollingStock, settings: &ExportSettings) -> CarEvent {
    let current = Place::from_manifest(&rs.location);
    let destination = Place::from_manifest(&rs.destination);
    let final_dest = Place::from_manifest(&rs.final_destination);
    let rwe = Place::from_manifest(&rs.return_when_empty);
    CarEvent {
        set_to: set_to(listed, &current, &destination).code().to_string(),
        road: text(&rs.road),
        number: text(&rs.number),
        car_type: text(&rs.car_type),
        length: text(&rs.length),
        weight: text(&rs.weight),
        load: text(&rs.load),
        load_type: short_load_type(&text(&rs.load_type)).to_string(),
        hazardous: truthy(&rs.hazardous),
        color: text(&rs.color),
        kernel: text(&rs.kernel),
        kernel_size: text(&rs.kernel_size),
        owner: text(&rs.owner),
        track: current.track.clone(),
        location: current.location.clone(),
        destination: destination.location_or(&settings.destination_standin),
        dest_and_track: destination.with_track_or(&settings.destination_standin),
        final_dest: final_dest.location_or(&settings.final_dest_standin),
        fd_and_track: final_dest.with_track_or(&settings.final_dest_standin),
        comment: text(&rs.comment),
        set_out_msg: text(&rs.remove_comment),
        pickup_msg: text(&rs.add_comment),
        rwe: rwe.with_track_or(""),
    }
}

fn track_events(stop: &ManifestStop, settings: &ExportSettings) -> TrackWorkEvents {
    let locos = stop
        .engines
        .remove
        .iter()
        .map(|rs| loco_event(SetTo::SetOut, rs, settings))
        .chain(
            stop.engines
                .add
                .iter()
                .map(|rs| loco_event(SetTo::PickUp, rs, settings)),
        )
        .collect();
    let cars = stop
        .cars
        .remove
        .iter()
        .map(|rs| car_event(SetTo::SetOut, rs, settings))
        .chain(
            stop.cars
                .add
                .iter()
                .map(|rs| car_event(SetTo::PickUp, rs, settings)),
        )
        .collect();

    TrackWorkEvents {
        track_name: text(&stop.name),
        length: length_of(stop),
        locos,
        cars,
    }
}

/// Restructure a manifest into a work event list. The train becomes the single
/// location; each stop on its route becomes one track.
pub fn work_events(manifest: &HostManifest, settings: &ExportSettings) -> WorkEventList {
    let train_name = text(&manifest.train_name);
    WorkEventList {
        railroad_name: text(&manifest.railroad),
        railroad_description: settings.railroad_description.clone(),
        train_name: train_name.clone(),
        train_description: text(&manifest.description),
        train_comment: text(&manifest.comment),
        division: settings.division.clone(),
        date: text(&manifest.date),
        locations: vec![WorkLocation {
            location_name: train_name,
            tracks: manifest
                .locations
                .iter()
                .map(|stop| track_events(stop, settings))
                .collect(),
        }],
    }
}

#[cfg(test)]
pub(crate) fn sample_manifest() -> HostManifest {
    serde_json::from_value(serde_json::json!({
        "railroad": "Pacific Lines",
        "userName": "Local 12",
        "description": "Mill switcher",
        "comment": "Watch the grade",
        "date": "2022-03-01T10:00:00",
        "locations": [
            {
                "userName": "Yard1",
                "length": {"length": 240, "unit": "feet"},
                "engines": {
                    "add": [{
                        "road": "SP", "number": "4449", "carType": "Steam", "model": "GS4",
                        "length": 100, "weight": 400, "consist": "",
                        "location": {"userName": "Yard1", "track": {"userName": "Engine"}},
                        "destination": {"userName": "Mill Town"}
                    }],
                    "remove": []
                },
                "cars": {
                    "add": [{
                        "road": "SP", "number": 1234, "carType": "XM", "length": "40",
                        "load": "Grain", "loadType": "Load", "hazardous": false,
                        "kernel": "K1", "kernelSize": 2,
                        "location": {"userName": "Yard1", "track": {"userName": "T1"}},
                        "destination": {"userName": "Mill Town", "track": {"userName": "Mill"}},
                        "finalDestination": null,
                        "returnWhenEmpty": {"userName": "Yard1"},
                        "addComment": "Handle with care"
                    }, {
                        "road": "UP", "number": "77", "carType": "GB", "loadType": "Empty",
                        "hazardous": "true",
                        "location": {"userName": "Yard1", "track": {"userName": "T2"}},
                        "destination": {"userName": "Yard1", "track": {"userName": "T2"}}
                    }],
                    "remove": []
                }
            },
            {
                "userName": "Mill Town",
                "cars": {
                    "add": [],
                    "remove": [{
                        "road": "SP", "number": 1234, "carType": "XM",
                        "loadType": "Special",
                        "location": {"userName": "Yard1", "track": {"userName": "T1"}},
                        "destination": {"userName": "Mill Town", "track": {"userName": "Mill"}},
                        "removeComment": "Spot at door 2"
                    }]
                }
            }
        ]
    }))
    .expect("sample manifest is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> ExportSettings {
        ExportSettings {
            railroad_description: "Coast route".to_string(),
            division: "Coast".to_string(),
            destination_standin: "No Dest".to_string(),
            final_dest_standin: "No FD".to_string(),
        }
    }

    #[test]
    fn header_carried_from_manifest_and_settings() {
        let list = work_events(&sample_manifest(), &settings());
        assert_eq!(list.railroad_name, "Pacific Lines");
        assert_eq!(list.railroad_description, "Coast route");
        assert_eq!(list.train_name, "Local 12");
        assert_eq!(list.train_description, "Mill switcher");
        assert_eq!(list.train_comment, "Watch the grade");
        assert_eq!(list.division, "Coast");
        assert_eq!(list.date, "2022-03-01T10:00:00");
        assert_eq!(list.locations.len(), 1);
        assert_eq!(list.location().map(|l| l.location_name.as_str()), Some("Local 12"));
    }

    #[test]
    fn one_track_per_stop() {
        let list = work_events(&sample_manifest(), &settings());
        let tracks = &list.locations[0].tracks;
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track_name, "Yard1");
        assert_eq!(tracks[0].length, 240);
        assert_eq!(tracks[1].track_name, "Mill Town");
        assert_eq!(tracks[1].length, 0);
        assert_eq!(list.event_count(), 4);
    }

    #[test]
    fn set_to_codes_and_stand_ins() {
        let list = work_events(&sample_manifest(), &settings());
        let yard = &list.locations[0].tracks[0];

        let loco = &yard.locos[0];
        assert_eq!(loco.set_to, "PU");
        assert_eq!(loco.track, "Engine");
        assert_eq!(loco.length, "100");
        assert_eq!(loco.destination, "Mill Town");

        let pickup = &yard.cars[0];
        assert_eq!(pickup.set_to, "PU");
        assert_eq!(pickup.number, "1234");
        assert_eq!(pickup.load_type, "L");
        assert!(!pickup.hazardous);
        assert_eq!(pickup.dest_and_track, "Mill Town, Mill");
        assert_eq!(pickup.final_dest, "No FD");
        assert_eq!(pickup.fd_and_track, "No FD");
        assert_eq!(pickup.kernel_size, "2");
        assert_eq!(pickup.rwe, "Yard1");
        assert_eq!(pickup.pickup_msg, "Handle with care");

        let held = &yard.cars[1];
        assert_eq!(held.set_to, "H");
        assert_eq!(held.load_type, "E");
        assert!(held.hazardous);

        let set_out = &list.locations[0].tracks[1].cars[0];
        assert_eq!(set_out.set_to, "SO");
        assert_eq!(set_out.load_type, "O");
        assert_eq!(set_out.set_out_msg, "Spot at door 2");
    }

    #[test]
    fn empty_destination_uses_stand_in() {
        let rs: ManifestRollingStock = serde_json::from_value(json!({
            "road": "BN", "number": "55",
            "location": {"userName": "Yard1", "track": {"userName": "T1"}}
        }))
        .expect("valid entry");
        let car = car_event(SetTo::PickUp, &rs, &settings());
        assert_eq!(car.set_to, "PU");
        assert_eq!(car.destination, "No Dest");
        assert_eq!(car.dest_and_track, "No Dest");
        let loco = loco_event(SetTo::SetOut, &rs, &settings());
        assert_eq!(loco.destination, "No Dest");
    }

    #[test]
    fn scalar_flattening() {
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!(40)), "40");
        assert_eq!(value_to_string(&json!(" XM ")), "XM");
        assert_eq!(value_to_string(&json!(["a", 1])), "a 1");
        assert!(!value_to_string(&json!(["door 2", ["north"]])).contains(','));
        assert_eq!(short_load_type("Empty"), "E");
        assert_eq!(short_load_type("load"), "L");
        assert_eq!(short_load_type(""), "O");
    }
}
