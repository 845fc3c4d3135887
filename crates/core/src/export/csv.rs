//! Flat CSV rendering of a work event list, in the layout the o2o scripts read.
//!
//! Only the railroad name and division are quoted. Commas inside comments pass through
//! unescaped so the output matches what the scripts already accept.

use crate::models::{CarEvent, LocoEvent, WorkEventList};

const LOCO_COLUMNS: &str =
    "setTo,Road,Number,Type,Model,Length,Weight,Consist,Owner,Track,Location,Destination,Comment";

const CAR_COLUMNS: &str = "setTo,Road,Number,Type,Length,Weight,Load,Load_Type,Hazardous,Color,Kernel,Kernel_Size,Owner,Track,Location,Destination,dest&Track,Final_Dest,fd&Track,Comment,Drop_Comment,Pickup_Comment,RWE";

fn loco_row(loco: &LocoEvent) -> String {
    let fields = [
        &loco.set_to,
        &loco.road,
        &loco.number,
        &loco.car_type,
        &loco.model,
        &loco.length,
        &loco.weight,
        &loco.consist,
        &loco.owner,
        &loco.track,
        &loco.location,
        &loco.destination,
        &loco.comment,
    ];
    let mut row = String::new();
    for field in fields {
        row.push_str(field);
        row.push(',');
    }
    row
}

fn car_row(car: &CarEvent) -> String {
    let hazardous = if car.hazardous { "True" } else { "False" };
    let fields: [&str; 23] = [
        &car.set_to,
        &car.road,
        &car.number,
        &car.car_type,
        &car.length,
        &car.weight,
        &car.load,
        &car.load_type,
        hazardous,
        &car.color,
        &car.kernel,
        &car.kernel_size,
        &car.owner,
        &car.track,
        &car.location,
        &car.destination,
        &car.dest_and_track,
        &car.final_dest,
        &car.fd_and_track,
        &car.comment,
        &car.set_out_msg,
        &car.pickup_msg,
        &car.rwe,
    ];
    fields.join(",")
}

/// Render the list. Every line, including the last, ends with `\n`.
pub fn render(list: &WorkEventList) -> String {
    let location_name = list
        .location()
        .map(|location| location.location_name.as_str())
        .unwrap_or_default();
    let tracks = list
        .location()
        .map(|location| location.tracks.as_slice())
        .unwrap_or_default();

    let mut lines = vec![
        "Operator,Description,Parameters".to_string(),
        format!("RT,Report Type,{}", list.train_description),
        format!("RN,Railroad Name,\"{}\"", list.railroad_name),
        format!("RD,Railroad Division,\"{}\"", list.division),
        format!("LN,Location Name,{location_name}"),
        "PRNTR,Printer Name,".to_string(),
        format!("YPC,Yard Pattern Comment,{}", list.train_comment),
        format!("VT,Valid,{}", list.date),
        "SE,Set Engines".to_string(),
        LOCO_COLUMNS.to_string(),
    ];
    for track in tracks {
        lines.push(format!("TN,Track name,{}", track.track_name));
        lines.extend(track.locos.iter().map(loco_row));
    }

    lines.push("SC,Set Cars".to_string());
    lines.push(CAR_COLUMNS.to_string());
    for track in tracks {
        lines.push(format!("TN,Track name,{}", track.track_name));
        lines.extend(track.cars.iter().map(car_row));
    }

    let mut out = String::new();
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ExportSettings, export::convert};

    fn rendered() -> String {
        let settings = ExportSettings {
            division: "Coast".to_string(),
            ..ExportSettings::default()
        };
        render(&convert::work_events(&convert::sample_manifest(), &settings))
    }

    #[test]
    fn header_rows_are_fixed() {
        let csv = rendered();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            &lines[..10],
            &[
                "Operator,Description,Parameters",
                "RT,Report Type,Mill switcher",
                "RN,Railroad Name,\"Pacific Lines\"",
                "RD,Railroad Division,\"Coast\"",
                "LN,Location Name,Local 12",
                "PRNTR,Printer Name,",
                "YPC,Yard Pattern Comment,Watch the grade",
                "VT,Valid,2022-03-01T10:00:00",
                "SE,Set Engines",
                LOCO_COLUMNS,
            ]
        );
    }

    #[test]
    fn engine_and_car_sections() {
        let csv = rendered();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[10], "TN,Track name,Yard1");
        assert_eq!(
            lines[11],
            "PU,SP,4449,Steam,GS4,100,400,,,Engine,Yard1,Mill Town,,"
        );
        assert_eq!(lines[12], "TN,Track name,Mill Town");
        assert_eq!(lines[13], "SC,Set Cars");
        assert_eq!(lines[14], CAR_COLUMNS);
        assert_eq!(lines[15], "TN,Track name,Yard1");
        assert_eq!(
            lines[16],
            "PU,SP,1234,XM,40,,Grain,L,False,,K1,2,,T1,Yard1,Mill Town,Mill Town, Mill,Unknown,Unknown,,,Handle with care,Yard1"
        );
        assert!(lines[17].starts_with("H,UP,77,GB,,,,E,True,"));
        assert_eq!(lines[18], "TN,Track name,Mill Town");
        assert!(lines[19].starts_with("SO,SP,1234,XM,"));
        assert_eq!(lines.len(), 20);
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn comment_commas_pass_through() {
        let car = CarEvent {
            set_to: "PU".to_string(),
            road: "SP".to_string(),
            number: "1".to_string(),
            car_type: "XM".to_string(),
            length: String::new(),
            weight: String::new(),
            load: String::new(),
            load_type: "E".to_string(),
            hazardous: false,
            color: String::new(),
            kernel: String::new(),
            kernel_size: String::new(),
            owner: String::new(),
            track: String::new(),
            location: String::new(),
            destination: String::new(),
            dest_and_track: String::new(),
            final_dest: String::new(),
            fd_and_track: String::new(),
            comment: "door 2, north".to_string(),
            set_out_msg: String::new(),
            pickup_msg: String::new(),
            rwe: String::new(),
        };
        let row = car_row(&car);
        assert!(row.contains(",door 2, north,"));
        assert_eq!(row.split(',').count(), 24);
    }

    #[test]
    fn array_comment_keeps_column_count() -> anyhow::Result<()> {
        let mut manifest = convert::sample_manifest();
        manifest.locations[0].cars.add[0].comment = Some(serde_json::json!(["door 2", "north"]));
        let csv = render(&convert::work_events(&manifest, &ExportSettings::default()));

        let row = csv
            .lines()
            .find(|line| line.starts_with("PU,SP,1234,"))
            .ok_or_else(|| anyhow::anyhow!("car row missing"))?;
        assert!(row.contains(",door 2 north,"));
        assert_eq!(row.split(',').count(), CAR_COLUMNS.split(',').count());
        Ok(())
    }
}
