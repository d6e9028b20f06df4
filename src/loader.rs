//! CSV ingestion for the two source datasets.
//!
//! The loader owns data quality: rows with missing or zero coordinates,
//! unparseable timestamps, unknown offense categories or unknown boroughs
//! are dropped (and counted in the log), so the clustering core only ever
//! sees validated records. Records are returned in timestamp order.

use crate::error::Result;
use crate::records::{ArrestRecord, Borough, EventRecord, OffenseCategory};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Raw arrest row as it appears in `arrests.csv`. Every field is optional so
/// that a malformed row deserializes and can be dropped, instead of aborting
/// the whole file.
#[derive(Debug, Deserialize)]
struct RawArrestRow {
    #[serde(alias = "ARREST_DATE")]
    arrest_date: Option<String>,
    #[serde(alias = "Latitude")]
    latitude: Option<f64>,
    #[serde(alias = "Longitude")]
    longitude: Option<f64>,
    #[serde(alias = "OFNS_DESC")]
    ofns_desc: Option<String>,
    #[serde(alias = "ARREST_BORO")]
    arrest_boro: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEventRow {
    #[serde(alias = "Event Name")]
    event_name: Option<String>,
    #[serde(alias = "Start Date/Time")]
    start_date_time: Option<String>,
    #[serde(alias = "End Date/Time")]
    end_date_time: Option<String>,
    #[serde(alias = "Event Borough")]
    event_borough: Option<String>,
    #[serde(alias = "Latitude")]
    latitude: Option<f64>,
    #[serde(alias = "Longitude")]
    longitude: Option<f64>,
}

/// Timestamp formats seen across NYC open-data exports.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    // Date-only rows resolve to midnight
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn valid_coordinates(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat != 0.0 && lon != 0.0
}

/// Reads arrest records, dropping malformed rows and rows outside the five
/// tracked offense categories. Output is sorted by timestamp.
pub fn load_arrests<R: Read>(reader: R) -> Result<Vec<ArrestRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut records = Vec::new();
    let mut dropped = 0usize;
    let mut untracked = 0usize;

    for row in csv_reader.deserialize::<RawArrestRow>() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        let category = match row.ofns_desc.as_deref().and_then(OffenseCategory::from_ofns_desc) {
            Some(category) => category,
            None => {
                untracked += 1;
                continue;
            }
        };
        let (Some(lat), Some(lon)) = (row.latitude, row.longitude) else {
            dropped += 1;
            continue;
        };
        if !valid_coordinates(lat, lon) {
            dropped += 1;
            continue;
        }
        let (Some(occurred_at), Some(borough)) = (
            row.arrest_date.as_deref().and_then(parse_timestamp),
            row.arrest_boro.as_deref().and_then(Borough::from_code),
        ) else {
            dropped += 1;
            continue;
        };
        records.push(ArrestRecord {
            occurred_at,
            latitude: lat,
            longitude: lon,
            category,
            borough,
        });
    }

    records.sort_by_key(|r| r.occurred_at);
    if dropped > 0 {
        warn!("dropped {dropped} malformed arrest rows");
    }
    debug!(
        "loaded {} arrests ({untracked} rows outside tracked categories)",
        records.len()
    );
    Ok(records)
}

/// Reads event-permit records. Rows sharing a name and time span merge into
/// a single event whose route accumulates each row's vertex, which is how
/// route-shaped permits (parades, marathons) arrive.
pub fn load_events<R: Read>(reader: R) -> Result<Vec<EventRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut events: Vec<EventRecord> = Vec::new();
    let mut dropped = 0usize;

    for row in csv_reader.deserialize::<RawEventRow>() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        let (Some(name), Some(start_raw), Some(end_raw), Some(boro_raw)) = (
            row.event_name,
            row.start_date_time,
            row.end_date_time,
            row.event_borough,
        ) else {
            dropped += 1;
            continue;
        };
        let (Some(start), Some(end), Some(borough)) = (
            parse_timestamp(&start_raw),
            parse_timestamp(&end_raw),
            Borough::from_code(&boro_raw),
        ) else {
            dropped += 1;
            continue;
        };
        if end <= start {
            dropped += 1;
            continue;
        }
        let vertex = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) if valid_coordinates(lat, lon) => Some((lat, lon)),
            _ => None,
        };

        if let Some(existing) = events
            .iter_mut()
            .find(|e| e.name == name && e.start == start && e.end == end)
        {
            if let Some(vertex) = vertex {
                existing.route.push(vertex);
            }
            continue;
        }
        events.push(EventRecord {
            name,
            start,
            end,
            route: vertex.into_iter().collect(),
            borough,
        });
    }

    events.sort_by_key(|e| e.start);
    if dropped > 0 {
        warn!("dropped {dropped} malformed event rows");
    }
    debug!("loaded {} events", events.len());
    Ok(events)
}

pub fn load_arrests_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ArrestRecord>> {
    load_arrests(File::open(path.as_ref()).map_err(|e| crate::error::Error::Csv(e.to_string()))?)
}

pub fn load_events_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
    load_events(File::open(path.as_ref()).map_err(|e| crate::error::Error::Csv(e.to_string()))?)
}
