use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The five offense categories the pipeline tracks. Anything else is dropped
/// by the loader before it reaches the core.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum OffenseCategory {
    Robbery,
    Assault,
    DangerousDrugs,
    CriminalTrespass,
    PetitLarceny,
}

impl OffenseCategory {
    /// Maps an NYPD `ofns_desc` value onto a tracked category. Returns `None`
    /// for offense descriptions outside the tracked set.
    pub fn from_ofns_desc(desc: &str) -> Option<Self> {
        match desc.trim().to_ascii_uppercase().as_str() {
            "ROBBERY" => Some(Self::Robbery),
            "ASSAULT 3 & RELATED OFFENSES" | "FELONY ASSAULT" => Some(Self::Assault),
            "DANGEROUS DRUGS" => Some(Self::DangerousDrugs),
            "CRIMINAL TRESPASS" => Some(Self::CriminalTrespass),
            "PETIT LARCENY" => Some(Self::PetitLarceny),
            _ => None,
        }
    }
}

/// NYC borough, as encoded in the `arrest_boro` column.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize,
)]
pub enum Borough {
    Bronx,
    Brooklyn,
    Manhattan,
    Queens,
    StatenIsland,
}

impl Borough {
    /// Decodes the single-letter borough code used by the arrests dataset.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "B" | "BRONX" => Some(Self::Bronx),
            "K" | "BROOKLYN" => Some(Self::Brooklyn),
            "M" | "MANHATTAN" => Some(Self::Manhattan),
            "Q" | "QUEENS" => Some(Self::Queens),
            "S" | "STATEN ISLAND" => Some(Self::StatenIsland),
            _ => None,
        }
    }
}

/// A single validated arrest. Immutable once loaded: the loader guarantees
/// finite, non-zero coordinates and a parseable timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrestRecord {
    pub occurred_at: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub category: OffenseCategory,
    pub borough: Borough,
}

impl ArrestRecord {
    /// The record's position as a (lat, lon) pair, the shape the clusterers
    /// consume.
    pub fn position(&self) -> Vec<f64> {
        vec![self.latitude, self.longitude]
    }
}

/// A permitted public event. The route is one or more (lat, lon) vertices;
/// point events carry a single vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub route: Vec<(f64, f64)>,
    pub borough: Borough,
}

impl EventRecord {
    /// Whether the event is in progress at any point during `window`.
    pub fn overlaps(&self, window: &AnalysisWindow) -> bool {
        self.start < window.end && self.end > window.start
    }
}

/// A half-open time interval `[start, end)` over which records are selected
/// for a clustering run or a comparison side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl AnalysisWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        AnalysisWindow { start, end }
    }

    /// A window covering one whole calendar day.
    pub fn whole_day(day: NaiveDate) -> Self {
        let start = day.and_hms_opt(0, 0, 0).expect("midnight is always valid");
        AnalysisWindow {
            start,
            end: start + chrono::Duration::days(1),
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t < self.end
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// The same interval shifted by a whole number of days. Negative values
    /// shift backwards in time.
    pub fn shifted_days(&self, days: i64) -> Self {
        let delta = chrono::Duration::days(days);
        AnalysisWindow {
            start: self.start + delta,
            end: self.end + delta,
        }
    }

    /// Filters `records` down to those falling inside this window, preserving
    /// input order.
    pub fn select<'a>(&self, records: &'a [ArrestRecord]) -> Vec<&'a ArrestRecord> {
        records
            .iter()
            .filter(|r| self.contains(r.occurred_at))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn category_mapping() {
        assert_eq!(
            OffenseCategory::from_ofns_desc("ROBBERY"),
            Some(OffenseCategory::Robbery)
        );
        assert_eq!(
            OffenseCategory::from_ofns_desc("petit larceny"),
            Some(OffenseCategory::PetitLarceny)
        );
        assert_eq!(OffenseCategory::from_ofns_desc("JOSTLING"), None);
    }

    #[test]
    fn borough_codes() {
        assert_eq!(Borough::from_code("M"), Some(Borough::Manhattan));
        assert_eq!(Borough::from_code("s"), Some(Borough::StatenIsland));
        assert_eq!(Borough::from_code("X"), None);
    }

    #[test]
    fn window_is_half_open() {
        let w = AnalysisWindow::whole_day(NaiveDate::from_ymd_opt(2024, 11, 3).unwrap());
        assert!(w.contains(dt(2024, 11, 3, 0)));
        assert!(w.contains(dt(2024, 11, 3, 23)));
        assert!(!w.contains(dt(2024, 11, 4, 0)));
    }

    #[test]
    fn event_overlap() {
        let event = EventRecord {
            name: "NYC Marathon".into(),
            start: dt(2024, 11, 3, 8),
            end: dt(2024, 11, 3, 14),
            route: vec![(40.60, -74.06), (40.75, -73.97)],
            borough: Borough::Manhattan,
        };
        let marathon_day = AnalysisWindow::whole_day(NaiveDate::from_ymd_opt(2024, 11, 3).unwrap());
        let week_before = marathon_day.shifted_days(-7);
        assert!(event.overlaps(&marathon_day));
        assert!(!event.overlaps(&week_before));
    }
}
