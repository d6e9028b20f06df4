//! Headline descriptive statistics for a set of arrests: the counts the
//! reporting layer tabulates for any window before it ever reaches for a
//! clusterer.

use crate::records::{ArrestRecord, Borough, OffenseCategory};
use chrono::{Datelike, Timelike};
use std::collections::BTreeMap;

/// Count breakdowns of a record slice. All fields derive from the records
/// alone; profiles for different windows can be computed independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrestProfile {
    pub total: usize,
    pub by_category: BTreeMap<OffenseCategory, usize>,
    pub by_borough: BTreeMap<Borough, usize>,
    /// Arrests per hour of day, index 0-23.
    pub by_hour: [usize; 24],
    /// Arrests per month, index 0 = January.
    pub by_month: [usize; 12],
}

impl ArrestProfile {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ArrestRecord>,
    {
        let mut profile = ArrestProfile {
            total: 0,
            by_category: BTreeMap::new(),
            by_borough: BTreeMap::new(),
            by_hour: [0; 24],
            by_month: [0; 12],
        };
        for record in records {
            profile.total += 1;
            *profile.by_category.entry(record.category).or_insert(0) += 1;
            *profile.by_borough.entry(record.borough).or_insert(0) += 1;
            profile.by_hour[record.occurred_at.hour() as usize] += 1;
            profile.by_month[record.occurred_at.month0() as usize] += 1;
        }
        profile
    }

    /// The most frequent offense category, if any records exist.
    pub fn top_category(&self) -> Option<OffenseCategory> {
        self.by_category
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(&category, _)| category)
    }

    /// The hour of day with the most arrests.
    pub fn peak_hour(&self) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        self.by_hour
            .iter()
            .enumerate()
            .max_by_key(|(_, &count)| count)
            .map(|(hour, _)| hour as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(month: u32, hour: u32, category: OffenseCategory, borough: Borough) -> ArrestRecord {
        ArrestRecord {
            occurred_at: NaiveDate::from_ymd_opt(2024, month, 15)
                .unwrap()
                .and_hms_opt(hour, 30, 0)
                .unwrap(),
            latitude: 40.7,
            longitude: -74.0,
            category,
            borough,
        }
    }

    #[test]
    fn profile_counts_every_dimension() {
        let records = vec![
            record(1, 9, OffenseCategory::Robbery, Borough::Manhattan),
            record(1, 21, OffenseCategory::Robbery, Borough::Brooklyn),
            record(6, 21, OffenseCategory::Assault, Borough::Manhattan),
        ];
        let profile = ArrestProfile::from_records(&records);
        assert_eq!(profile.total, 3);
        assert_eq!(profile.by_category[&OffenseCategory::Robbery], 2);
        assert_eq!(profile.by_borough[&Borough::Manhattan], 2);
        assert_eq!(profile.by_hour[21], 2);
        assert_eq!(profile.by_month[0], 2);
        assert_eq!(profile.by_month[5], 1);
        assert_eq!(profile.top_category(), Some(OffenseCategory::Robbery));
        assert_eq!(profile.peak_hour(), Some(21));
    }

    #[test]
    fn empty_profile_has_no_top_category() {
        let profile = ArrestProfile::from_records(std::iter::empty());
        assert_eq!(profile.total, 0);
        assert_eq!(profile.top_category(), None);
        assert_eq!(profile.peak_hour(), None);
    }
}
