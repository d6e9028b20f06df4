//! The comparative statistics engine.
//!
//! Given a matched pair of windows — an event window and a control/baseline
//! window — computes the arrest-count delta, the percentage-point shift in
//! offense composition, the change in cluster counts and a spatial-extent
//! comparison. Every output is a pure function of the two snapshots; nothing
//! is persisted.

use crate::assignment::ClusterAssignment;
use crate::centers::cluster_centroids;
use crate::error::{Error, Result};
use crate::geometry::SpatialExtentMetric;
use crate::records::{AnalysisWindow, ArrestRecord, EventRecord, OffenseCategory};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// How the control window for a comparison is chosen. Always an explicit,
/// inspectable input to the comparison — never inferred implicitly.
///
/// The rule matches day-of-week by stepping in whole weeks from the event
/// window, preferring a candidate in the same month (to control for seasonal
/// variation) and skipping any candidate a permitted event overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRule {
    /// Try to stay within the event's calendar month before giving up and
    /// accepting a neighbouring month.
    pub prefer_same_month: bool,
    /// How many weeks away from the event window to search, in each
    /// direction.
    pub max_candidate_weeks: u32,
}

impl Default for BaselineRule {
    fn default() -> Self {
        BaselineRule {
            prefer_same_month: true,
            max_candidate_weeks: 8,
        }
    }
}

impl BaselineRule {
    /// Selects a control window for `event_window`: the nearest same-weekday
    /// window free of any permitted event, searched backwards first. Returns
    /// `None` when every candidate within range is event-laden.
    pub fn select(
        &self,
        event_window: AnalysisWindow,
        events: &[EventRecord],
    ) -> Option<AnalysisWindow> {
        let candidates = self.candidates(event_window);
        let event_free =
            |w: &AnalysisWindow| !events.iter().any(|e| e.overlaps(w));

        if self.prefer_same_month {
            let month = event_window.start.format("%Y-%m").to_string();
            if let Some(window) = candidates
                .iter()
                .find(|w| w.start.format("%Y-%m").to_string() == month && event_free(w))
            {
                return Some(*window);
            }
        }
        candidates.into_iter().find(|w| event_free(w))
    }

    fn candidates(&self, event_window: AnalysisWindow) -> Vec<AnalysisWindow> {
        // Whole-week shifts preserve the day of week; backwards offsets come
        // first at every distance.
        (1..=self.max_candidate_weeks as i64)
            .flat_map(|weeks| {
                [
                    event_window.shifted_days(-7 * weeks),
                    event_window.shifted_days(7 * weeks),
                ]
            })
            .collect()
    }
}

/// One side of a comparison: a window, the records that fall inside it and,
/// optionally, a clustering of exactly those records.
pub struct WindowSnapshot<'a> {
    window: AnalysisWindow,
    records: Vec<&'a ArrestRecord>,
    assignment: Option<&'a ClusterAssignment>,
}

impl<'a> WindowSnapshot<'a> {
    /// Builds a snapshot by selecting `records` down to the window.
    pub fn new(window: AnalysisWindow, records: &'a [ArrestRecord]) -> Self {
        WindowSnapshot {
            window,
            records: window.select(records),
            assignment: None,
        }
    }

    /// Attaches a clustering of this snapshot's records. The assignment must
    /// cover exactly the records selected by the window, in the same order.
    pub fn with_assignment(mut self, assignment: &'a ClusterAssignment) -> Result<Self> {
        if assignment.len() != self.records.len() {
            return Err(Error::DimensionMismatch(format!(
                "assignment covers {} points but the window holds {} records",
                assignment.len(),
                self.records.len()
            )));
        }
        self.assignment = Some(assignment);
        Ok(self)
    }

    pub fn window(&self) -> AnalysisWindow {
        self.window
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn category_counts(&self) -> BTreeMap<OffenseCategory, usize> {
        let mut counts: BTreeMap<OffenseCategory, usize> =
            OffenseCategory::iter().map(|c| (c, 0)).collect();
        for record in &self.records {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        counts
    }

    fn cluster_centroid_pairs(&self) -> Result<Option<Vec<(f64, f64)>>> {
        let Some(assignment) = self.assignment else {
            return Ok(None);
        };
        let positions: Vec<Vec<f64>> = self.records.iter().map(|r| r.position()).collect();
        let centroids = cluster_centroids(&positions, assignment.labels())?;
        Ok(Some(centroids.into_iter().map(|c| (c[0], c[1])).collect()))
    }
}

/// The engine's complete output for one event/baseline pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub event_name: String,
    pub baseline_window: AnalysisWindow,
    pub event_window: AnalysisWindow,
    pub arrest_count_baseline: usize,
    pub arrest_count_event: usize,
    /// Relative change in arrest counts, in percent. Use
    /// [`ComparisonResult::percent_change_rounded`] for reporting.
    pub percent_change: f64,
    /// Percentage-point shift of each category's share of the total, event
    /// minus baseline. Sums to zero across categories.
    pub pp_shifts: BTreeMap<OffenseCategory, f64>,
    pub cluster_count_baseline: Option<usize>,
    pub cluster_count_event: Option<usize>,
    pub spatial_extent_baseline: Option<f64>,
    pub spatial_extent_event: Option<f64>,
}

impl ComparisonResult {
    /// The percent change rounded to one decimal place, for reporting.
    pub fn percent_change_rounded(&self) -> f64 {
        (self.percent_change * 10.0).round() / 10.0
    }
}

/// Compares an event window against its baseline.
///
/// Fails with [`Error::DivisionUndefined`] when either window holds no
/// arrests: a relative change against a zero baseline is meaningless, and an
/// empty event window has no composition to shift. Both are surfaced rather
/// than coerced, keeping the zero-sum invariant on the shifts of every
/// result that is returned.
pub fn compare(
    event_name: &str,
    baseline: &WindowSnapshot<'_>,
    event: &WindowSnapshot<'_>,
    extent_metric: SpatialExtentMetric,
) -> Result<ComparisonResult> {
    let baseline_count = baseline.record_count();
    let event_count = event.record_count();
    if baseline_count == 0 {
        return Err(Error::DivisionUndefined {
            context: format!(
                "{event_name} baseline window {:?}",
                baseline.window.start.date()
            ),
        });
    }
    if event_count == 0 {
        return Err(Error::DivisionUndefined {
            context: format!("{event_name} event window {:?}", event.window.start.date()),
        });
    }

    let percent_change =
        (event_count as f64 - baseline_count as f64) / baseline_count as f64 * 100.0;

    let baseline_counts = baseline.category_counts();
    let event_counts = event.category_counts();
    let pp_shifts = OffenseCategory::iter()
        .map(|category| {
            let baseline_share = baseline_counts[&category] as f64 / baseline_count as f64;
            let event_share = event_counts[&category] as f64 / event_count as f64;
            (category, (event_share - baseline_share) * 100.0)
        })
        .collect();

    let spatial_extent_baseline = baseline
        .cluster_centroid_pairs()?
        .map(|centroids| extent_metric.measure(&centroids));
    let spatial_extent_event = event
        .cluster_centroid_pairs()?
        .map(|centroids| extent_metric.measure(&centroids));

    Ok(ComparisonResult {
        event_name: event_name.to_string(),
        baseline_window: baseline.window,
        event_window: event.window,
        arrest_count_baseline: baseline_count,
        arrest_count_event: event_count,
        percent_change,
        pp_shifts,
        cluster_count_baseline: baseline.assignment.map(ClusterAssignment::cluster_count),
        cluster_count_event: event.assignment.map(ClusterAssignment::cluster_count),
        spatial_extent_baseline,
        spatial_extent_event,
    })
}
