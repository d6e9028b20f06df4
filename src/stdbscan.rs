//! Spatio-temporal DBSCAN.
//!
//! Extends DBSCAN by treating temporal proximity as a second, independently
//! thresholded neighbourhood condition: two points are neighbours only if
//! they are within `eps1` spatially *and* within `eps2` temporally. The
//! conjunctive criterion (rather than a combined metric) is what lets the
//! algorithm find clusters that are spatially diffuse but temporally tight,
//! such as a crowd dispersing along a parade route over a few hours, which
//! plain DBSCAN would miss or over-merge.

use crate::assignment::{ClusterAssignment, NOISE};
use crate::dbscan::{expand_cluster, UNCLASSIFIED};
use crate::error::Result;
use crate::neighbourhood::RegionQuery;
use crate::params::StDbscanParams;
use crate::records::ArrestRecord;
use crate::validation::validate_points;
use chrono::{DateTime, NaiveDateTime};

/// One input point: a position and a timestamp. Timestamps are carried as
/// seconds on a continuous scale, never wrapped per day, so an event running
/// across midnight cannot split a cluster.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub epoch_seconds: i64,
}

impl StPoint {
    pub fn new(latitude: f64, longitude: f64, at: NaiveDateTime) -> Self {
        StPoint {
            latitude,
            longitude,
            epoch_seconds: at.and_utc().timestamp(),
        }
    }
}

impl From<&ArrestRecord> for StPoint {
    fn from(record: &ArrestRecord) -> Self {
        StPoint::new(record.latitude, record.longitude, record.occurred_at)
    }
}

/// Per-cluster summary derived for the comparison engine: how big the
/// cluster is, where its centre of mass sits and the time span it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub label: i32,
    pub size: usize,
    /// (lat, lon) centroid of the cluster's points.
    pub centroid: (f64, f64),
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
}

/// The full output of an ST-DBSCAN run.
#[derive(Debug, Clone, PartialEq)]
pub struct StClustering {
    pub assignment: ClusterAssignment,
    /// One summary per cluster, ordered by label.
    pub summaries: Vec<ClusterSummary>,
}

/// The ST-DBSCAN clustering algorithm.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use stclust::{DistanceMetric, StDbscan, StDbscanParams, StPoint};
///
/// let base = NaiveDate::from_ymd_opt(2024, 11, 3)
///     .unwrap()
///     .and_hms_opt(9, 0, 0)
///     .unwrap();
/// let points: Vec<StPoint> = (0..4)
///     .map(|i| StPoint::new(40.75, -73.98 + i as f64 * 1e-4, base + chrono::Duration::minutes(i * 10)))
///     .collect();
/// let params = StDbscanParams::builder()
///     .eps1(0.5)
///     .eps2_minutes(30.0)
///     .min_samples(2)
///     .dist_metric(DistanceMetric::Haversine)
///     .build()
///     .unwrap();
/// let result = StDbscan::new(&points, params).cluster().unwrap();
/// assert_eq!(result.assignment.cluster_count(), 1);
/// assert_eq!(result.summaries[0].size, 4);
/// ```
pub struct StDbscan<'a> {
    points: &'a [StPoint],
    params: StDbscanParams,
}

impl<'a> StDbscan<'a> {
    pub fn new(points: &'a [StPoint], params: StDbscanParams) -> Self {
        StDbscan { points, params }
    }

    /// Runs the clustering. As with the spatial variant, degenerate input
    /// yields an all-noise result rather than an error.
    pub fn cluster(&self) -> Result<StClustering> {
        let spatial: Vec<Vec<f64>> = self
            .points
            .iter()
            .map(|p| vec![p.latitude, p.longitude])
            .collect();
        validate_points(&spatial, self.params.dist_metric)?;

        if self.points.len() < self.params.min_samples {
            return Ok(StClustering {
                assignment: ClusterAssignment::all_noise(self.points.len()),
                summaries: Vec::new(),
            });
        }

        let eps2_seconds = self.params.eps2_minutes * 60.0;
        let query = RegionQuery::new(&spatial, self.params.dist_metric, &self.params.nn_algo);
        let neighbours_of = |idx: usize| -> Vec<usize> {
            let t = self.points[idx].epoch_seconds;
            query
                .neighbours_within(idx, self.params.eps1)
                .into_iter()
                .filter(|&n| (self.points[n].epoch_seconds - t).abs() as f64 <= eps2_seconds)
                .collect()
        };

        let mut labels = vec![UNCLASSIFIED; self.points.len()];
        let mut visited = vec![false; self.points.len()];
        let mut cluster_id = 0;

        for point_idx in 0..self.points.len() {
            if visited[point_idx] {
                continue;
            }
            visited[point_idx] = true;

            let neighbours = neighbours_of(point_idx);
            if neighbours.len() < self.params.min_samples {
                labels[point_idx] = NOISE;
                continue;
            }

            expand_cluster(
                &neighbours_of,
                self.params.min_samples,
                point_idx,
                &neighbours,
                &mut labels,
                &mut visited,
                cluster_id,
            );
            cluster_id += 1;
        }

        let summaries = self.summarise(&labels, cluster_id);
        Ok(StClustering {
            assignment: ClusterAssignment::new(labels),
            summaries,
        })
    }

    fn summarise(&self, labels: &[i32], n_clusters: i32) -> Vec<ClusterSummary> {
        (0..n_clusters)
            .map(|label| {
                let members: Vec<&StPoint> = labels
                    .iter()
                    .zip(self.points.iter())
                    .filter(|(&l, _)| l == label)
                    .map(|(_, p)| p)
                    .collect();
                let size = members.len();
                let lat = members.iter().map(|p| p.latitude).sum::<f64>() / size as f64;
                let lon = members.iter().map(|p| p.longitude).sum::<f64>() / size as f64;
                let first = members.iter().map(|p| p.epoch_seconds).min().unwrap_or(0);
                let last = members.iter().map(|p| p.epoch_seconds).max().unwrap_or(0);
                ClusterSummary {
                    label,
                    size,
                    centroid: (lat, lon),
                    first_seen: naive_from_epoch(first),
                    last_seen: naive_from_epoch(last),
                }
            })
            .collect()
    }
}

fn naive_from_epoch(seconds: i64) -> NaiveDateTime {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn params(eps1: f64, eps2_minutes: f64, min_samples: usize) -> StDbscanParams {
        StDbscanParams::builder()
            .eps1(eps1)
            .eps2_minutes(eps2_minutes)
            .min_samples(min_samples)
            .dist_metric(DistanceMetric::Haversine)
            .build()
            .unwrap()
    }

    #[test]
    fn splits_spatially_coincident_but_temporally_distant_points() {
        // Same corner, morning and evening. A 60 minute eps2 keeps the two
        // bursts apart even though plain DBSCAN would merge them.
        let mut points = Vec::new();
        for i in 0..4 {
            points.push(StPoint::new(40.75, -73.98, at(3, 9, i * 10)));
        }
        for i in 0..4 {
            points.push(StPoint::new(40.75, -73.98, at(3, 20, i * 10)));
        }
        let result = StDbscan::new(&points, params(0.2, 60.0, 3)).cluster().unwrap();
        assert_eq!(result.assignment.cluster_count(), 2);

        let spans: Vec<_> = result
            .summaries
            .iter()
            .map(|s| (s.first_seen, s.last_seen))
            .collect();
        assert!(spans.contains(&(at(3, 9, 0), at(3, 9, 30))));
        assert!(spans.contains(&(at(3, 20, 0), at(3, 20, 30))));
    }

    #[test]
    fn midnight_spanning_burst_stays_one_cluster() {
        // 23:30 to 00:30 across midnight; a per-day wrap would split this.
        let points = vec![
            StPoint::new(40.70, -73.99, at(3, 23, 30)),
            StPoint::new(40.70, -73.99, at(3, 23, 50)),
            StPoint::new(40.70, -73.99, at(4, 0, 10)),
            StPoint::new(40.70, -73.99, at(4, 0, 30)),
        ];
        let result = StDbscan::new(&points, params(0.2, 30.0, 2)).cluster().unwrap();
        assert_eq!(result.assignment.cluster_count(), 1);
        assert_eq!(result.summaries[0].size, 4);
    }

    #[test]
    fn degenerate_input_is_all_noise() {
        let points = vec![StPoint::new(40.7, -74.0, at(3, 12, 0))];
        let result = StDbscan::new(&points, params(0.2, 60.0, 4)).cluster().unwrap();
        assert_eq!(result.assignment.noise_count(), 1);
        assert!(result.summaries.is_empty());
    }

    #[test]
    fn summary_centroid_sits_between_members() {
        let points = vec![
            StPoint::new(40.70, -74.00, at(3, 12, 0)),
            StPoint::new(40.72, -74.00, at(3, 12, 10)),
            StPoint::new(40.74, -74.00, at(3, 12, 20)),
        ];
        let result = StDbscan::new(&points, params(3.0, 60.0, 2)).cluster().unwrap();
        assert_eq!(result.summaries.len(), 1);
        let (lat, lon) = result.summaries[0].centroid;
        assert!((lat - 40.72).abs() < 1e-9);
        assert!((lon + 74.00).abs() < 1e-9);
    }
}
