//! Validated parameter sets for the three clustering algorithms.
//!
//! Every parameter has documented units and a valid range, enforced when the
//! builder's `build` is called. Out-of-range values are rejected with
//! [`Error::InvalidParameter`] rather than silently clamped, so a
//! miscalibrated run can never start.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::neighbourhood::NnAlgorithm;

const EPS_DEFAULT_KM: f64 = 0.5;
const MIN_SAMPLES_DEFAULT: usize = 5;
const MIN_CLUSTER_SIZE_DEFAULT: usize = 5;
const MAX_CLUSTER_SIZE_DEFAULT: usize = usize::MAX;
const TEMPORAL_EPS_DEFAULT_MINUTES: f64 = 60.0;

const MIN_SAMPLES_MINIMUM: usize = 1;
const MIN_CLUSTER_SIZE_MINIMUM: usize = 2;

fn require_positive_finite(value: f64, name: &'static str) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::InvalidParameter {
            name,
            message: "must be finite",
        });
    }
    if value <= 0.0 {
        return Err(Error::InvalidParameter {
            name,
            message: "must be positive",
        });
    }
    Ok(value)
}

fn require_at_least(value: usize, minimum: usize, name: &'static str) -> Result<usize> {
    if value < minimum {
        return Err(Error::InvalidParameter {
            name,
            message: match minimum {
                1 => "must be at least 1",
                _ => "must be at least 2",
            },
        });
    }
    Ok(value)
}

/// Parameters for plain spatial DBSCAN.
#[derive(Debug, Clone, PartialEq)]
pub struct DbscanParams {
    /// Neighbourhood radius, in the units of the distance metric
    /// (kilometres for Haversine).
    pub(crate) eps: f64,
    /// Minimum neighbours (self included) for a point to be core.
    pub(crate) min_samples: usize,
    pub(crate) dist_metric: DistanceMetric,
    pub(crate) nn_algo: NnAlgorithm,
}

/// Builder for [`DbscanParams`].
#[derive(Debug, Clone, Default)]
pub struct DbscanParamsBuilder {
    eps: Option<f64>,
    min_samples: Option<usize>,
    dist_metric: Option<DistanceMetric>,
    nn_algo: Option<NnAlgorithm>,
}

impl DbscanParams {
    pub fn builder() -> DbscanParamsBuilder {
        DbscanParamsBuilder::default()
    }

    pub(crate) fn default_params() -> Self {
        Self::builder().build().expect("defaults are in range")
    }
}

impl DbscanParamsBuilder {
    /// Sets the neighbourhood radius `eps`. Units follow the distance metric:
    /// kilometres for Haversine, coordinate units for Euclidean. Must be a
    /// positive finite number.
    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = Some(eps);
        self
    }

    /// Sets the minimum number of neighbours (including the point itself)
    /// required for a core point. Must be at least 1. Defaults to 5.
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = Some(min_samples);
        self
    }

    /// Sets the distance metric. Defaults to Haversine, since the expected
    /// inputs are raw geographic coordinates.
    pub fn dist_metric(mut self, dist_metric: DistanceMetric) -> Self {
        self.dist_metric = Some(dist_metric);
        self
    }

    /// Sets the region-query backend. Defaults to `Auto`, which picks
    /// brute-force for small inputs and a k-d tree otherwise.
    pub fn nn_algorithm(mut self, nn_algo: NnAlgorithm) -> Self {
        self.nn_algo = Some(nn_algo);
        self
    }

    pub fn build(self) -> Result<DbscanParams> {
        Ok(DbscanParams {
            eps: require_positive_finite(self.eps.unwrap_or(EPS_DEFAULT_KM), "eps")?,
            min_samples: require_at_least(
                self.min_samples.unwrap_or(MIN_SAMPLES_DEFAULT),
                MIN_SAMPLES_MINIMUM,
                "min_samples",
            )?,
            dist_metric: self.dist_metric.unwrap_or(DistanceMetric::Haversine),
            nn_algo: self.nn_algo.unwrap_or(NnAlgorithm::Auto),
        })
    }
}

/// Parameters for spatio-temporal DBSCAN.
///
/// The two thresholds are independent: a pair of points are neighbours only
/// if they are within `eps1` spatially *and* within `eps2` temporally.
#[derive(Debug, Clone, PartialEq)]
pub struct StDbscanParams {
    /// Spatial neighbourhood radius, in the units of the distance metric.
    pub(crate) eps1: f64,
    /// Temporal neighbourhood radius, in minutes.
    pub(crate) eps2_minutes: f64,
    pub(crate) min_samples: usize,
    pub(crate) dist_metric: DistanceMetric,
    pub(crate) nn_algo: NnAlgorithm,
}

/// Builder for [`StDbscanParams`].
#[derive(Debug, Clone, Default)]
pub struct StDbscanParamsBuilder {
    eps1: Option<f64>,
    eps2_minutes: Option<f64>,
    min_samples: Option<usize>,
    dist_metric: Option<DistanceMetric>,
    nn_algo: Option<NnAlgorithm>,
}

impl StDbscanParams {
    pub fn builder() -> StDbscanParamsBuilder {
        StDbscanParamsBuilder::default()
    }
}

impl StDbscanParamsBuilder {
    /// Sets the spatial radius `eps1`, in the distance metric's units. Must
    /// be positive and finite.
    pub fn eps1(mut self, eps1: f64) -> Self {
        self.eps1 = Some(eps1);
        self
    }

    /// Sets the temporal radius `eps2`, in minutes. Must be positive and
    /// finite. Setting it wider than the data's whole time span makes the
    /// temporal constraint vacuous and reduces the algorithm to plain DBSCAN.
    pub fn eps2_minutes(mut self, eps2_minutes: f64) -> Self {
        self.eps2_minutes = Some(eps2_minutes);
        self
    }

    /// Minimum conjunctive neighbours (self included) for a core point.
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = Some(min_samples);
        self
    }

    pub fn dist_metric(mut self, dist_metric: DistanceMetric) -> Self {
        self.dist_metric = Some(dist_metric);
        self
    }

    pub fn nn_algorithm(mut self, nn_algo: NnAlgorithm) -> Self {
        self.nn_algo = Some(nn_algo);
        self
    }

    pub fn build(self) -> Result<StDbscanParams> {
        Ok(StDbscanParams {
            eps1: require_positive_finite(self.eps1.unwrap_or(EPS_DEFAULT_KM), "eps1")?,
            eps2_minutes: require_positive_finite(
                self.eps2_minutes.unwrap_or(TEMPORAL_EPS_DEFAULT_MINUTES),
                "eps2",
            )?,
            min_samples: require_at_least(
                self.min_samples.unwrap_or(MIN_SAMPLES_DEFAULT),
                MIN_SAMPLES_MINIMUM,
                "min_samples",
            )?,
            dist_metric: self.dist_metric.unwrap_or(DistanceMetric::Haversine),
            nn_algo: self.nn_algo.unwrap_or(NnAlgorithm::Auto),
        })
    }
}

/// Parameters for hierarchical DBSCAN. No fixed `eps`; cluster extraction is
/// driven by persistence across all density levels.
#[derive(Debug, Clone, PartialEq)]
pub struct HdbscanParams {
    /// Smallest group of points that can count as a cluster.
    pub(crate) min_cluster_size: usize,
    /// k for the core-distance calculation (distance to the k-th neighbour).
    pub(crate) min_samples: usize,
    /// Clusters larger than this are never selected. Unbounded by default.
    pub(crate) max_cluster_size: usize,
    pub(crate) dist_metric: DistanceMetric,
    pub(crate) nn_algo: NnAlgorithm,
}

/// Builder for [`HdbscanParams`].
#[derive(Debug, Clone, Default)]
pub struct HdbscanParamsBuilder {
    min_cluster_size: Option<usize>,
    min_samples: Option<usize>,
    max_cluster_size: Option<usize>,
    dist_metric: Option<DistanceMetric>,
    nn_algo: Option<NnAlgorithm>,
}

impl HdbscanParams {
    pub fn builder() -> HdbscanParamsBuilder {
        HdbscanParamsBuilder::default()
    }

    pub(crate) fn default_params() -> Self {
        Self::builder().build().expect("defaults are in range")
    }
}

impl HdbscanParamsBuilder {
    /// Sets the minimum cluster size. The main lever for tuning results.
    /// Must be at least 2. Defaults to 5.
    pub fn min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = Some(min_cluster_size);
        self
    }

    /// Sets min samples for the core-distance calculation. Defaults to the
    /// minimum cluster size.
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = Some(min_samples);
        self
    }

    /// Caps the size of any selected cluster. Must be at least the minimum
    /// cluster size.
    pub fn max_cluster_size(mut self, max_cluster_size: usize) -> Self {
        self.max_cluster_size = Some(max_cluster_size);
        self
    }

    pub fn dist_metric(mut self, dist_metric: DistanceMetric) -> Self {
        self.dist_metric = Some(dist_metric);
        self
    }

    pub fn nn_algorithm(mut self, nn_algo: NnAlgorithm) -> Self {
        self.nn_algo = Some(nn_algo);
        self
    }

    pub fn build(self) -> Result<HdbscanParams> {
        let min_cluster_size = require_at_least(
            self.min_cluster_size.unwrap_or(MIN_CLUSTER_SIZE_DEFAULT),
            MIN_CLUSTER_SIZE_MINIMUM,
            "min_cluster_size",
        )?;
        let max_cluster_size = self.max_cluster_size.unwrap_or(MAX_CLUSTER_SIZE_DEFAULT);
        if max_cluster_size < min_cluster_size {
            return Err(Error::InvalidParameter {
                name: "max_cluster_size",
                message: "must not be smaller than min_cluster_size",
            });
        }
        Ok(HdbscanParams {
            min_cluster_size,
            min_samples: require_at_least(
                self.min_samples.unwrap_or(min_cluster_size),
                MIN_SAMPLES_MINIMUM,
                "min_samples",
            )?,
            max_cluster_size,
            dist_metric: self.dist_metric.unwrap_or(DistanceMetric::Haversine),
            nn_algo: self.nn_algo.unwrap_or(NnAlgorithm::Auto),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        assert!(DbscanParams::builder().build().is_ok());
        assert!(StDbscanParams::builder().build().is_ok());
        assert!(HdbscanParams::builder().build().is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            DbscanParams::builder().eps(0.0).build(),
            Err(Error::InvalidParameter { name: "eps", .. })
        ));
        assert!(matches!(
            DbscanParams::builder().eps(f64::NAN).build(),
            Err(Error::InvalidParameter { name: "eps", .. })
        ));
        assert!(matches!(
            DbscanParams::builder().min_samples(0).build(),
            Err(Error::InvalidParameter {
                name: "min_samples",
                ..
            })
        ));
        assert!(matches!(
            StDbscanParams::builder().eps2_minutes(-5.0).build(),
            Err(Error::InvalidParameter { name: "eps2", .. })
        ));
        assert!(matches!(
            HdbscanParams::builder().min_cluster_size(1).build(),
            Err(Error::InvalidParameter {
                name: "min_cluster_size",
                ..
            })
        ));
        assert!(matches!(
            HdbscanParams::builder()
                .min_cluster_size(10)
                .max_cluster_size(5)
                .build(),
            Err(Error::InvalidParameter {
                name: "max_cluster_size",
                ..
            })
        ));
    }

    #[test]
    fn min_samples_defaults_to_min_cluster_size() {
        let params = HdbscanParams::builder().min_cluster_size(8).build().unwrap();
        assert_eq!(params.min_samples, 8);
    }
}
