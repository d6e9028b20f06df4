//! Spatial and spatio-temporal density clustering with event/baseline
//! comparison statistics, built for the question "how do large public events
//! change the distribution and make-up of arrests around them?".
//!
//! Three clusterers share one data model:
//!  1. [`Dbscan`] — the classic fixed-radius density clustering, run per
//!     offense category over the full year to map the baseline hotspots;
//!  2. [`StDbscan`] — a spatio-temporal variant whose neighbourhood
//!     criterion is conjunctive (within `eps1` spatially AND `eps2`
//!     temporally), so it can separate a morning burst from an evening one
//!     at the same corner, or follow a crowd dispersing along a route; and
//!  3. [`Hdbscan`] — hierarchical density clustering that trades the `eps`
//!     choice for a persistence competition across all density levels, used
//!     to rank hotspots by confidence.
//!
//! On top of the clusterers, [`compare::compare`] turns a matched pair of
//! windows (event day versus an explicitly-selected control day) into a
//! [`ComparisonResult`]: percent change in arrests, percentage-point
//! composition shifts that sum to zero, cluster counts and a spatial-extent
//! measure over cluster centroids.
//!
//! # Examples
//! ```
//! use stclust::{Dbscan, DbscanParams, DistanceMetric};
//!
//! // Arrest positions as (lat, lon) pairs: two street corners and a stray.
//! let positions: Vec<Vec<f64>> = vec![
//!     vec![40.7549, -73.9840],
//!     vec![40.7552, -73.9838],
//!     vec![40.7547, -73.9843],
//!     vec![40.7610, -73.9800],
//!     vec![40.7612, -73.9797],
//!     vec![40.7608, -73.9803],
//!     vec![40.8300, -73.9000],
//! ];
//! let params = DbscanParams::builder()
//!     .eps(0.25) // kilometres
//!     .min_samples(2)
//!     .dist_metric(DistanceMetric::Haversine)
//!     .build()
//!     .unwrap();
//! let assignment = Dbscan::new(&positions, params).cluster().unwrap();
//! assert_eq!(assignment.cluster_count(), 2);
//! assert_eq!(assignment.labels()[6], -1); // noise
//! ```
//!
//! # References
//! * [Ester, M. et al. A density-based algorithm for discovering clusters in large spatial databases with noise.](https://dl.acm.org/doi/10.5555/3001460.3001507)
//! * [Birant, D.; Kut, A. ST-DBSCAN: An algorithm for clustering spatial-temporal data.](https://www.sciencedirect.com/science/article/pii/S0169023X06000218)
//! * [Campello, R.J.G.B.; Moulavi, D.; Sander, J. Density-based clustering based on hierarchical density estimates.](https://link.springer.com/chapter/10.1007/978-3-642-37456-2_14)

pub use crate::assignment::{ClusterAssignment, NOISE};
pub use crate::compare::{compare, BaselineRule, ComparisonResult, WindowSnapshot};
pub use crate::dbscan::Dbscan;
pub use crate::distance::DistanceMetric;
pub use crate::error::{Error, Result};
pub use crate::geometry::SpatialExtentMetric;
pub use crate::hdbscan::{Hdbscan, HdbscanResult};
pub use crate::neighbourhood::NnAlgorithm;
pub use crate::params::{
    DbscanParams, DbscanParamsBuilder, HdbscanParams, HdbscanParamsBuilder, StDbscanParams,
    StDbscanParamsBuilder,
};
pub use crate::records::{
    AnalysisWindow, ArrestRecord, Borough, EventRecord, OffenseCategory,
};
pub use crate::stdbscan::{ClusterSummary, StClustering, StDbscan, StPoint};
pub use crate::summary::ArrestProfile;

mod assignment;
mod centers;
pub mod compare;
mod dbscan;
mod distance;
mod error;
mod geometry;
mod hdbscan;
pub mod loader;
mod neighbourhood;
mod params;
mod records;
pub mod runner;
mod stdbscan;
mod summary;
mod union_find;
mod validation;

pub use crate::centers::cluster_centroids;
