//! Spatial-extent measures over cluster centroids.
//!
//! Used to quantify "spatial expansion" between an event window and its
//! baseline, e.g. arrests strung out along a marathon route versus a normal
//! day's compact hotspots.

use crate::distance::haversine_distance;

/// Kilometres per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.32;

/// How to reduce a set of cluster centroids to a single extent number.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpatialExtentMetric {
    /// Area of the convex hull of the centroids, in square kilometres.
    /// Zero for fewer than three centroids.
    ConvexHullArea,
    /// Greatest pairwise haversine distance between centroids, in
    /// kilometres. Zero for fewer than two centroids.
    MaxCentroidSeparation,
}

impl SpatialExtentMetric {
    /// Computes the extent of a set of (lat, lon) centroids.
    pub fn measure(&self, centroids: &[(f64, f64)]) -> f64 {
        match self {
            Self::ConvexHullArea => convex_hull_area_km2(centroids),
            Self::MaxCentroidSeparation => max_pairwise_km(centroids),
        }
    }
}

/// Equirectangular projection onto a local plane in kilometres. Accurate
/// enough at city scale, where the latitude band is narrow.
fn project_km(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mean_lat = points.iter().map(|p| p.0).sum::<f64>() / points.len() as f64;
    let lon_scale = KM_PER_DEGREE * mean_lat.to_radians().cos();
    points
        .iter()
        .map(|&(lat, lon)| (lon * lon_scale, lat * KM_PER_DEGREE))
        .collect()
}

fn max_pairwise_km(centroids: &[(f64, f64)]) -> f64 {
    let mut max = 0.0_f64;
    for (i, a) in centroids.iter().enumerate() {
        for b in centroids.iter().skip(i + 1) {
            let dist = haversine_distance(&[a.0, a.1], &[b.0, b.1]);
            if dist > max {
                max = dist;
            }
        }
    }
    max
}

fn convex_hull_area_km2(centroids: &[(f64, f64)]) -> f64 {
    if centroids.len() < 3 {
        return 0.0;
    }
    let hull = convex_hull(&project_km(centroids));
    shoelace_area(&hull)
}

/// Andrew's monotone chain. Returns the hull in counter-clockwise order.
fn convex_hull(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("invalid float"));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let cross = |o: (f64, f64), a: (f64, f64), b: (f64, f64)| -> f64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut lower: Vec<(f64, f64)> = Vec::new();
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f64, f64)> = Vec::new();
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn shoelace_area(polygon: &[(f64, f64)]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..polygon.len() {
        let (x1, y1) = polygon[i];
        let (x2, y2) = polygon[(i + 1) % polygon.len()];
        twice_area += x1 * y2 - x2 * y1;
    }
    (twice_area / 2.0).abs()
}
