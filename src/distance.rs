use num_traits::Float;

/// Mean Earth radius in kilometres, used by the Haversine metric.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance metrics available to the clustering algorithms.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Straight-line distance. Suitable for projected or abstract coordinates.
    Euclidean,
    /// Great-circle distance in kilometres between (latitude, longitude)
    /// pairs given in degrees. The right choice for raw geographic points.
    Haversine,
}

impl DistanceMetric {
    pub(crate) fn calc_dist<T: Float>(&self, a: &[T], b: &[T]) -> T {
        match self {
            Self::Euclidean => euclidean_distance(a, b),
            Self::Haversine => haversine_distance(a, b),
        }
    }
}

pub(crate) fn get_dist_func<T: Float>(metric: &DistanceMetric) -> fn(&[T], &[T]) -> T {
    match metric {
        DistanceMetric::Euclidean => euclidean_distance,
        DistanceMetric::Haversine => haversine_distance,
    }
}

pub(crate) fn euclidean_distance<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .fold(T::zero(), std::ops::Add::add)
        .sqrt()
}

/// Haversine great-circle distance. Inputs are (lat, lon) in degrees, output
/// is kilometres.
pub(crate) fn haversine_distance<T: Float>(a: &[T], b: &[T]) -> T {
    let lat1 = a[0].to_radians();
    let lat2 = b[0].to_radians();
    let d_lat = (b[0] - a[0]).to_radians();
    let d_lon = (b[1] - a[1]).to_radians();

    let two = T::from(2.0).unwrap_or_else(|| T::one() + T::one());
    let h = (d_lat / two).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / two).sin().powi(2);
    let c = two * h.sqrt().asin();
    T::from(EARTH_RADIUS_KM).unwrap_or_else(T::one) * c
}
