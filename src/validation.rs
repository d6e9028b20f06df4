use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use num_traits::Float;

/// Checks the structural invariants the clusterers rely on: consistent
/// dimensionality, finite coordinates and, for the Haversine metric, sane
/// latitude/longitude ranges. An empty dataset is valid; degenerate inputs
/// are handled by the algorithms, not here.
pub(crate) fn validate_points<T: Float>(data: &[Vec<T>], metric: DistanceMetric) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let dims_0th = data[0].len();
    for (n, datapoint) in data.iter().enumerate() {
        if datapoint.len() != dims_0th {
            return Err(Error::DimensionMismatch(format!(
                "0th point has {dims_0th} dimensions, but point {n} has {}",
                datapoint.len()
            )));
        }
        for element in datapoint {
            if !element.is_finite() {
                return Err(Error::NonFiniteCoordinate(format!(
                    "point {n} contains a non-finite element"
                )));
            }
        }
    }
    if metric == DistanceMetric::Haversine {
        validate_geographic(data)?;
    }
    Ok(())
}

fn validate_geographic<T: Float>(data: &[Vec<T>]) -> Result<()> {
    if data[0].len() != 2 {
        return Err(Error::DimensionMismatch(format!(
            "geographic coordinates must be (lat, lon) pairs, not {}-dimensional",
            data[0].len()
        )));
    }
    let lat_bound = T::from(90.0).expect("constant fits any float");
    let lon_bound = T::from(180.0).expect("constant fits any float");
    for (n, datapoint) in data.iter().enumerate() {
        let (lat, lon) = (datapoint[0], datapoint[1]);
        if lat < -lat_bound || lat > lat_bound {
            return Err(Error::NonFiniteCoordinate(format!(
                "point {n}: latitude must be in range -90 to 90"
            )));
        }
        if lon < -lon_bound || lon > lon_bound {
            return Err(Error::NonFiniteCoordinate(format!(
                "point {n}: longitude must be in range -180 to 180"
            )));
        }
    }
    Ok(())
}
