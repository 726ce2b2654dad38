use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used by the haversine formula.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another coordinate in meters.
    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_m(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Haversine distance between two lat/lon pairs, in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * EARTH_RADIUS_M
}

/// Total along-path length of a coordinate sequence, in meters.
pub fn path_length_m(coords: &[Coordinate]) -> f64 {
    coords
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_identical_points() {
        assert_eq!(haversine_m(-23.5, -46.6, -23.5, -46.6), 0.0);
    }

    #[test]
    fn haversine_one_degree_longitude_at_equator() {
        // One degree of longitude at the equator is roughly 111.2 km.
        let d = haversine_m(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn path_length_sums_consecutive_legs() {
        let coords = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.0, 0.002),
        ];
        let total = path_length_m(&coords);
        let leg = haversine_m(0.0, 0.0, 0.0, 0.001);
        assert!((total - 2.0 * leg).abs() < 1e-6);
    }
}
