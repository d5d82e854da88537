//! Great-circle navigation helpers in nautical miles and degrees.
use serde::{Deserialize, Serialize};

/// Mean Earth radius in nautical miles
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// A geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another position in nautical miles (Haversine)
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        EARTH_RADIUS_NM * self.central_angle_to(other)
    }

    /// Initial true bearing towards another position, rounded to whole degrees in `0..360`
    pub fn bearing_to(&self, other: &LatLng) -> i32 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let y = delta_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

        let bearing = y.atan2(x).to_degrees();
        normalize_degrees((bearing + 360.0).round() as i32)
    }

    /// Position reached after flying `distance_nm` from here along the great circle towards `end`.
    ///
    /// Distances beyond the end point extrapolate along the same great circle; callers clamp.
    pub fn interpolate_towards(&self, end: &LatLng, distance_nm: f64) -> LatLng {
        let delta = self.central_angle_to(end);
        if delta == 0.0 {
            return *self;
        }

        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();
        let lat2 = end.lat.to_radians();
        let lon2 = end.lon.to_radians();

        let fraction = distance_nm / (EARTH_RADIUS_NM * delta);
        let a = ((1.0 - fraction) * delta).sin() / delta.sin();
        let b = (fraction * delta).sin() / delta.sin();

        let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
        let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
        let z = a * lat1.sin() + b * lat2.sin();

        let lat = z.atan2((x * x + y * y).sqrt());
        let lon = y.atan2(x);

        LatLng::new(lat.to_degrees(), lon.to_degrees())
    }

    /// Whether this position lies behind an aircraft at `from` flying `track_deg`
    /// (more than 90 degrees off its track)
    pub fn is_behind(&self, from: &LatLng, track_deg: i32) -> bool {
        let bearing_to_point = from.bearing_to(self);
        angle_difference(bearing_to_point, track_deg).abs() > 90
    }

    fn central_angle_to(&self, other: &LatLng) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        2.0 * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Reported aircraft state, replaced wholesale on every refresh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftPosition {
    pub position: LatLng,
    pub altitude_ft: i32,
    pub groundspeed_kts: i32,
    pub track_deg: i32,
}

/// Signed shortest angle from `to` to `from` in degrees, in `-180..180`
pub fn angle_difference(from: i32, to: i32) -> i32 {
    (from - to + 540).rem_euclid(360) - 180
}

/// Wrap any integer heading into `0..360`
pub fn normalize_degrees(deg: i32) -> i32 {
    deg.rem_euclid(360)
}

/// Sum of leg lengths along an ordered list of positions
pub fn path_length_nm<'a, I>(points: I) -> f64
where
    I: IntoIterator<Item = &'a LatLng>,
{
    let mut iter = points.into_iter();
    let Some(mut previous) = iter.next() else {
        return 0.0;
    };
    let mut total = 0.0;
    for point in iter {
        total += previous.distance_to(point);
        previous = point;
    }
    total
}
