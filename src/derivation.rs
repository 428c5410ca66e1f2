use crate::gpx_types::TrackPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Quantities derived from a point and its predecessor. All zero / `None`
/// for the first point of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Derivation {
    /// Absolute timestamp difference; `None` if either timestamp is absent.
    pub time_delta_ms: Option<u64>,
    pub distance_2d: f64,
    pub distance_3d: f64,
    /// Current minus previous elevation, carried-forward values included.
    pub elevation_delta: Option<f64>,
    /// Speed inferred from 3-D distance and time, in m/s.
    pub speed: Option<f64>,
}

/// Great-circle distance in meters between two lat/lng pairs in degrees.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn derive(current: &TrackPoint, previous: Option<&TrackPoint>) -> Derivation {
    let Some(previous) = previous else {
        return Derivation::default();
    };

    let time_delta_ms = match (current.meta.time, previous.meta.time) {
        (Some(t1), Some(t0)) => Some((t1 - t0).num_milliseconds().unsigned_abs()),
        _ => None,
    };

    let distance_2d = haversine_distance(previous.lat, previous.lng, current.lat, current.lng);

    let elevation_delta = match (current.meta.elevation, previous.meta.elevation) {
        (Some(e1), Some(e0)) => Some(e1 - e0),
        _ => None,
    };
    let distance_3d = match elevation_delta {
        Some(dz) => distance_2d.hypot(dz),
        None => distance_2d,
    };

    let speed = match time_delta_ms {
        Some(dt) if dt > 0 => Some(1000.0 * distance_3d / dt as f64),
        _ => None,
    };

    Derivation {
        time_delta_ms,
        distance_2d,
        distance_3d,
        elevation_delta,
        speed,
    }
}
