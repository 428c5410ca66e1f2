use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;

use crate::error::{GpxError, Result};
use crate::gpx_types::{RawPoint, TrackPoint, Waypoint};

/// Naive timestamp layouts accepted when the text is not RFC 3339; read as UTC.
const NAIVE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Turn a raw track/route point into a [`TrackPoint`].
///
/// Fails only on a missing or non-numeric coordinate. Unparseable channel
/// values are treated as absent. A point without elevation inherits the
/// elevation of `previous`.
pub fn extract_point(raw: &RawPoint, previous: Option<&TrackPoint>) -> Result<TrackPoint> {
    let lat = parse_coordinate("lat", raw.lat.as_deref())?;
    let lng = parse_coordinate("lon", raw.lon.as_deref())?;

    let mut point = TrackPoint::new(lat, lng);
    let meta = &mut point.meta;
    let present = &mut point.present;

    meta.time = raw.time.as_deref().and_then(parse_timestamp);
    present.duration = meta.time.is_some();

    meta.elevation = parse_number("ele", raw.ele.as_deref());
    present.elevation = meta.elevation.is_some();
    if meta.elevation.is_none() {
        meta.elevation = previous.and_then(|prev| prev.meta.elevation);
    }

    meta.speed = parse_number("speed", raw.speed.as_deref());
    present.speed = meta.speed.is_some();

    meta.heart_rate = parse_integer("hr", raw.hr.as_deref());
    present.heart_rate = meta.heart_rate.is_some();

    meta.cadence = parse_integer("cad", raw.cad.as_deref());
    present.cadence = meta.cadence.is_some();

    meta.temperature = parse_number("atemp", raw.atemp.as_deref());
    present.temperature = meta.temperature.is_some();

    Ok(point)
}

pub fn extract_waypoint(raw: &RawPoint) -> Result<Waypoint> {
    Ok(Waypoint {
        lat: parse_coordinate("lat", raw.lat.as_deref())?,
        lng: parse_coordinate("lon", raw.lon.as_deref())?,
        name: non_empty(raw.name.as_deref()),
        desc: non_empty(raw.desc.as_deref()),
        sym: non_empty(raw.sym.as_deref()),
        waypoint_type: non_empty(raw.point_type.as_deref()),
        elevation: parse_number("ele", raw.ele.as_deref()),
        time: raw.time.as_deref().and_then(parse_timestamp),
    })
}

fn parse_coordinate(attribute: &'static str, value: Option<&str>) -> Result<f64> {
    let value = value.ok_or(GpxError::MissingAttribute {
        element: "point",
        attribute,
    })?;
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GpxError::InvalidCoordinate {
            attribute,
            value: value.to_string(),
        })
}

/// Parse an RFC 3339 timestamp, or a naive one taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    let parsed = NAIVE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc());
    if parsed.is_none() {
        debug!("ignoring unparseable timestamp '{text}'");
    }
    parsed
}

fn parse_number(field: &str, text: Option<&str>) -> Option<f64> {
    let text = text?.trim();
    let value = text.parse::<f64>().ok().filter(|v| v.is_finite());
    if value.is_none() {
        debug!("ignoring non-numeric <{field}> value '{text}'");
    }
    value
}

/// Integral channels accept decimal text, truncated toward zero.
fn parse_integer(field: &str, text: Option<&str>) -> Option<u32> {
    let trimmed = text?.trim();
    if let Ok(value) = trimmed.parse::<u32>() {
        return Some(value);
    }
    parse_number(field, Some(trimmed))
        .filter(|v| *v >= 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v.trunc() as u32)
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
