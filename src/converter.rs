use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::gpx_types::*;
use crate::style::StyleRecord;

/// Convert a parse result to a GeoJSON FeatureCollection: one feature per
/// layer followed by one Point feature per waypoint.
pub fn to_feature_collection(result: &ParseResult) -> FeatureCollection {
    let mut features: Vec<Feature> = result.layers.iter().map(layer_to_feature).collect();
    features.extend(result.waypoints.iter().map(waypoint_to_feature));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn layer_to_feature(layer: &TrackLayer) -> Feature {
    let value = match layer.points.as_slice() {
        [single] => Value::Point(point_coords(single.lng, single.lat, single.meta.elevation)),
        points => Value::LineString(
            points
                .iter()
                .map(|pt| point_coords(pt.lng, pt.lat, pt.meta.elevation))
                .collect(),
        ),
    };

    let gpx_type = match layer.kind {
        LayerKind::Track => "track",
        LayerKind::Route => "route",
    };

    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String(gpx_type.to_string()),
    );
    insert_optional(&mut props, "name", &layer.name);
    insert_style(&mut props, &layer.style);
    insert_coordinate_properties(&mut props, &layer.points);

    feature(value, props)
}

fn waypoint_to_feature(wpt: &Waypoint) -> Feature {
    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("waypoint".to_string()),
    );
    insert_optional(&mut props, "name", &wpt.name);
    insert_optional(&mut props, "desc", &wpt.desc);
    insert_optional(&mut props, "sym", &wpt.sym);
    insert_optional(&mut props, "type", &wpt.waypoint_type);
    if let Some(time) = wpt.time {
        props.insert("time".to_string(), JsonValue::String(time.to_rfc3339()));
    }

    feature(
        Value::Point(point_coords(wpt.lng, wpt.lat, wpt.elevation)),
        props,
    )
}

fn feature(value: Value, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Build [lon, lat] or [lon, lat, ele] coordinate array.
fn point_coords(lng: f64, lat: f64, ele: Option<f64>) -> Vec<f64> {
    match ele {
        Some(ele) => vec![lng, lat, ele],
        None => vec![lng, lat],
    }
}

fn insert_optional(props: &mut Map<String, JsonValue>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), JsonValue::String(v.clone()));
    }
}

fn insert_style(props: &mut Map<String, JsonValue>, style: &StyleRecord) {
    if let Ok(JsonValue::Object(style)) = serde_json::to_value(style) {
        props.insert("style".to_string(), JsonValue::Object(style));
    }
}

/// Per-coordinate channel arrays, each included only when at least one
/// point carries a value.
fn insert_coordinate_properties(props: &mut Map<String, JsonValue>, points: &[TrackPoint]) {
    let mut coord_props = Map::new();

    insert_channel(&mut coord_props, "times", points, |pt| {
        pt.meta.time.map(|t| JsonValue::String(t.to_rfc3339()))
    });
    insert_channel(&mut coord_props, "heartRates", points, |pt| {
        pt.meta.heart_rate.map(JsonValue::from)
    });
    insert_channel(&mut coord_props, "cadences", points, |pt| {
        pt.meta.cadence.map(JsonValue::from)
    });
    insert_channel(&mut coord_props, "temperatures", points, |pt| {
        pt.meta.temperature.and_then(number)
    });
    insert_channel(&mut coord_props, "speeds", points, |pt| {
        pt.meta.speed.and_then(number)
    });

    if !coord_props.is_empty() {
        props.insert(
            "coordinateProperties".to_string(),
            JsonValue::Object(coord_props),
        );
    }
}

fn insert_channel(
    coord_props: &mut Map<String, JsonValue>,
    key: &str,
    points: &[TrackPoint],
    value: impl Fn(&TrackPoint) -> Option<JsonValue>,
) {
    let values: Vec<JsonValue> = points
        .iter()
        .map(|pt| value(pt).unwrap_or(JsonValue::Null))
        .collect();

    if values.iter().any(|v| !v.is_null()) {
        coord_props.insert(key.to_string(), JsonValue::Array(values));
    }
}

fn number(v: f64) -> Option<JsonValue> {
    serde_json::Number::from_f64(v).map(JsonValue::Number)
}
