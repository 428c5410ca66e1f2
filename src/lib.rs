//! GPX parsing with derived per-point metrics and document-wide statistics.
//!
//! [`parse`] takes GPX text and [`ParseOptions`] and returns a [`ParseResult`]:
//! document metadata, channel flags, elevation/speed/heart-rate/cadence/
//! temperature statistics, durations, styled track layers and waypoints.
//! The same entry point is exported to JavaScript as `parseGpx`.

pub mod converter;
pub mod derivation;
pub mod document;
pub mod error;
pub mod extract;
pub mod gpx_types;
pub mod normalize;
pub mod options;
pub mod parser;
pub mod segment;
pub mod stats;
pub mod style;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use crate::document::parse;
pub use crate::error::{GpxError, Result};
pub use crate::gpx_types::{
    DocumentMetadata, Flags, LayerKind, ParseResult, PointMeta, TrackLayer, TrackPoint, Waypoint,
};
pub use crate::options::{ElementKind, ParseOptions};
pub use crate::stats::{ChannelStats, DurationStats, ElevationStats, Sample};
pub use crate::style::{StyleOverrides, StyleRecord};

/// Parse a GPX string, returning the full parse result as a JS object.
#[wasm_bindgen(js_name = parseGpx)]
pub fn parse_gpx(gpx_string: &str, options: JsValue) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let result = document::parse(gpx_string, &opts)?;
    to_js(&result)
}

/// Parse a GPX string and convert the result to GeoJSON, returned as a JS object.
#[wasm_bindgen(js_name = parseGpxToGeoJson)]
pub fn parse_gpx_to_geojson(
    gpx_string: &str,
    options: JsValue,
) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let result = document::parse(gpx_string, &opts)?;
    let fc = converter::to_feature_collection(&result);
    to_js(&fc)
}

/// Maps become plain JS objects rather than `Map` instances.
fn to_js<T: Serialize>(value: &T) -> std::result::Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options(options: JsValue) -> std::result::Result<ParseOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(ParseOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| {
            GpxError::InvalidOptions {
                message: e.to_string(),
            }
            .into()
        })
    }
}
