use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::{ChannelStats, DurationStats, ElevationStats};
use crate::style::StyleRecord;

// ---- structural pass output ----

/// Raw GPX data as discovered by the structural pass, before any numeric
/// interpretation.
#[derive(Debug, Default)]
pub struct RawDocument {
    pub waypoints: Vec<RawPoint>,
    pub routes: Vec<RawRoute>,
    pub tracks: Vec<RawTrack>,
}

/// A point element (wpt, rtept, trkpt) with its attribute and child texts.
#[derive(Debug, Clone, Default)]
pub struct RawPoint {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub ele: Option<String>,
    pub time: Option<String>,
    pub speed: Option<String>,
    pub hr: Option<String>,
    pub cad: Option<String>,
    pub atemp: Option<String>,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub sym: Option<String>,
    pub point_type: Option<String>,
}

/// A GPX route (<rte>).
#[derive(Debug, Default)]
pub struct RawRoute {
    pub name: Option<String>,
    pub style: Option<StyleRecord>,
    pub points: Vec<RawPoint>,
}

/// A GPX track (<trk>).
#[derive(Debug, Default)]
pub struct RawTrack {
    pub name: Option<String>,
    pub style: Option<StyleRecord>,
    pub segments: Vec<RawSegment>,
}

/// A GPX track segment (<trkseg>).
#[derive(Debug, Default)]
pub struct RawSegment {
    pub points: Vec<RawPoint>,
}

// ---- parse result ----

/// Document-level metadata; the first matching element in the document wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentMetadata {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
}

/// Which channels carry data. Used both per point (present in the source
/// element) and per document (present anywhere).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    pub elevation: bool,
    pub speed: bool,
    #[serde(rename = "hr")]
    pub heart_rate: bool,
    pub duration: bool,
    #[serde(rename = "atemp")]
    pub temperature: bool,
    #[serde(rename = "cad")]
    pub cadence: bool,
}

impl Flags {
    pub fn union(&mut self, other: &Flags) {
        self.elevation |= other.elevation;
        self.speed |= other.speed;
        self.heart_rate |= other.heart_rate;
        self.duration |= other.duration;
        self.temperature |= other.temperature;
        self.cadence |= other.cadence;
    }
}

/// Per-point channel values. `elevation` may be carried forward from the
/// previous point and `speed` may be derived; `TrackPoint::present` tells
/// which values came from the source element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointMeta {
    pub time: Option<DateTime<Utc>>,
    pub elevation: Option<f64>,
    pub heart_rate: Option<u32>,
    pub cadence: Option<u32>,
    pub temperature: Option<f64>,
    pub speed: Option<f64>,
}

/// A track or route point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    pub meta: PointMeta,
    pub present: Flags,
}

impl TrackPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            meta: PointMeta::default(),
            present: Flags::default(),
        }
    }

    /// Fill in a derived speed; an explicit source speed is kept.
    pub fn with_speed(mut self, speed: Option<f64>) -> Self {
        if self.meta.speed.is_none() {
            self.meta.speed = speed;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Track,
    Route,
}

/// One renderable track or route: ordered points plus resolved style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackLayer {
    pub kind: LayerKind,
    pub name: Option<String>,
    pub points: Vec<TrackPoint>,
    pub style: StyleRecord,
}

/// A GPX waypoint (<wpt>).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub sym: Option<String>,
    #[serde(rename = "type")]
    pub waypoint_type: Option<String>,
    pub elevation: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

/// Everything computed from one GPX document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub metadata: DocumentMetadata,
    pub flags: Flags,
    /// Sum of 3-D inter-point distances over all layers, in meters.
    pub length: f64,
    pub elevation: ElevationStats,
    pub speed: ChannelStats,
    pub heart_rate: ChannelStats,
    pub cadence: ChannelStats,
    pub temperature: ChannelStats,
    pub duration: DurationStats,
    pub layers: Vec<TrackLayer>,
    pub waypoints: Vec<Waypoint>,
}

impl ParseResult {
    pub fn point_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.points.len()).sum()
    }
}
