//! Running per-channel statistics.
//!
//! One [`Aggregator`] is owned by a single parse call and threaded through
//! every segment run by `&mut`. Averages are computed once, when the
//! aggregator is consumed by [`Aggregator::finalize`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::derivation::Derivation;
use crate::gpx_types::{Flags, TrackPoint};

/// One plotted value. `distance` is the cumulative document length in meters
/// at the sampled point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
    pub distance: f64,
}

/// Min/max/total/count of one channel.
///
/// `avg` is `None` until [`ChannelStats::finalize`] runs, and stays `None`
/// when no value was observed; it never holds a placeholder zero or NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub total: f64,
    pub count: usize,
    pub avg: Option<f64>,
    pub samples: Vec<Sample>,
}

impl ChannelStats {
    pub fn observe(&mut self, value: f64, lat: f64, lng: f64, distance: f64) {
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
        self.total += value;
        self.count += 1;
        self.samples.push(Sample {
            lat,
            lng,
            value,
            distance,
        });
    }

    pub fn finalize(&mut self) {
        self.avg = (self.count > 0).then(|| self.total / self.count as f64);
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Channel statistics plus cumulative climb and descent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElevationStats {
    #[serde(flatten)]
    pub channel: ChannelStats,
    pub gain: f64,
    pub loss: f64,
}

impl ElevationStats {
    pub fn observe_delta(&mut self, delta: f64) {
        if delta > 0.0 {
            self.gain += delta;
        } else {
            self.loss -= delta;
        }
    }
}

/// Elapsed and moving time, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationStats {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub total_ms: u64,
    pub moving_ms: u64,
}

impl DurationStats {
    fn observe_time(&mut self, time: DateTime<Utc>) {
        if self.start.is_none() {
            self.start = Some(time);
        }
        self.end = Some(time);
    }

    fn add_interval(&mut self, delta_ms: u64, max_point_interval_ms: u64) {
        self.total_ms = self.total_ms.saturating_add(delta_ms);
        if delta_ms < max_point_interval_ms {
            self.moving_ms = self.moving_ms.saturating_add(delta_ms);
        }
    }
}

/// Finalized document-wide statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub flags: Flags,
    pub length: f64,
    pub elevation: ElevationStats,
    pub speed: ChannelStats,
    pub heart_rate: ChannelStats,
    pub cadence: ChannelStats,
    pub temperature: ChannelStats,
    pub duration: DurationStats,
}

/// Accumulates every point of every layer in one document.
#[derive(Debug)]
pub struct Aggregator {
    max_point_interval_ms: u64,
    stats: Statistics,
}

impl Aggregator {
    pub fn new(max_point_interval_ms: u64) -> Self {
        Self {
            max_point_interval_ms,
            stats: Statistics::default(),
        }
    }

    /// Fold one point and its derivation against the previous point.
    pub fn fold(&mut self, point: &TrackPoint, derivation: &Derivation) {
        let stats = &mut self.stats;
        stats.length += derivation.distance_3d;
        stats.flags.union(&point.present);

        let (lat, lng, distance) = (point.lat, point.lng, stats.length);
        let meta = &point.meta;

        if point.present.elevation {
            if let Some(ele) = meta.elevation {
                stats.elevation.channel.observe(ele, lat, lng, distance);
            }
        }
        if let Some(delta) = derivation.elevation_delta {
            stats.elevation.observe_delta(delta);
        }
        if let Some(speed) = meta.speed {
            stats.flags.speed = true;
            stats.speed.observe(speed, lat, lng, distance);
        }
        if let Some(hr) = meta.heart_rate {
            stats.heart_rate.observe(f64::from(hr), lat, lng, distance);
        }
        if let Some(cad) = meta.cadence {
            stats.cadence.observe(f64::from(cad), lat, lng, distance);
        }
        if let Some(atemp) = meta.temperature {
            stats.temperature.observe(atemp, lat, lng, distance);
        }
        if let Some(time) = meta.time {
            stats.duration.observe_time(time);
        }
        if let Some(delta_ms) = derivation.time_delta_ms {
            stats
                .duration
                .add_interval(delta_ms, self.max_point_interval_ms);
        }
    }

    pub fn finalize(mut self) -> Statistics {
        let stats = &mut self.stats;
        stats.elevation.channel.finalize();
        stats.speed.finalize();
        stats.heart_rate.finalize();
        stats.cadence.finalize();
        stats.temperature.finalize();
        self.stats
    }
}
