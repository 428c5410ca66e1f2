use log::{debug, warn};

use crate::derivation::derive;
use crate::extract::extract_point;
use crate::gpx_types::{LayerKind, RawPoint, TrackLayer, TrackPoint};
use crate::stats::Aggregator;
use crate::style::StyleRecord;

/// One pass over the ordered points of a segment (or of a whole track when
/// segments are joined). The last accepted point is the cursor for
/// elevation carry-forward and derivation.
pub struct SegmentParser<'a> {
    aggregator: &'a mut Aggregator,
    points: Vec<TrackPoint>,
    skipped: usize,
}

impl<'a> SegmentParser<'a> {
    pub fn new(aggregator: &'a mut Aggregator) -> Self {
        Self {
            aggregator,
            points: Vec::new(),
            skipped: 0,
        }
    }

    /// Extract, derive and fold one point. Points with a missing or invalid
    /// coordinate are skipped.
    pub fn push(&mut self, raw: &RawPoint) {
        let previous = self.points.last();
        let point = match extract_point(raw, previous) {
            Ok(point) => point,
            Err(e) if e.is_point_level() => {
                debug!("skipping point: {e}");
                self.skipped += 1;
                return;
            }
            Err(e) => {
                warn!("skipping point after unexpected error: {e}");
                self.skipped += 1;
                return;
            }
        };

        let derivation = derive(&point, previous);
        let point = point.with_speed(derivation.speed);
        self.aggregator.fold(&point, &derivation);
        self.points.push(point);
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Close the run. A run without any accepted point yields no layer.
    pub fn finish(
        self,
        kind: LayerKind,
        name: Option<String>,
        style: StyleRecord,
    ) -> Option<TrackLayer> {
        if self.skipped > 0 {
            debug!("{} point(s) skipped in {kind:?} layer", self.skipped);
        }
        if self.points.is_empty() {
            return None;
        }
        Some(TrackLayer {
            kind,
            name,
            points: self.points,
            style,
        })
    }
}

/// Run one segment parse over `points` and build its layer.
pub fn parse_segment<'r>(
    points: impl IntoIterator<Item = &'r RawPoint>,
    kind: LayerKind,
    name: Option<String>,
    style: StyleRecord,
    aggregator: &mut Aggregator,
) -> Option<TrackLayer> {
    let mut parser = SegmentParser::new(aggregator);
    for raw in points {
        parser.push(raw);
    }
    parser.finish(kind, name, style)
}
