use log::{debug, info, warn};

use crate::error::{GpxError, Result};
use crate::extract::extract_waypoint;
use crate::gpx_types::{LayerKind, ParseResult, RawDocument, TrackLayer, Waypoint};
use crate::normalize::canonicalize;
use crate::options::ParseOptions;
use crate::parser::{parse_gpx, scan_metadata};
use crate::segment::{parse_segment, SegmentParser};
use crate::stats::Aggregator;
use crate::style::resolve;

/// Parse a GPX document into layers, waypoints and document-wide statistics.
///
/// The call owns all of its state, so independent documents can be parsed
/// concurrently and dropping an unfinished call publishes nothing.
pub fn parse(text: &str, opts: &ParseOptions) -> Result<ParseResult> {
    let xml = canonicalize(text);
    let raw = parse_gpx(&xml, opts)?;
    let metadata = scan_metadata(&xml)?;

    let mut aggregator = Aggregator::new(opts.max_point_interval_ms);
    let layers = build_layers(&raw, opts, &mut aggregator);

    if opts.expects_layers() && layers.is_empty() {
        warn!(
            "no layers found ({} route(s), {} track(s) discovered)",
            raw.routes.len(),
            raw.tracks.len()
        );
        return Err(GpxError::NoLayersFound);
    }

    let waypoints = extract_waypoints(&raw);
    let stats = aggregator.finalize();

    let result = ParseResult {
        metadata,
        flags: stats.flags,
        length: stats.length,
        elevation: stats.elevation,
        speed: stats.speed,
        heart_rate: stats.heart_rate,
        cadence: stats.cadence,
        temperature: stats.temperature,
        duration: stats.duration,
        layers,
        waypoints,
    };
    info!(
        "parsed GPX: {} layer(s), {} point(s), {} waypoint(s), {:.0} m",
        result.layers.len(),
        result.point_count(),
        result.waypoints.len(),
        result.length
    );
    Ok(result)
}

/// Routes first, then tracks, each in document order. Every `<rte>` and
/// `<trk>` resolves its style once; split track segments share it.
fn build_layers(
    raw: &RawDocument,
    opts: &ParseOptions,
    aggregator: &mut Aggregator,
) -> Vec<TrackLayer> {
    let mut layers = Vec::new();

    for (i, route) in raw.routes.iter().enumerate() {
        let style = resolve(route.style.as_ref(), &opts.default_style, opts.override_for(i));
        layers.extend(parse_segment(
            &route.points,
            LayerKind::Route,
            route.name.clone(),
            style,
            aggregator,
        ));
    }

    for (i, track) in raw.tracks.iter().enumerate() {
        let style = resolve(track.style.as_ref(), &opts.default_style, opts.override_for(i));

        if opts.join_track_segments {
            let mut parser = SegmentParser::new(aggregator);
            for point in track.segments.iter().flat_map(|seg| &seg.points) {
                parser.push(point);
            }
            layers.extend(parser.finish(LayerKind::Track, track.name.clone(), style));
        } else {
            for seg in &track.segments {
                layers.extend(parse_segment(
                    &seg.points,
                    LayerKind::Track,
                    track.name.clone(),
                    style.clone(),
                    aggregator,
                ));
            }
        }
    }

    layers
}

fn extract_waypoints(raw: &RawDocument) -> Vec<Waypoint> {
    raw.waypoints
        .iter()
        .filter_map(|point| match extract_waypoint(point) {
            Ok(wpt) => Some(wpt),
            Err(e) if e.is_point_level() => {
                debug!("skipping waypoint: {e}");
                None
            }
            Err(e) => {
                warn!("skipping waypoint after unexpected error: {e}");
                None
            }
        })
        .collect()
}
