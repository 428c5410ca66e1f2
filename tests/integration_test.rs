use geojson::Value;
use gpx_stats::converter::to_feature_collection;
use gpx_stats::{parse, ElementKind, GpxError, LayerKind, ParseOptions, ParseResult};

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parse_fixture(path: &str) -> ParseResult {
    init_logging();
    parse(&load_fixture(path), &ParseOptions::default()).unwrap()
}

fn parse_fixture_with_opts(path: &str, opts: &ParseOptions) -> Result<ParseResult, GpxError> {
    init_logging();
    parse(&load_fixture(path), opts)
}

// ---- basic/ ----

#[test]
fn test_01_simple_track_metadata() {
    let result = parse_fixture("basic/01_simple_track.gpx");
    assert_eq!(result.metadata.name.as_deref(), Some("Morning Run"));
    assert_eq!(result.metadata.desc.as_deref(), Some("Easy loop along the river"));
    assert_eq!(result.metadata.author.as_deref(), Some("Sam Rivera"));
    assert_eq!(result.metadata.copyright.as_deref(), Some("Sam Rivera"));
}

#[test]
fn test_01_simple_track_statistics() {
    let result = parse_fixture("basic/01_simple_track.gpx");
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.layers[0].kind, LayerKind::Track);
    assert_eq!(result.layers[0].name.as_deref(), Some("Loop"));
    assert_eq!(result.layers[0].points.len(), 5);

    let ele = &result.elevation;
    assert_eq!(ele.channel.min, Some(10.0));
    assert_eq!(ele.channel.max, Some(15.0));
    assert_eq!(ele.channel.count, 5);
    assert!((ele.channel.avg.unwrap() - 12.4).abs() < 1e-9);
    assert_eq!(ele.gain, 6.0);
    assert_eq!(ele.loss, 2.0);
    // Every point has elevation, so gain - loss is the net change.
    assert_eq!(ele.gain - ele.loss, 14.0 - 10.0);

    // The 60 s interval exceeds the 15 s threshold.
    assert_eq!(result.duration.total_ms, 90_000);
    assert_eq!(result.duration.moving_ms, 30_000);
    assert_eq!(
        result.duration.start.unwrap().to_rfc3339(),
        "2025-01-01T06:00:00+00:00"
    );
    assert_eq!(
        result.duration.end.unwrap().to_rfc3339(),
        "2025-01-01T06:01:30+00:00"
    );

    assert!(result.length > 4.0 * 111.19 && result.length < 4.0 * 111.4);
    assert_eq!(result.speed.count, 4);
    assert!(result.flags.elevation && result.flags.duration && result.flags.speed);
    assert!(!result.flags.heart_rate && !result.flags.cadence && !result.flags.temperature);
    assert_eq!(result.heart_rate.avg, None);
}

#[test]
fn test_01_samples_carry_cumulative_distance() {
    let result = parse_fixture("basic/01_simple_track.gpx");
    let samples = &result.elevation.channel.samples;
    assert_eq!(samples.len(), 5);
    assert_eq!(samples[0].distance, 0.0);
    assert!(samples.windows(2).all(|w| w[1].distance >= w[0].distance));
    assert_eq!(samples[4].distance, result.length);
    assert_eq!(samples[2].value, 11.0);
}

#[test]
fn test_02_route_and_waypoints() {
    let result = parse_fixture("basic/02_route_and_waypoints.gpx");
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.layers[0].kind, LayerKind::Route);
    assert_eq!(result.layers[0].name.as_deref(), Some("Tokyo Loop"));
    assert_eq!(result.layers[0].points.len(), 3);

    assert_eq!(result.waypoints.len(), 2);
    let tower = &result.waypoints[0];
    assert_eq!(tower.name.as_deref(), Some("Tokyo Tower"));
    assert_eq!(tower.sym.as_deref(), Some("Flag, Blue"));
    assert_eq!(tower.waypoint_type.as_deref(), Some("POI"));
    assert_eq!(tower.elevation, Some(40.5));
    assert_eq!(result.waypoints[1].name.as_deref(), Some("Skytree"));

    // First <name> in the document wins, wherever it is.
    assert_eq!(result.metadata.name.as_deref(), Some("Tokyo Tower"));

    // No timestamps: no durations, no speeds.
    assert!(!result.flags.duration);
    assert!(!result.flags.speed);
    assert_eq!(result.duration.start, None);
    assert_eq!(result.duration.total_ms, 0);
    assert!(result.speed.is_empty());
    assert!(result.length > 0.0);
}

#[test]
fn test_01_wide_interval_threshold_counts_every_interval() {
    let opts = ParseOptions::from_json(r#"{"maxPointIntervalMs":70000}"#).unwrap();
    let result = parse_fixture_with_opts("basic/01_simple_track.gpx", &opts).unwrap();
    assert_eq!(result.duration.total_ms, 90_000);
    assert_eq!(result.duration.moving_ms, result.duration.total_ms);
}

#[test]
fn test_02_waypoints_not_requested() {
    let opts = ParseOptions {
        element_kinds: vec![ElementKind::Route],
        ..Default::default()
    };
    let result = parse_fixture_with_opts("basic/02_route_and_waypoints.gpx", &opts).unwrap();
    assert!(result.waypoints.is_empty());
    assert_eq!(result.layers.len(), 1);
}

// ---- tracks/ ----

#[test]
fn test_03_multi_segment_joined() {
    let result = parse_fixture("tracks/03_multi_segment.gpx");
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.layers[0].points.len(), 4);

    assert_eq!(result.duration.total_ms, 3_605_000);
    assert_eq!(result.duration.moving_ms, 10_000);
    assert_eq!(result.elevation.gain, 30.0);
    assert_eq!(result.elevation.loss, 5.0);
}

#[test]
fn test_03_multi_segment_split() {
    let opts = ParseOptions {
        join_track_segments: false,
        ..Default::default()
    };
    let result = parse_fixture_with_opts("tracks/03_multi_segment.gpx", &opts).unwrap();
    assert_eq!(result.layers.len(), 2);
    assert_eq!(result.layers[0].points.len(), 2);
    assert_eq!(result.layers[1].points.len(), 2);
    assert_eq!(result.layers[0].style, result.layers[1].style);
    assert_eq!(result.layers[1].name.as_deref(), Some("Two Part Hike"));

    assert_eq!(result.duration.total_ms, 10_000);
    assert_eq!(result.elevation.gain, 10.0);
    assert_eq!(result.elevation.loss, 5.0);
}

#[test]
fn test_03_embedded_style() {
    let result = parse_fixture("tracks/03_multi_segment.gpx");
    let style = &result.layers[0].style;
    assert_eq!(style.color.as_deref(), Some("#FF8800"));
    assert_eq!(style.opacity, Some(0.8));
    assert_eq!(style.weight, Some(5.0));
    assert_eq!(style.line_cap.as_deref(), Some("round"));
    assert!(style.dash_array.is_none());
}

#[test]
fn test_03_style_precedence() {
    let opts = ParseOptions::from_json(
        r#"{"defaultStyle":{"color":"green","weight":2,"lineJoin":"bevel"},"styleOverrides":{"opacity":0.25}}"#,
    )
    .unwrap();
    let result = parse_fixture_with_opts("tracks/03_multi_segment.gpx", &opts).unwrap();
    let style = &result.layers[0].style;
    assert_eq!(style.color.as_deref(), Some("#FF8800"));
    assert_eq!(style.weight, Some(5.0));
    assert_eq!(style.line_join.as_deref(), Some("bevel"));
    assert_eq!(style.opacity, Some(0.25));
}

// ---- vendor/ ----

#[test]
fn test_04_garmin_extensions() {
    let result = parse_fixture("vendor/04_garmin_extensions.gpx");
    assert_eq!(result.metadata.name.as_deref(), Some("Garmin Activity"));
    assert!(result.flags.heart_rate && result.flags.cadence && result.flags.temperature);

    assert_eq!(result.heart_rate.min, Some(120.0));
    assert_eq!(result.heart_rate.max, Some(140.0));
    assert_eq!(result.heart_rate.avg, Some(130.0));
    assert_eq!(result.cadence.avg, Some(85.0));
    assert_eq!(result.temperature.avg, Some(9.0));
    assert_eq!(result.temperature.count, 3);

    let point = &result.layers[0].points[1];
    assert_eq!(point.meta.heart_rate, Some(130));
    assert_eq!(point.meta.cadence, Some(90));
    assert_eq!(point.meta.temperature, Some(9.0));
    assert_eq!(result.duration.moving_ms, 0);
    assert_eq!(result.duration.total_ms, 40_000);
}

#[test]
fn test_05_alternate_spellings_normalized() {
    let result = parse_fixture("vendor/05_cluetrust_spellings.gpx");
    assert!(result.flags.cadence);
    assert!(result.flags.heart_rate);
    assert!(result.flags.temperature);
    assert!(!result.flags.elevation);

    assert_eq!(result.cadence.count, 2);
    assert_eq!(result.cadence.avg, Some(72.0));
    assert_eq!(result.heart_rate.max, Some(105.0));
    assert_eq!(result.temperature.min, Some(18.5));
    assert!(result.elevation.channel.is_empty());
    assert_eq!(result.elevation.channel.avg, None);
}

// ---- edge_cases/ ----

#[test]
fn test_06_waypoints_only_fails_when_tracks_requested() {
    let err = parse_fixture_with_opts("edge_cases/06_waypoints_only.gpx", &ParseOptions::default())
        .unwrap_err();
    assert!(matches!(err, GpxError::NoLayersFound));
}

#[test]
fn test_06_waypoints_only_succeeds_for_waypoints() {
    let opts = ParseOptions {
        element_kinds: vec![ElementKind::Waypoint],
        ..Default::default()
    };
    let result = parse_fixture_with_opts("edge_cases/06_waypoints_only.gpx", &opts).unwrap();
    assert_eq!(result.waypoints.len(), 1);
    assert!(result.layers.is_empty());
}

#[test]
fn test_07_truncated_is_malformed() {
    let err = parse_fixture_with_opts("edge_cases/07_truncated.gpx", &ParseOptions::default())
        .unwrap_err();
    assert!(matches!(err, GpxError::MalformedDocument { .. }));
    assert!(err.to_string().starts_with("malformed GPX document"));
}

#[test]
fn test_08_irregular_points_tolerated() {
    let result = parse_fixture("edge_cases/08_irregular_points.gpx");
    let points = &result.layers[0].points;
    assert_eq!(points.len(), 3);

    // Carried forward, unparseable time dropped.
    assert_eq!(points[1].meta.elevation, Some(100.0));
    assert_eq!(points[1].meta.time, None);

    assert_eq!(result.speed.count, 1);
    assert_eq!(result.speed.max, Some(2.5));
    assert_eq!(result.elevation.channel.count, 2);
    assert_eq!(result.elevation.channel.max, Some(100.0));
    assert_eq!(result.elevation.loss, 10.0);
    assert_eq!(result.elevation.gain, 0.0);

    assert!(result.duration.start.is_some());
    assert!(result.duration.end > result.duration.start);
    assert_eq!(result.duration.total_ms, 0);
    assert!(result.duration.total_ms >= result.duration.moving_ms);
}

// ---- whole-result properties ----

const ALL_FIXTURES: &[&str] = &[
    "basic/01_simple_track.gpx",
    "basic/02_route_and_waypoints.gpx",
    "tracks/03_multi_segment.gpx",
    "vendor/04_garmin_extensions.gpx",
    "vendor/05_cluetrust_spellings.gpx",
    "edge_cases/08_irregular_points.gpx",
];

#[test]
fn test_parsing_is_idempotent() {
    for path in ALL_FIXTURES {
        let first = parse_fixture(path);
        let second = parse_fixture(path);
        assert_eq!(first, second, "{path}");
    }
}

#[test]
fn test_concurrent_parses_are_independent() {
    let expected: Vec<ParseResult> = ALL_FIXTURES.iter().map(|p| parse_fixture(p)).collect();

    let actual: Vec<ParseResult> = std::thread::scope(|scope| {
        let handles: Vec<_> = ALL_FIXTURES
            .iter()
            .map(|path| scope.spawn(move || parse_fixture(path)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(expected, actual);
}

#[test]
fn test_duration_and_average_invariants() {
    for path in ALL_FIXTURES {
        let result = parse_fixture(path);
        assert!(result.duration.total_ms >= result.duration.moving_ms, "{path}");
        assert!(result.elevation.gain >= 0.0 && result.elevation.loss >= 0.0, "{path}");
        for channel in [
            &result.elevation.channel,
            &result.speed,
            &result.heart_rate,
            &result.cadence,
            &result.temperature,
        ] {
            match channel.count {
                0 => assert_eq!(channel.avg, None, "{path}"),
                n => assert_eq!(channel.avg, Some(channel.total / n as f64), "{path}"),
            }
        }
    }
}

#[test]
fn test_extreme_timestamps_saturate_duration() {
    init_logging();
    let mut xml = String::from(r#"<gpx version="1.1"><trk><trkseg>"#);
    for i in 0..60_000 {
        let time = if i % 2 == 0 {
            "0001-01-01T00:00:00Z"
        } else {
            "9999-12-31T23:59:59Z"
        };
        xml.push_str(&format!(r#"<trkpt lat="0" lon="0"><time>{time}</time></trkpt>"#));
    }
    xml.push_str("</trkseg></trk></gpx>");

    let result = parse(&xml, &ParseOptions::default()).unwrap();
    assert_eq!(result.layers[0].points.len(), 60_000);
    assert_eq!(result.duration.total_ms, u64::MAX);
    assert_eq!(result.duration.moving_ms, 0);
    assert!(result.duration.total_ms >= result.duration.moving_ms);
}

#[test]
fn test_result_serializes_with_short_flag_names() {
    let result = parse_fixture("vendor/05_cluetrust_spellings.gpx");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["flags"]["cad"], true);
    assert_eq!(json["flags"]["hr"], true);
    assert_eq!(json["flags"]["elevation"], false);
    assert!(json["elevation"]["avg"].is_null());
    assert_eq!(json["heartRate"]["count"], 2);
    assert_eq!(json["layers"][0]["kind"], "track");
}

#[test]
fn test_geojson_export() {
    let result = parse_fixture("basic/02_route_and_waypoints.gpx");
    let fc = to_feature_collection(&result);
    assert_eq!(fc.features.len(), 3);

    let types: Vec<&str> = fc
        .features
        .iter()
        .map(|f| f.properties.as_ref().unwrap()["gpxType"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["route", "waypoint", "waypoint"]);

    let geom = fc.features[0].geometry.as_ref().unwrap();
    if let Value::LineString(coords) = &geom.value {
        assert_eq!(coords.len(), 3);
        assert!((coords[0][0] - 139.6503).abs() < 1e-4);
        assert!((coords[0][1] - 35.6762).abs() < 1e-4);
    } else {
        panic!("Expected LineString");
    }
}
