use gpx_stream_wasm::error::ErrorKind;
use gpx_stream_wasm::gpx_types::{Gpx, GpxFields, PathFields, Track, TrackSegment, WayPoint};
use gpx_stream_wasm::options::WriteOptions;
use gpx_stream_wasm::parser::{parse_gpx, read_gpx, read_gpx_file};
use gpx_stream_wasm::values::{Fix, LengthUnit};
use gpx_stream_wasm::writer::{write_gpx, write_gpx_file, write_gpx_string};

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn parse(path: &str) -> Gpx {
    parse_gpx(&load_fixture(path)).unwrap()
}

fn round_trip(gpx: &Gpx) -> Gpx {
    let xml = write_gpx_string(gpx, &WriteOptions::default()).unwrap();
    parse_gpx(&xml).unwrap()
}

// ---- basic/ ----

#[test]
fn test_01_minimal_waypoint() {
    let gpx = parse("basic/01_minimal_waypoint.gpx");
    assert_eq!(gpx.version(), "1.1");
    assert_eq!(gpx.creator(), "gpx-stream-tests");
    assert_eq!(gpx.waypoints().len(), 1);

    let wpt = gpx.waypoints().first().unwrap();
    assert!((wpt.latitude().degrees() - 35.6762).abs() < 1e-9);
    assert!((wpt.longitude().degrees() - 139.6503).abs() < 1e-9);
    assert!(wpt.is_bare());
    assert!(gpx.metadata().is_none());
}

#[test]
fn test_02_full_waypoint() {
    let gpx = parse("basic/02_full_waypoint.gpx");
    let wpt = gpx.waypoints().first().unwrap();

    assert_eq!(wpt.elevation().unwrap().to_meters(), 135.0);
    assert_eq!(wpt.elevation().unwrap().unit(), LengthUnit::Meter);
    assert_eq!(wpt.time().unwrap().to_string(), "2009-05-19T04:00:30Z");
    assert_eq!(wpt.magnetic_variation().unwrap().value(), 12.5);
    assert_eq!(wpt.geoid_height().unwrap().to_meters(), 14.2);
    assert_eq!(wpt.name(), Some("Moscow Waypoint"));
    assert_eq!(wpt.comment(), Some("A comment"));
    assert_eq!(wpt.description(), Some("Eastern Moscow"));
    assert_eq!(wpt.source(), Some("GPS"));
    assert_eq!(wpt.symbol(), Some("Flag, Blue"));
    assert_eq!(wpt.kind(), Some("POI"));
    assert_eq!(wpt.fix(), Some(Fix::Dim3));
    assert_eq!(wpt.sat().unwrap().value(), 8);
    assert_eq!(wpt.hdop().unwrap().value(), 1.2);
    assert_eq!(wpt.vdop().unwrap().value(), 1.9);
    assert_eq!(wpt.pdop().unwrap().value(), 2.3);
    assert_eq!(wpt.age_of_dgps_data().unwrap().value(), 4.0);
    assert_eq!(wpt.dgps_id().unwrap().value(), 42);
    assert_eq!(wpt.course().unwrap().value(), 271.5);

    let link = wpt.links().first().unwrap();
    assert_eq!(link.href(), "https://example.com/moscow");
    assert_eq!(link.text(), Some("Moscow"));
    assert_eq!(link.mime_type(), Some("text/html"));
}

#[test]
fn test_03_simple_route() {
    let gpx = parse("basic/03_simple_route.gpx");
    assert_eq!(gpx.routes().len(), 1);

    let route = gpx.routes().first().unwrap();
    assert_eq!(route.name(), Some("Tokyo Loop"));
    assert_eq!(route.fields().description.as_deref(), Some("A route around central Tokyo"));
    assert_eq!(route.number().unwrap().value(), 1);
    assert_eq!(route.points().len(), 3);
    assert_eq!(route.points().first().unwrap().name(), Some("Tokyo Station"));
}

#[test]
fn test_04_simple_track() {
    let gpx = parse("basic/04_simple_track.gpx");
    let track = gpx.tracks().first().unwrap();
    assert_eq!(track.name(), Some("Morning Run"));
    assert_eq!(track.fields().kind.as_deref(), Some("running"));
    assert_eq!(track.segments().len(), 1);

    let elevations: Vec<f64> = track
        .points()
        .filter_map(|p| p.elevation())
        .map(|e| e.to_meters())
        .collect();
    assert_eq!(elevations, vec![10.5, 11.0, 11.5]);

    let times: Vec<String> = track
        .points()
        .filter_map(|p| p.time())
        .map(|t| t.to_string())
        .collect();
    assert_eq!(times.len(), 3);
    assert_eq!(times[2], "2025-01-01T06:00:10Z");
}

#[test]
fn test_05_complete() {
    let gpx = parse("basic/05_complete.gpx");
    let metadata = gpx.metadata().unwrap();
    assert_eq!(metadata.name(), Some("Complete Example"));
    assert_eq!(metadata.description(), Some("Every metadata child"));
    assert_eq!(metadata.keywords(), Some("tokyo, walking"));
    assert_eq!(
        metadata.time().unwrap().to_string(),
        "2024-06-01T08:30:00+09:00"
    );

    let author = metadata.author().unwrap();
    assert_eq!(author.name(), Some("Jane Doe"));
    assert_eq!(author.email().unwrap().to_string(), "jane@example.com");
    assert_eq!(author.link().unwrap().href(), "https://example.com/jane");

    let copyright = metadata.copyright().unwrap();
    assert_eq!(copyright.author(), "Jane Doe");
    assert_eq!(copyright.year(), Some(2024));

    let bounds = metadata.bounds().unwrap();
    assert_eq!(bounds.min_lat().degrees(), 35.6);
    assert_eq!(bounds.max_lon().degrees(), 139.8);

    assert_eq!(gpx.waypoints().len(), 1);
    assert_eq!(gpx.routes().len(), 1);
    assert_eq!(gpx.tracks().len(), 1);
}

// ---- tracks/ ----

#[test]
fn test_06_multi_segment() {
    let gpx = parse("tracks/06_multi_segment.gpx");
    let track = gpx.tracks().first().unwrap();
    let sizes: Vec<usize> = track.segments().iter().map(|s| s.points().len()).collect();
    assert_eq!(sizes, vec![3, 5]);
    assert_eq!(track.points().count(), 8);
    assert_eq!(gpx.track_points().count(), 8);
}

#[test]
fn test_07_multi_track() {
    let gpx = parse("tracks/07_multi_track.gpx");
    let names: Vec<&str> = gpx.tracks().iter().filter_map(|t| t.name()).collect();
    assert_eq!(names, vec!["Day 1", "Day 2"]);
    assert_eq!(gpx.track_points().count(), 4);
}

// ---- edge_cases/ ----

#[test]
fn test_09_empty() {
    let gpx = parse("edge_cases/09_empty.gpx");
    assert!(gpx.waypoints().is_empty());
    assert!(gpx.routes().is_empty());
    assert!(gpx.tracks().is_empty());
    assert!(gpx.extensions().is_none());
}

#[test]
fn test_10_empty_segments() {
    let gpx = parse("edge_cases/10_empty_segments.gpx");
    let track = gpx.tracks().first().unwrap();
    let sizes: Vec<usize> = track.segments().iter().map(|s| s.points().len()).collect();
    assert_eq!(sizes, vec![0, 1, 0]);
}

#[test]
fn test_11_cdata_and_entities() {
    let gpx = parse("edge_cases/11_cdata_and_entities.gpx");
    let wpt = gpx.waypoints().first().unwrap();
    assert_eq!(wpt.name(), Some("Café & Bar"));
    assert_eq!(wpt.description(), Some("Open <daily> & late"));
    assert_eq!(wpt.links().first().unwrap().href(), "https://example.com/?a=1&b=2");
}

#[test]
fn test_12_no_namespace() {
    let gpx = parse("edge_cases/12_no_namespace.gpx");
    let wpt = gpx.waypoints().first().unwrap();
    assert_eq!(wpt.name(), Some("Sydney"));
    assert!(wpt.latitude().degrees() < 0.0);
}

#[test]
fn test_13_gpx10() {
    let gpx = parse("edge_cases/13_gpx10.gpx");
    assert_eq!(gpx.version(), "1.0");

    // GPX 1.0 children without a 1.1 counterpart are kept as extensions
    let root_nodes: Vec<&str> = gpx.extensions().unwrap().nodes().iter().map(|n| n.name()).collect();
    assert_eq!(root_nodes, vec!["time"]);

    let point = gpx.track_points().next().unwrap();
    assert_eq!(point.elevation().unwrap().to_meters(), 20.0);
    let speed = point.extensions().unwrap().nodes().first().unwrap();
    assert_eq!(speed.xml(), "<speed>5.5</speed>");
}

#[test]
fn test_14_unordered_children() {
    let gpx = parse("edge_cases/14_unordered_children.gpx");
    assert_eq!(gpx.metadata().unwrap().name(), Some("Trailing Metadata"));

    let wpt = gpx.waypoints().first().unwrap();
    assert_eq!(wpt.name(), Some("Backwards"));
    assert_eq!(wpt.elevation().unwrap().to_meters(), -3.5);
    assert_eq!(wpt.time().unwrap().to_string(), "2020-02-29T12:00:00.250Z");

    let track = gpx.tracks().first().unwrap();
    assert_eq!(track.name(), Some("Late Name"));
    assert_eq!(track.points().count(), 1);
}

// ---- vendor/ ----

#[test]
fn test_15_garmin_extensions() {
    let gpx = parse("vendor/15_garmin_extensions.gpx");
    let prefixes: Vec<&str> = gpx.namespaces().iter().map(|ns| ns.prefix()).collect();
    assert_eq!(prefixes, vec!["gpxtpx"]);

    let nodes: Vec<&str> = gpx
        .track_points()
        .filter_map(|p| p.extensions())
        .flat_map(|ext| ext.nodes())
        .map(|node| node.xml())
        .collect();
    assert_eq!(nodes.len(), 2);
    assert_eq!(
        nodes[0],
        "<gpxtpx:TrackPointExtension><gpxtpx:hr>128</gpxtpx:hr><gpxtpx:cad>85</gpxtpx:cad></gpxtpx:TrackPointExtension>"
    );
}

// ---- round trips ----

#[test]
fn test_round_trip_preserves_model() {
    for fixture in [
        "basic/02_full_waypoint.gpx",
        "basic/05_complete.gpx",
        "tracks/06_multi_segment.gpx",
        "edge_cases/10_empty_segments.gpx",
        "edge_cases/11_cdata_and_entities.gpx",
        "edge_cases/13_gpx10.gpx",
        "vendor/15_garmin_extensions.gpx",
    ] {
        let gpx = parse(fixture);
        assert_eq!(round_trip(&gpx), gpx, "round trip changed {fixture}");
    }
}

#[test]
fn test_compact_round_trip() {
    let gpx = parse("basic/05_complete.gpx");
    let xml = write_gpx_string(&gpx, &WriteOptions::compact()).unwrap();
    assert_eq!(xml.lines().count(), 1);
    assert_eq!(parse_gpx(&xml).unwrap(), gpx);
}

#[test]
fn test_built_document_round_trip() {
    let segment = TrackSegment::new(
        vec![
            WayPoint::of(55.753572, 37.808250).unwrap(),
            WayPoint::of(55.754, 37.809).unwrap(),
        ],
        None,
    );
    let fields = PathFields {
        name: Some("Built".to_string()),
        ..Default::default()
    };
    let gpx = Gpx::new(
        "builder",
        "1.1",
        GpxFields {
            tracks: vec![Track::new(fields, vec![segment])],
            ..Default::default()
        },
    )
    .unwrap();

    let mut out = Vec::new();
    write_gpx(&gpx, &mut out, &WriteOptions::default()).unwrap();
    assert_eq!(read_gpx(out.as_slice()).unwrap(), gpx);
}

#[test]
fn test_file_round_trip() {
    let gpx = parse("basic/04_simple_track.gpx");
    let path = std::env::temp_dir().join(format!("gpx-stream-{}.gpx", std::process::id()));

    write_gpx_file(&gpx, &path, &WriteOptions::default()).unwrap();
    let back = read_gpx_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(back, gpx);
}

// ---- errors/ ----

#[test]
fn test_latitude_out_of_range() {
    let err = parse_gpx(&load_fixture("errors/latitude_out_of_range.gpx")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.path(), Some("/gpx/wpt"));
}

#[test]
fn test_missing_creator() {
    let err = parse_gpx(&load_fixture("errors/missing_creator.gpx")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("creator"), "{err}");
}

#[test]
fn test_bad_fix() {
    let err = parse_gpx(&load_fixture("errors/bad_fix.gpx")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.path(), Some("/gpx/trk/trkseg/trkpt/fix"));
}

#[test]
fn test_truncated() {
    let err = parse_gpx(&load_fixture("errors/truncated.gpx")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_missing_file() {
    let err = read_gpx_file("tests/fixtures/does_not_exist.gpx").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

// ---- JSON ----

#[test]
fn test_json_shape() {
    let gpx = parse("basic/02_full_waypoint.gpx");
    let json = serde_json::to_value(&gpx).unwrap();
    assert_eq!(json["creator"], "gpx-stream-tests");

    let wpt = &json["waypoints"][0];
    assert_eq!(wpt["latitude"], 55.753572);
    assert_eq!(wpt["name"], "Moscow Waypoint");
    assert_eq!(wpt["fix"], "3d");
    assert_eq!(wpt["time"], "2009-05-19T04:00:30Z");
    assert_eq!(wpt["links"][0]["type"], "text/html");
}
