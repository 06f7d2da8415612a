use sobs_sra_loader::coords::{LatLon, LatLonFormat, NO_COORDINATE, parse_lat_lon};

fn converted(text: &str) -> (f64, f64) {
    match parse_lat_lon(text) {
        LatLon::Converted { x, y } => (x, y),
        other => panic!("{text:?} was not converted: {other:?}"),
    }
}

#[test]
fn decimal_hemisphere_is_signed() {
    assert_eq!(converted("45.5 N, 73.6 W"), (-73.6, 45.5));
    assert_eq!(converted("12.0 S 77.0 W"), (-77.0, -12.0));
    assert_eq!(converted("0.5 S 30.25 E"), (30.25, -0.5));
    assert_eq!(converted("38.98N 76.94W"), (-76.94, 38.98));
}

#[test]
fn trailing_text_is_ignored() {
    assert_eq!(converted("45.5 N 73.6 W (approx.)"), (-73.6, 45.5));
}

#[test]
fn sentinels_mean_no_coordinate() {
    for text in NO_COORDINATE {
        assert_eq!(parse_lat_lon(text), LatLon::NoCoordinate, "{text}");
    }
    assert_eq!(parse_lat_lon("MISSING"), LatLon::Unrecognized);
}

#[test]
fn other_layouts_are_recognized_but_not_converted() {
    let cases = [
        ("45° N, 73° W", LatLonFormat::DegreeSymbol),
        ("N45.5 W73.6", LatLonFormat::HemispherePrefixed),
        ("45.5, -73.6", LatLonFormat::BarePair),
        ("45.5 -73.6", LatLonFormat::BarePair),
        ("(N:W) 45.5:73.6", LatLonFormat::Labeled),
    ];
    for (text, format) in cases {
        assert_eq!(parse_lat_lon(text), LatLon::Unconverted(format), "{text}");
    }
}

#[test]
fn integers_without_decimal_point_are_unrecognized() {
    assert_eq!(parse_lat_lon("45 N 73 W"), LatLon::Unrecognized);
    assert_eq!(parse_lat_lon(""), LatLon::Unrecognized);
    assert_eq!(parse_lat_lon("Canada: Montreal"), LatLon::Unrecognized);
}
