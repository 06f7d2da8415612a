use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

pub const NO_COORDINATE: [&str; 7] = [
    "not applicable",
    "missing",
    "not collected",
    "Missing",
    "NA",
    "not available",
    "Not Collected",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatLonFormat {
    // 45.5 N 73.6 W
    DecimalHemisphere,
    // 45° N, 73° W
    DegreeSymbol,
    // N45.5 W73.6
    HemispherePrefixed,
    // 45.5, -73.6
    BarePair,
    // (N:W) 45.5:73.6
    Labeled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatLon {
    // `x` is longitude, `y` is latitude.
    Converted { x: f64, y: f64 },
    NoCoordinate,
    Unconverted(LatLonFormat),
    Unrecognized,
}

static FORMATS: LazyLock<Vec<(LatLonFormat, Regex)>> = LazyLock::new(|| {
    [
        (
            LatLonFormat::DecimalHemisphere,
            r"^(?P<x>-?\d*\.\d*)\s*(?P<ns>[NS]),?\s*(?P<y>-?\d*\.\d*)\s*(?P<ew>[EW])",
        ),
        (LatLonFormat::DegreeSymbol, r"^(\d*)°\s*(\w),\s*(\d*)°\s*(\w)"),
        (
            LatLonFormat::HemispherePrefixed,
            r"^([NS])([\d\.]*)\s*([EW])([\d\.]*)",
        ),
        (LatLonFormat::BarePair, r"^(-?\d*\.\d*)[\s,]*(-?\d*\.\d*)"),
        (
            LatLonFormat::Labeled,
            r"^\(([NS]):([EW])\) (-?\d*\.\d*):(-?\d*\.\d*)",
        ),
    ]
    .into_iter()
    .map(|(format, pattern)| (format, Regex::new(pattern).unwrap()))
    .collect()
});

pub fn parse_lat_lon(text: &str) -> LatLon {
    if NO_COORDINATE.contains(&text) {
        return LatLon::NoCoordinate;
    }

    let Some((format, captures)) = FORMATS
        .iter()
        .find_map(|(format, regex)| regex.captures(text).map(|captures| (*format, captures)))
    else {
        return LatLon::Unrecognized;
    };

    if format != LatLonFormat::DecimalHemisphere {
        return LatLon::Unconverted(format);
    }

    convert(&captures).unwrap_or(LatLon::Unconverted(format))
}

fn convert(captures: &Captures<'_>) -> Option<LatLon> {
    let latitude = signed_degrees(&captures["x"], &captures["ns"])?;
    let longitude = signed_degrees(&captures["y"], &captures["ew"])?;
    Some(LatLon::Converted {
        x: longitude,
        y: latitude,
    })
}

pub fn signed_degrees(number: &str, hemisphere: &str) -> Option<f64> {
    let number: f64 = number.parse().ok()?;
    match hemisphere {
        "N" | "E" => Some(number),
        "S" | "W" => Some(-number),
        _ => None,
    }
}
