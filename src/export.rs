use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::coords::{LatLon, parse_lat_lon};
use crate::error::SobsError;

pub const DEFAULT_ORGANISM: &str = "soil metagenome";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Option<String>>),
}

impl Field {
    // Lists are joined with `;`, commas become `_`, newlines are dropped.
    pub fn render(&self) -> String {
        let raw = match self {
            Field::Null => String::new(),
            Field::Integer(value) => value.to_string(),
            Field::Float(value) => format!("{value:?}"),
            Field::Text(value) => value.clone(),
            Field::List(values) => values
                .iter()
                .map(|value| value.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(";"),
        };
        raw.replace(',', "_").replace('\n', "")
    }

    fn first_text(&self) -> Option<&str> {
        match self {
            Field::Text(value) => Some(value.as_str()),
            Field::List(values) => values.first()?.as_deref(),
            _ => None,
        }
    }
}

pub type Row = BTreeMap<String, Field>;

pub fn geolocate(rows: Vec<Row>, sink: &dyn ProgressSink) -> Vec<Row> {
    let mut written = 0usize;
    let mut out = Vec::new();

    for mut row in rows {
        let Some(text) = row.get("lat_lon").and_then(Field::first_text) else {
            continue;
        };
        let LatLon::Converted { x, y } = parse_lat_lon(text) else {
            continue;
        };

        row.insert("x".to_string(), Field::Float(x));
        row.insert("y".to_string(), Field::Float(y));
        written += 1;
        if written % 1000 == 0 {
            sink.event(ProgressEvent {
                message: format!("---> written {written} records"),
                elapsed: None,
            });
        }
        out.push(row);
    }

    out
}

pub fn header(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn write_csv<W: Write>(rows: &[Row], out: W) -> Result<(), SobsError> {
    let header = header(rows);
    if header.is_empty() {
        return Ok(());
    }

    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(&header)
        .map_err(|err| SobsError::Csv(err.to_string()))?;
    for row in rows {
        let record = header
            .iter()
            .map(|key| row.get(key).map(Field::render).unwrap_or_default());
        writer
            .write_record(record)
            .map_err(|err| SobsError::Csv(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| SobsError::Csv(err.to_string()))
}
