use camino::Utf8Path;
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::{Attributes, Experiment, Record, RecordKind, Run, Sample};
use crate::error::SobsError;
use crate::export::{Field, Row};

pub trait RecordStore {
    fn reset(&mut self) -> Result<(), SobsError>;

    // All or nothing.
    fn insert_many(&mut self, kind: RecordKind, batch: &[Record]) -> Result<(), SobsError>;

    fn count(&self, kind: RecordKind) -> Result<u64, SobsError>;

    fn organism_rows(&self, pattern: &str) -> Result<Vec<Row>, SobsError>;
}

const DROP_TABLES: &str = "
DROP TABLE IF EXISTS sample;
DROP TABLE IF EXISTS experiment;
DROP TABLE IF EXISTS run;
";

const CREATE_TABLES: &str = "
CREATE TABLE experiment (
    id TEXT PRIMARY KEY NOT NULL CHECK (length(id) <= 255),
    sample_accession TEXT CHECK (length(sample_accession) <= 255),
    description TEXT,
    library_name TEXT CHECK (length(library_name) <= 255),
    library_strategy TEXT CHECK (length(library_strategy) <= 255),
    library_source TEXT CHECK (length(library_source) <= 255),
    library_selection TEXT CHECK (length(library_selection) <= 255),
    library_layout TEXT CHECK (length(library_layout) <= 255),
    platform_type TEXT CHECK (length(platform_type) <= 255),
    platform_instrument_model TEXT CHECK (length(platform_instrument_model) <= 255)
);
CREATE INDEX experiment_sample_accession ON experiment (sample_accession);

CREATE TABLE sample (
    id TEXT PRIMARY KEY NOT NULL CHECK (length(id) <= 255),
    taxid INTEGER,
    scientific_name TEXT CHECK (length(scientific_name) <= 255),
    attributes TEXT NOT NULL CHECK (json_valid(attributes))
);
CREATE INDEX sample_taxid ON sample (taxid);

CREATE TABLE run (
    id TEXT PRIMARY KEY NOT NULL CHECK (length(id) <= 255),
    experiment_accession TEXT CHECK (length(experiment_accession) <= 255),
    title TEXT CHECK (length(title) <= 255)
);
CREATE INDEX run_experiment_accession ON run (experiment_accession);
";

const ORGANISM_QUERY: &str = "
SELECT
    experiment.id AS experiment_accession,
    sample.id AS sample_accession,
    sample.scientific_name AS scientific_name,
    sample.taxid AS taxid,
    run.id AS run_accession,
    experiment.library_name AS library_name,
    experiment.library_strategy AS library_strategy,
    experiment.library_source AS library_source,
    experiment.library_selection AS library_selection,
    experiment.library_layout AS library_layout,
    experiment.platform_type AS platform_type,
    experiment.platform_instrument_model AS platform_instrument_model,
    run.title AS title,
    json_extract(sample.attributes, '$.lat_lon') AS lat_lon,
    json_extract(sample.attributes, '$.geo_loc_name') AS geo_loc_name
FROM experiment
LEFT JOIN sample ON experiment.sample_accession = sample.id
LEFT JOIN run ON run.experiment_accession = experiment.id
WHERE sample.scientific_name LIKE ?1
";

// Columns holding a JSON list of attribute values.
const LIST_COLUMNS: [&str; 2] = ["lat_lon", "geo_loc_name"];

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Utf8Path) -> Result<Self, SobsError> {
        let conn = Connection::open(path.as_std_path())
            .map_err(|err| SobsError::Store(format!("open {path}: {err}")))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, SobsError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn records(&self, kind: RecordKind) -> Result<Vec<Record>, SobsError> {
        match kind {
            RecordKind::Sample => {
                let mut stmt = self.conn.prepare_cached(
                    "SELECT id, taxid, scientific_name, attributes FROM sample ORDER BY id",
                )?;
                let rows = stmt.query_map([], |row| {
                    let attributes: String = row.get(3)?;
                    let attributes: Attributes = serde_json::from_str(&attributes)
                        .map_err(|err| {
                            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(err))
                        })?;
                    Ok(Record::Sample {
                        id: row.get(0)?,
                        sample: Sample {
                            taxid: row.get(1)?,
                            scientific_name: row.get(2)?,
                            attributes,
                        },
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            RecordKind::Experiment => {
                let mut stmt = self.conn.prepare_cached(
                    "SELECT id, sample_accession, description, library_name, library_strategy,
                            library_source, library_selection, library_layout, platform_type,
                            platform_instrument_model
                     FROM experiment ORDER BY id",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(Record::Experiment {
                        id: row.get(0)?,
                        experiment: Experiment {
                            sample_accession: row.get(1)?,
                            description: row.get(2)?,
                            library_name: row.get(3)?,
                            library_strategy: row.get(4)?,
                            library_source: row.get(5)?,
                            library_selection: row.get(6)?,
                            library_layout: row.get(7)?,
                            platform_type: row.get(8)?,
                            platform_instrument_model: row.get(9)?,
                        },
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            RecordKind::Run => {
                let mut stmt = self.conn.prepare_cached(
                    "SELECT id, experiment_accession, title FROM run ORDER BY id",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(Record::Run {
                        id: row.get(0)?,
                        run: Run {
                            experiment_accession: row.get(1)?,
                            title: row.get(2)?,
                        },
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
        }
    }

    pub fn sample(&self, id: &str) -> Result<Option<Sample>, SobsError> {
        let row = self
            .conn
            .query_row(
                "SELECT taxid, scientific_name, attributes FROM sample WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((taxid, scientific_name, attributes)) = row else {
            return Ok(None);
        };
        let attributes = serde_json::from_str(&attributes)
            .map_err(|err| SobsError::Store(format!("sample {id} attributes: {err}")))?;
        Ok(Some(Sample {
            taxid,
            scientific_name,
            attributes,
        }))
    }

    fn insert_batch(&mut self, batch: &[Record]) -> Result<(), String> {
        let tx = self.conn.transaction().map_err(|err| err.to_string())?;
        for record in batch {
            insert_record(&tx, record).map_err(|err| format!("{}: {err}", record.id()))?;
        }
        tx.commit().map_err(|err| err.to_string())
    }
}

impl RecordStore for SqliteStore {
    fn reset(&mut self) -> Result<(), SobsError> {
        self.conn.execute_batch(DROP_TABLES)?;
        self.conn.execute_batch(CREATE_TABLES)?;
        Ok(())
    }

    fn insert_many(&mut self, kind: RecordKind, batch: &[Record]) -> Result<(), SobsError> {
        self.insert_batch(batch).map_err(|message| SobsError::Insert {
            kind: kind.to_string(),
            message,
            batch: serde_json::to_string_pretty(batch)
                .unwrap_or_else(|err| format!("<unprintable batch: {err}>")),
        })
    }

    fn count(&self, kind: RecordKind) -> Result<u64, SobsError> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.as_str());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn organism_rows(&self, pattern: &str) -> Result<Vec<Row>, SobsError> {
        let mut stmt = self.conn.prepare(ORGANISM_QUERY)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let rows = stmt.query_map(params![pattern], |row| {
            let mut out = Row::new();
            for (idx, column) in columns.iter().enumerate() {
                let field = match row.get_ref(idx)? {
                    ValueRef::Null => Field::Null,
                    ValueRef::Integer(value) => Field::Integer(value),
                    ValueRef::Real(value) => Field::Float(value),
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                        let text = String::from_utf8_lossy(bytes).into_owned();
                        if LIST_COLUMNS.contains(&column.as_str()) {
                            list_field(&text).map_err(|err| {
                                rusqlite::Error::FromSqlConversionFailure(
                                    idx,
                                    Type::Text,
                                    Box::new(err),
                                )
                            })?
                        } else {
                            Field::Text(text)
                        }
                    }
                };
                out.insert(column.clone(), field);
            }
            Ok(out)
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn insert_record(tx: &rusqlite::Transaction<'_>, record: &Record) -> Result<(), SobsError> {
    match record {
        Record::Sample { id, sample } => {
            let attributes = serde_json::to_string(&sample.attributes)
                .map_err(|err| SobsError::Store(err.to_string()))?;
            tx.prepare_cached(
                "INSERT INTO sample (id, taxid, scientific_name, attributes)
                 VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![id, sample.taxid, sample.scientific_name, attributes])?;
        }
        Record::Experiment { id, experiment } => {
            tx.prepare_cached(
                "INSERT INTO experiment (id, sample_accession, description, library_name,
                    library_strategy, library_source, library_selection, library_layout,
                    platform_type, platform_instrument_model)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?
            .execute(params![
                id,
                experiment.sample_accession,
                experiment.description,
                experiment.library_name,
                experiment.library_strategy,
                experiment.library_source,
                experiment.library_selection,
                experiment.library_layout,
                experiment.platform_type,
                experiment.platform_instrument_model,
            ])?;
        }
        Record::Run { id, run } => {
            tx.prepare_cached(
                "INSERT INTO run (id, experiment_accession, title) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![id, run.experiment_accession, run.title])?;
        }
    }
    Ok(())
}

// A JSON list of values, or a bare JSON scalar treated as a one-item list.
fn list_field(text: &str) -> Result<Field, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };
    Ok(Field::List(
        items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Null => None,
                serde_json::Value::String(text) => Some(text),
                other => Some(other.to_string()),
            })
            .collect(),
    ))
}
