use std::fs::File;
use std::io::{BufWriter, Read};
use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tracing::warn;

use crate::archive::{self, ArchiveReader};
use crate::config::{ExportOptions, LoadOptions};
use crate::domain::RecordKind;
use crate::error::SobsError;
use crate::export;
use crate::loader::{self, BatchLoader, KindCounts};
use crate::mapper;
use crate::store::RecordStore;

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub records: KindCounts,
    pub rows: KindCounts,
    pub entries_loaded: u64,
    pub entries_skipped: u64,
    pub insert_calls: u64,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResult {
    pub kind: RecordKind,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MembersResult {
    pub members: u64,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub organism: String,
    pub rows_scanned: usize,
    pub rows_written: usize,
    pub output: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> App<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn load<R: Read>(
        &mut self,
        archive: &mut ArchiveReader<R>,
        options: &LoadOptions,
        sink: &dyn ProgressSink,
    ) -> Result<LoadSummary, SobsError> {
        let start = Instant::now();

        sink.event(ProgressEvent {
            message: "--- dropping existing data".to_string(),
            elapsed: None,
        });
        self.store.reset()?;
        sink.event(ProgressEvent {
            message: "--- migrating up!".to_string(),
            elapsed: None,
        });

        let mut loader = BatchLoader::new(&mut self.store, options.batch_size, sink)?;
        let mut entries_loaded = 0;
        let mut entries_skipped = 0;

        for entry in archive.entries()? {
            let mut entry = entry?;
            sink.event(ProgressEvent {
                message: format!("--- loading {}", entry.name()),
                elapsed: Some(start.elapsed()),
            });

            let Some(kind) = RecordKind::from_member_name(entry.name()) else {
                continue;
            };
            let root = match loader::read_tree(&mut entry) {
                Ok(Some(root)) => root,
                Ok(None) => continue,
                Err(err @ SobsError::Xml { .. }) if options.skip_malformed => {
                    warn!(entry = entry.name(), error = %err, "skipping malformed member");
                    entries_skipped += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };

            loader.load(kind, mapper::records(kind, &root))?;
            entries_loaded += 1;
        }

        let records = loader.totals();
        let insert_calls = loader.insert_calls();

        let rows = KindCounts {
            samples: self.store.count(RecordKind::Sample)?,
            experiments: self.store.count(RecordKind::Experiment)?,
            runs: self.store.count(RecordKind::Run)?,
        };

        Ok(LoadSummary {
            records,
            rows,
            entries_loaded,
            entries_skipped,
            insert_calls,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }

    pub fn export(
        &self,
        options: &ExportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ExportSummary, SobsError> {
        sink.event(ProgressEvent {
            message: "querying database".to_string(),
            elapsed: None,
        });
        let rows = self.store.organism_rows(&options.organism)?;
        let rows_scanned = rows.len();

        sink.event(ProgressEvent {
            message: "munging coordinates".to_string(),
            elapsed: None,
        });
        let rows = export::geolocate(rows, sink);

        sink.event(ProgressEvent {
            message: "writing results".to_string(),
            elapsed: None,
        });
        let file = File::create(options.output.as_std_path()).map_err(|err| {
            SobsError::Filesystem(format!("create {}: {err}", options.output))
        })?;
        export::write_csv(&rows, BufWriter::new(file))?;

        Ok(ExportSummary {
            organism: options.organism.clone(),
            rows_scanned,
            rows_written: rows.len(),
            output: options.output.to_string(),
        })
    }
}

pub fn count<R: Read>(
    archive: &mut ArchiveReader<R>,
    kind: RecordKind,
    skip_malformed: bool,
    sink: &dyn ProgressSink,
) -> Result<CountResult, SobsError> {
    let count = loader::count_records(archive, kind, skip_malformed, sink)?;
    Ok(CountResult { kind, count })
}

pub fn list_members<R: Read>(
    archive: &mut ArchiveReader<R>,
    output: &Utf8Path,
    sink: &dyn ProgressSink,
) -> Result<MembersResult, SobsError> {
    let file = File::create(output.as_std_path())
        .map_err(|err| SobsError::Filesystem(format!("create {output}: {err}")))?;
    let members = archive::list_members(archive, BufWriter::new(file))?;
    sink.event(ProgressEvent {
        message: format!("{members} members"),
        elapsed: None,
    });
    Ok(MembersResult {
        members,
        output: output.to_string(),
    })
}
