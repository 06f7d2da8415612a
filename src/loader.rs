use std::io::Read;

use serde::Serialize;
use tracing::{debug, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::archive::{ArchiveEntry, ArchiveReader};
use crate::domain::{Record, RecordKind};
use crate::error::SobsError;
use crate::mapper;
use crate::store::RecordStore;
use crate::xml::{self, Element};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub samples: u64,
    pub experiments: u64,
    pub runs: u64,
}

impl KindCounts {
    pub fn get(&self, kind: RecordKind) -> u64 {
        match kind {
            RecordKind::Sample => self.samples,
            RecordKind::Experiment => self.experiments,
            RecordKind::Run => self.runs,
        }
    }

    fn get_mut(&mut self, kind: RecordKind) -> &mut u64 {
        match kind {
            RecordKind::Sample => &mut self.samples,
            RecordKind::Experiment => &mut self.experiments,
            RecordKind::Run => &mut self.runs,
        }
    }
}

pub struct BatchLoader<'a, S: RecordStore> {
    store: &'a mut S,
    batch_size: usize,
    sink: &'a dyn ProgressSink,
    totals: KindCounts,
    insert_calls: u64,
}

impl<'a, S: RecordStore> BatchLoader<'a, S> {
    pub fn new(
        store: &'a mut S,
        batch_size: usize,
        sink: &'a dyn ProgressSink,
    ) -> Result<Self, SobsError> {
        if batch_size == 0 {
            return Err(SobsError::Config("batch size must be at least 1".to_string()));
        }
        Ok(Self {
            store,
            batch_size,
            sink,
            totals: KindCounts::default(),
            insert_calls: 0,
        })
    }

    pub fn load<I>(&mut self, kind: RecordKind, records: I) -> Result<u64, SobsError>
    where
        I: IntoIterator<Item = Result<Record, SobsError>>,
    {
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut loaded = 0;

        for record in records {
            batch.push(record?);
            loaded += 1;
            *self.totals.get_mut(kind) += 1;

            if batch.len() >= self.batch_size {
                self.flush(kind, &mut batch)?;
            }
        }

        if !batch.is_empty() {
            self.flush(kind, &mut batch)?;
        }

        Ok(loaded)
    }

    pub fn totals(&self) -> KindCounts {
        self.totals
    }

    pub fn insert_calls(&self) -> u64 {
        self.insert_calls
    }

    fn flush(&mut self, kind: RecordKind, batch: &mut Vec<Record>) -> Result<(), SobsError> {
        self.sink.event(ProgressEvent {
            message: format!("--- inserting batch of {} {kind} records", batch.len()),
            elapsed: None,
        });
        self.store.insert_many(kind, batch)?;
        self.insert_calls += 1;
        batch.clear();

        let rows = self.store.count(kind)?;
        self.sink.event(ProgressEvent {
            message: format!(
                "--- n_{kind}s={}; row count={rows}",
                self.totals.get(kind)
            ),
            elapsed: None,
        });
        Ok(())
    }
}

pub fn read_tree<R: Read>(entry: &mut ArchiveEntry<'_, R>) -> Result<Option<Element>, SobsError> {
    let name = entry.name().to_string();
    let Some(bytes) = entry.read_all()? else {
        return Ok(None);
    };
    debug!(entry = %name, bytes = bytes.len(), "parsing member");
    xml::parse(&name, bytes.as_slice()).map(Some)
}

pub fn count_records<R: Read>(
    archive: &mut ArchiveReader<R>,
    kind: RecordKind,
    skip_malformed: bool,
    sink: &dyn ProgressSink,
) -> Result<u64, SobsError> {
    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        if RecordKind::from_member_name(entry.name()) != Some(kind) {
            continue;
        }
        let root = match read_tree(&mut entry) {
            Ok(Some(root)) => root,
            Ok(None) => continue,
            Err(err @ SobsError::Xml { .. }) if skip_malformed => {
                warn!(entry = entry.name(), error = %err, "skipping malformed member");
                continue;
            }
            Err(err) => return Err(err),
        };
        for record in mapper::records(kind, &root) {
            record?;
            count += 1;
        }
        sink.event(ProgressEvent {
            message: format!("--- {} {kind} records so far ({})", count, entry.name()),
            elapsed: None,
        });
    }
    Ok(count)
}
