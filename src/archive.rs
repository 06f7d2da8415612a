use std::fs::File;
use std::io::{Read, Write};

use camino::Utf8Path;
use flate2::read::GzDecoder;
use tar::{Archive, Entries, Entry};

use crate::error::SobsError;

// Entries must be consumed in archive order.
pub struct ArchiveReader<R: Read> {
    archive: Archive<GzDecoder<R>>,
}

impl ArchiveReader<File> {
    pub fn open(path: &Utf8Path) -> Result<Self, SobsError> {
        let file = File::open(path.as_std_path())
            .map_err(|err| SobsError::Archive(format!("open {path}: {err}")))?;
        Ok(Self::new(file))
    }
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            archive: Archive::new(GzDecoder::new(reader)),
        }
    }

    pub fn entries(&mut self) -> Result<ArchiveEntries<'_, R>, SobsError> {
        let entries = self.archive.entries().map_err(archive_error)?;
        Ok(ArchiveEntries { entries })
    }
}

pub struct ArchiveEntries<'a, R: 'a + Read> {
    entries: Entries<'a, GzDecoder<R>>,
}

impl<'a, R: Read> Iterator for ArchiveEntries<'a, R> {
    type Item = Result<ArchiveEntry<'a, R>, SobsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(entry.map_err(archive_error).and_then(ArchiveEntry::new))
    }
}

pub struct ArchiveEntry<'a, R: 'a + Read> {
    name: String,
    inner: Entry<'a, GzDecoder<R>>,
}

impl<'a, R: Read> ArchiveEntry<'a, R> {
    fn new(inner: Entry<'a, GzDecoder<R>>) -> Result<Self, SobsError> {
        let name = inner
            .path()
            .map_err(archive_error)?
            .to_string_lossy()
            .into_owned();
        Ok(Self { name, inner })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_file(&self) -> bool {
        self.inner.header().entry_type().is_file()
    }

    pub fn reader(&mut self) -> Option<&mut dyn Read> {
        if self.is_file() {
            Some(&mut self.inner)
        } else {
            None
        }
    }

    pub fn read_all(&mut self) -> Result<Option<Vec<u8>>, SobsError> {
        let name = self.name.clone();
        let Some(reader) = self.reader() else {
            return Ok(None);
        };
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|err| SobsError::Archive(format!("read {name}: {err}")))?;
        Ok(Some(bytes))
    }
}

pub fn list_members<R: Read, W: Write>(
    archive: &mut ArchiveReader<R>,
    mut out: W,
) -> Result<u64, SobsError> {
    let mut count = 0;
    for entry in archive.entries()? {
        let entry = entry?;
        writeln!(out, "{}", entry.name()).map_err(|err| SobsError::Filesystem(err.to_string()))?;
        count += 1;
    }
    out.flush()
        .map_err(|err| SobsError::Filesystem(err.to_string()))?;
    Ok(count)
}

fn archive_error(err: std::io::Error) -> SobsError {
    SobsError::Archive(err.to_string())
}
