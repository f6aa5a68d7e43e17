//! CSV archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait
//! and give it one or more `Archiver` members set up in its constructor.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<Box<dyn Write + Send>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while writing or reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Could not create the archive file: {0}")]
    CreateError(std::io::Error),

    #[error("Could not write to the archive: {0}")]
    WriteError(csv::Error),

    #[error("Could not flush the archive: {0}")]
    FlushError(std::io::Error),

    #[error("Could not read the archive: {0}")]
    ReadError(csv::Error),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a csv.
pub trait Archived {
    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    ///
    /// Any existing file at the path is truncated.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session,
        path: P,
        delimiter: u8,
    ) -> Result<Self, ArchiveError> {
        let session_path = session.arch_root.join(path);

        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent).map_err(ArchiveError::CreateError)?;
        }

        let file = File::create(session_path).map_err(ArchiveError::CreateError)?;

        Ok(Self::from_writer(file, delimiter))
    }

    /// Create a new archiver writing into any writer.
    pub fn from_writer<W: Write + Send + 'static>(writer: W, delimiter: u8) -> Self {
        let w = WriterBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_writer(Box::new(writer) as Box<dyn Write + Send>);

        Self { writer: w }
    }

    /// Serialise a record into the archive.
    ///
    /// When the record is a struct its field names are written as the header
    /// before the first record.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        self.writer
            .serialize(record)
            .map_err(ArchiveError::WriteError)?;
        self.flush()
    }

    /// Write a raw row of fields into the archive.
    pub fn write_row<I, F>(&mut self, fields: I) -> Result<(), ArchiveError>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        self.writer
            .write_record(fields)
            .map_err(ArchiveError::WriteError)?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), ArchiveError> {
        self.writer.flush().map_err(ArchiveError::FlushError)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read a delimited archive back into its header and records.
pub fn read_archive<R: Read>(
    reader: R,
    delimiter: u8,
) -> Result<(StringRecord, Vec<StringRecord>), ArchiveError> {
    let mut r = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let header = r.headers().map_err(ArchiveError::ReadError)?.clone();
    let records = r
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(ArchiveError::ReadError)?;

    Ok((header, records))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Writer which shares its buffer so the test can inspect what was written.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(Serialize)]
    struct Report {
        tick: u64,
        num_arrived: usize,
    }

    #[test]
    fn test_serialise_writes_header_once() {
        let buf = SharedBuf::default();
        let mut arch = Archiver::from_writer(buf.clone(), b',');

        arch.serialise(Report { tick: 1, num_arrived: 0 }).unwrap();
        arch.serialise(Report { tick: 2, num_arrived: 3 }).unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "tick,num_arrived\n1,0\n2,3\n");
    }

    #[test]
    fn test_rows_read_back() {
        let buf = SharedBuf::default();
        let mut arch = Archiver::from_writer(buf.clone(), b' ');

        arch.write_row(&["A", "B"]).unwrap();
        arch.write_row(&["1.5", "-2"]).unwrap();

        let bytes = buf.0.lock().unwrap().clone();
        let (header, records) = read_archive(bytes.as_slice(), b' ').unwrap();

        assert_eq!(header.iter().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(0), Some("1.5"));
        assert_eq!(records[0].get(1), Some("-2"));
    }
}
