//! Struct archiving functionality
//!
//! Module reports are archived as CSV files in the session's archive
//! directory, one row per processed cycle. To add archiving to a module give
//! it an `Archiver` member, set it up during `init`, and implement the
//! `Archived` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
///
/// The default archiver has no file and discards everything it is given,
/// which is what modules use when running without a session.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    CreateError(std::io::Error),

    #[error("Cannot write the archive record: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the archive file: {0}")]
    FlushError(std::io::Error),
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
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        let arch_path = session.arch_root.join(path);

        if let Some(parent) = arch_path.parent() {
            std::fs::create_dir_all(parent).map_err(ArchiveError::CreateError)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(arch_path)
            .map_err(ArchiveError::CreateError)?;

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// True if this archiver is writing to a file.
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        if let Some(ref mut w) = self.writer {
            w.serialize(record).map_err(ArchiveError::WriteError)?;
            w.flush().map_err(ArchiveError::FlushError)?;
        }

        Ok(())
    }
}
