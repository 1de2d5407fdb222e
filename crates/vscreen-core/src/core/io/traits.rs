use super::Format;
use super::compression::{OutputFile, open_input};
use super::error::Error;
use crate::core::models::molecule::Molecule;
use std::io::{BufRead, Write};
use std::path::Path;

/// Defines the interface for reading and writing a molecular file format.
///
/// Readers are lazy: [`MolecularFile::records`] yields one molecule per record
/// so multi-molecule files can be streamed. A malformed record produces an
/// `Err` item and the iterator resumes at the next record.
pub trait MolecularFile {
    /// The format handled by this implementation.
    const FORMAT: Format;

    /// Iterator over the records of a reader.
    type Records<R: BufRead>: Iterator<Item = Result<Molecule, Error>>;

    /// Starts reading records from a buffered reader.
    fn records<R: BufRead>(reader: R) -> Self::Records<R>;

    /// Writes one molecule as a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Error>;

    /// Reads every record of a file, decompressing `.gz` paths.
    ///
    /// # Errors
    ///
    /// Returns the first I/O or parse error encountered.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Molecule>, Error> {
        let reader = open_input(path.as_ref())?;
        Self::records(reader).collect()
    }

    /// Writes all molecules to a file, compressing `.gz` paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn write_all_to_path<P: AsRef<Path>>(molecules: &[Molecule], path: P) -> Result<(), Error> {
        let mut out = OutputFile::create(path.as_ref())?;
        for molecule in molecules {
            Self::write_to(molecule, &mut out)?;
        }
        out.finish()?;
        Ok(())
    }
}
