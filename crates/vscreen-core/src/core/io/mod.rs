//! # Molecular File I/O
//!
//! Readers and writers for the molecular formats vscreen exchanges with other
//! tools, plus the format-token resolution used by the command line.
//!
//! | Format  | Read | Write | Notes                                  |
//! |---------|------|-------|----------------------------------------|
//! | `sdf`   | yes  | yes   | V2000, data items preserved            |
//! | `mol2`  | yes  | yes   | Tripos, partial charges preserved      |
//! | `pdb`   | yes  | yes   | bonds from `CONECT` plus distances     |
//! | `pdbqt` | yes  | yes   | AutoDock types, Vina result remarks    |
//! | `xyz`   | yes  | yes   | bonds perceived from distances         |
//! | `csv`   | no   | yes   | tabular data fields only               |
//!
//! Any path ending in `.gz` is transparently (de)compressed.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

pub mod compression;
pub mod error;
pub(crate) mod lines;
pub mod mol2;
pub mod pdb;
pub mod pdbqt;
pub mod sdf;
pub mod traits;
pub mod xyz;

pub use compression::{OutputFile, open_input};
pub use error::Error;
use traits::MolecularFile;

use crate::core::models::molecule::Molecule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Sdf,
    Mol2,
    Pdb,
    Pdbqt,
    Xyz,
    Csv,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sdf => "sdf",
            Self::Mol2 => "mol2",
            Self::Pdb => "pdb",
            Self::Pdbqt => "pdbqt",
            Self::Xyz => "xyz",
            Self::Csv => "csv",
        }
    }

    /// Whether molecules (rather than only their data fields) can be stored.
    pub fn is_molecular(self) -> bool {
        self != Self::Csv
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sdf" | "sd" | "mol" => Ok(Self::Sdf),
            "mol2" => Ok(Self::Mol2),
            "pdb" | "ent" => Ok(Self::Pdb),
            "pdbqt" => Ok(Self::Pdbqt),
            "xyz" => Ok(Self::Xyz),
            "csv" => Ok(Self::Csv),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the format token for a file.
///
/// An explicit token wins and is returned verbatim. Otherwise the token is the
/// last dot-separated segment of the file name, or the second-to-last when the
/// name ends in `.gz`. Names without such a segment resolve to `None`.
pub fn resolve_format(explicit: Option<&str>, path: &Path) -> Option<String> {
    if let Some(token) = explicit {
        return Some(token.to_string());
    }
    let name = path.file_name()?.to_str()?;
    let mut segments: Vec<&str> = name.split('.').collect();
    if segments.len() > 1
        && segments
            .last()
            .is_some_and(|s| s.eq_ignore_ascii_case("gz"))
    {
        segments.pop();
    }
    if segments.len() < 2 {
        return None;
    }
    segments
        .last()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// A lazily parsed sequence of molecules.
pub type MoleculeStream = Box<dyn Iterator<Item = Result<Molecule, Error>> + Send>;

/// Streams the molecules of `reader` in the given format.
pub fn read_stream(format: Format, reader: Box<dyn BufRead + Send>) -> Result<MoleculeStream, Error> {
    match format {
        Format::Sdf => Ok(Box::new(sdf::SdfFile::records(reader))),
        Format::Mol2 => Ok(Box::new(mol2::Mol2File::records(reader))),
        Format::Pdb => Ok(Box::new(pdb::PdbFile::records(reader))),
        Format::Pdbqt => Ok(Box::new(pdbqt::PdbqtFile::records(reader))),
        Format::Xyz => Ok(Box::new(xyz::XyzFile::records(reader))),
        Format::Csv => Err(Error::UnsupportedReadFormat(format)),
    }
}

/// Opens `path` (decompressing `.gz`) and streams its molecules.
pub fn read_path(format: Format, path: &Path) -> Result<MoleculeStream, Error> {
    read_stream(format, open_input(path)?)
}

/// Writes a single molecule record in the given molecular format.
pub fn write_molecule(format: Format, molecule: &Molecule, mut writer: &mut dyn Write) -> Result<(), Error> {
    match format {
        Format::Sdf => sdf::SdfFile::write_to(molecule, &mut writer),
        Format::Mol2 => mol2::Mol2File::write_to(molecule, &mut writer),
        Format::Pdb => pdb::PdbFile::write_to(molecule, &mut writer),
        Format::Pdbqt => pdbqt::PdbqtFile::write_to(molecule, &mut writer),
        Format::Xyz => xyz::XyzFile::write_to(molecule, &mut writer),
        Format::Csv => Err(Error::UnsupportedWriteFormat(format)),
    }
}
