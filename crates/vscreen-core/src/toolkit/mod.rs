//! # Toolkit Backends
//!
//! A toolkit reads molecules from files and prepares them for the screening
//! stages. Two interchangeable backends exist, mirroring the two chemistry
//! toolkits a screening workflow is usually run with:
//!
//! - [`ob::OpenBabelToolkit`] (`ob`, default) - reads every molecular format and
//!   keeps chemically questionable molecules.
//! - [`rdk::RdkitToolkit`] (`rdk`) - no XYZ support and strict valence
//!   sanitization: offending molecules are skipped.
//!
//! The backend is chosen once with [`ToolkitKind::resolve`] and injected into
//! the pipeline as an `Arc<dyn Toolkit>`.

use crate::core::chem::perception;
use crate::core::io::{self, Format};
use crate::core::models::molecule::Molecule;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub mod ob;
pub mod rdk;

/// Environment variable that forces a toolkit regardless of the command line.
pub const TOOLKIT_ENV_VAR: &str = "VSCREEN_TOOLKIT";

#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Toolkit '{toolkit}' cannot read the '{format}' format")]
    UnsupportedFormat {
        toolkit: &'static str,
        format: Format,
    },

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid toolkit '{0}' (expected 'ob' or 'rdk')")]
    InvalidKind(String),
}

/// A lazy sequence of prepared molecules.
pub type Supplier = Box<dyn Iterator<Item = Result<Molecule, ToolkitError>> + Send>;

pub trait Toolkit: Send + Sync + fmt::Debug {
    /// Short identifier (`"ob"` or `"rdk"`).
    fn name(&self) -> &'static str;

    fn supports(&self, format: Format) -> bool;

    /// Opens `path` and lazily yields its molecules with perception applied.
    fn read_file(&self, format: Format, path: &Path) -> Result<Supplier, ToolkitError>;

    /// Prepares a molecule for use as a docking/scoring/interaction receptor.
    fn mark_receptor(&self, molecule: &mut Molecule) {
        molecule.protein = true;
        perception::assign_implicit_hydrogens(molecule);
    }
}

/// Checks support and existence, then opens the record stream for `path`.
pub(crate) fn open_records(
    toolkit: &dyn Toolkit,
    format: Format,
    path: &Path,
) -> Result<io::MoleculeStream, ToolkitError> {
    if !toolkit.supports(format) {
        return Err(ToolkitError::UnsupportedFormat {
            toolkit: toolkit.name(),
            format,
        });
    }
    if !path.exists() {
        return Err(ToolkitError::NotFound {
            path: path.to_path_buf(),
        });
    }
    io::read_path(format, path).map_err(|source| ToolkitError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Turns a record error into a skipped record (parse errors) or a stream error.
pub(crate) fn triage(
    toolkit: &'static str,
    path: &Path,
    error: io::Error,
) -> Option<Result<Molecule, ToolkitError>> {
    match error {
        io::Error::Parse { .. } => {
            warn!(toolkit, path = %path.display(), "Skipping unreadable record: {}", error);
            None
        }
        source => Some(Err(ToolkitError::Read {
            path: path.to_path_buf(),
            source,
        })),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolkitKind {
    #[default]
    OpenBabel,
    Rdkit,
}

impl ToolkitKind {
    /// Applies the environment override: a non-empty `env` value names the
    /// toolkit to use regardless of `flag`.
    pub fn resolve(flag: ToolkitKind, env: Option<&str>) -> Result<Self, ToolkitError> {
        match env.map(str::trim) {
            Some(value) if !value.is_empty() => value.parse(),
            _ => Ok(flag),
        }
    }

    pub fn build(self) -> Arc<dyn Toolkit> {
        match self {
            Self::OpenBabel => Arc::new(ob::OpenBabelToolkit),
            Self::Rdkit => Arc::new(rdk::RdkitToolkit),
        }
    }
}

impl FromStr for ToolkitKind {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ob" => Ok(Self::OpenBabel),
            "rdk" => Ok(Self::Rdkit),
            other => Err(ToolkitError::InvalidKind(other.to_string())),
        }
    }
}

impl fmt::Display for ToolkitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenBabel => "ob",
            Self::Rdkit => "rdk",
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    pub(crate) const ETHANOL_SDF: &str = "\
ethanol
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5200    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.0000    1.4000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
  2  3  1  0  0  0  0
M  END
$$$$
";

    pub(crate) const PENTAVALENT_SDF: &str = "\
bad carbon
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.3000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.6000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  3  0  0  0  0
  2  3  3  0  0  0  0
M  END
$$$$
";

    pub(crate) fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn env_value_overrides_flag() {
        assert_eq!(ToolkitKind::resolve(ToolkitKind::OpenBabel, Some("rdk")).unwrap(), ToolkitKind::Rdkit);
        assert_eq!(ToolkitKind::resolve(ToolkitKind::Rdkit, Some("ob")).unwrap(), ToolkitKind::OpenBabel);
        assert_eq!(ToolkitKind::resolve(ToolkitKind::Rdkit, None).unwrap(), ToolkitKind::Rdkit);
        assert_eq!(ToolkitKind::resolve(ToolkitKind::Rdkit, Some("  ")).unwrap(), ToolkitKind::Rdkit);
    }

    #[test]
    fn invalid_env_value_is_an_error() {
        assert!(matches!(
            ToolkitKind::resolve(ToolkitKind::OpenBabel, Some("pybel")),
            Err(ToolkitError::InvalidKind(v)) if v == "pybel"
        ));
    }

    #[test]
    fn built_toolkit_reports_its_name() {
        assert_eq!(ToolkitKind::OpenBabel.build().name(), "ob");
        assert_eq!(ToolkitKind::Rdkit.build().name(), "rdk");
    }

    #[test]
    fn missing_file_is_not_found() {
        let toolkit = ToolkitKind::OpenBabel.build();
        let err = toolkit
            .read_file(Format::Sdf, Path::new("/definitely/missing.sdf"))
            .err()
            .unwrap();
        assert!(matches!(err, ToolkitError::NotFound { path } if path.ends_with("missing.sdf")));
    }

    #[test]
    fn mark_receptor_sets_protein_flag() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "lig.sdf", ETHANOL_SDF);
        let toolkit = ToolkitKind::OpenBabel.build();
        let mut mol = toolkit.read_file(Format::Sdf, &path).unwrap().next().unwrap().unwrap();
        assert!(!mol.protein);
        toolkit.mark_receptor(&mut mol);
        assert!(mol.protein);
    }
}
