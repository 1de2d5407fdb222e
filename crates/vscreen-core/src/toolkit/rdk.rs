use super::{Supplier, Toolkit, ToolkitError, open_records, triage};
use crate::core::chem::perception::{perceive, valence_violations};
use crate::core::io::Format;
use std::path::Path;
use tracing::{debug, warn};

/// Strict backend: no XYZ input, and molecules failing valence sanitization
/// are dropped from the stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct RdkitToolkit;

impl Toolkit for RdkitToolkit {
    fn name(&self) -> &'static str {
        "rdk"
    }

    fn supports(&self, format: Format) -> bool {
        matches!(format, Format::Sdf | Format::Mol2 | Format::Pdb | Format::Pdbqt)
    }

    fn read_file(&self, format: Format, path: &Path) -> Result<Supplier, ToolkitError> {
        let records = open_records(self, format, path)?;
        let path = path.to_path_buf();
        debug!(toolkit = "rdk", path = %path.display(), %format, "Opened molecule file");
        Ok(Box::new(records.filter_map(move |record| match record {
            Ok(mut molecule) => {
                perceive(&mut molecule);
                let violations = valence_violations(&molecule);
                if violations.is_empty() {
                    Some(Ok(molecule))
                } else {
                    warn!(
                        title = %molecule.title,
                        path = %path.display(),
                        "Skipping molecule that failed sanitization: explicit valence too high for atoms {:?}",
                        violations.iter().map(|i| i + 1).collect::<Vec<_>>()
                    );
                    None
                }
            }
            Err(e) => triage("rdk", &path, e),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::tests::{ETHANOL_SDF, PENTAVALENT_SDF, write_fixture};
    use tempfile::TempDir;

    #[test]
    fn skips_molecules_failing_sanitization() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "mixed.sdf", &format!("{PENTAVALENT_SDF}{ETHANOL_SDF}"));
        let mols: Vec<_> = RdkitToolkit
            .read_file(Format::Sdf, &path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(mols.len(), 1);
        assert_eq!(mols[0].title, "ethanol");
    }

    #[test]
    fn xyz_is_unsupported() {
        let err = RdkitToolkit.read_file(Format::Xyz, Path::new("a.xyz")).err().unwrap();
        assert!(matches!(
            err,
            ToolkitError::UnsupportedFormat {
                toolkit: "rdk",
                format: Format::Xyz
            }
        ));
    }
}
