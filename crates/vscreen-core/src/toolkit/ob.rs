use super::{Supplier, Toolkit, ToolkitError, open_records, triage};
use crate::core::chem::perception::{perceive, valence_violations};
use crate::core::io::Format;
use std::path::Path;
use tracing::debug;

/// Lenient backend: every molecular format, molecules with valence problems kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenBabelToolkit;

impl Toolkit for OpenBabelToolkit {
    fn name(&self) -> &'static str {
        "ob"
    }

    fn supports(&self, format: Format) -> bool {
        format.is_molecular()
    }

    fn read_file(&self, format: Format, path: &Path) -> Result<Supplier, ToolkitError> {
        let records = open_records(self, format, path)?;
        let path = path.to_path_buf();
        debug!(toolkit = "ob", path = %path.display(), %format, "Opened molecule file");
        Ok(Box::new(records.filter_map(move |record| match record {
            Ok(mut molecule) => {
                perceive(&mut molecule);
                let violations = valence_violations(&molecule);
                if !violations.is_empty() {
                    debug!(title = %molecule.title, atoms = ?violations, "Keeping molecule with unusual valences");
                }
                Some(Ok(molecule))
            }
            Err(e) => triage("ob", &path, e),
        })))
    }
}
