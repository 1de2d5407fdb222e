use super::descriptors::Descriptor;
use super::models::Model;
use super::{ScoringError, ScoringFunction};
use crate::core::chem::receptor::PreparedReceptor;
use crate::core::models::molecule::Molecule;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// On-disk layout of a serialized scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScorerFile {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub descriptors: Descriptor,
    pub model: Model,
}

fn default_version() -> u32 {
    1
}

impl ScorerFile {
    pub fn save(&self, path: &Path) -> Result<(), ScoringError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|source| ScoringError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush()?;
        Ok(())
    }
}

/// A descriptor/model pair loaded from a scorer file.
#[derive(Debug, Clone)]
pub struct TrainedScorer {
    name: String,
    descriptors: Descriptor,
    model: Model,
}

impl ScoringFunction for TrainedScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, ligand: &Molecule, receptor: &PreparedReceptor) -> Result<f64, ScoringError> {
        let features = self.descriptors.compute(ligand, receptor);
        Ok(self.model.predict(&features))
    }
}

/// Loads a serialized scoring function, checking that the model consumes
/// exactly what the descriptors produce.
pub fn load_scorer(path: &Path) -> Result<Arc<dyn ScoringFunction>, ScoringError> {
    let file = File::open(path).map_err(|_| ScoringError::NotFound {
        path: path.to_path_buf(),
    })?;
    let scorer: ScorerFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ScoringError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    scorer.model.validate().map_err(|details| ScoringError::InvalidModel {
        path: path.to_path_buf(),
        details,
    })?;
    let (descriptors, model) = (scorer.descriptors.width(), scorer.model.input_width());
    if descriptors != model {
        return Err(ScoringError::WidthMismatch {
            path: path.to_path_buf(),
            descriptors,
            model,
        });
    }
    debug!(name = %scorer.name, path = %path.display(), width = descriptors, "Loaded scoring function");
    Ok(Arc::new(TrainedScorer {
        name: scorer.name,
        descriptors: scorer.descriptors,
        model: scorer.model,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::perception::{perceive, tests::benzene};
    use crate::scoring::descriptors::tests::pocket;
    use std::fs;
    use tempfile::TempDir;

    fn linear_v1(weights: usize) -> ScorerFile {
        ScorerFile {
            name: "rfscore_v1_test".into(),
            version: 1,
            descriptors: Descriptor::rfscore_v1(),
            model: Model::Linear {
                weights: vec![0.1; weights],
                intercept: 1.0,
            },
        }
    }

    #[test]
    fn loads_and_predicts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scorer.json");
        linear_v1(36).save(&path).unwrap();

        let scorer = load_scorer(&path).unwrap();
        assert_eq!(scorer.name(), "rfscore_v1_test");
        let mut ligand = benzene(false);
        perceive(&mut ligand);
        let value = scorer.predict(&ligand, &pocket()).unwrap();
        assert!((value - (1.0 + 0.1 * 18.0)).abs() < 1e-9);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_scorer(Path::new("bogus.pkl")).unwrap_err();
        assert!(matches!(err, ScoringError::NotFound { path } if path == Path::new("bogus.pkl")));
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        linear_v1(10).save(&path).unwrap();
        assert!(matches!(
            load_scorer(&path),
            Err(ScoringError::WidthMismatch {
                descriptors: 36,
                model: 10,
                ..
            })
        ));
    }

    #[test]
    fn non_json_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.pkl");
        fs::write(&path, b"\x80\x04binary pickle").unwrap();
        assert!(matches!(load_scorer(&path), Err(ScoringError::Parse { .. })));
    }
}
