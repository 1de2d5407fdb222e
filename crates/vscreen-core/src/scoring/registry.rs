use super::loader::load_scorer;
use super::vina::VinaScorer;
use super::{ScoringError, ScoringFunction};
use crate::core::models::molecule::Molecule;
use crate::docking::DockingParams;
use crate::docking::vina::VinaEngine;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const FAMILIES: &[&str] = &[
    "nnscore",
    "rfscore_v1",
    "rfscore_v2",
    "rfscore_v3",
    "pleclinear",
    "plecnn",
    "plecrf",
];
const DATASETS: &[&str] = &[
    "pdbbind2007",
    "pdbbind2012",
    "pdbbind2013",
    "pdbbind2014",
    "pdbbind2015",
    "pdbbind2016",
];
const DEFAULT_DATASET: &str = "pdbbind2016";

/// A built-in scoring function name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScorerName {
    /// Rescoring through the Vina executable.
    AutodockVina,
    /// A fitted model identified by family and training set.
    Trained {
        family: &'static str,
        dataset: &'static str,
    },
}

impl ScorerName {
    /// Parses `family[_pdbbindYYYY]`; `rfscore` is an alias of `rfscore_v1`.
    pub fn parse(name: &str) -> Result<Self, ScoringError> {
        let normalized = name.trim().to_ascii_lowercase();
        if normalized == "autodock_vina" {
            return Ok(Self::AutodockVina);
        }
        let unknown = || ScoringError::UnknownScorer(name.to_string());
        let (family, dataset) = match normalized.rfind("_pdbbind") {
            Some(at) => (&normalized[..at], &normalized[at + 1..]),
            None => (normalized.as_str(), DEFAULT_DATASET),
        };
        let family = if family == "rfscore" { "rfscore_v1" } else { family };
        let family = FAMILIES.iter().copied().find(|f| *f == family).ok_or_else(unknown)?;
        let dataset = DATASETS.iter().copied().find(|d| *d == dataset).ok_or_else(unknown)?;
        Ok(Self::Trained { family, dataset })
    }

    /// File name of a trained scorer inside `<data-dir>/scoring`.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::AutodockVina => None,
            Self::Trained { family, dataset } => Some(format!("{family}_{dataset}.json")),
        }
    }
}

impl fmt::Display for ScorerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutodockVina => f.write_str("autodock_vina"),
            Self::Trained { family, dataset } => write!(f, "{family}_{dataset}"),
        }
    }
}

/// Resolves built-in scorer names against the data directory.
#[derive(Debug, Clone)]
pub struct ScorerRegistry {
    data_dir: PathBuf,
    vina: DockingParams,
}

impl ScorerRegistry {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            vina: DockingParams::default(),
        }
    }

    /// Parameters used when `autodock_vina` rescoring builds its engine.
    pub fn with_vina_params(mut self, params: DockingParams) -> Self {
        self.vina = params;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn scoring_dir(&self) -> PathBuf {
        self.data_dir.join("scoring")
    }

    pub fn path_for(&self, name: &ScorerName) -> Option<PathBuf> {
        name.file_name().map(|f| self.scoring_dir().join(f))
    }

    /// Builds the scorer registered under `name` for use against `receptor`.
    pub fn resolve(&self, name: &str, receptor: &Molecule) -> Result<Arc<dyn ScoringFunction>, ScoringError> {
        let parsed = ScorerName::parse(name)?;
        match &parsed {
            ScorerName::AutodockVina => {
                let engine = VinaEngine::new(receptor, self.vina.clone())?;
                Ok(Arc::new(VinaScorer::new(Arc::new(engine))))
            }
            ScorerName::Trained { .. } => {
                let path = self.scoring_dir().join(parsed.file_name().unwrap_or_default());
                if !path.is_file() {
                    return Err(ScoringError::NotInstalled {
                        name: parsed.to_string(),
                        path,
                    });
                }
                debug!(scorer = %parsed, path = %path.display(), "Resolved built-in scoring function");
                load_scorer(&path)
            }
        }
    }
}
