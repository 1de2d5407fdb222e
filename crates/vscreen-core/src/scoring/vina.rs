use super::{ScoringError, ScoringFunction};
use crate::core::chem::receptor::PreparedReceptor;
use crate::core::models::molecule::Molecule;
use crate::docking::DockingEngine;
use std::sync::Arc;

/// Rescoring with the Vina scoring function through a docking engine's
/// score-only mode. The engine is already bound to the receptor.
#[derive(Debug, Clone)]
pub struct VinaScorer {
    engine: Arc<dyn DockingEngine>,
}

impl VinaScorer {
    pub fn new(engine: Arc<dyn DockingEngine>) -> Self {
        Self { engine }
    }
}

impl ScoringFunction for VinaScorer {
    fn name(&self) -> &str {
        "vina_affinity"
    }

    fn predict(&self, ligand: &Molecule, _receptor: &PreparedReceptor) -> Result<f64, ScoringError> {
        Ok(self.engine.score_only(ligand)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::DockingError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FixedEngine {
        calls: AtomicUsize,
    }

    impl DockingEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn dock(&self, ligand: &Molecule) -> Result<Vec<Molecule>, DockingError> {
            Ok(vec![ligand.clone()])
        }

        fn score_only(&self, _ligand: &Molecule) -> Result<f64, DockingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(-8.25)
        }
    }

    #[test]
    fn delegates_to_score_only() {
        let engine = Arc::new(FixedEngine::default());
        let scorer = VinaScorer::new(engine.clone());
        let receptor = PreparedReceptor::new(Arc::new(Molecule::new("r", Vec::new(), Vec::new())));
        let ligand = Molecule::new("l", Vec::new(), Vec::new());
        assert_eq!(scorer.predict(&ligand, &receptor).unwrap(), -8.25);
        assert_eq!(scorer.name(), "vina_affinity");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }
}
