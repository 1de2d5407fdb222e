use super::error::PipelineError;
use crate::core::chem::receptor::PreparedReceptor;
use crate::core::models::molecule::Molecule;
use crate::docking::DockingEngine;
use crate::filters::Filter;
use crate::scoring::ScoringFunction;
use crate::similarity::SimilarityQuery;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{instrument, trace, warn};

/// One step of the screening pipeline. A stage maps a molecule to zero
/// (rejected), one (annotated) or several (docked poses) molecules.
pub(crate) trait Stage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn apply(&self, molecule: Molecule) -> Result<Vec<Molecule>, PipelineError>;

    /// Inputs dropped so far because the stage could not process them.
    fn skipped(&self) -> usize {
        0
    }
}

#[derive(Debug)]
pub(crate) struct FilterStage {
    filter: Filter,
}

impl FilterStage {
    pub(crate) fn new(filter: Filter) -> Self {
        Self { filter }
    }
}

impl Stage for FilterStage {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn apply(&self, molecule: Molecule) -> Result<Vec<Molecule>, PipelineError> {
        if self.filter.passes(&molecule) {
            Ok(vec![molecule])
        } else {
            trace!(title = %molecule.title, filter = %self.filter, "Rejected by filter");
            Ok(Vec::new())
        }
    }
}

#[derive(Debug)]
pub(crate) struct SimilarityStage {
    query: SimilarityQuery,
}

impl SimilarityStage {
    pub(crate) fn new(query: SimilarityQuery) -> Self {
        Self { query }
    }
}

impl Stage for SimilarityStage {
    fn name(&self) -> &'static str {
        "similarity"
    }

    fn apply(&self, mut molecule: Molecule) -> Result<Vec<Molecule>, PipelineError> {
        if self.query.annotate(&mut molecule) {
            Ok(vec![molecule])
        } else {
            trace!(
                title = %molecule.title,
                method = %self.query.method(),
                cutoff = self.query.cutoff(),
                "Below similarity cutoff"
            );
            Ok(Vec::new())
        }
    }
}

#[derive(Debug)]
pub(crate) struct DockingStage {
    engine: Arc<dyn DockingEngine>,
    skipped: AtomicUsize,
}

impl DockingStage {
    pub(crate) fn new(engine: Arc<dyn DockingEngine>) -> Self {
        Self {
            engine,
            skipped: AtomicUsize::new(0),
        }
    }
}

impl Stage for DockingStage {
    fn name(&self) -> &'static str {
        "docking"
    }

    fn apply(&self, molecule: Molecule) -> Result<Vec<Molecule>, PipelineError> {
        match self.engine.dock(&molecule) {
            Ok(poses) => Ok(poses),
            Err(e) => {
                warn!(title = %molecule.title, engine = self.engine.name(), "Skipping ligand that failed to dock: {}", e);
                self.skipped.fetch_add(1, Ordering::Relaxed);
                Ok(Vec::new())
            }
        }
    }

    fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub(crate) struct ScoringStage {
    function: Arc<dyn ScoringFunction>,
    receptor: Arc<PreparedReceptor>,
}

impl ScoringStage {
    pub(crate) fn new(function: Arc<dyn ScoringFunction>, receptor: Arc<PreparedReceptor>) -> Self {
        Self { function, receptor }
    }
}

impl Stage for ScoringStage {
    fn name(&self) -> &'static str {
        "scoring"
    }

    fn apply(&self, mut molecule: Molecule) -> Result<Vec<Molecule>, PipelineError> {
        let score = self.function.predict(&molecule, &self.receptor)?;
        molecule.data.set(self.function.name(), format!("{score:.3}"));
        Ok(vec![molecule])
    }
}

/// Pushes one input molecule through every stage in order. A stage error
/// replaces all results of that input with the error.
#[instrument(level = "trace", skip_all, fields(title = %molecule.title))]
pub(crate) fn process(stages: &[Arc<dyn Stage>], molecule: Molecule) -> Vec<Result<Molecule, PipelineError>> {
    let mut current = vec![molecule];
    for stage in stages {
        let mut next = Vec::with_capacity(current.len());
        for m in current {
            match stage.apply(m) {
                Ok(out) => next.extend(out),
                Err(e) => {
                    trace!(stage = stage.name(), "Stage failed");
                    return vec![Err(e)];
                }
            }
        }
        if next.is_empty() {
            return Vec::new();
        }
        current = next;
    }
    current.into_iter().map(Ok).collect()
}
