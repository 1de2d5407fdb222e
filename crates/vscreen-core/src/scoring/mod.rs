//! # Rescoring
//!
//! Scoring functions predict a binding affinity for a (docked) ligand against
//! a prepared receptor. Machine-learned scorers are stored as JSON files that
//! pair a descriptor definition ([`descriptors::Descriptor`]) with a fitted
//! model ([`models::Model`]); see [`loader::load_scorer`]. Built-in scorer
//! names resolve to files in the data directory through
//! [`registry::ScorerRegistry`], except `autodock_vina`, which rescores through
//! the Vina executable ([`vina::VinaScorer`]).

use crate::core::chem::receptor::PreparedReceptor;
use crate::core::models::molecule::Molecule;
use crate::docking::DockingError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub mod descriptors;
pub mod loader;
pub mod models;
pub mod registry;
pub mod vina;

pub use loader::load_scorer;
pub use registry::{ScorerName, ScorerRegistry};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Scoring function file not found or unreadable: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Scoring function '{name}' is not installed (expected {})", path.display())]
    NotInstalled { name: String, path: PathBuf },

    #[error("Unknown scoring function '{0}'")]
    UnknownScorer(String),

    #[error("Invalid scoring function file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Scoring function {}: model expects {model} features but descriptors produce {descriptors}", path.display())]
    WidthMismatch {
        path: PathBuf,
        descriptors: usize,
        model: usize,
    },

    #[error("Invalid model in {}: {details}", path.display())]
    InvalidModel { path: PathBuf, details: String },

    #[error("Failed to write scoring function: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Docking(#[from] DockingError),
}

/// A fitted affinity predictor.
pub trait ScoringFunction: Send + Sync + fmt::Debug {
    /// Data field under which predictions are stored.
    fn name(&self) -> &str;

    fn predict(&self, ligand: &Molecule, receptor: &PreparedReceptor) -> Result<f64, ScoringError>;
}
