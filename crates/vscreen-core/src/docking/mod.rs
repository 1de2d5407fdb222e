//! # Docking
//!
//! Docking places each ligand into the receptor binding site and returns one
//! molecule per predicted pose. The search itself is delegated to an external
//! engine ([`vina::VinaEngine`]); this module owns the search-box parameters
//! and the engine seam.

use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::{bounding_box, centroid, round_to};
use nalgebra::Vector3;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub mod vina;

/// Padding added around an auto-ligand when deriving the box size.
const AUTO_BOX_PADDING: f64 = 10.0;

#[derive(Debug, Error)]
pub enum DockingError {
    #[error("Unknown docking engine '{0}' (expected 'autodock_vina')")]
    UnknownEngine(String),

    #[error("AutoDock Vina executable not found (looked for {searched})")]
    ExecutableNotFound { searched: String },

    #[error("Invalid docking parameters: {0}")]
    InvalidParams(String),

    #[error("Docking I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] crate::core::io::Error),

    #[error("Docking engine failed for '{ligand}' ({status}): {stderr}")]
    ProcessFailed {
        ligand: String,
        status: String,
        stderr: String,
    },

    #[error("Could not read docking output for '{ligand}': {details}")]
    Output { ligand: String, details: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DockingEngineKind {
    AutodockVina,
}

impl DockingEngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutodockVina => "autodock_vina",
        }
    }
}

impl FromStr for DockingEngineKind {
    type Err = DockingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "autodock_vina" | "vina" => Ok(Self::AutodockVina),
            _ => Err(DockingError::UnknownEngine(s.to_string())),
        }
    }
}

impl fmt::Display for DockingEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search box and sampling settings of a docking run.
#[derive(Debug, Clone, PartialEq)]
pub struct DockingParams {
    pub center: Vector3<f64>,
    pub size: Vector3<f64>,
    pub exhaustiveness: u32,
    pub seed: Option<i64>,
    pub num_modes: u32,
    pub energy_range: f64,
    /// Explicit path of the engine executable; searched on `PATH` when absent.
    pub executable: Option<PathBuf>,
}

impl Default for DockingParams {
    fn default() -> Self {
        Self {
            center: Vector3::zeros(),
            size: Vector3::new(20.0, 20.0, 20.0),
            exhaustiveness: 8,
            seed: None,
            num_modes: 9,
            energy_range: 3.0,
            executable: None,
        }
    }
}

impl DockingParams {
    /// Default parameters with the box fitted around a reference ligand: the
    /// center is the coordinate mean and each edge spans the ligand extent
    /// plus padding, rounded up to whole angstroms.
    pub fn from_auto_ligand(ligand: &Molecule) -> Self {
        let mut params = Self::default();
        let positions = ligand.positions();
        if let (Some(c), Some((min, max))) = (centroid(&positions), bounding_box(&positions)) {
            params.center = c.coords.map(|v| round_to(v, 3));
            params.size = (max - min).map(|extent| (extent + AUTO_BOX_PADDING).ceil());
        }
        params
    }

    pub fn validate(&self) -> Result<(), DockingError> {
        if !self.center.iter().all(|v| v.is_finite()) {
            return Err(DockingError::InvalidParams("box center must be finite".into()));
        }
        if !self.size.iter().all(|v| v.is_finite() && *v > 0.0) {
            return Err(DockingError::InvalidParams(
                "box size components must be positive".into(),
            ));
        }
        if self.exhaustiveness == 0 {
            return Err(DockingError::InvalidParams("exhaustiveness must be at least 1".into()));
        }
        if self.num_modes == 0 {
            return Err(DockingError::InvalidParams("num_modes must be at least 1".into()));
        }
        if self.energy_range.is_nan() || self.energy_range <= 0.0 {
            return Err(DockingError::InvalidParams("energy_range must be positive".into()));
        }
        Ok(())
    }
}

/// A docking backend bound to one receptor and one set of parameters.
pub trait DockingEngine: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Docks `ligand` and returns its poses, best first.
    fn dock(&self, ligand: &Molecule) -> Result<Vec<Molecule>, DockingError>;

    /// Scores `ligand` in place without searching.
    fn score_only(&self, ligand: &Molecule) -> Result<f64, DockingError>;
}
