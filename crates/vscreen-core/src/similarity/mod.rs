//! # Similarity Screening
//!
//! Ranks ligands against one or more query molecules. Shape methods
//! ([`shape`]) compare moment descriptors of atomic distance distributions;
//! interaction methods ([`fingerprint`]) compare protein-ligand interaction
//! fingerprints computed against a prepared receptor.
//!
//! A [`SimilarityQuery`] precomputes the query descriptors once and is then
//! shared read-only by all pipeline workers.

use crate::core::chem::receptor::PreparedReceptor;
use crate::core::models::molecule::Molecule;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub mod fingerprint;
pub mod interactions;
pub mod shape;

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("Unknown similarity method '{0}' (expected ifp, sifp, usr, usr_cat or electroshape)")]
    UnknownMethod(String),
    #[error("Similarity method '{0}' requires a receptor")]
    MissingReceptor(SimilarityMethod),
    #[error("Similarity method '{0}' requires at least one query molecule")]
    NoQueries(SimilarityMethod),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimilarityMethod {
    Ifp,
    Sifp,
    Usr,
    UsrCat,
    Electroshape,
}

impl SimilarityMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ifp => "ifp",
            Self::Sifp => "sifp",
            Self::Usr => "usr",
            Self::UsrCat => "usr_cat",
            Self::Electroshape => "electroshape",
        }
    }

    pub fn requires_receptor(self) -> bool {
        matches!(self, Self::Ifp | Self::Sifp)
    }

    /// Data field under which the best similarity of a ligand is stored.
    pub fn data_key(self) -> String {
        format!("{}_similarity", self.as_str())
    }

    fn describe(self, molecule: &Molecule, receptor: Option<&PreparedReceptor>) -> Vec<f64> {
        match (self, receptor) {
            (Self::Usr, _) => shape::usr(molecule),
            (Self::UsrCat, _) => shape::usr_cat(molecule),
            (Self::Electroshape, _) => shape::electroshape(molecule),
            (Self::Ifp, Some(r)) => fingerprint::ifp(molecule, r),
            (Self::Sifp, Some(r)) => fingerprint::sifp(molecule, r),
            (Self::Ifp | Self::Sifp, None) => Vec::new(),
        }
    }

    fn compare(self, a: &[f64], b: &[f64]) -> f64 {
        if self.requires_receptor() {
            fingerprint::dice(a, b)
        } else {
            shape::shape_similarity(a, b)
        }
    }
}

impl FromStr for SimilarityMethod {
    type Err = SimilarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ifp" => Ok(Self::Ifp),
            "sifp" => Ok(Self::Sifp),
            "usr" => Ok(Self::Usr),
            "usr_cat" | "usrcat" => Ok(Self::UsrCat),
            "electroshape" => Ok(Self::Electroshape),
            _ => Err(SimilarityError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A similarity method bound to its query descriptors, receptor and cutoff.
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
    method: SimilarityMethod,
    references: Vec<Vec<f64>>,
    receptor: Option<Arc<PreparedReceptor>>,
    cutoff: f64,
}

impl SimilarityQuery {
    pub fn new(
        method: SimilarityMethod,
        queries: &[Molecule],
        receptor: Option<Arc<PreparedReceptor>>,
        cutoff: f64,
    ) -> Result<Self, SimilarityError> {
        if queries.is_empty() {
            return Err(SimilarityError::NoQueries(method));
        }
        if method.requires_receptor() && receptor.is_none() {
            return Err(SimilarityError::MissingReceptor(method));
        }
        let references = queries
            .iter()
            .map(|q| method.describe(q, receptor.as_deref()))
            .collect();
        Ok(Self {
            method,
            references,
            receptor,
            cutoff,
        })
    }

    pub fn method(&self) -> SimilarityMethod {
        self.method
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Highest similarity of `ligand` to any of the queries.
    pub fn best(&self, ligand: &Molecule) -> f64 {
        let descriptor = self.method.describe(ligand, self.receptor.as_deref());
        self.references
            .iter()
            .map(|r| self.method.compare(&descriptor, r))
            .fold(0.0, f64::max)
    }

    /// Scores `ligand`, records the score in its data fields and reports
    /// whether it reaches the cutoff.
    pub fn annotate(&self, ligand: &mut Molecule) -> bool {
        let score = self.best(ligand);
        ligand.data.set(self.method.data_key(), format!("{score:.3}"));
        score >= self.cutoff
    }
}
