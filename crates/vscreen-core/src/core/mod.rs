//! # Core Module
//!
//! Fundamental building blocks shared by every screening stage.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Elements, atoms, bonds and molecules with data fields
//! - **Chemistry Perception** ([`chem`]) - Rings, aromaticity, hydrogens, pharmacophore features and descriptors
//! - **File I/O** ([`io`]) - Streaming readers and writers for SDF, MOL2, PDB, PDBQT and XYZ
//! - **Utilities** ([`utils`]) - Geometry helpers and spatial neighbor search

pub mod chem;
pub mod io;
pub mod models;
pub mod utils;
