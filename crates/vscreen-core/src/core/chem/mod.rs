//! # Chemistry Perception Module
//!
//! Derived chemical knowledge computed from atoms and bonds: rings, aromaticity,
//! implicit hydrogens, pharmacophoric features, whole-molecule descriptors and
//! receptor preparation for interaction-based methods.

pub mod descriptors;
pub mod features;
pub mod perception;
pub mod protein;
pub mod receptor;
