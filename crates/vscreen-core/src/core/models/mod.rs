//! # Core Models Module
//!
//! Data structures used to represent molecules throughout vscreen.
//!
//! ## Key Components
//!
//! - [`element`] - Element identities and their static properties
//! - [`atom`] - Atoms with coordinates, charges and optional residue membership
//! - [`topology`] - Bonds and bond orders
//! - [`molecule`] - Molecules with connectivity, rings and ordered data fields
//!
//! Ligands, query molecules and receptors share the same [`molecule::Molecule`]
//! type; receptors are distinguished by the `protein` flag set during preparation.

pub mod atom;
pub mod element;
pub mod molecule;
pub mod topology;
