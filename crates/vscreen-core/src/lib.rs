//! # vscreen Core Library
//!
//! Virtual screening of small molecules: loading ligand libraries, filtering
//! them by drug-likeness rules, ranking them by similarity to known actives,
//! docking them into a receptor and rescoring the docked poses.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a layered arrangement so that each concern can be tested
//! on its own:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Atom`,
//!   `Bond`), chemical perception, geometry utilities and molecular file formats.
//!
//! - **Services: [`toolkit`], [`filters`], [`similarity`], [`docking`],
//!   [`scoring`].** Each exposes its behavior behind a trait or enum seam:
//!   toolkits read and prepare molecules, filters count rule violations,
//!   similarity methods compare descriptors, docking engines produce poses and
//!   scoring functions predict affinities.
//!
//! - **[`engine`]: The Logic Core.** The stateful [`engine::pipeline::Pipeline`]
//!   chains inputs, runs the configured stages in parallel chunks and writes
//!   the results.

pub mod core;
pub mod docking;
pub mod engine;
pub mod filters;
pub mod scoring;
pub mod similarity;
pub mod toolkit;
