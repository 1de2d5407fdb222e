//! # Engine Module
//!
//! The screening engine: a lazy, chunked and parallel pipeline that pushes
//! ligands through the configured stages and writes the surviving results.
//!
//! ## Overview
//!
//! A [`pipeline::Pipeline`] records its inputs and stages when configured and
//! does no work until results are fetched. Input molecules are then pulled in
//! chunks, each chunk is processed in parallel on the pipeline's own worker
//! pool, and results are yielded in input order.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - worker count and chunk size
//! - **Stages** (`stages`) - filter, similarity, docking and scoring steps
//! - **Pipeline** ([`pipeline`]) - input chaining, chunked execution, writers
//! - **Progress Monitoring** ([`progress`]) - callbacks for front ends
//! - **Error Handling** ([`error`]) - the pipeline error wrapping every stage error

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub(crate) mod stages;
