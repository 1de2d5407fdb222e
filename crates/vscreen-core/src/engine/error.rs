use thiserror::Error;

use super::config::ConfigError;
use crate::core::io;
use crate::docking::DockingError;
use crate::filters::FilterError;
use crate::scoring::ScoringError;
use crate::similarity::SimilarityError;
use crate::toolkit::ToolkitError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),

    #[error("Invalid pipeline configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Toolkit(#[from] ToolkitError),

    #[error(transparent)]
    Format(#[from] io::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Similarity(#[from] SimilarityError),

    #[error(transparent)]
    Docking(#[from] DockingError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("Failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}
