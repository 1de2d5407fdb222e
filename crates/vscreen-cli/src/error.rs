use std::path::PathBuf;
use thiserror::Error;
use vscreen::engine::error::PipelineError;
use vscreen::scoring::ScoringError;
use vscreen::toolkit::ToolkitError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error(
        "Cannot determine the output format: pass -o <format> or use an output file name with a known extension"
    )]
    MissingOutputFormat,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pipeline(PipelineError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Toolkit(inner) => inner.into(),
            PipelineError::Scoring(inner) => inner.into(),
            other => Self::Pipeline(other),
        }
    }
}

impl From<ToolkitError> for CliError {
    fn from(e: ToolkitError) -> Self {
        match e {
            ToolkitError::NotFound { path } => Self::FileNotFound { path },
            other => Self::Pipeline(PipelineError::Toolkit(other)),
        }
    }
}

impl From<ScoringError> for CliError {
    fn from(e: ScoringError) -> Self {
        match e {
            ScoringError::NotFound { path } => Self::FileNotFound { path },
            other => Self::Pipeline(PipelineError::Scoring(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_surface_as_file_not_found() {
        let err: CliError = PipelineError::Toolkit(ToolkitError::NotFound {
            path: PathBuf::from("ligands.sdf"),
        })
        .into();
        assert!(matches!(err, CliError::FileNotFound { ref path } if path == &PathBuf::from("ligands.sdf")));
        assert_eq!(err.to_string(), "File not found: ligands.sdf");

        let err: CliError = ScoringError::NotFound {
            path: PathBuf::from("bogus.pkl"),
        }
        .into();
        assert!(matches!(err, CliError::FileNotFound { .. }));
    }

    #[test]
    fn other_pipeline_errors_are_wrapped() {
        let err: CliError = PipelineError::ThreadPool("boom".into()).into();
        assert!(matches!(err, CliError::Pipeline(PipelineError::ThreadPool(_))));
    }

    #[test]
    fn missing_output_format_is_distinct_from_missing_files() {
        let message = CliError::MissingOutputFormat.to_string();
        assert!(message.contains("output format"));
        assert!(!message.contains("not found"));
    }
}
