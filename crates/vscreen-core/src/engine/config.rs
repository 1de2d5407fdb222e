use std::num::NonZeroUsize;
use std::thread;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid worker count {0}: use -1 for all cores or a positive number")]
    InvalidWorkerCount(i64),
    #[error("Invalid chunk size {0}: must be at least 1")]
    InvalidChunkSize(usize),
}

/// Concurrency and batching settings of a [`Pipeline`](super::pipeline::Pipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Worker threads in the pipeline's pool.
    pub n_cpu: usize,
    /// Molecules pulled from the inputs per parallel batch.
    pub chunksize: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_cpu: available_cores(),
            chunksize: 100,
        }
    }
}

fn available_cores() -> usize {
    thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    n_cpu: Option<i64>,
    chunksize: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `-1` selects every logical core.
    pub fn n_cpu(mut self, n_cpu: i64) -> Self {
        self.n_cpu = Some(n_cpu);
        self
    }

    pub fn chunksize(mut self, chunksize: usize) -> Self {
        self.chunksize = Some(chunksize);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let n_cpu = match self.n_cpu.unwrap_or(-1) {
            -1 => available_cores(),
            n if n >= 1 => n as usize,
            n => return Err(ConfigError::InvalidWorkerCount(n)),
        };
        let chunksize = match self.chunksize.unwrap_or(100) {
            0 => return Err(ConfigError::InvalidChunkSize(0)),
            c => c,
        };
        Ok(PipelineConfig { n_cpu, chunksize })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minus_one_means_all_cores() {
        let config = PipelineConfigBuilder::new().n_cpu(-1).build().unwrap();
        assert_eq!(config.n_cpu, available_cores());
        assert_eq!(config.chunksize, 100);
    }

    #[test]
    fn explicit_values_are_used_verbatim() {
        let config = PipelineConfigBuilder::new().n_cpu(3).chunksize(7).build().unwrap();
        assert_eq!(config, PipelineConfig { n_cpu: 3, chunksize: 7 });
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(
            PipelineConfigBuilder::new().n_cpu(0).build(),
            Err(ConfigError::InvalidWorkerCount(0))
        );
        assert_eq!(
            PipelineConfigBuilder::new().n_cpu(-4).build(),
            Err(ConfigError::InvalidWorkerCount(-4))
        );
        assert_eq!(
            PipelineConfigBuilder::new().chunksize(0).build(),
            Err(ConfigError::InvalidChunkSize(0))
        );
    }
}
