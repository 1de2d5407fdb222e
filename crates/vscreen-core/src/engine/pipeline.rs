use super::config::PipelineConfig;
use super::error::PipelineError;
use super::progress::{Progress, ProgressReporter};
use super::stages::{self, DockingStage, FilterStage, ScoringStage, SimilarityStage, Stage};
use crate::core::chem::receptor::PreparedReceptor;
use crate::core::io::{self, Format, OutputFile};
use crate::core::models::molecule::Molecule;
use crate::docking::vina::VinaEngine;
use crate::docking::{DockingEngine, DockingEngineKind, DockingParams};
use crate::filters::Filter;
use crate::scoring::ScoringFunction;
use crate::similarity::{SimilarityMethod, SimilarityQuery};
use crate::toolkit::{Toolkit, ToolkitError};
use itertools::{Either, Itertools};
use rayon::prelude::*;
use std::io::Write;
use std::iter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The operations a screening front end drives, in the order it usually
/// drives them: inputs, then stages, then a single write.
pub trait VirtualScreen {
    fn load_ligands(&mut self, format: Format, path: &Path) -> Result<(), PipelineError>;

    fn apply_filter(&mut self, filter: Filter) -> Result<(), PipelineError>;

    fn similarity(
        &mut self,
        method: SimilarityMethod,
        queries: &[Molecule],
        receptor: Option<Arc<PreparedReceptor>>,
        cutoff: f64,
    ) -> Result<(), PipelineError>;

    fn dock(
        &mut self,
        engine: DockingEngineKind,
        receptor: Arc<PreparedReceptor>,
        params: DockingParams,
    ) -> Result<(), PipelineError>;

    fn score(
        &mut self,
        function: Arc<dyn ScoringFunction>,
        receptor: Arc<PreparedReceptor>,
    ) -> Result<(), PipelineError>;

    fn write(&mut self, format: Format, path: &Path, reporter: &ProgressReporter) -> Result<usize, PipelineError>;

    fn write_to(
        &mut self,
        format: Format,
        writer: &mut dyn Write,
        reporter: &ProgressReporter,
    ) -> Result<usize, PipelineError>;

    fn write_csv(
        &mut self,
        writer: &mut dyn Write,
        fields: &[String],
        reporter: &ProgressReporter,
    ) -> Result<usize, PipelineError>;
}

/// A lazy screening pipeline.
///
/// Inputs and stages are only recorded when configured; molecules are read,
/// processed and yielded when results are fetched. Each chunk of
/// `chunksize` input molecules is processed in parallel on the pipeline's own
/// worker pool, and results keep input order.
#[derive(Debug)]
pub struct Pipeline {
    toolkit: Arc<dyn Toolkit>,
    config: PipelineConfig,
    pool: rayon::ThreadPool,
    inputs: Vec<(Format, PathBuf)>,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new(toolkit: Arc<dyn Toolkit>, config: PipelineConfig) -> Result<Self, PipelineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_cpu)
            .thread_name(|i| format!("vscreen-worker-{i}"))
            .build()
            .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;
        info!(
            toolkit = toolkit.name(),
            threads = config.n_cpu,
            chunksize = config.chunksize,
            "Pipeline created"
        );
        Ok(Self {
            toolkit,
            config,
            pool,
            inputs: Vec::new(),
            stages: Vec::new(),
        })
    }

    pub fn toolkit(&self) -> &Arc<dyn Toolkit> {
        &self.toolkit
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registers an input file. Existence and format support are checked now;
    /// the file is read when results are fetched.
    pub fn load_ligands(&mut self, format: Format, path: &Path) -> Result<(), PipelineError> {
        if !self.toolkit.supports(format) {
            return Err(ToolkitError::UnsupportedFormat {
                toolkit: self.toolkit.name(),
                format,
            }
            .into());
        }
        if !path.is_file() {
            return Err(ToolkitError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        debug!(path = %path.display(), %format, "Queued ligand file");
        self.inputs.push((format, path.to_path_buf()));
        Ok(())
    }

    pub fn apply_filter(&mut self, filter: Filter) {
        debug!(%filter, "Added filter stage");
        self.stages.push(Arc::new(FilterStage::new(filter)));
    }

    pub fn similarity(
        &mut self,
        method: SimilarityMethod,
        queries: &[Molecule],
        receptor: Option<Arc<PreparedReceptor>>,
        cutoff: f64,
    ) -> Result<(), PipelineError> {
        let query = SimilarityQuery::new(method, queries, receptor, cutoff)?;
        debug!(%method, queries = queries.len(), cutoff, "Added similarity stage");
        self.stages.push(Arc::new(SimilarityStage::new(query)));
        Ok(())
    }

    /// Builds the named engine against `receptor` and adds a docking stage.
    pub fn dock(
        &mut self,
        engine: DockingEngineKind,
        receptor: &PreparedReceptor,
        params: DockingParams,
    ) -> Result<(), PipelineError> {
        let built: Arc<dyn DockingEngine> = match engine {
            DockingEngineKind::AutodockVina => Arc::new(VinaEngine::new(receptor.molecule(), params)?),
        };
        self.dock_with(built);
        Ok(())
    }

    pub fn dock_with(&mut self, engine: Arc<dyn DockingEngine>) {
        debug!(engine = engine.name(), "Added docking stage");
        self.stages.push(Arc::new(DockingStage::new(engine)));
    }

    pub fn score(&mut self, function: Arc<dyn ScoringFunction>, receptor: Arc<PreparedReceptor>) {
        debug!(scorer = function.name(), "Added scoring stage");
        self.stages.push(Arc::new(ScoringStage::new(function, receptor)));
    }

    fn read_inputs(&self) -> impl Iterator<Item = Result<Molecule, PipelineError>> + '_ {
        self.inputs.iter().flat_map(move |(format, path)| {
            debug!(path = %path.display(), "Reading ligands");
            match self.toolkit.read_file(*format, path) {
                Ok(supplier) => Either::Left(supplier.map(|r| r.map_err(PipelineError::from))),
                Err(e) => Either::Right(iter::once(Err(e.into()))),
            }
        })
    }

    /// Lazily yields result molecules in input order.
    pub fn fetch(&self) -> impl Iterator<Item = Result<Molecule, PipelineError>> + '_ {
        let mut inputs = self.read_inputs();
        let chunksize = self.config.chunksize;
        let steps = self.stages.as_slice();
        let pool = &self.pool;
        iter::from_fn(move || {
            let chunk: Vec<_> = inputs.by_ref().take(chunksize).collect();
            if chunk.is_empty() {
                return None;
            }
            let processed: Vec<Vec<Result<Molecule, PipelineError>>> = pool.install(|| {
                chunk
                    .into_par_iter()
                    .map(|item| match item {
                        Ok(molecule) => stages::process(steps, molecule),
                        Err(e) => vec![Err(e)],
                    })
                    .collect()
            });
            Some(processed.into_iter().flatten())
        })
        .flatten()
    }

    #[instrument(skip_all, name = "write_molecules", fields(%format))]
    pub fn write_to(
        &self,
        format: Format,
        writer: &mut dyn Write,
        reporter: &ProgressReporter,
    ) -> Result<usize, PipelineError> {
        if !format.is_molecular() {
            return Err(io::Error::UnsupportedWriteFormat(format).into());
        }
        reporter.report(Progress::PhaseStart { name: "Screening" });
        let mut count = 0;
        for result in self.fetch() {
            io::write_molecule(format, &result?, writer)?;
            count += 1;
            reporter.report(Progress::TaskIncrement);
        }
        writer.flush()?;
        self.finish_phase(reporter);
        info!(count, "Wrote result molecules");
        Ok(count)
    }

    /// Writes all results to `path`, gzip-compressed when it ends in `.gz`.
    pub fn write(&self, format: Format, path: &Path, reporter: &ProgressReporter) -> Result<usize, PipelineError> {
        let mut file = OutputFile::create(path)?;
        let count = self.write_to(format, &mut file, reporter)?;
        file.finish()?;
        Ok(count)
    }

    fn finish_phase(&self, reporter: &ProgressReporter) {
        let skipped: usize = self.stages.iter().map(|s| s.skipped()).sum();
        if skipped > 0 {
            warn!(skipped, "Some ligands produced no results");
            reporter.report(Progress::Message(format!("{skipped} ligand(s) skipped after docking failures")));
        }
        reporter.report(Progress::PhaseFinish);
    }

    /// Writes results as CSV: a `name` column followed by `fields`, or by
    /// every data key in first-seen order when `fields` is empty.
    #[instrument(skip_all, name = "write_csv")]
    pub fn write_csv(
        &self,
        writer: &mut dyn Write,
        fields: &[String],
        reporter: &ProgressReporter,
    ) -> Result<usize, PipelineError> {
        reporter.report(Progress::PhaseStart { name: "Screening" });
        let mut csv = csv::Writer::from_writer(writer);
        let mut count = 0;

        if fields.is_empty() {
            let molecules: Vec<Molecule> = self.fetch().collect::<Result<_, _>>()?;
            let columns: Vec<String> = molecules
                .iter()
                .flat_map(|m| m.data.keys())
                .unique()
                .map(str::to_string)
                .collect();
            csv.write_record(iter::once("name").chain(columns.iter().map(String::as_str)))?;
            for molecule in &molecules {
                csv.write_record(csv_row(molecule, &columns))?;
                count += 1;
                reporter.report(Progress::TaskIncrement);
            }
        } else {
            csv.write_record(iter::once("name").chain(fields.iter().map(String::as_str)))?;
            for result in self.fetch() {
                csv.write_record(csv_row(&result?, fields))?;
                count += 1;
                reporter.report(Progress::TaskIncrement);
            }
        }
        csv.flush()?;
        self.finish_phase(reporter);
        info!(count, "Wrote CSV rows");
        Ok(count)
    }
}

fn csv_row<'a>(molecule: &'a Molecule, columns: &'a [String]) -> impl Iterator<Item = &'a str> {
    iter::once(molecule.title.as_str()).chain(columns.iter().map(|c| molecule.data.get(c).unwrap_or("")))
}

impl VirtualScreen for Pipeline {
    fn load_ligands(&mut self, format: Format, path: &Path) -> Result<(), PipelineError> {
        Pipeline::load_ligands(self, format, path)
    }

    fn apply_filter(&mut self, filter: Filter) -> Result<(), PipelineError> {
        Pipeline::apply_filter(self, filter);
        Ok(())
    }

    fn similarity(
        &mut self,
        method: SimilarityMethod,
        queries: &[Molecule],
        receptor: Option<Arc<PreparedReceptor>>,
        cutoff: f64,
    ) -> Result<(), PipelineError> {
        Pipeline::similarity(self, method, queries, receptor, cutoff)
    }

    fn dock(
        &mut self,
        engine: DockingEngineKind,
        receptor: Arc<PreparedReceptor>,
        params: DockingParams,
    ) -> Result<(), PipelineError> {
        Pipeline::dock(self, engine, &receptor, params)
    }

    fn score(
        &mut self,
        function: Arc<dyn ScoringFunction>,
        receptor: Arc<PreparedReceptor>,
    ) -> Result<(), PipelineError> {
        Pipeline::score(self, function, receptor);
        Ok(())
    }

    fn write(&mut self, format: Format, path: &Path, reporter: &ProgressReporter) -> Result<usize, PipelineError> {
        Pipeline::write(self, format, path, reporter)
    }

    fn write_to(
        &mut self,
        format: Format,
        writer: &mut dyn Write,
        reporter: &ProgressReporter,
    ) -> Result<usize, PipelineError> {
        Pipeline::write_to(self, format, writer, reporter)
    }

    fn write_csv(
        &mut self,
        writer: &mut dyn Write,
        fields: &[String],
        reporter: &ProgressReporter,
    ) -> Result<usize, PipelineError> {
        Pipeline::write_csv(self, writer, fields, reporter)
    }
}
