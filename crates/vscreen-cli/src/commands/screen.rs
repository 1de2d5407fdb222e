use crate::cli::Cli;
use crate::config::{self, Environment, FileSpec, OutputTarget, ScreenPlan};
use crate::data::DataManager;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use std::io;
use std::sync::Arc;
use tracing::{debug, info};
use vscreen::core::chem::receptor::PreparedReceptor;
use vscreen::core::io::{Format, OutputFile};
use vscreen::core::models::molecule::Molecule;
use vscreen::engine::pipeline::{Pipeline, VirtualScreen};
use vscreen::engine::progress::ProgressReporter;
use vscreen::scoring::{ScoringFunction, load_scorer};
use vscreen::toolkit::Toolkit;

pub fn run(cli: Cli) -> Result<()> {
    let plan = config::build_plan(&cli, &Environment::from_process())?;
    info!(toolkit = %plan.toolkit, inputs = plan.inputs.len(), "Starting virtual screen");

    let toolkit = plan.toolkit.build();
    let mut pipeline = Pipeline::new(toolkit.clone(), plan.pipeline)?;
    let data = DataManager::with_custom_path(&plan.data_dir);
    debug!(path = %data.get_data_path().display(), "Using data directory");

    let progress = if plan.show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    let count = execute(&plan, toolkit.as_ref(), &mut pipeline, &data, &reporter)?;
    info!(count, "✅ Screening completed.");
    if let OutputTarget::File(path) = &plan.output {
        eprintln!("✓ {} result(s) written to: {}", count, path.display());
    }
    Ok(())
}

/// Drives `screen` through the plan: inputs, filters, receptor, similarity,
/// docking, scoring and finally the single write. Returns the number of
/// records written.
pub fn execute<S: VirtualScreen>(
    plan: &ScreenPlan,
    toolkit: &dyn Toolkit,
    screen: &mut S,
    data: &DataManager,
    reporter: &ProgressReporter,
) -> Result<usize> {
    for input in &plan.inputs {
        screen.load_ligands(input.format, &input.path)?;
    }
    for filter in &plan.filters {
        screen.apply_filter(*filter)?;
    }

    let receptor = plan
        .receptor
        .as_ref()
        .map(|spec| load_receptor(toolkit, spec))
        .transpose()?;

    if !plan.similarity.is_empty() {
        let mut queries = Vec::new();
        for spec in &plan.queries {
            queries.extend(read_molecules(toolkit, spec)?);
        }
        debug!(queries = queries.len(), "Loaded query molecules");
        for method in &plan.similarity {
            screen.similarity(*method, &queries, receptor.clone(), plan.cutoff)?;
        }
    }

    let auto_ligand = match &plan.docking.auto_ligand {
        Some(spec) => Some(first_molecule(toolkit, spec, "auto-ligand")?),
        None => None,
    };
    let params = plan.docking.params(auto_ligand.as_ref());

    if let Some(engine) = plan.dock {
        let receptor = require_receptor(&receptor, "--dock")?;
        info!(%engine, center = ?params.center, size = ?params.size, "Docking enabled");
        screen.dock(engine, receptor, params.clone())?;
    }

    if !plan.scores.is_empty() || !plan.score_files.is_empty() {
        let receptor = require_receptor(&receptor, "--score")?;
        let registry = data.scorer_registry(params);
        let mut functions: Vec<Arc<dyn ScoringFunction>> = Vec::new();
        for name in &plan.scores {
            functions.push(registry.resolve(name, receptor.molecule())?);
        }
        for path in &plan.score_files {
            functions.push(load_scorer(path)?);
        }
        for function in functions {
            screen.score(function, receptor.clone())?;
        }
    }

    let written = match (&plan.output, plan.output_format) {
        (OutputTarget::File(path), Format::Csv) => {
            let mut file = OutputFile::create(path)?;
            let n = screen.write_csv(&mut file, &plan.fields, reporter)?;
            file.finish()?;
            n
        }
        (OutputTarget::File(path), format) => screen.write(format, path, reporter)?,
        (OutputTarget::Stdout, Format::Csv) => {
            screen.write_csv(&mut io::stdout().lock(), &plan.fields, reporter)?
        }
        (OutputTarget::Stdout, format) => screen.write_to(format, &mut io::stdout().lock(), reporter)?,
    };
    Ok(written)
}

fn require_receptor(receptor: &Option<Arc<PreparedReceptor>>, option: &str) -> Result<Arc<PreparedReceptor>> {
    receptor
        .clone()
        .ok_or_else(|| CliError::Argument(format!("{option} requires --receptor")))
}

fn read_molecules(toolkit: &dyn Toolkit, spec: &FileSpec) -> Result<Vec<Molecule>> {
    let molecules = toolkit
        .read_file(spec.format, &spec.path)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(molecules)
}

fn first_molecule(toolkit: &dyn Toolkit, spec: &FileSpec, role: &str) -> Result<Molecule> {
    toolkit
        .read_file(spec.format, &spec.path)?
        .next()
        .transpose()?
        .ok_or_else(|| {
            CliError::Argument(format!("The {} file '{}' contains no molecules", role, spec.path.display()))
        })
}

fn load_receptor(toolkit: &dyn Toolkit, spec: &FileSpec) -> Result<Arc<PreparedReceptor>> {
    let mut molecule = first_molecule(toolkit, spec, "receptor")?;
    toolkit.mark_receptor(&mut molecule);
    info!(
        path = %spec.path.display(),
        atoms = molecule.atom_count(),
        "Loaded receptor"
    );
    Ok(Arc::new(PreparedReceptor::new(Arc::new(molecule))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::build_plan;
    use clap::Parser;
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};
    use vscreen::docking::{DockingEngineKind, DockingParams};
    use vscreen::engine::error::PipelineError;
    use vscreen::filters::Filter;
    use vscreen::scoring::descriptors::Descriptor;
    use vscreen::scoring::loader::ScorerFile;
    use vscreen::scoring::models::Model;
    use vscreen::similarity::SimilarityMethod;
    use vscreen::toolkit::{Supplier, ToolkitError, ToolkitKind};

    const ETHANOL_SDF: &str = "\
ethanol
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5200    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.0000    1.4000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
  2  3  1  0  0  0  0
M  END
$$$$
";

    /// Toolkit that records every file it is asked to read.
    #[derive(Debug)]
    struct RecordingToolkit {
        inner: Arc<dyn Toolkit>,
        reads: Mutex<Vec<PathBuf>>,
    }

    impl RecordingToolkit {
        fn new() -> Self {
            Self {
                inner: ToolkitKind::OpenBabel.build(),
                reads: Mutex::new(Vec::new()),
            }
        }

        fn reads_of(&self, path: &Path) -> usize {
            self.reads.lock().unwrap().iter().filter(|p| p.as_path() == path).count()
        }
    }

    impl Toolkit for RecordingToolkit {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn supports(&self, format: Format) -> bool {
            self.inner.supports(format)
        }

        fn read_file(&self, format: Format, path: &Path) -> std::result::Result<Supplier, ToolkitError> {
            self.reads.lock().unwrap().push(path.to_path_buf());
            self.inner.read_file(format, path)
        }
    }

    /// Screen double that records calls and the receptor objects it receives.
    #[derive(Default)]
    struct RecordingScreen {
        calls: Vec<String>,
        receptors: Vec<usize>,
    }

    impl RecordingScreen {
        fn saw(&mut self, receptor: &Arc<PreparedReceptor>) {
            self.receptors.push(Arc::as_ptr(receptor) as usize);
        }
    }

    impl VirtualScreen for RecordingScreen {
        fn load_ligands(&mut self, format: Format, path: &Path) -> std::result::Result<(), PipelineError> {
            if !path.exists() {
                return Err(ToolkitError::NotFound {
                    path: path.to_path_buf(),
                }
                .into());
            }
            self.calls.push(format!("load {format} {}", path.file_name().unwrap().to_string_lossy()));
            Ok(())
        }

        fn apply_filter(&mut self, filter: Filter) -> std::result::Result<(), PipelineError> {
            self.calls.push(format!("filter {filter}"));
            Ok(())
        }

        fn similarity(
            &mut self,
            method: SimilarityMethod,
            queries: &[Molecule],
            receptor: Option<Arc<PreparedReceptor>>,
            cutoff: f64,
        ) -> std::result::Result<(), PipelineError> {
            if let Some(r) = &receptor {
                self.saw(r);
            }
            self.calls.push(format!("similarity {method} {} {cutoff}", queries.len()));
            Ok(())
        }

        fn dock(
            &mut self,
            engine: DockingEngineKind,
            receptor: Arc<PreparedReceptor>,
            params: DockingParams,
        ) -> std::result::Result<(), PipelineError> {
            self.saw(&receptor);
            self.calls.push(format!("dock {engine} {}", params.exhaustiveness));
            Ok(())
        }

        fn score(
            &mut self,
            function: Arc<dyn ScoringFunction>,
            receptor: Arc<PreparedReceptor>,
        ) -> std::result::Result<(), PipelineError> {
            self.saw(&receptor);
            self.calls.push(format!("score {}", function.name()));
            Ok(())
        }

        fn write(
            &mut self,
            format: Format,
            _path: &Path,
            _reporter: &ProgressReporter,
        ) -> std::result::Result<usize, PipelineError> {
            self.calls.push(format!("write {format}"));
            Ok(0)
        }

        fn write_to(
            &mut self,
            format: Format,
            _writer: &mut dyn Write,
            _reporter: &ProgressReporter,
        ) -> std::result::Result<usize, PipelineError> {
            self.calls.push(format!("write_to {format}"));
            Ok(0)
        }

        fn write_csv(
            &mut self,
            _writer: &mut dyn Write,
            fields: &[String],
            _reporter: &ProgressReporter,
        ) -> std::result::Result<usize, PipelineError> {
            self.calls.push(format!("write_csv {}", fields.join(",")));
            Ok(0)
        }
    }

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self { dir: tempdir().unwrap() }
        }

        fn file(&self, name: &str, content: &str) -> String {
            let path = self.dir.path().join(name);
            fs::write(&path, content).unwrap();
            path.to_str().unwrap().to_string()
        }

        fn scorer(&self, name: &str) -> String {
            let path = self.dir.path().join(name);
            ScorerFile {
                name: "toy_linear".to_string(),
                version: 1,
                descriptors: Descriptor::VinaTerms,
                model: Model::Linear {
                    weights: vec![0.5; 6],
                    intercept: 1.0,
                },
            }
            .save(&path)
            .unwrap();
            path.to_str().unwrap().to_string()
        }

        fn path(&self, name: &str) -> String {
            self.dir.path().join(name).to_str().unwrap().to_string()
        }

        fn plan(&self, args: &[&str]) -> ScreenPlan {
            let cli = Cli::parse_from(std::iter::once("vscreen").chain(args.iter().copied()));
            let env = Environment {
                toolkit: None,
                data_dir: Some(self.path("data")),
            };
            build_plan(&cli, &env).unwrap()
        }

        fn data(&self) -> DataManager {
            DataManager::with_custom_path(self.path("data"))
        }
    }

    #[test]
    fn loads_inputs_and_applies_filters_in_order() {
        let fx = Fixture::new();
        let a = fx.file("a.sdf", ETHANOL_SDF);
        let b = fx.file("b.sdf", ETHANOL_SDF);
        let c = fx.file("c.sdf", ETHANOL_SDF);
        let out = fx.path("hits.sdf");
        let plan = fx.plan(&[&a, &b, &c, "--filter", "ro5", "--filter", "ro3:1", "-O", &out]);

        let mut screen = RecordingScreen::default();
        let toolkit = RecordingToolkit::new();
        execute(&plan, &toolkit, &mut screen, &fx.data(), &ProgressReporter::new()).unwrap();

        assert_eq!(
            screen.calls,
            ["load sdf a.sdf", "load sdf b.sdf", "load sdf c.sdf", "filter ro5", "filter ro3:1", "write sdf"]
        );
    }

    #[test]
    fn receptor_is_loaded_once_and_shared_by_every_stage() {
        let fx = Fixture::new();
        let ligands = fx.file("ligands.sdf", ETHANOL_SDF);
        let receptor = fx.file("receptor.sdf", ETHANOL_SDF);
        let query = fx.file("query.sdf", ETHANOL_SDF);
        let scorer = fx.scorer("toy.json");
        let plan = fx.plan(&[
            &ligands,
            "--receptor",
            &receptor,
            "--similarity",
            "ifp",
            "--similarity",
            "usr",
            "--query",
            &query,
            "--dock",
            "autodock_vina",
            "--exhaustiveness",
            "4",
            "--score_file",
            &scorer,
            "-o",
            "csv",
            "--field",
            "toy_linear",
        ]);

        let mut screen = RecordingScreen::default();
        let toolkit = RecordingToolkit::new();
        execute(&plan, &toolkit, &mut screen, &fx.data(), &ProgressReporter::new()).unwrap();

        assert_eq!(toolkit.reads_of(Path::new(&receptor)), 1);
        assert_eq!(screen.receptors.len(), 4);
        assert!(screen.receptors.iter().all(|p| *p == screen.receptors[0]));
        assert_eq!(
            screen.calls,
            [
                "load sdf ligands.sdf",
                "similarity ifp 1 0.9",
                "similarity usr 1 0.9",
                "dock autodock_vina 4",
                "score toy_linear",
                "write_csv toy_linear",
            ]
        );
    }

    #[test]
    fn input_removed_after_planning_fails_before_any_write() {
        let fx = Fixture::new();
        let present = fx.file("present.sdf", ETHANOL_SDF);
        let missing = fx.file("missing.sdf", ETHANOL_SDF);
        let out = fx.path("out.sdf");
        let plan = fx.plan(&[&present, &missing, "-O", &out]);
        fs::remove_file(&missing).unwrap();

        let mut screen = RecordingScreen::default();
        let err = execute(&plan, &RecordingToolkit::new(), &mut screen, &fx.data(), &ProgressReporter::new())
            .unwrap_err();
        assert!(matches!(err, CliError::FileNotFound { ref path } if path.ends_with("missing.sdf")));
        assert!(err.to_string().contains("missing.sdf"));
        assert!(!screen.calls.iter().any(|c| c.starts_with("write")));
    }

    #[test]
    fn missing_input_without_extension_is_reported_as_missing() {
        let fx = Fixture::new();
        let present = fx.file("present.sdf", ETHANOL_SDF);
        let missing = fx.path("ligands");
        let cli = Cli::parse_from(["vscreen", present.as_str(), missing.as_str(), "-o", "sdf"]);
        let env = Environment {
            toolkit: None,
            data_dir: Some(fx.path("data")),
        };
        let err = build_plan(&cli, &env).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound { ref path } if path.ends_with("ligands")));
    }

    #[test]
    fn missing_score_file_fails_without_scoring() {
        let fx = Fixture::new();
        let ligands = fx.file("ligands.sdf", ETHANOL_SDF);
        let receptor = fx.file("receptor.sdf", ETHANOL_SDF);
        let good = fx.scorer("good.json");
        let bogus = fx.path("bogus.pkl");
        let plan = fx.plan(&[&ligands, "--receptor", &receptor, "--score_file", &good, "--score_file", &bogus, "-o", "sdf"]);

        let mut screen = RecordingScreen::default();
        let err = execute(&plan, &RecordingToolkit::new(), &mut screen, &fx.data(), &ProgressReporter::new())
            .unwrap_err();
        assert!(matches!(err, CliError::FileNotFound { ref path } if path.ends_with("bogus.pkl")));
        assert!(!screen.calls.iter().any(|c| c.starts_with("score") || c.starts_with("write")));
    }

    #[test]
    fn uninstalled_builtin_scorer_is_reported() {
        let fx = Fixture::new();
        let ligands = fx.file("ligands.sdf", ETHANOL_SDF);
        let receptor = fx.file("receptor.sdf", ETHANOL_SDF);
        let plan = fx.plan(&[&ligands, "--receptor", &receptor, "--score", "rfscore", "-o", "sdf"]);

        let mut screen = RecordingScreen::default();
        let err = execute(&plan, &RecordingToolkit::new(), &mut screen, &fx.data(), &ProgressReporter::new())
            .unwrap_err();
        assert!(err.to_string().contains("rfscore_v1_pdbbind2016"));
    }

    #[test]
    fn screens_end_to_end_into_a_csv_file() {
        let fx = Fixture::new();
        let ligands = fx.file("ligands.sdf", &format!("{ETHANOL_SDF}{}", ETHANOL_SDF.replacen("ethanol", "second", 1)));
        let receptor = fx.file("receptor.sdf", ETHANOL_SDF);
        let scorer = fx.scorer("toy.json");
        let out = fx.path("scores.csv.gz");
        let plan = fx.plan(&[
            &ligands,
            "--filter",
            "ro5",
            "--receptor",
            &receptor,
            "--score_file",
            &scorer,
            "-O",
            &out,
            "-n",
            "2",
            "-c",
            "1",
        ]);

        let toolkit = plan.toolkit.build();
        let mut pipeline = Pipeline::new(toolkit.clone(), plan.pipeline).unwrap();
        let n = execute(&plan, toolkit.as_ref(), &mut pipeline, &fx.data(), &ProgressReporter::new()).unwrap();
        assert_eq!(n, 2);

        let mut text = String::new();
        std::io::Read::read_to_string(&mut vscreen::core::io::open_input(Path::new(&out)).unwrap(), &mut text)
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,toy_linear");
        assert!(lines[1].starts_with("ethanol,"));
        assert!(lines[2].starts_with("second,"));
    }
}
