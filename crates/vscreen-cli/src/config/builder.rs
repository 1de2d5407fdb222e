use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{DockingSettings, FileSpec, OutputTarget, ScreenPlan};
use crate::cli::Cli;
use crate::data::{DATA_DIR_ENV_VAR, DataManager};
use crate::error::{CliError, Result};
use crate::utils::parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::debug;
use vscreen::core::io::{self, Format};
use vscreen::docking::{DockingEngineKind, DockingParams};
use vscreen::engine::config::PipelineConfigBuilder;
use vscreen::filters::Filter;
use vscreen::scoring::ScorerName;
use vscreen::similarity::SimilarityMethod;
use vscreen::toolkit::{TOOLKIT_ENV_VAR, ToolkitKind};

/// Environment variables consulted while building the plan.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    pub toolkit: Option<String>,
    pub data_dir: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            toolkit: std::env::var(TOOLKIT_ENV_VAR).ok(),
            data_dir: std::env::var(DATA_DIR_ENV_VAR).ok(),
        }
    }
}

/// Resolves the format of `path`, preferring the explicit token.
fn resolve_format(explicit: Option<&str>, path: &Path) -> Result<Option<Format>> {
    io::resolve_format(explicit, path)
        .map(|token| {
            token
                .parse::<Format>()
                .map_err(|e| CliError::Argument(format!("{} ('{}')", e, path.display())))
        })
        .transpose()
}

/// Existence is checked first so a missing file is always reported as such,
/// whatever its name looks like.
fn file_spec(explicit: Option<&str>, path: &Path, role: &str) -> Result<FileSpec> {
    if !path.is_file() {
        return Err(CliError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let format = resolve_format(explicit, path)?.ok_or_else(|| {
        CliError::Argument(format!(
            "Cannot determine the format of {} '{}'",
            role,
            path.display()
        ))
    })?;
    if !format.is_molecular() {
        return Err(CliError::Argument(format!(
            "The {} '{}' must be a molecular file, not {}",
            role,
            path.display(),
            format
        )));
    }
    Ok(FileSpec {
        format,
        path: path.to_path_buf(),
    })
}

fn parse_all<T, E: std::fmt::Display>(
    values: &[String],
    parse: impl Fn(&str) -> std::result::Result<T, E>,
) -> Result<Vec<T>> {
    values
        .iter()
        .map(|v| parse(v).map_err(|e| CliError::Argument(e.to_string())))
        .collect()
}

/// Merges command line, environment, config file and defaults into a
/// validated [`ScreenPlan`]. Nothing is read from the inputs here.
pub fn build_plan(cli: &Cli, env: &Environment) -> Result<ScreenPlan> {
    let defaults = DefaultsConfig::default();
    let mut file = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let pipeline_file = file.pipeline.take().unwrap_or_default();
    let docking_file = file.docking.take().unwrap_or_default();
    let scoring_file = file.scoring.take().unwrap_or_default();
    let output_file = file.output.take().unwrap_or_default();

    let flag_toolkit: ToolkitKind = cli
        .toolkit
        .parse()
        .map_err(|e: vscreen::toolkit::ToolkitError| CliError::Argument(e.to_string()))?;
    let toolkit = ToolkitKind::resolve(flag_toolkit, env.toolkit.as_deref())
        .map_err(|e| CliError::Argument(format!("{TOOLKIT_ENV_VAR}: {e}")))?;

    let pipeline = PipelineConfigBuilder::new()
        .n_cpu(cli.n_cpu.or(pipeline_file.n_cpu).unwrap_or(defaults.n_cpu))
        .chunksize(cli.chunksize.or(pipeline_file.chunksize).unwrap_or(defaults.chunksize))
        .build()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let inputs = cli
        .inputs
        .iter()
        .map(|path| file_spec(cli.input_format.as_deref(), path, "input file"))
        .collect::<Result<Vec<_>>>()?;

    let output_format = match &cli.output {
        Some(path) => resolve_format(cli.output_format.as_deref(), path)?,
        None => cli
            .output_format
            .as_deref()
            .map(|token| token.parse::<Format>().map_err(|e| CliError::Argument(e.to_string())))
            .transpose()?,
    }
    .ok_or(CliError::MissingOutputFormat)?;
    let output = cli
        .output
        .clone()
        .map_or(OutputTarget::Stdout, OutputTarget::File);

    let filters = parse_all(&cli.filters, str::parse::<Filter>)?;
    let similarity = parse_all(&cli.similarity, str::parse::<SimilarityMethod>)?;
    let dock = cli
        .dock
        .as_deref()
        .map(|name| name.parse::<DockingEngineKind>().map_err(|e| CliError::Argument(e.to_string())))
        .transpose()?;
    parse_all(&cli.scores, ScorerName::parse)?;

    let receptor = cli
        .receptor
        .as_deref()
        .map(|path| file_spec(None, path, "receptor"))
        .transpose()?;
    let queries = cli
        .queries
        .iter()
        .map(|path| file_spec(None, path, "query"))
        .collect::<Result<Vec<_>>>()?;

    if dock.is_some() && receptor.is_none() {
        return Err(CliError::Argument("--dock requires --receptor".into()));
    }
    if let Some(method) = similarity.first() {
        if queries.is_empty() {
            return Err(CliError::Argument(format!(
                "--similarity {method} requires at least one --query"
            )));
        }
    }
    if let Some(method) = similarity.iter().find(|m| m.requires_receptor()) {
        if receptor.is_none() {
            return Err(CliError::Argument(format!("--similarity {method} requires --receptor")));
        }
    }
    if (!cli.scores.is_empty() || !cli.score_files.is_empty()) && receptor.is_none() {
        return Err(CliError::Argument("--score and --score_file require --receptor".into()));
    }

    let center = cli
        .center
        .as_deref()
        .map(parser::parse_triple)
        .transpose()
        .map_err(|e| CliError::Argument(e.to_string()))?;
    let size = cli
        .size
        .as_deref()
        .map(parser::parse_box_size)
        .transpose()
        .map_err(|e| CliError::Argument(e.to_string()))?;
    let auto_ligand = cli
        .auto_ligand
        .as_deref()
        .map(|path| file_spec(None, path, "auto-ligand"))
        .transpose()?;
    let docking = DockingSettings {
        base: DockingParams {
            exhaustiveness: cli.exhaustiveness,
            seed: cli.seed,
            num_modes: docking_file.num_modes.unwrap_or(defaults.num_modes),
            energy_range: docking_file.energy_range.unwrap_or(defaults.energy_range),
            executable: cli.vina.clone().or(docking_file.vina),
            ..Default::default()
        },
        auto_ligand,
        center,
        size,
    };
    docking
        .params(None)
        .validate()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let data_dir = DataManager::new(
        cli.data_dir.as_deref(),
        env.data_dir.as_deref(),
        scoring_file.data_dir.as_deref(),
    )?
    .get_data_path()
    .to_path_buf();

    let fields = if cli.fields.is_empty() {
        output_file.fields.unwrap_or_default()
    } else {
        cli.fields.clone()
    };

    let show_progress = !cli.no_progress && !cli.quiet && std::io::stderr().is_terminal();

    let plan = ScreenPlan {
        toolkit,
        pipeline,
        inputs,
        filters,
        similarity,
        cutoff: cli.cutoff,
        queries,
        receptor,
        dock,
        docking,
        scores: cli.scores.clone(),
        score_files: cli.score_files.clone(),
        data_dir,
        output,
        output_format,
        fields,
        show_progress,
    };
    debug!("Final screening plan: {:?}", &plan);
    Ok(plan)
}
