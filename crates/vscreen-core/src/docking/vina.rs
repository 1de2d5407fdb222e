use super::{DockingEngine, DockingError, DockingParams};
use crate::core::io::pdbqt::{self, PdbqtFile};
use crate::core::io::traits::MolecularFile;
use crate::core::models::molecule::Molecule;
use nalgebra::Point3;
use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tracing::{debug, trace};

const EXECUTABLE_NAME: &str = "vina";

/// AutoDock Vina driven as an external process, one single-threaded run per
/// ligand. The receptor PDBQT is written once into the engine's scratch
/// directory, which is removed when the engine is dropped.
#[derive(Debug)]
pub struct VinaEngine {
    executable: PathBuf,
    params: DockingParams,
    workdir: TempDir,
    receptor_path: PathBuf,
    counter: AtomicUsize,
}

/// Resolves the Vina executable: an explicit path must exist, otherwise
/// `vina` is searched on `PATH`.
pub fn locate_executable(explicit: Option<&Path>) -> Result<PathBuf, DockingError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(DockingError::ExecutableNotFound {
                searched: path.display().to_string(),
            })
        };
    }
    let search = env::var_os("PATH").unwrap_or_default();
    env::split_paths(&search)
        .map(|dir| dir.join(EXECUTABLE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| DockingError::ExecutableNotFound {
            searched: format!("'{EXECUTABLE_NAME}' on PATH"),
        })
}

/// Extracts the affinity from `vina --score_only` output (1.1 and 1.2 styles).
fn parse_score_only(stdout: &str) -> Option<f64> {
    stdout.lines().find_map(|line| {
        let line = line.trim();
        let rest = line
            .strip_prefix("Affinity:")
            .or_else(|| line.strip_prefix("Estimated Free Energy of Binding").map(|r| r.trim_start_matches([' ', ':'])))?;
        rest.split_whitespace().next()?.parse::<f64>().ok()
    })
}

impl VinaEngine {
    pub fn new(receptor: &Molecule, params: DockingParams) -> Result<Self, DockingError> {
        params.validate()?;
        let executable = locate_executable(params.executable.as_deref())?;
        let workdir = tempfile::Builder::new().prefix("vscreen-vina-").tempdir()?;
        let receptor_path = workdir.path().join("receptor.pdbqt");
        let mut writer = BufWriter::new(File::create(&receptor_path)?);
        pdbqt::write_receptor(receptor, &mut writer)?;
        writer.flush()?;
        debug!(
            executable = %executable.display(),
            workdir = %workdir.path().display(),
            "Prepared AutoDock Vina receptor"
        );
        Ok(Self {
            executable,
            params,
            workdir,
            receptor_path,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn params(&self) -> &DockingParams {
        &self.params
    }

    /// Writes the ligand PDBQT under a fresh name and returns its path plus
    /// the original atom index of every written atom.
    fn write_ligand(&self, ligand: &Molecule) -> Result<(PathBuf, Vec<usize>), DockingError> {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = self.workdir.path().join(format!("ligand_{id}.pdbqt"));
        let mut writer = BufWriter::new(File::create(&path)?);
        let order = pdbqt::write_ligand(ligand, &mut writer)?;
        writer.flush()?;
        Ok((path, order))
    }

    fn box_args(&self) -> Vec<OsString> {
        let p = &self.params;
        let mut args = Vec::with_capacity(12);
        for (axis, c, s) in [
            ("x", p.center.x, p.size.x),
            ("y", p.center.y, p.size.y),
            ("z", p.center.z, p.size.z),
        ] {
            args.push(format!("--center_{axis}").into());
            args.push(c.to_string().into());
            args.push(format!("--size_{axis}").into());
            args.push(s.to_string().into());
        }
        args
    }

    fn run(&self, ligand: &Molecule, args: Vec<OsString>) -> Result<Output, DockingError> {
        trace!(title = %ligand.title, ?args, "Running Vina");
        let output = Command::new(&self.executable)
            .arg("--receptor")
            .arg(&self.receptor_path)
            .args(args)
            .args(self.box_args())
            .args(["--cpu", "1"])
            .output()?;
        if !output.status.success() {
            return Err(DockingError::ProcessFailed {
                ligand: ligand.title.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Maps each pose of the Vina output back onto the input ligand.
    fn read_poses(ligand: &Molecule, order: &[usize], text: &str) -> Result<Vec<Molecule>, DockingError> {
        let output_error = |details: String| DockingError::Output {
            ligand: ligand.title.clone(),
            details,
        };
        let mut poses = Vec::new();
        for model in PdbqtFile::records(Cursor::new(text.as_bytes())) {
            let model = model?;
            if model.atom_count() != order.len() {
                return Err(output_error(format!(
                    "pose has {} atoms, expected {}",
                    model.atom_count(),
                    order.len()
                )));
            }
            let mut positions: Vec<Point3<f64>> = ligand.positions();
            for (k, &original) in order.iter().enumerate() {
                positions[original] = model.atom(k).position;
            }
            let mut pose = ligand.with_positions(&positions);
            for key in ["vina_affinity", "vina_rmsd_lb", "vina_rmsd_ub"] {
                if let Some(value) = model.data.get(key) {
                    pose.data.set(key, value);
                }
            }
            poses.push(pose);
        }
        if poses.is_empty() {
            return Err(output_error("no poses in output".into()));
        }
        Ok(poses)
    }
}

impl DockingEngine for VinaEngine {
    fn name(&self) -> &'static str {
        "autodock_vina"
    }

    fn dock(&self, ligand: &Molecule) -> Result<Vec<Molecule>, DockingError> {
        let (ligand_path, order) = self.write_ligand(ligand)?;
        let out_path = ligand_path.with_extension("out.pdbqt");
        let p = &self.params;
        let mut args: Vec<OsString> = vec![
            "--ligand".into(),
            ligand_path.clone().into(),
            "--out".into(),
            out_path.clone().into(),
            "--exhaustiveness".into(),
            p.exhaustiveness.to_string().into(),
            "--num_modes".into(),
            p.num_modes.to_string().into(),
            "--energy_range".into(),
            p.energy_range.to_string().into(),
        ];
        if let Some(seed) = p.seed {
            args.push("--seed".into());
            args.push(seed.to_string().into());
        }
        let result = self
            .run(ligand, args)
            .and_then(|_| fs::read_to_string(&out_path).map_err(DockingError::from))
            .and_then(|text| Self::read_poses(ligand, &order, &text));
        let _ = fs::remove_file(&ligand_path);
        let _ = fs::remove_file(&out_path);
        let poses = result?;
        debug!(title = %ligand.title, poses = poses.len(), "Docked ligand");
        Ok(poses)
    }

    fn score_only(&self, ligand: &Molecule) -> Result<f64, DockingError> {
        let (ligand_path, _) = self.write_ligand(ligand)?;
        let args: Vec<OsString> = vec!["--ligand".into(), ligand_path.clone().into(), "--score_only".into()];
        let result = self.run(ligand, args);
        let _ = fs::remove_file(&ligand_path);
        let output = result?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_score_only(&stdout).ok_or_else(|| DockingError::Output {
            ligand: ligand.title.clone(),
            details: "no affinity in score-only output".into(),
        })
    }
}
