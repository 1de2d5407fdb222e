use nalgebra::Vector3;
use std::path::PathBuf;
use vscreen::core::io::Format;
use vscreen::core::models::molecule::Molecule;
use vscreen::docking::{DockingEngineKind, DockingParams};
use vscreen::engine::config::PipelineConfig;
use vscreen::filters::Filter;
use vscreen::similarity::SimilarityMethod;
use vscreen::toolkit::ToolkitKind;

/// A file together with the format it will be read or written in.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSpec {
    pub format: Format,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Box and sampling settings, completed once the auto-ligand is read.
#[derive(Debug, Clone, PartialEq)]
pub struct DockingSettings {
    pub base: DockingParams,
    pub auto_ligand: Option<FileSpec>,
    pub center: Option<[f64; 3]>,
    pub size: Option<[f64; 3]>,
}

impl DockingSettings {
    /// Final parameters: derived from the auto-ligand when given, with an
    /// explicit center or size taking precedence over the derived values.
    pub fn params(&self, auto_ligand: Option<&Molecule>) -> DockingParams {
        let mut params = self.base.clone();
        if let Some(ligand) = auto_ligand {
            let fitted = DockingParams::from_auto_ligand(ligand);
            params.center = fitted.center;
            params.size = fitted.size;
        }
        if let Some(center) = self.center {
            params.center = Vector3::from(center);
        }
        if let Some(size) = self.size {
            params.size = Vector3::from(size);
        }
        params
    }
}

/// The fully merged and validated run configuration.
#[derive(Debug, Clone)]
pub struct ScreenPlan {
    pub toolkit: ToolkitKind,
    pub pipeline: PipelineConfig,
    pub inputs: Vec<FileSpec>,
    pub filters: Vec<Filter>,
    pub similarity: Vec<SimilarityMethod>,
    pub cutoff: f64,
    pub queries: Vec<FileSpec>,
    pub receptor: Option<FileSpec>,
    pub dock: Option<DockingEngineKind>,
    pub docking: DockingSettings,
    pub scores: Vec<String>,
    pub score_files: Vec<PathBuf>,
    pub data_dir: PathBuf,
    pub output: OutputTarget,
    pub output_format: Format,
    pub fields: Vec<String>,
    pub show_progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use vscreen::core::models::atom::Atom;
    use vscreen::core::models::element::Element;
    use nalgebra::Point3;

    fn settings() -> DockingSettings {
        DockingSettings {
            base: DockingParams {
                exhaustiveness: 16,
                ..Default::default()
            },
            auto_ligand: None,
            center: None,
            size: None,
        }
    }

    #[test]
    fn defaults_apply_without_auto_ligand() {
        let params = settings().params(None);
        assert_eq!(params.center, Vector3::zeros());
        assert_eq!(params.size, Vector3::new(20.0, 20.0, 20.0));
        assert_eq!(params.exhaustiveness, 16);
    }

    #[test]
    fn explicit_center_overrides_auto_ligand() {
        let ligand = Molecule::new(
            "ref",
            vec![
                Atom::new(Element::C, "C1", Point3::new(0.0, 0.0, 0.0)),
                Atom::new(Element::C, "C2", Point3::new(2.0, 4.0, 6.0)),
            ],
            Vec::new(),
        );
        let mut s = settings();
        s.center = Some([9.0, 9.0, 9.0]);
        let params = s.params(Some(&ligand));
        assert_eq!(params.center, Vector3::new(9.0, 9.0, 9.0));
        assert_eq!(params.size, Vector3::new(12.0, 14.0, 16.0));
    }
}
