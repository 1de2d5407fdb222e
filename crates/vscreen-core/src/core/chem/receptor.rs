use super::features::Features;
use crate::core::models::molecule::Molecule;
use crate::core::utils::spatial::CellGrid;
use std::collections::HashMap;
use std::sync::Arc;

const GRID_CELL_SIZE: f64 = 4.0;

/// Identity of a receptor residue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueKey {
    pub chain: char,
    pub number: isize,
    pub name: String,
}

/// A receptor with everything that ligand/receptor descriptors need precomputed:
/// atom features, a neighbor grid over heavy atoms and a residue index.
///
/// Preparation is done once per receptor and then shared across worker threads.
#[derive(Debug, Clone)]
pub struct PreparedReceptor {
    molecule: Arc<Molecule>,
    features: Features,
    grid: CellGrid,
    heavy_atoms: Vec<usize>,
    residues: Vec<ResidueKey>,
    residue_of: Vec<Option<usize>>,
}

impl PreparedReceptor {
    pub fn new(molecule: Arc<Molecule>) -> Self {
        let features = Features::compute(&molecule);
        let heavy_atoms: Vec<usize> = molecule.heavy_atoms().collect();
        let points = heavy_atoms
            .iter()
            .map(|&i| molecule.atom(i).position)
            .collect();
        let grid = CellGrid::new(points, GRID_CELL_SIZE);

        let mut keys: Vec<ResidueKey> = molecule
            .atoms()
            .iter()
            .filter_map(|a| a.residue.as_ref())
            .map(|r| ResidueKey {
                chain: r.chain,
                number: r.number,
                name: r.name.clone(),
            })
            .collect();
        keys.sort();
        keys.dedup();
        let slots: HashMap<&ResidueKey, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();
        let residue_of = molecule
            .atoms()
            .iter()
            .map(|a| {
                a.residue.as_ref().and_then(|r| {
                    let key = ResidueKey {
                        chain: r.chain,
                        number: r.number,
                        name: r.name.clone(),
                    };
                    slots.get(&key).copied()
                })
            })
            .collect();

        Self {
            molecule,
            features,
            grid,
            heavy_atoms,
            residues: keys,
            residue_of,
        }
    }

    pub fn molecule(&self) -> &Arc<Molecule> {
        &self.molecule
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn residues(&self) -> &[ResidueKey] {
        &self.residues
    }

    pub fn residue_of(&self, atom: usize) -> Option<usize> {
        self.residue_of.get(atom).copied().flatten()
    }

    /// Receptor heavy atoms within `radius` of `point`, as `(atom index, distance)`.
    pub fn heavy_atoms_within(&self, point: &nalgebra::Point3<f64>, radius: f64) -> Vec<(usize, f64)> {
        self.grid
            .within(point, radius)
            .into_iter()
            .map(|(slot, d)| (self.heavy_atoms[slot], d))
            .collect()
    }
}
