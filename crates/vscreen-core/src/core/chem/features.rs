use super::protein;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use crate::core::utils::geometry::{centroid, ring_normal};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

/// An aromatic ring with its geometric center and plane normal.
#[derive(Debug, Clone, PartialEq)]
pub struct AromaticRing {
    pub atoms: Vec<usize>,
    pub centroid: Point3<f64>,
    pub normal: Vector3<f64>,
}

/// Per-atom pharmacophoric flags plus the aromatic rings of a molecule.
///
/// Ligand flags are derived from connectivity; atoms that belong to standard
/// residues of a receptor use residue/atom-name tables instead.
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub hydrophobic: Vec<bool>,
    pub donor: Vec<bool>,
    pub acceptor: Vec<bool>,
    pub cation: Vec<bool>,
    pub anion: Vec<bool>,
    pub halogen_donor: Vec<bool>,
    pub metal: Vec<bool>,
    pub rings: Vec<AromaticRing>,
}

impl Features {
    pub fn compute(molecule: &Molecule) -> Self {
        let n = molecule.atom_count();
        let mut features = Features {
            hydrophobic: vec![false; n],
            donor: vec![false; n],
            acceptor: vec![false; n],
            cation: vec![false; n],
            anion: vec![false; n],
            halogen_donor: vec![false; n],
            metal: vec![false; n],
            rings: Vec::new(),
        };
        for i in 0..n {
            let atom = molecule.atom(i);
            if atom.is_hydrogen() {
                continue;
            }
            features.metal[i] = atom.element.is_metal();
            features.hydrophobic[i] = is_hydrophobic(molecule, i);
            match standard_residue(molecule, i) {
                Some(residue) => {
                    let name = atom.name.as_str();
                    features.donor[i] = protein::is_donor(residue, name, atom.element);
                    features.acceptor[i] = protein::is_acceptor(residue, name, atom.element);
                    features.cation[i] = protein::is_cationic(residue, name);
                    features.anion[i] = protein::is_anionic(residue, name);
                }
                None => {
                    features.donor[i] = is_ligand_donor(molecule, i);
                    features.acceptor[i] = is_ligand_acceptor(molecule, i);
                    features.cation[i] = atom.formal_charge > 0 && !features.metal[i];
                    features.anion[i] = atom.formal_charge < 0;
                    features.halogen_donor[i] = matches!(atom.element, Element::CL | Element::BR | Element::I)
                        && molecule.neighbors(i).any(|n| molecule.atom(n).element == Element::C);
                }
            }
        }
        features.rings = aromatic_rings(molecule);
        features
    }
}

fn standard_residue(molecule: &Molecule, atom: usize) -> Option<&str> {
    let residue = molecule.atom(atom).residue.as_ref()?;
    (molecule.protein && !residue.hetero && protein::is_amino_acid(&residue.name)
        || residue.name == "HOH"
        || residue.name == "WAT")
        .then_some(residue.name.as_str())
}

fn is_hydrophobic(molecule: &Molecule, atom: usize) -> bool {
    match molecule.atom(atom).element {
        Element::C => molecule
            .neighbors(atom)
            .all(|n| matches!(molecule.atom(n).element, Element::C | Element::H)),
        Element::CL | Element::BR | Element::I => true,
        Element::S => molecule
            .neighbors(atom)
            .all(|n| matches!(molecule.atom(n).element, Element::C | Element::S)),
        _ => false,
    }
}

fn is_ligand_donor(molecule: &Molecule, atom: usize) -> bool {
    matches!(molecule.atom(atom).element, Element::N | Element::O) && molecule.hydrogen_count(atom) > 0
}

fn is_amide_nitrogen(molecule: &Molecule, atom: usize) -> bool {
    molecule.neighbors(atom).any(|c| {
        molecule.atom(c).element == Element::C
            && molecule.bonded(c).any(|(o, bond)| {
                bond.order == BondOrder::Double
                    && matches!(molecule.atom(o).element, Element::O | Element::S)
            })
    })
}

fn is_ligand_acceptor(molecule: &Molecule, atom: usize) -> bool {
    let a = molecule.atom(atom);
    match a.element {
        Element::O => a.formal_charge <= 0,
        Element::N => {
            a.formal_charge <= 0
                && molecule.hydrogen_count(atom) == 0
                && !is_amide_nitrogen(molecule, atom)
                && !(a.aromatic && molecule.heavy_degree(atom) == 3)
        }
        _ => false,
    }
}

fn aromatic_rings(molecule: &Molecule) -> Vec<AromaticRing> {
    let mut rings: Vec<Vec<usize>> = Vec::new();
    let mut by_residue: HashMap<(char, isize, &str), HashMap<&str, usize>> = HashMap::new();
    for (i, atom) in molecule.atoms().iter().enumerate() {
        if let Some(residue) = atom.residue.as_ref().filter(|r| molecule.protein && !r.hetero) {
            if !protein::aromatic_ring_templates(&residue.name).is_empty() {
                by_residue
                    .entry((residue.chain, residue.number, residue.name.as_str()))
                    .or_default()
                    .insert(atom.name.trim(), i);
            }
        }
    }
    for ((_, _, name), atoms) in &by_residue {
        for template in protein::aromatic_ring_templates(name) {
            let ring: Option<Vec<usize>> = template.iter().map(|n| atoms.get(n).copied()).collect();
            rings.extend(ring);
        }
    }
    for ring in molecule.rings() {
        let templated = ring.iter().any(|&a| {
            molecule.atom(a).residue.as_ref().is_some_and(|r| {
                molecule.protein && !r.hetero && !protein::aromatic_ring_templates(&r.name).is_empty()
            })
        });
        if !templated && ring.iter().all(|&a| molecule.atom(a).aromatic) {
            rings.push(ring.clone());
        }
    }
    rings.sort();
    rings
        .into_iter()
        .filter_map(|atoms| {
            let points: Vec<_> = atoms.iter().map(|&a| molecule.atom(a).position).collect();
            Some(AromaticRing {
                centroid: centroid(&points)?,
                normal: ring_normal(&points)?,
                atoms,
            })
        })
        .collect()
}
