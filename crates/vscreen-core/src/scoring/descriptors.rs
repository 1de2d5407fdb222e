//! Protein-ligand descriptors used as model inputs.

use crate::core::chem::descriptors::rotatable_bonds;
use crate::core::chem::features::Features;
use crate::core::chem::receptor::PreparedReceptor;
use crate::core::models::molecule::Molecule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interaction radius of the Vina-like terms.
const VINA_CUTOFF: f64 = 8.0;

const RFSCORE_LIGAND_ELEMENTS: [u8; 9] = [6, 7, 8, 9, 15, 16, 17, 35, 53];
const RFSCORE_PROTEIN_ELEMENTS: [u8; 4] = [6, 7, 8, 16];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Descriptor {
    /// Counts of ligand/protein heavy-atom pairs by element pair and distance
    /// bin. Bin `k` covers `(cutoffs[k-1], cutoffs[k]]`, the first bin starts at 0.
    ElementPairCounts {
        ligand_elements: Vec<u8>,
        protein_elements: Vec<u8>,
        cutoffs: Vec<f64>,
    },
    /// Gauss1, gauss2, repulsion, hydrophobic, hydrogen bond and rotor count.
    VinaTerms,
    /// Protein-ligand extended connectivity fingerprint (folded counts).
    Plec {
        depth_ligand: u32,
        depth_protein: u32,
        distance_cutoff: f64,
        size: usize,
    },
    Concat { parts: Vec<Descriptor> },
}

impl Descriptor {
    pub fn rfscore_v1() -> Self {
        Self::ElementPairCounts {
            ligand_elements: RFSCORE_LIGAND_ELEMENTS.to_vec(),
            protein_elements: RFSCORE_PROTEIN_ELEMENTS.to_vec(),
            cutoffs: vec![12.0],
        }
    }

    pub fn rfscore_v2() -> Self {
        Self::ElementPairCounts {
            ligand_elements: RFSCORE_LIGAND_ELEMENTS.to_vec(),
            protein_elements: RFSCORE_PROTEIN_ELEMENTS.to_vec(),
            cutoffs: vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0],
        }
    }

    pub fn rfscore_v3() -> Self {
        Self::Concat {
            parts: vec![Self::rfscore_v1(), Self::VinaTerms],
        }
    }

    pub fn plec(size: usize) -> Self {
        Self::Plec {
            depth_ligand: 2,
            depth_protein: 4,
            distance_cutoff: 4.5,
            size,
        }
    }

    /// Number of values produced by [`Descriptor::compute`].
    pub fn width(&self) -> usize {
        match self {
            Self::ElementPairCounts {
                ligand_elements,
                protein_elements,
                cutoffs,
            } => ligand_elements.len() * protein_elements.len() * cutoffs.len(),
            Self::VinaTerms => 6,
            Self::Plec { size, .. } => *size,
            Self::Concat { parts } => parts.iter().map(Descriptor::width).sum(),
        }
    }

    pub fn compute(&self, ligand: &Molecule, receptor: &PreparedReceptor) -> Vec<f64> {
        match self {
            Self::ElementPairCounts {
                ligand_elements,
                protein_elements,
                cutoffs,
            } => element_pair_counts(ligand, receptor, ligand_elements, protein_elements, cutoffs),
            Self::VinaTerms => vina_terms(ligand, receptor).to_vec(),
            Self::Plec {
                depth_ligand,
                depth_protein,
                distance_cutoff,
                size,
            } => plec(ligand, receptor, *depth_ligand, *depth_protein, *distance_cutoff, *size),
            Self::Concat { parts } => parts.iter().flat_map(|p| p.compute(ligand, receptor)).collect(),
        }
    }
}

fn element_pair_counts(
    ligand: &Molecule,
    receptor: &PreparedReceptor,
    ligand_elements: &[u8],
    protein_elements: &[u8],
    cutoffs: &[f64],
) -> Vec<f64> {
    let bins = cutoffs.len();
    let mut counts = vec![0.0; ligand_elements.len() * protein_elements.len() * bins];
    let Some(&max_cutoff) = cutoffs.last() else {
        return counts;
    };
    let protein = receptor.molecule();
    for i in ligand.heavy_atoms() {
        let atom = ligand.atom(i);
        let Some(li) = ligand_elements.iter().position(|&z| z == atom.element.atomic_number()) else {
            continue;
        };
        for (j, d) in receptor.heavy_atoms_within(&atom.position, max_cutoff) {
            let z = protein.atom(j).element.atomic_number();
            let Some(pj) = protein_elements.iter().position(|&e| e == z) else {
                continue;
            };
            if let Some(bin) = cutoffs.iter().position(|&c| d <= c) {
                counts[(li * protein_elements.len() + pj) * bins + bin] += 1.0;
            }
        }
    }
    counts
}

/// Vina-style steric and polar terms summed over heavy-atom pairs within 8 Å,
/// evaluated on surface distances `d - R1 - R2` with X-Score radii.
pub fn vina_terms(ligand: &Molecule, receptor: &PreparedReceptor) -> [f64; 6] {
    let lig = Features::compute(ligand);
    let rec = receptor.features();
    let protein = receptor.molecule();
    let mut terms = [0.0; 6];
    for i in ligand.heavy_atoms() {
        let atom = ligand.atom(i);
        let ri = atom.element.data().xs_radius;
        for (j, d) in receptor.heavy_atoms_within(&atom.position, VINA_CUTOFF) {
            let s = d - ri - protein.atom(j).element.data().xs_radius;
            terms[0] += (-(s / 0.5).powi(2)).exp();
            terms[1] += (-((s - 3.0) / 2.0).powi(2)).exp();
            if s < 0.0 {
                terms[2] += s * s;
            }
            if lig.hydrophobic[i] && rec.hydrophobic[j] {
                terms[3] += ramp(s, 0.5, 1.5);
            }
            if (lig.donor[i] && rec.acceptor[j]) || (lig.acceptor[i] && rec.donor[j]) {
                terms[4] += ramp(s, -0.7, 0.0);
            }
        }
    }
    terms[5] = rotatable_bonds(ligand) as f64;
    terms
}

/// 1 below `good`, 0 above `bad`, linear in between.
fn ramp(x: f64, good: f64, bad: f64) -> f64 {
    if x <= good {
        1.0
    } else if x >= bad {
        0.0
    } else {
        (bad - x) / (bad - good)
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over 64-bit words; stable across builds, so folded fingerprints
/// stay compatible with models fitted earlier.
fn hash_words(words: &[u64]) -> u64 {
    let mut h = FNV_OFFSET;
    for w in words {
        for byte in w.to_le_bytes() {
            h ^= byte as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
    }
    h
}

fn atom_invariant(molecule: &Molecule, atom: usize) -> u64 {
    let a = molecule.atom(atom);
    hash_words(&[
        a.element.atomic_number() as u64,
        molecule.heavy_degree(atom) as u64,
        molecule.hydrogen_count(atom) as u64,
        (a.formal_charge as i64) as u64,
        a.aromatic as u64,
        molecule.is_ring_atom(atom) as u64,
    ])
}

/// Circular (Morgan-style) environment hash of `atom` at `depth` bonds.
fn environment(molecule: &Molecule, atom: usize, depth: u32, memo: &mut HashMap<(usize, u32), u64>) -> u64 {
    if let Some(&h) = memo.get(&(atom, depth)) {
        return h;
    }
    let h = if depth == 0 {
        atom_invariant(molecule, atom)
    } else {
        let center = environment(molecule, atom, depth - 1, memo);
        let neighbors: Vec<(usize, u64)> = molecule
            .bonded(atom)
            .filter(|(n, _)| !molecule.atom(*n).is_hydrogen())
            .map(|(n, bond)| (n, (bond.order.valence() * 2.0) as u64))
            .collect();
        let mut words: Vec<u64> = neighbors
            .into_iter()
            .map(|(n, order)| hash_words(&[order, environment(molecule, n, depth - 1, memo)]))
            .collect();
        words.sort_unstable();
        words.insert(0, center);
        words.insert(1, depth as u64);
        hash_words(&words)
    };
    memo.insert((atom, depth), h);
    h
}

fn plec(
    ligand: &Molecule,
    receptor: &PreparedReceptor,
    depth_ligand: u32,
    depth_protein: u32,
    cutoff: f64,
    size: usize,
) -> Vec<f64> {
    let mut counts = vec![0.0; size];
    if size == 0 {
        return counts;
    }
    let protein = receptor.molecule();
    let mut ligand_memo = HashMap::new();
    let mut protein_memo = HashMap::new();
    for i in ligand.heavy_atoms() {
        let position = ligand.atom(i).position;
        for (j, _) in receptor.heavy_atoms_within(&position, cutoff) {
            for depth in 0..=depth_ligand.max(depth_protein) {
                let l = environment(ligand, i, depth.min(depth_ligand), &mut ligand_memo);
                let p = environment(protein, j, depth.min(depth_protein), &mut protein_memo);
                let slot = (hash_words(&[l, p]) % size as u64) as usize;
                counts[slot] += 1.0;
            }
        }
    }
    counts
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::chem::perception::{perceive, tests::benzene};
    use crate::core::models::atom::{Atom, ResidueInfo};
    use crate::core::models::element::Element;
    use nalgebra::{Point3, Vector3};
    use std::sync::Arc;

    pub(crate) fn pocket() -> PreparedReceptor {
        let atoms = vec![
            Atom::new(Element::C, "CB", Point3::new(0.0, 0.0, 4.0)).with_residue(ResidueInfo::new("ALA", 1, 'A')),
            Atom::new(Element::N, "N", Point3::new(3.0, 0.0, 4.0)).with_residue(ResidueInfo::new("ALA", 1, 'A')),
            Atom::new(Element::O, "O", Point3::new(0.0, 3.0, 9.0)).with_residue(ResidueInfo::new("ALA", 1, 'A')),
            Atom::new(Element::S, "SG", Point3::new(0.0, 0.0, 30.0)).with_residue(ResidueInfo::new("CYS", 2, 'A')),
        ];
        let mut mol = Molecule::new("pocket", atoms, Vec::new());
        mol.protein = true;
        PreparedReceptor::new(Arc::new(mol))
    }

    fn ligand() -> Molecule {
        let mut mol = benzene(false);
        perceive(&mut mol);
        mol
    }

    #[test]
    fn widths() {
        assert_eq!(Descriptor::rfscore_v1().width(), 36);
        assert_eq!(Descriptor::rfscore_v2().width(), 216);
        assert_eq!(Descriptor::rfscore_v3().width(), 42);
        assert_eq!(Descriptor::plec(4096).width(), 4096);
    }

    #[test]
    fn rfscore_v1_counts_element_pairs_within_twelve_angstroms() {
        let values = Descriptor::rfscore_v1().compute(&ligand(), &pocket());
        assert_eq!(values.len(), 36);
        // Six ring carbons each see C, N and O of the pocket; S is out of range.
        assert_eq!(values[0], 6.0);
        assert_eq!(values[1], 6.0);
        assert_eq!(values[2], 6.0);
        assert_eq!(values[3], 0.0);
        assert_eq!(values.iter().sum::<f64>(), 18.0);
    }

    #[test]
    fn rfscore_v2_bins_by_distance() {
        let values = Descriptor::rfscore_v2().compute(&ligand(), &pocket());
        let carbon_carbon = &values[0..6];
        // Ring carbons lie 4.0-4.3 Å from CB.
        assert_eq!(carbon_carbon[2], 6.0);
        assert_eq!(carbon_carbon.iter().sum::<f64>(), 6.0);
    }

    #[test]
    fn vina_terms_count_rotors_and_attraction() {
        let terms = vina_terms(&ligand(), &pocket());
        assert!(terms[0] > 0.0 && terms[1] > 0.0);
        assert_eq!(terms[2], 0.0);
        assert_eq!(terms[5], 0.0);
    }

    #[test]
    fn plec_is_deterministic_and_translation_sensitive() {
        let d = Descriptor::plec(1024);
        let a = d.compute(&ligand(), &pocket());
        let b = d.compute(&ligand(), &pocket());
        assert_eq!(a, b);
        assert!(a.iter().sum::<f64>() > 0.0);

        let mol = ligand();
        let far: Vec<_> = mol.positions().iter().map(|p| p + Vector3::new(0.0, 0.0, -20.0)).collect();
        let moved = mol.with_positions(&far);
        assert_eq!(d.compute(&moved, &pocket()).iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn descriptor_json_shape() {
        let json = serde_json::to_string(&Descriptor::rfscore_v3()).unwrap();
        assert!(json.starts_with(r#"{"type":"concat","parts":[{"type":"element_pair_counts""#));
        let back: Descriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Descriptor::rfscore_v3());
    }
}
