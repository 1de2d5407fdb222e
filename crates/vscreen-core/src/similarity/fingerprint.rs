use super::interactions::{CHANNEL_COUNT, detect};
use crate::core::chem::protein::{RESIDUE_TYPE_COUNT, residue_type_index};
use crate::core::chem::receptor::PreparedReceptor;
use crate::core::models::molecule::Molecule;

/// Interaction fingerprint: one block of channel counts per receptor residue,
/// in receptor residue order.
pub fn ifp(ligand: &Molecule, receptor: &PreparedReceptor) -> Vec<f64> {
    let mut counts = vec![0.0; receptor.residues().len() * CHANNEL_COUNT];
    for interaction in detect(ligand, receptor) {
        counts[interaction.residue * CHANNEL_COUNT + interaction.channel as usize] += 1.0;
    }
    counts
}

/// Simple interaction fingerprint: channel counts aggregated by residue type.
pub fn sifp(ligand: &Molecule, receptor: &PreparedReceptor) -> Vec<f64> {
    let mut counts = vec![0.0; RESIDUE_TYPE_COUNT * CHANNEL_COUNT];
    for interaction in detect(ligand, receptor) {
        let kind = residue_type_index(&receptor.residues()[interaction.residue].name);
        counts[kind * CHANNEL_COUNT + interaction.channel as usize] += 1.0;
    }
    counts
}

/// Dice coefficient on count vectors. Two empty fingerprints score 0.
pub fn dice(a: &[f64], b: &[f64]) -> f64 {
    let total: f64 = a.iter().chain(b).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let shared: f64 = a.iter().zip(b).map(|(x, y)| x.min(*y)).sum();
    2.0 * shared / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::perception::perceive;
    use crate::core::models::atom::{Atom, ResidueInfo};
    use crate::core::models::element::Element;
    use nalgebra::Point3;
    use std::sync::Arc;

    fn receptor() -> PreparedReceptor {
        let atoms = vec![
            Atom::new(Element::C, "CB", Point3::new(20.0, 0.0, 0.0)).with_residue(ResidueInfo::new("ALA", 1, 'A')),
            Atom::new(Element::O, "OG", Point3::new(0.0, 0.0, 2.9)).with_residue(ResidueInfo::new("SER", 2, 'A')),
        ];
        let mut mol = Molecule::new("rec", atoms, Vec::new());
        mol.protein = true;
        PreparedReceptor::new(Arc::new(mol))
    }

    fn methanol() -> Molecule {
        let atoms = vec![
            Atom::new(Element::C, "C1", Point3::new(-1.4, 0.0, 0.0)),
            Atom::new(Element::O, "O1", Point3::origin()),
        ];
        let bonds = vec![crate::core::models::topology::Bond::new(0, 1, Default::default())];
        let mut mol = Molecule::new("methanol", atoms, bonds);
        perceive(&mut mol);
        mol
    }

    #[test]
    fn ifp_places_counts_in_residue_blocks() {
        let fp = ifp(&methanol(), &receptor());
        assert_eq!(fp.len(), 2 * CHANNEL_COUNT);
        assert!(fp[..CHANNEL_COUNT].iter().all(|&c| c == 0.0));
        assert_eq!(fp[CHANNEL_COUNT + 6], 1.0);
        assert_eq!(fp[CHANNEL_COUNT + 7], 1.0);
    }

    #[test]
    fn sifp_aggregates_by_residue_type() {
        let fp = sifp(&methanol(), &receptor());
        assert_eq!(fp.len(), RESIDUE_TYPE_COUNT * CHANNEL_COUNT);
        let serine = residue_type_index("SER");
        assert_eq!(fp[serine * CHANNEL_COUNT + 6], 1.0);
    }

    #[test]
    fn dice_on_counts() {
        assert_eq!(dice(&[1.0, 2.0], &[1.0, 2.0]), 1.0);
        assert_eq!(dice(&[2.0, 0.0], &[1.0, 1.0]), 0.5);
        assert_eq!(dice(&[0.0], &[0.0]), 0.0);
    }
}
