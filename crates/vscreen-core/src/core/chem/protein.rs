use crate::core::models::element::Element;
use phf::{Map, Set, phf_map, phf_set};

/// Number of residue-type slots used by residue-type fingerprints (20 amino acids + other).
pub const RESIDUE_TYPE_COUNT: usize = 21;

static AMINO_ACIDS: Map<&'static str, usize> = phf_map! {
    "ALA" => 0, "ARG" => 1, "ASN" => 2, "ASP" => 3, "ASH" => 3,
    "CYS" => 4, "CYX" => 4, "CYM" => 4, "GLN" => 5, "GLU" => 6, "GLH" => 6,
    "GLY" => 7, "HIS" => 8, "HID" => 8, "HIE" => 8, "HIP" => 8,
    "ILE" => 9, "LEU" => 10, "LYS" => 11, "LYN" => 11, "MET" => 12, "MSE" => 12,
    "PHE" => 13, "PRO" => 14, "SER" => 15, "THR" => 16, "TRP" => 17,
    "TYR" => 18, "VAL" => 19,
};

static CATIONIC_ATOMS: Set<&'static str> = phf_set! {
    "LYS:NZ", "ARG:NE", "ARG:NH1", "ARG:NH2", "HIP:ND1", "HIP:NE2",
};

static ANIONIC_ATOMS: Set<&'static str> = phf_set! {
    "ASP:OD1", "ASP:OD2", "GLU:OE1", "GLU:OE2",
};

static HYDROXYL_DONORS: Set<&'static str> = phf_set! {
    "SER:OG", "THR:OG1", "TYR:OH", "HOH:O", "WAT:O",
};

static SIDECHAIN_ACCEPTORS: Set<&'static str> = phf_set! {
    "HIS:ND1", "HIS:NE2", "HID:NE2", "HIE:ND1", "MET:SD",
};

static PHE_RINGS: &[&[&str]] = &[&["CG", "CD1", "CE1", "CZ", "CE2", "CD2"]];
static HIS_RINGS: &[&[&str]] = &[&["CG", "ND1", "CE1", "NE2", "CD2"]];
static TRP_RINGS: &[&[&str]] = &[
    &["CG", "CD1", "NE1", "CE2", "CD2"],
    &["CD2", "CE2", "CZ2", "CH2", "CZ3", "CE3"],
];

fn key(residue: &str, atom: &str) -> String {
    format!("{}:{}", residue.trim(), atom.trim())
}

/// Slot of a residue name in residue-type fingerprints; unknown names map to the last slot.
pub fn residue_type_index(residue: &str) -> usize {
    AMINO_ACIDS
        .get(residue.trim())
        .copied()
        .unwrap_or(RESIDUE_TYPE_COUNT - 1)
}

pub fn is_amino_acid(residue: &str) -> bool {
    AMINO_ACIDS.contains_key(residue.trim())
}

pub fn is_cationic(residue: &str, atom: &str) -> bool {
    CATIONIC_ATOMS.contains(key(residue, atom).as_str())
}

pub fn is_anionic(residue: &str, atom: &str) -> bool {
    atom.trim() == "OXT" || ANIONIC_ATOMS.contains(key(residue, atom).as_str())
}

/// Hydrogen-bond donors of standard residues: every nitrogen except proline's
/// backbone N, hydroxyl oxygens and water.
pub fn is_donor(residue: &str, atom: &str, element: Element) -> bool {
    match element {
        Element::N => !(residue.trim() == "PRO" && atom.trim() == "N"),
        Element::O => HYDROXYL_DONORS.contains(key(residue, atom).as_str()),
        _ => false,
    }
}

/// Hydrogen-bond acceptors of standard residues: every oxygen plus the
/// unprotonated histidine nitrogens and methionine sulfur.
pub fn is_acceptor(residue: &str, atom: &str, element: Element) -> bool {
    element == Element::O || SIDECHAIN_ACCEPTORS.contains(key(residue, atom).as_str())
}

/// Atom names of the aromatic rings of a residue.
pub fn aromatic_ring_templates(residue: &str) -> &'static [&'static [&'static str]] {
    match residue.trim() {
        "PHE" | "TYR" => PHE_RINGS,
        "HIS" | "HID" | "HIE" | "HIP" => HIS_RINGS,
        "TRP" => TRP_RINGS,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_type_index_maps_aliases_and_unknowns() {
        assert_eq!(residue_type_index("HIE"), residue_type_index("HIS"));
        assert_eq!(residue_type_index("ALA"), 0);
        assert_eq!(residue_type_index("HOH"), RESIDUE_TYPE_COUNT - 1);
        assert!(is_amino_acid("TRP"));
        assert!(!is_amino_acid("LIG"));
    }

    #[test]
    fn charged_atoms_are_recognized() {
        assert!(is_cationic("LYS", "NZ"));
        assert!(is_cationic("ARG", " NH2 "));
        assert!(!is_cationic("LYS", "CE"));
        assert!(is_anionic("ASP", "OD2"));
        assert!(is_anionic("GLY", "OXT"));
        assert!(!is_anionic("ASN", "OD1"));
    }

    #[test]
    fn hydrogen_bond_roles() {
        assert!(is_donor("ALA", "N", Element::N));
        assert!(!is_donor("PRO", "N", Element::N));
        assert!(is_donor("SER", "OG", Element::O));
        assert!(!is_donor("ALA", "O", Element::O));
        assert!(is_acceptor("ALA", "O", Element::O));
        assert!(is_acceptor("HIS", "NE2", Element::N));
        assert!(!is_acceptor("LYS", "NZ", Element::N));
    }

    #[test]
    fn ring_templates() {
        assert_eq!(aromatic_ring_templates("TYR").len(), 1);
        assert_eq!(aromatic_ring_templates("TRP").len(), 2);
        assert!(aromatic_ring_templates("ALA").is_empty());
    }
}
