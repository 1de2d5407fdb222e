use super::element::Element;
use nalgebra::Point3;

/// Residue membership of an atom read from a macromolecular format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResidueInfo {
    /// Three-letter residue name (e.g. `"ARG"`, `"HOH"`).
    pub name: String,
    /// Residue sequence number as written in the source file.
    pub number: isize,
    /// Chain identifier, `' '` when absent.
    pub chain: char,
    /// Whether the atom came from a `HETATM` record.
    pub hetero: bool,
}

impl ResidueInfo {
    pub fn new(name: &str, number: isize, chain: char) -> Self {
        Self {
            name: name.trim().to_ascii_uppercase(),
            number,
            chain,
            hetero: false,
        }
    }
}

/// Represents an atom of a molecule together with the per-atom state that the
/// readers, perception routines and writers share.
///
/// Derived fields (`aromatic`, `implicit_hydrogens`) are filled by
/// [`crate::core::chem::perception::perceive`] and should be treated as
/// read-only by downstream code.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Chemical element.
    pub element: Element,
    /// Atom name as found in the source file (may be empty for SDF input).
    pub name: String,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Partial charge carried by the input file (MOL2, PDBQT), zero otherwise.
    pub partial_charge: f64,
    /// Formal charge.
    pub formal_charge: i8,
    /// Residue information for atoms read from PDB-like formats.
    pub residue: Option<ResidueInfo>,
    /// Format-specific atom type string (Sybyl or AutoDock) as read.
    pub atom_type: Option<String>,
    /// Number of hydrogens implied by valence but not present as atoms.
    pub implicit_hydrogens: u8,
    /// Aromaticity flag from ring perception.
    pub aromatic: bool,
}

impl Atom {
    pub fn new(element: Element, name: &str, position: Point3<f64>) -> Self {
        Self {
            element,
            name: name.to_string(),
            position,
            partial_charge: 0.0,
            formal_charge: 0,
            residue: None,
            atom_type: None,
            implicit_hydrogens: 0,
            aromatic: false,
        }
    }

    pub fn with_residue(mut self, residue: ResidueInfo) -> Self {
        self.residue = Some(residue);
        self
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }

    pub fn residue_name(&self) -> Option<&str> {
        self.residue.as_ref().map(|r| r.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_neutral_defaults() {
        let atom = Atom::new(Element::C, "C1", Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.name, "C1");
        assert_eq!(atom.formal_charge, 0);
        assert_eq!(atom.partial_charge, 0.0);
        assert!(atom.residue.is_none());
        assert!(!atom.aromatic);
        assert!(!atom.is_hydrogen());
    }

    #[test]
    fn residue_names_are_normalized() {
        let atom = Atom::new(Element::N, "NZ", Point3::origin())
            .with_residue(ResidueInfo::new(" lys", 42, 'A'));
        assert_eq!(atom.residue_name(), Some("LYS"));
        assert_eq!(atom.residue.as_ref().map(|r| r.number), Some(42));
    }
}
