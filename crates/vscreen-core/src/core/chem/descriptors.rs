use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;

const HYDROGEN_MASS: f64 = 1.008;

/// Molecular weight including implicit hydrogens.
pub fn molecular_weight(molecule: &Molecule) -> f64 {
    molecule
        .atoms()
        .iter()
        .map(|a| a.element.mass() + a.implicit_hydrogens as f64 * HYDROGEN_MASS)
        .sum()
}

/// Lipinski acceptor count: nitrogen and oxygen atoms.
pub fn hydrogen_bond_acceptors(molecule: &Molecule) -> usize {
    molecule
        .atoms()
        .iter()
        .filter(|a| matches!(a.element, Element::N | Element::O))
        .count()
}

/// Lipinski donor count: nitrogen and oxygen atoms bearing at least one hydrogen.
pub fn hydrogen_bond_donors(molecule: &Molecule) -> usize {
    (0..molecule.atom_count())
        .filter(|&i| {
            matches!(molecule.atom(i).element, Element::N | Element::O)
                && molecule.hydrogen_count(i) > 0
        })
        .count()
}

fn bonded_to_heteroatom(molecule: &Molecule, atom: usize) -> bool {
    molecule
        .neighbors(atom)
        .any(|n| !matches!(molecule.atom(n).element, Element::C | Element::H))
}

fn has_double_bond_to(molecule: &Molecule, atom: usize, element: Element) -> bool {
    molecule
        .bonded(atom)
        .any(|(n, b)| b.order == BondOrder::Double && molecule.atom(n).element == element)
}

fn heavy_atom_contribution(molecule: &Molecule, atom: usize) -> f64 {
    let a = molecule.atom(atom);
    match a.element {
        Element::C if a.aromatic && bonded_to_heteroatom(molecule, atom) => 0.1360,
        Element::C if a.aromatic => 0.1581,
        Element::C if has_double_bond_to(molecule, atom, Element::O) => -0.0516,
        Element::C if bonded_to_heteroatom(molecule, atom) => -0.2035,
        Element::C => 0.1441,
        Element::N if a.formal_charge > 0 => -0.3187,
        Element::N if a.aromatic => -0.4806,
        Element::N if molecule.neighbors(atom).any(|c| has_double_bond_to(molecule, c, Element::O)) => -0.7096,
        Element::N => -1.0190,
        Element::O if a.formal_charge < 0 => -1.3260,
        Element::O if a.aromatic => 0.1552,
        Element::O if molecule.bonded(atom).any(|(_, b)| b.order == BondOrder::Double) => -0.1526,
        Element::O if molecule.hydrogen_count(atom) > 0 => -0.2893,
        Element::O => -0.0684,
        Element::S => 0.6482,
        Element::P => 0.8612,
        Element::F => 0.4202,
        Element::CL => 0.6895,
        Element::BR => 0.8456,
        Element::I => 0.8857,
        _ => 0.0,
    }
}

fn hydrogen_contribution(parent: Element) -> f64 {
    match parent {
        Element::N => 0.2142,
        Element::O => -0.2677,
        _ => 0.1230,
    }
}

/// Octanol/water partition coefficient.
///
/// Atom contributions follow the Wildman-Crippen scheme collapsed to
/// element/environment classes; hydrogens are credited to their heavy parent.
pub fn logp(molecule: &Molecule) -> f64 {
    let mut total = 0.0;
    for i in molecule.heavy_atoms() {
        total += heavy_atom_contribution(molecule, i);
        let hydrogens = molecule.hydrogen_count(i) as f64;
        total += hydrogens * hydrogen_contribution(molecule.atom(i).element);
    }
    total
}

fn is_amide_bond(molecule: &Molecule, a: usize, b: usize) -> bool {
    let check = |c: usize, n: usize| {
        molecule.atom(c).element == Element::C
            && molecule.atom(n).element == Element::N
            && has_double_bond_to(molecule, c, Element::O)
    };
    check(a, b) || check(b, a)
}

fn has_triple_bond(molecule: &Molecule, atom: usize) -> bool {
    molecule.bonded(atom).any(|(_, b)| b.order == BondOrder::Triple)
}

/// Whether bond `index` is a rotatable torsion: single, acyclic, between two
/// non-terminal heavy atoms, and neither an amide nor next to a triple bond.
pub fn is_rotatable(molecule: &Molecule, index: usize) -> bool {
    let bond = &molecule.bonds()[index];
    let (a, b) = (bond.atom1, bond.atom2);
    bond.order == BondOrder::Single
        && !molecule.is_ring_bond(index)
        && !molecule.atom(a).is_hydrogen()
        && !molecule.atom(b).is_hydrogen()
        && molecule.heavy_degree(a) > 1
        && molecule.heavy_degree(b) > 1
        && !is_amide_bond(molecule, a, b)
        && !has_triple_bond(molecule, a)
        && !has_triple_bond(molecule, b)
}

pub fn rotatable_bonds(molecule: &Molecule) -> usize {
    (0..molecule.bonds().len())
        .filter(|&i| is_rotatable(molecule, i))
        .count()
}
