use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondOrder};
use crate::core::utils::spatial::CellGrid;
use std::collections::{HashSet, VecDeque};

const MAX_RING_SIZE: usize = 8;
const BOND_TOLERANCE: f64 = 0.45;
const MIN_BOND_DISTANCE: f64 = 0.4;

/// Runs ring, aromaticity and implicit hydrogen perception in place.
pub fn perceive(molecule: &mut Molecule) {
    let rings = find_rings(molecule);
    molecule.set_rings(rings);
    assign_aromaticity(molecule);
    assign_implicit_hydrogens(molecule);
}

/// Smallest ring through every bond, deduplicated by atom set.
///
/// Each ring is returned in path order so consecutive atoms are bonded.
pub fn find_rings(molecule: &Molecule) -> Vec<Vec<usize>> {
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut rings = Vec::new();
    for bond in molecule.bonds() {
        if molecule.atom(bond.atom1).is_hydrogen() || molecule.atom(bond.atom2).is_hydrogen() {
            continue;
        }
        if let Some(path) = shortest_path_avoiding(molecule, bond.atom1, bond.atom2) {
            let mut key = path.clone();
            key.sort_unstable();
            if seen.insert(key) {
                rings.push(path);
            }
        }
    }
    rings
}

fn shortest_path_avoiding(molecule: &Molecule, start: usize, goal: usize) -> Option<Vec<usize>> {
    let n = molecule.atom_count();
    let mut parent = vec![usize::MAX; n];
    let mut depth = vec![0usize; n];
    let mut queue = VecDeque::from([start]);
    parent[start] = start;
    while let Some(current) = queue.pop_front() {
        if depth[current] + 1 >= MAX_RING_SIZE {
            continue;
        }
        for next in molecule.neighbors(current) {
            if current == start && next == goal {
                continue;
            }
            if parent[next] != usize::MAX || molecule.atom(next).is_hydrogen() {
                continue;
            }
            parent[next] = current;
            depth[next] = depth[current] + 1;
            if next == goal {
                let mut path = vec![goal];
                let mut cursor = goal;
                while cursor != start {
                    cursor = parent[cursor];
                    path.push(cursor);
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}

fn ring_bond_orders(molecule: &Molecule, ring: &[usize]) -> Vec<BondOrder> {
    ring.iter()
        .enumerate()
        .filter_map(|(k, &a)| {
            let b = ring[(k + 1) % ring.len()];
            molecule.bond_between(a, b).map(|(_, bond)| bond.order)
        })
        .collect()
}

fn has_lone_pair_donor(molecule: &Molecule, atom: usize) -> bool {
    let element = molecule.atom(atom).element;
    matches!(element, Element::N | Element::O | Element::S)
}

/// Flags atoms of aromatic 5- and 6-membered rings.
///
/// A ring is aromatic when all of its bonds are marked aromatic, when a
/// six-membered ring carries three double bonds, or when a five-membered ring
/// carries two double bonds and a heteroatom with a lone pair.
pub fn assign_aromaticity(molecule: &mut Molecule) {
    let mut aromatic_atoms = Vec::new();
    for ring in molecule.rings() {
        if ring.len() != 5 && ring.len() != 6 {
            continue;
        }
        let orders = ring_bond_orders(molecule, ring);
        if orders.len() != ring.len() {
            continue;
        }
        let doubles = orders.iter().filter(|o| **o == BondOrder::Double).count();
        let all_aromatic = orders.iter().all(|o| *o == BondOrder::Aromatic);
        let kekule = match ring.len() {
            6 => doubles == 3,
            _ => {
                doubles == 2
                    && ring.iter().any(|&a| {
                        has_lone_pair_donor(molecule, a)
                            && molecule
                                .bonded(a)
                                .all(|(_, b)| b.order != BondOrder::Double)
                    })
            }
        };
        if all_aromatic || kekule {
            aromatic_atoms.extend(ring.iter().copied());
        }
    }
    for index in aromatic_atoms {
        molecule.atoms_mut()[index].aromatic = true;
    }
}

fn target_valence(atom: &Atom) -> Option<i32> {
    let base = atom.element.data().default_valence as i32;
    let charge = atom.formal_charge as i32;
    match atom.element {
        Element::C => Some(base - charge.abs()),
        Element::N | Element::P => Some(base + charge),
        Element::O | Element::S => Some(base + charge),
        Element::F | Element::CL | Element::BR | Element::I => Some(base - charge.abs()),
        Element::B => Some(base),
        _ => None,
    }
}

/// Fills `implicit_hydrogens` for organic-subset atoms of non-protein molecules.
pub fn assign_implicit_hydrogens(molecule: &mut Molecule) {
    let counts: Vec<u8> = (0..molecule.atom_count())
        .map(|i| {
            let atom = molecule.atom(i);
            if molecule.protein || atom.residue.as_ref().is_some_and(|r| !r.hetero) {
                return 0;
            }
            let Some(target) = target_valence(atom) else {
                return 0;
            };
            let valence = match molecule.explicit_valence(i) {
                v if atom.aromatic => v.floor(),
                v => v,
            };
            (target - valence.ceil() as i32).clamp(0, 4) as u8
        })
        .collect();
    for (atom, count) in molecule.atoms_mut().iter_mut().zip(counts) {
        atom.implicit_hydrogens = count;
    }
}

/// Connects atoms closer than the sum of their covalent radii plus a tolerance.
///
/// Used for formats without connectivity (XYZ, PDB without `CONECT`). Every
/// perceived bond is single. Hydrogens keep only their closest partner.
pub fn perceive_bonds(atoms: &[Atom]) -> Vec<Bond> {
    let positions: Vec<_> = atoms.iter().map(|a| a.position).collect();
    let max_radius = atoms
        .iter()
        .map(|a| a.element.data().covalent_radius)
        .fold(0.0, f64::max);
    let grid = CellGrid::new(positions, 2.0 * max_radius + BOND_TOLERANCE);
    let mut bonds = Vec::new();
    let mut hydrogen_partner: Vec<Option<(usize, f64)>> = vec![None; atoms.len()];
    for (i, atom) in atoms.iter().enumerate() {
        let ri = atom.element.data().covalent_radius;
        if ri == 0.0 {
            continue;
        }
        for (j, distance) in grid.within(&atom.position, 2.0 * max_radius + BOND_TOLERANCE) {
            if j <= i || distance < MIN_BOND_DISTANCE {
                continue;
            }
            let other = &atoms[j];
            let rj = other.element.data().covalent_radius;
            if rj == 0.0 || distance > ri + rj + BOND_TOLERANCE {
                continue;
            }
            if atom.element.is_metal() || other.element.is_metal() {
                continue;
            }
            match (atom.is_hydrogen(), other.is_hydrogen()) {
                (true, true) => continue,
                (true, false) => keep_closest(&mut hydrogen_partner[i], j, distance),
                (false, true) => keep_closest(&mut hydrogen_partner[j], i, distance),
                (false, false) => bonds.push(Bond::new(i, j, BondOrder::Single)),
            }
        }
    }
    for (h, partner) in hydrogen_partner.into_iter().enumerate() {
        if let Some((heavy, _)) = partner {
            bonds.push(Bond::new(heavy.min(h), heavy.max(h), BondOrder::Single));
        }
    }
    bonds
}

fn keep_closest(slot: &mut Option<(usize, f64)>, candidate: usize, distance: f64) {
    if slot.is_none_or(|(_, best)| distance < best) {
        *slot = Some((candidate, distance));
    }
}

/// Atoms whose explicit valence exceeds what the element allows at its formal charge.
pub fn valence_violations(molecule: &Molecule) -> Vec<usize> {
    (0..molecule.atom_count())
        .filter(|&i| {
            let atom = molecule.atom(i);
            if atom.element == Element::DUMMY || atom.element.is_metal() {
                return false;
            }
            let allowed = atom.element.data().max_valence as f64 + atom.formal_charge.unsigned_abs() as f64;
            let bonded = molecule.explicit_valence(i);
            let valence = if atom.aromatic { bonded.floor() } else { bonded };
            valence > allowed + 1e-6
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use nalgebra::Point3;

    pub(crate) fn benzene(kekule: bool) -> Molecule {
        let atoms: Vec<Atom> = (0..6)
            .map(|k| {
                let t = std::f64::consts::PI / 3.0 * k as f64;
                Atom::new(Element::C, &format!("C{}", k + 1), Point3::new(1.39 * t.cos(), 1.39 * t.sin(), 0.0))
            })
            .collect();
        let bonds = (0..6)
            .map(|k| {
                let order = match (kekule, k % 2) {
                    (false, _) => BondOrder::Aromatic,
                    (true, 0) => BondOrder::Double,
                    (true, _) => BondOrder::Single,
                };
                Bond::new(k, (k + 1) % 6, order)
            })
            .collect();
        Molecule::new("benzene", atoms, bonds)
    }

    #[test]
    fn finds_single_six_ring_in_benzene() {
        let mol = benzene(false);
        let rings = find_rings(&mol);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 6);
    }

    #[test]
    fn aromatic_and_kekule_benzene_are_aromatic_with_one_hydrogen_each() {
        for kekule in [false, true] {
            let mut mol = benzene(kekule);
            perceive(&mut mol);
            assert!(mol.atoms().iter().all(|a| a.aromatic), "kekule={kekule}");
            assert!(mol.atoms().iter().all(|a| a.implicit_hydrogens == 1), "kekule={kekule}");
            assert!((0..6).all(|b| mol.is_ring_bond(b)));
        }
    }

    #[test]
    fn cyclohexane_is_not_aromatic() {
        let mut mol = benzene(false);
        let bonds: Vec<_> = mol.bonds().iter().map(|b| Bond::new(b.atom1, b.atom2, BondOrder::Single)).collect();
        mol = Molecule::new("cyclohexane", mol.atoms().to_vec(), bonds);
        perceive(&mut mol);
        assert!(mol.atoms().iter().all(|a| !a.aromatic));
        assert!(mol.atoms().iter().all(|a| a.implicit_hydrogens == 2));
    }

    #[test]
    fn implicit_hydrogens_respect_charge() {
        let atoms = vec![
            Atom::new(Element::N, "N", Point3::origin()),
            Atom::new(Element::C, "C", Point3::new(1.5, 0.0, 0.0)),
        ];
        let mut mol = Molecule::new("methylammonium", atoms, vec![Bond::new(0, 1, BondOrder::Single)]);
        mol.atoms_mut()[0].formal_charge = 1;
        perceive(&mut mol);
        assert_eq!(mol.atom(0).implicit_hydrogens, 3);
        assert_eq!(mol.atom(1).implicit_hydrogens, 3);
    }

    #[test]
    fn perceives_bonds_from_distances() {
        let atoms = vec![
            Atom::new(Element::C, "C1", Point3::new(0.0, 0.0, 0.0)),
            Atom::new(Element::O, "O1", Point3::new(1.43, 0.0, 0.0)),
            Atom::new(Element::H, "H1", Point3::new(1.75, 0.9, 0.0)),
            Atom::new(Element::C, "C2", Point3::new(5.0, 0.0, 0.0)),
        ];
        let bonds = perceive_bonds(&atoms);
        assert_eq!(bonds.len(), 2);
        assert!(bonds.iter().any(|b| b.contains(0) && b.contains(1)));
        assert!(bonds.iter().any(|b| b.contains(1) && b.contains(2)));
    }

    #[test]
    fn detects_pentavalent_carbon() {
        let mut atoms = vec![Atom::new(Element::C, "C", Point3::origin())];
        let mut bonds = Vec::new();
        for k in 0..5 {
            atoms.push(Atom::new(Element::H, "H", Point3::new(k as f64, 1.0, 0.0)));
            bonds.push(Bond::new(0, k + 1, BondOrder::Single));
        }
        let mol = Molecule::new("bad", atoms, bonds);
        assert_eq!(valence_violations(&mol), vec![0]);
    }
}
