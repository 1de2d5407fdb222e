use super::atom::Atom;
use super::topology::Bond;
use nalgebra::Point3;

/// Ordered key/value annotations attached to a molecule.
///
/// Insertion order is preserved so that writers (SDF data items, CSV columns)
/// reproduce the order in which fields were produced. Setting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFields(Vec<(String, String)>);

impl DataFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A molecule: atoms, bonds, perceived rings and the data fields accumulated
/// while it travels through a screening pipeline.
///
/// Atoms and bonds are addressed by index. The adjacency list is rebuilt
/// whenever the bond set changes, so neighbor queries are cheap.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    pub title: String,
    pub data: DataFields,
    /// Set by the toolkit when the molecule is prepared as a docking/scoring receptor.
    pub protein: bool,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>,
    rings: Vec<Vec<usize>>,
    ring_bonds: Vec<bool>,
}

impl Molecule {
    /// Builds a molecule, dropping bonds that reference missing atoms or are self loops.
    pub fn new(title: impl Into<String>, atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let n = atoms.len();
        let bonds: Vec<Bond> = bonds
            .into_iter()
            .filter(|b| b.atom1 < n && b.atom2 < n && b.atom1 != b.atom2)
            .collect();
        let mut molecule = Self {
            title: title.into(),
            data: DataFields::new(),
            protein: false,
            ring_bonds: vec![false; bonds.len()],
            atoms,
            bonds,
            adjacency: Vec::new(),
            rings: Vec::new(),
        };
        molecule.rebuild_adjacency();
        molecule
    }

    fn rebuild_adjacency(&mut self) {
        let mut adjacency = vec![Vec::new(); self.atoms.len()];
        for (index, bond) in self.bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, index));
            adjacency[bond.atom2].push((bond.atom1, index));
        }
        self.adjacency = adjacency;
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn atom(&self, index: usize) -> &Atom {
        &self.atoms[index]
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[atom].iter().map(|&(n, _)| n)
    }

    /// Yields `(neighbor, bond)` pairs for `atom`.
    pub fn bonded(&self, atom: usize) -> impl Iterator<Item = (usize, &Bond)> + '_ {
        self.adjacency[atom]
            .iter()
            .map(|&(n, b)| (n, &self.bonds[b]))
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<(usize, &Bond)> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, index)| (index, &self.bonds[index]))
    }

    pub fn heavy_atoms(&self) -> impl Iterator<Item = usize> + '_ {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_hydrogen())
            .map(|(i, _)| i)
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.heavy_atoms().count()
    }

    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.neighbors(atom)
            .filter(|&n| !self.atoms[n].is_hydrogen())
            .count()
    }

    /// Explicit plus implicit hydrogens on `atom`.
    pub fn hydrogen_count(&self, atom: usize) -> usize {
        let explicit = self
            .neighbors(atom)
            .filter(|&n| self.atoms[n].is_hydrogen())
            .count();
        explicit + self.atoms[atom].implicit_hydrogens as usize
    }

    /// Sum of bond valences over explicit bonds.
    pub fn explicit_valence(&self, atom: usize) -> f64 {
        self.bonded(atom).map(|(_, b)| b.order.valence()).sum()
    }

    pub fn rings(&self) -> &[Vec<usize>] {
        &self.rings
    }

    pub fn is_ring_bond(&self, bond: usize) -> bool {
        self.ring_bonds.get(bond).copied().unwrap_or(false)
    }

    pub fn is_ring_atom(&self, atom: usize) -> bool {
        self.rings.iter().any(|r| r.contains(&atom))
    }

    pub(crate) fn set_rings(&mut self, rings: Vec<Vec<usize>>) {
        let mut ring_bonds = vec![false; self.bonds.len()];
        for ring in &rings {
            for (k, &a) in ring.iter().enumerate() {
                let b = ring[(k + 1) % ring.len()];
                if let Some((index, _)) = self.bond_between(a, b) {
                    ring_bonds[index] = true;
                }
            }
        }
        self.rings = rings;
        self.ring_bonds = ring_bonds;
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    pub fn heavy_positions(&self) -> Vec<Point3<f64>> {
        self.atoms
            .iter()
            .filter(|a| !a.is_hydrogen())
            .map(|a| a.position)
            .collect()
    }

    /// Returns a copy with new coordinates for every atom, keeping topology and data.
    ///
    /// `positions` must have one entry per atom.
    pub fn with_positions(&self, positions: &[Point3<f64>]) -> Molecule {
        debug_assert_eq!(positions.len(), self.atoms.len());
        let mut copy = self.clone();
        for (atom, position) in copy.atoms.iter_mut().zip(positions) {
            atom.position = *position;
        }
        copy
    }
}
