use super::Format;
use super::error::Error;
use super::pdb::{PdbRecords, atom_name, format_atom_name};
use super::traits::MolecularFile;
use crate::core::chem::descriptors::is_rotatable;
use crate::core::chem::features::Features;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

/// AutoDock PDBQT files.
///
/// Ligands are written with a torsion tree (`ROOT`/`BRANCH`/`TORSDOF`),
/// receptors (molecules flagged `protein`) as rigid atom lists.
pub struct PdbqtFile;

/// AutoDock atom type of atom `index`.
pub fn autodock_type(molecule: &Molecule, features: &Features, index: usize) -> String {
    let atom = molecule.atom(index);
    match atom.element {
        Element::H => {
            let polar = molecule
                .neighbors(index)
                .any(|n| matches!(molecule.atom(n).element, Element::N | Element::O | Element::S));
            (if polar { "HD" } else { "H" }).to_string()
        }
        Element::C if atom.aromatic => "A".to_string(),
        Element::C => "C".to_string(),
        Element::N if features.acceptor[index] => "NA".to_string(),
        Element::N => "N".to_string(),
        Element::O => "OA".to_string(),
        Element::S => "SA".to_string(),
        other => other.symbol().to_string(),
    }
}

fn atom_line(
    out: &mut String,
    molecule: &Molecule,
    features: &Features,
    index: usize,
    serial: usize,
) {
    let atom = molecule.atom(index);
    let (res_name, chain, res_seq) = match &atom.residue {
        Some(r) => (r.name.as_str(), r.chain, r.number),
        None => ("UNL", ' ', 1),
    };
    let p = atom.position;
    let _ = writeln!(
        out,
        "ATOM  {:>5} {} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}    {:>6.3} {:<2}",
        serial % 100_000,
        format_atom_name(&atom_name(molecule, index), atom.element),
        res_name,
        chain,
        res_seq,
        p.x,
        p.y,
        p.z,
        1.0,
        0.0,
        atom.partial_charge,
        autodock_type(molecule, features, index)
    );
}

/// Writes a receptor as a rigid PDBQT atom list.
pub fn write_receptor(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Error> {
    let features = Features::compute(molecule);
    let mut out = String::new();
    for index in 0..molecule.atom_count() {
        atom_line(&mut out, molecule, &features, index, index + 1);
    }
    writer.write_all(out.as_bytes())?;
    Ok(())
}

struct TorsionTree {
    fragments: Vec<Vec<usize>>,
    fragment_of: Vec<usize>,
    /// Rotatable bonds as `(atom in parent side, atom in child side)` candidates.
    rotatable: Vec<(usize, usize)>,
    root: usize,
}

fn find(parent: &mut [usize], x: usize) -> usize {
    let mut root = x;
    while parent[root] != root {
        root = parent[root];
    }
    let mut cursor = x;
    while parent[cursor] != root {
        let next = parent[cursor];
        parent[cursor] = root;
        cursor = next;
    }
    root
}

fn build_tree(molecule: &Molecule) -> TorsionTree {
    let n = molecule.atom_count();
    let mut parent: Vec<usize> = (0..n).collect();
    let mut rotatable = Vec::new();
    for (index, bond) in molecule.bonds().iter().enumerate() {
        if is_rotatable(molecule, index) {
            rotatable.push((bond.atom1, bond.atom2));
        } else {
            let (a, b) = (find(&mut parent, bond.atom1), find(&mut parent, bond.atom2));
            if a != b {
                parent[a.max(b)] = a.min(b);
            }
        }
    }
    let mut slots: HashMap<usize, usize> = HashMap::new();
    let mut fragments: Vec<Vec<usize>> = Vec::new();
    let mut fragment_of = vec![0; n];
    for atom in 0..n {
        let representative = find(&mut parent, atom);
        let slot = *slots.entry(representative).or_insert_with(|| {
            fragments.push(Vec::new());
            fragments.len() - 1
        });
        fragments[slot].push(atom);
        fragment_of[atom] = slot;
    }
    let heavy = |f: &Vec<usize>| f.iter().filter(|&&a| !molecule.atom(a).is_hydrogen()).count();
    let root = (0..fragments.len())
        .max_by(|&a, &b| heavy(&fragments[a]).cmp(&heavy(&fragments[b])).then(b.cmp(&a)))
        .unwrap_or(0);
    TorsionTree {
        fragments,
        fragment_of,
        rotatable,
        root,
    }
}

struct Emitter<'a> {
    molecule: &'a Molecule,
    features: Features,
    tree: TorsionTree,
    visited: Vec<bool>,
    serial_of: Vec<usize>,
    order: Vec<usize>,
    out: String,
}

impl Emitter<'_> {
    fn emit_atoms(&mut self, atoms: &[usize]) {
        for &atom in atoms {
            let serial = self.order.len() + 1;
            self.serial_of[atom] = serial;
            self.order.push(atom);
            atom_line(&mut self.out, self.molecule, &self.features, atom, serial);
        }
    }

    fn emit_branches(&mut self, fragment: usize) {
        let atoms = self.tree.fragments[fragment].clone();
        for atom in atoms {
            let children: Vec<usize> = self
                .tree
                .rotatable
                .iter()
                .filter_map(|&(a, b)| match (a == atom, b == atom) {
                    (true, _) => Some(b),
                    (_, true) => Some(a),
                    _ => None,
                })
                .collect();
            for child in children {
                let child_fragment = self.tree.fragment_of[child];
                if self.visited[child_fragment] {
                    continue;
                }
                self.visited[child_fragment] = true;
                let _ = writeln!(self.out, "BRANCH {:>3} {:>3}", self.serial_of[atom], self.order.len() + 1);
                let mut child_atoms = self.tree.fragments[child_fragment].clone();
                if let Some(pos) = child_atoms.iter().position(|&a| a == child) {
                    child_atoms.swap(0, pos);
                }
                self.emit_atoms(&child_atoms);
                self.emit_branches(child_fragment);
                let _ = writeln!(self.out, "ENDBRANCH {:>3} {:>3}", self.serial_of[atom], self.serial_of[child]);
            }
        }
    }
}

/// Writes a flexible ligand and returns the original atom index of every
/// written atom, in file order. Docked poses read back from Vina list atoms in
/// that same order.
pub fn write_ligand(molecule: &Molecule, writer: &mut impl Write) -> Result<Vec<usize>, Error> {
    if molecule.atom_count() == 0 {
        writeln!(writer, "REMARK  Name = {}\nROOT\nENDROOT\nTORSDOF 0", molecule.title)?;
        return Ok(Vec::new());
    }
    let tree = build_tree(molecule);
    let fragment_count = tree.fragments.len();
    let mut emitter = Emitter {
        molecule,
        features: Features::compute(molecule),
        visited: vec![false; fragment_count],
        serial_of: vec![0; molecule.atom_count()],
        order: Vec::with_capacity(molecule.atom_count()),
        out: String::new(),
        tree,
    };
    let root = emitter.tree.root;
    emitter.visited[root] = true;

    let _ = writeln!(emitter.out, "REMARK  Name = {}", molecule.title);
    let _ = writeln!(emitter.out, "ROOT");
    let root_atoms = emitter.tree.fragments.get(root).cloned().unwrap_or_default();
    emitter.emit_atoms(&root_atoms);
    // Fragments unreachable through rotatable bonds (disconnected components) stay rigid with the root.
    let mut reachable = vec![false; fragment_count];
    reachable[root] = true;
    let mut stack = vec![root];
    while let Some(f) = stack.pop() {
        for &(a, b) in &emitter.tree.rotatable {
            let (fa, fb) = (emitter.tree.fragment_of[a], emitter.tree.fragment_of[b]);
            for (from, to) in [(fa, fb), (fb, fa)] {
                if from == f && !reachable[to] {
                    reachable[to] = true;
                    stack.push(to);
                }
            }
        }
    }
    for f in 0..fragment_count {
        if !reachable[f] {
            emitter.visited[f] = true;
            let atoms = emitter.tree.fragments[f].clone();
            emitter.emit_atoms(&atoms);
        }
    }
    let _ = writeln!(emitter.out, "ENDROOT");
    emitter.emit_branches(root);
    let _ = writeln!(emitter.out, "TORSDOF {}", emitter.tree.rotatable.len());

    writer.write_all(emitter.out.as_bytes())?;
    Ok(emitter.order)
}

impl MolecularFile for PdbqtFile {
    const FORMAT: Format = Format::Pdbqt;
    type Records<R: BufRead> = PdbRecords<R>;

    fn records<R: BufRead>(reader: R) -> Self::Records<R> {
        PdbRecords::new(reader, Format::Pdbqt)
    }

    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Error> {
        if molecule.protein {
            write_receptor(molecule, writer)
        } else {
            write_ligand(molecule, writer).map(|_| ())
        }
    }
}
