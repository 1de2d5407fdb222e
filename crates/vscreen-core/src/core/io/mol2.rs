use super::Format;
use super::error::Error;
use super::lines::Lines;
use super::traits::MolecularFile;
use crate::core::models::atom::{Atom, ResidueInfo};
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{BufRead, Write};

const MOLECULE_TAG: &str = "@<TRIPOS>MOLECULE";

/// Tripos MOL2 files.
pub struct Mol2File;

pub struct Mol2Records<R> {
    lines: Lines<R>,
    started: bool,
    done: bool,
}

impl<R: BufRead> Mol2Records<R> {
    /// Collects the lines of the next `@<TRIPOS>MOLECULE` block.
    fn next_block(&mut self) -> Result<Option<Vec<(usize, String)>>, Error> {
        if !self.started {
            loop {
                match self.lines.next_line()? {
                    Some(line) if line.trim().eq_ignore_ascii_case(MOLECULE_TAG) => break,
                    Some(_) => continue,
                    None => return Ok(None),
                }
            }
            self.started = true;
        }
        let mut block = Vec::new();
        while let Some(line) = self.lines.next_line()? {
            if line.trim().eq_ignore_ascii_case(MOLECULE_TAG) {
                return Ok(Some(block));
            }
            block.push((self.lines.line_no(), line));
        }
        self.done = true;
        Ok(Some(block))
    }
}

impl<R: BufRead> Iterator for Mol2Records<R> {
    type Item = Result<Molecule, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_block() {
            Ok(Some(block)) => Some(parse_block(&block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn section<'a>(block: &'a [(usize, String)], name: &str) -> &'a [(usize, String)] {
    let Some(start) = block
        .iter()
        .position(|(_, l)| l.trim().eq_ignore_ascii_case(name))
    else {
        return &[];
    };
    let rest = &block[start + 1..];
    let end = rest
        .iter()
        .position(|(_, l)| l.trim_start().starts_with("@<TRIPOS>"))
        .unwrap_or(rest.len());
    &rest[..end]
}

fn data_lines(lines: &[(usize, String)]) -> impl Iterator<Item = &(usize, String)> {
    lines.iter().filter(|(_, l)| {
        let t = l.trim();
        !t.is_empty() && !t.starts_with('#')
    })
}

fn element_from_sybyl(atom_type: &str, name: &str) -> Option<Element> {
    let base = atom_type.split('.').next().unwrap_or("");
    Element::from_symbol(base).or_else(|| Element::guess_from_name(name, false))
}

fn residue_from_substructure(subst_id: &str, subst_name: &str) -> Option<ResidueInfo> {
    if subst_name.is_empty() || subst_name.starts_with('*') {
        return None;
    }
    let letters: String = subst_name.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = subst_name.chars().skip(letters.len()).collect();
    let number = digits
        .parse::<isize>()
        .or_else(|_| subst_id.parse::<isize>())
        .unwrap_or(1);
    let name = if letters.is_empty() { subst_name } else { letters.as_str() };
    Some(ResidueInfo::new(name, number, ' '))
}

fn parse_block(block: &[(usize, String)]) -> Result<Molecule, Error> {
    let first_line = block.first().map(|(ln, _)| *ln).unwrap_or(1);
    let mut header = block.iter();
    let title = header.next().map(|(_, l)| l.trim().to_string()).unwrap_or_default();
    let (counts_no, counts) = header
        .next()
        .ok_or_else(|| Error::parse(Format::Mol2, first_line, "missing counts line"))?;
    let mut counts_tokens = counts.split_whitespace();
    let atom_count = counts_tokens
        .next()
        .and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| Error::parse(Format::Mol2, *counts_no, "invalid atom count"))?;
    let bond_count = counts_tokens
        .next()
        .and_then(|t| t.parse::<usize>().ok())
        .unwrap_or(0);

    let mut atoms = Vec::with_capacity(atom_count);
    let mut id_map = HashMap::new();
    for (ln, raw) in data_lines(section(block, "@<TRIPOS>ATOM")).take(atom_count) {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        if parts.len() < 6 {
            return Err(Error::parse(Format::Mol2, *ln, "invalid ATOM line"));
        }
        let id = parts[0]
            .parse::<usize>()
            .map_err(|_| Error::parse(Format::Mol2, *ln, "invalid atom id"))?;
        let coord = |i: usize| {
            parts[i]
                .parse::<f64>()
                .map_err(|_| Error::parse(Format::Mol2, *ln, "invalid coordinate"))
        };
        let position = Point3::new(coord(2)?, coord(3)?, coord(4)?);
        let element = element_from_sybyl(parts[5], parts[1])
            .ok_or_else(|| Error::parse(Format::Mol2, *ln, "unable to infer element"))?;
        let mut atom = Atom::new(element, parts[1], position);
        atom.atom_type = Some(parts[5].to_string());
        if let (Some(subst_id), Some(subst_name)) = (parts.get(6), parts.get(7)) {
            atom.residue = residue_from_substructure(subst_id, subst_name);
        }
        if let Some(charge) = parts.get(8).and_then(|c| c.parse::<f64>().ok()) {
            atom.partial_charge = charge;
        }
        if atom.atom_type.as_deref() == Some("N.4") {
            atom.formal_charge = 1;
        }
        id_map.insert(id, atoms.len());
        atoms.push(atom);
    }
    if atoms.len() != atom_count {
        return Err(Error::parse(
            Format::Mol2,
            block.last().map(|(ln, _)| *ln).unwrap_or(first_line),
            "ATOM section ended before expected atom count",
        ));
    }

    let mut bonds = Vec::with_capacity(bond_count);
    for (ln, raw) in data_lines(section(block, "@<TRIPOS>BOND")).take(bond_count) {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(Error::parse(Format::Mol2, *ln, "invalid BOND line"));
        }
        let lookup = |token: &str| {
            token
                .parse::<usize>()
                .ok()
                .and_then(|id| id_map.get(&id).copied())
                .ok_or_else(|| Error::parse(Format::Mol2, *ln, "bond references unknown atom id"))
        };
        let order: BondOrder = parts[3]
            .parse()
            .map_err(|_| Error::parse(Format::Mol2, *ln, "unsupported bond type"))?;
        bonds.push(Bond::new(lookup(parts[1])?, lookup(parts[2])?, order));
    }

    Ok(Molecule::new(title, atoms, bonds))
}

/// Sybyl atom type for an atom, derived from element, aromaticity and bond orders
/// when the input did not carry one.
pub fn sybyl_type(molecule: &Molecule, index: usize) -> String {
    let atom = molecule.atom(index);
    if let Some(t) = atom.atom_type.as_deref().filter(|t| t.contains('.') || Element::from_symbol(t).is_some()) {
        return t.to_string();
    }
    let max_order = molecule.bonded(index).map(|(_, b)| b.order).fold(BondOrder::Single, |acc, o| {
        match (acc, o) {
            (BondOrder::Triple, _) | (_, BondOrder::Triple) => BondOrder::Triple,
            (BondOrder::Double, _) | (_, BondOrder::Double) => BondOrder::Double,
            _ => acc,
        }
    });
    let symbol = atom.element.symbol();
    let suffix = match atom.element {
        Element::C | Element::N if atom.aromatic => "ar",
        Element::C | Element::N | Element::O | Element::S | Element::P => match max_order {
            BondOrder::Triple => "1",
            BondOrder::Double => "2",
            _ if atom.element == Element::N && atom.formal_charge > 0 => "4",
            _ => "3",
        },
        _ => "",
    };
    if suffix.is_empty() {
        symbol.to_string()
    } else {
        format!("{symbol}.{suffix}")
    }
}

impl MolecularFile for Mol2File {
    const FORMAT: Format = Format::Mol2;
    type Records<R: BufRead> = Mol2Records<R>;

    fn records<R: BufRead>(reader: R) -> Self::Records<R> {
        Mol2Records {
            lines: Lines::new(reader),
            started: false,
            done: false,
        }
    }

    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Error> {
        writeln!(writer, "{MOLECULE_TAG}")?;
        let title = if molecule.title.is_empty() { "*****" } else { molecule.title.as_str() };
        writeln!(writer, "{title}")?;
        writeln!(writer, " {} {} 1 0 0", molecule.atom_count(), molecule.bonds().len())?;
        writeln!(writer, "{}", if molecule.protein { "PROTEIN" } else { "SMALL" })?;
        writeln!(writer, "USER_CHARGES")?;
        writeln!(writer)?;
        writeln!(writer, "@<TRIPOS>ATOM")?;
        for (i, atom) in molecule.atoms().iter().enumerate() {
            let name = if atom.name.is_empty() {
                format!("{}{}", atom.element.symbol(), i + 1)
            } else {
                atom.name.clone()
            };
            let (subst_id, subst_name) = match &atom.residue {
                Some(r) => (r.number, format!("{}{}", r.name, r.number)),
                None => (1, "UNL1".to_string()),
            };
            let p = atom.position;
            writeln!(
                writer,
                "{:>7} {:<8} {:>10.4} {:>10.4} {:>10.4} {:<6} {:>4} {:<8} {:>9.4}",
                i + 1,
                name,
                p.x,
                p.y,
                p.z,
                sybyl_type(molecule, i),
                subst_id,
                subst_name,
                atom.partial_charge
            )?;
        }
        writeln!(writer, "@<TRIPOS>BOND")?;
        for (i, bond) in molecule.bonds().iter().enumerate() {
            writeln!(
                writer,
                "{:>6} {:>5} {:>5} {}",
                i + 1,
                bond.atom1 + 1,
                bond.atom2 + 1,
                bond.order.sybyl_code()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_MOLECULES: &str = "\
# header comment
@<TRIPOS>MOLECULE
methanol
 2 1 1 0 0
SMALL
USER_CHARGES

@<TRIPOS>ATOM
      1 C1          0.0000    0.0000    0.0000 C.3     1  LIG1       0.1000
      2 O1          1.4000    0.0000    0.0000 O.3     1  LIG1      -0.4000
@<TRIPOS>BOND
     1     1     2 1
@<TRIPOS>MOLECULE
pyridine
 6 6 1 0 0
SMALL
NO_CHARGES

@<TRIPOS>ATOM
      1 N1          1.3900    0.0000    0.0000 N.ar
      2 C2          0.6950    1.2038    0.0000 C.ar
      3 C3         -0.6950    1.2038    0.0000 C.ar
      4 C4         -1.3900    0.0000    0.0000 C.ar
      5 C5         -0.6950   -1.2038    0.0000 C.ar
      6 C6          0.6950   -1.2038    0.0000 C.ar
@<TRIPOS>BOND
     1     1     2 ar
     2     2     3 ar
     3     3     4 ar
     4     4     5 ar
     5     5     6 ar
     6     6     1 ar
";

    #[test]
    fn streams_multiple_molecules() {
        let mols: Vec<Molecule> = Mol2File::records(Cursor::new(TWO_MOLECULES))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(mols.len(), 2);
        assert_eq!(mols[0].title, "methanol");
        assert!((mols[0].atom(1).partial_charge + 0.4).abs() < 1e-9);
        assert_eq!(mols[0].atom(0).residue_name(), Some("LIG"));
        assert_eq!(mols[1].atom(0).element, Element::N);
        assert!(mols[1].bonds().iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn writer_output_reads_back() {
        let mols: Vec<Molecule> = Mol2File::records(Cursor::new(TWO_MOLECULES))
            .collect::<Result<_, _>>()
            .unwrap();
        let mut out = Vec::new();
        for m in &mols {
            Mol2File::write_to(m, &mut out).unwrap();
        }
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains("N.ar"));
        let again: Vec<Molecule> = Mol2File::records(Cursor::new(out))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[1].bonds().len(), 6);
        assert!((again[0].atom(0).partial_charge - 0.1).abs() < 1e-4);
    }

    #[test]
    fn short_atom_section_is_an_error() {
        let text = "@<TRIPOS>MOLECULE\nx\n 3 0\n@<TRIPOS>ATOM\n 1 C1 0 0 0 C.3\n";
        let result = Mol2File::records(Cursor::new(text)).next().unwrap();
        assert!(matches!(result, Err(Error::Parse { format: Format::Mol2, .. })));
    }

    #[test]
    fn derives_sybyl_types_without_input_types() {
        let atoms = vec![
            Atom::new(Element::C, "C1", Point3::origin()),
            Atom::new(Element::O, "O1", Point3::new(1.2, 0.0, 0.0)),
        ];
        let mol = Molecule::new("formaldehyde", atoms, vec![Bond::new(0, 1, BondOrder::Double)]);
        assert_eq!(sybyl_type(&mol, 0), "C.2");
        assert_eq!(sybyl_type(&mol, 1), "O.2");
    }
}
