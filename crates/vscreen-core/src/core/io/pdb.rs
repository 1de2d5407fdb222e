use super::Format;
use super::error::Error;
use super::lines::{Lines, column};
use super::traits::MolecularFile;
use crate::core::chem::perception::perceive_bonds;
use crate::core::models::atom::{Atom, ResidueInfo};
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Write};

/// Protein Data Bank files. Each `MODEL`/`ENDMDL` block, or each block
/// terminated by `END`, is one molecule.
pub struct PdbFile;

/// Record reader shared by the PDB and PDBQT formats.
pub struct PdbRecords<R> {
    lines: Lines<R>,
    flavor: Format,
    done: bool,
}

impl<R: BufRead> PdbRecords<R> {
    pub(crate) fn new(reader: R, flavor: Format) -> Self {
        Self {
            lines: Lines::new(reader),
            flavor,
            done: false,
        }
    }

    fn read_block(&mut self) -> Result<Option<Molecule>, Error> {
        let mut title = String::new();
        let mut atoms: Vec<Atom> = Vec::new();
        let mut serials: HashMap<i64, usize> = HashMap::new();
        let mut conect: Vec<(i64, i64)> = Vec::new();
        let mut remarks: Vec<(String, String)> = Vec::new();

        loop {
            let Some(line) = self.lines.next_line()? else {
                self.done = true;
                break;
            };
            let ln = self.lines.line_no();
            let record = column(&line, 0, 6);
            match record {
                "ATOM" | "HETATM" => {
                    if let Some((serial, atom)) = parse_atom_line(&line, ln, self.flavor)? {
                        serials.insert(serial, atoms.len());
                        atoms.push(atom);
                    }
                }
                "CONECT" => conect.extend(parse_conect(&line)),
                "COMPND" | "TITLE" if title.is_empty() => {
                    title = line.get(10..).unwrap_or("").trim().to_string();
                }
                "REMARK" => {
                    if let Some(rest) = line.get(6..) {
                        let rest = rest.trim();
                        if let Some(values) = rest.strip_prefix("VINA RESULT:") {
                            let mut v = values.split_whitespace();
                            for key in ["vina_affinity", "vina_rmsd_lb", "vina_rmsd_ub"] {
                                if let Some(value) = v.next() {
                                    remarks.push((key.to_string(), value.to_string()));
                                }
                            }
                        } else if let Some(name) = rest.strip_prefix("Name =") {
                            if title.is_empty() {
                                title = name.trim().to_string();
                            }
                        }
                    }
                }
                "ENDMDL" => break,
                "END" if !atoms.is_empty() => break,
                _ => {}
            }
        }

        if atoms.is_empty() {
            return Ok(None);
        }
        let bonds = merge_bonds(&atoms, &serials, &conect);
        let mut molecule = Molecule::new(title, atoms, bonds);
        for (key, value) in remarks {
            molecule.data.set(key, value);
        }
        Ok(Some(molecule))
    }
}

impl<R: BufRead> Iterator for PdbRecords<R> {
    type Item = Result<Molecule, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.read_block() {
                Ok(Some(molecule)) => return Some(Ok(molecule)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

fn parse_formal_charge(field: &str) -> i8 {
    let field = field.trim();
    let (digits, negative) = match (field.strip_suffix('+'), field.strip_suffix('-')) {
        (Some(d), _) => (d, false),
        (_, Some(d)) => (d, true),
        _ => (field.trim_start_matches('+'), field.starts_with('-')),
    };
    let magnitude = digits.trim_start_matches('-').parse::<i8>().unwrap_or(0);
    if negative { -magnitude } else { magnitude }
}

/// Element for an AutoDock atom type (`A`, `NA`, `OA`, `HD`, `Zn`, ...).
pub fn element_from_autodock_type(ad_type: &str) -> Option<Element> {
    match ad_type.trim() {
        "A" | "C" => Some(Element::C),
        "N" | "NA" | "NS" => Some(Element::N),
        "O" | "OA" | "OS" => Some(Element::O),
        "S" | "SA" => Some(Element::S),
        "H" | "HD" | "HS" => Some(Element::H),
        other => Element::from_symbol(other),
    }
}

pub(crate) fn parse_atom_line(line: &str, ln: usize, flavor: Format) -> Result<Option<(i64, Atom)>, Error> {
    let alt_loc = line.chars().nth(16).unwrap_or(' ');
    if !matches!(alt_loc, ' ' | 'A' | '1') {
        return Ok(None);
    }
    let serial = column(line, 6, 11)
        .parse::<i64>()
        .map_err(|_| Error::parse(flavor, ln, "invalid atom serial number"))?;
    let raw_name = line.get(12..16).unwrap_or("");
    let name = raw_name.trim();
    let coord = |start, end| {
        column(line, start, end)
            .parse::<f64>()
            .map_err(|_| Error::parse(flavor, ln, "invalid coordinate"))
    };
    let position = Point3::new(coord(30, 38)?, coord(38, 46)?, coord(46, 54)?);

    let two_letter_hint = raw_name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    let (element, atom_type, partial_charge, formal_charge) = match flavor {
        Format::Pdbqt => {
            let ad_type = column(line, 77, 80);
            let element = element_from_autodock_type(ad_type)
                .or_else(|| Element::guess_from_name(name, two_letter_hint));
            let charge = column(line, 70, 76).parse::<f64>().unwrap_or(0.0);
            (element, Some(ad_type.to_string()).filter(|t| !t.is_empty()), charge, 0)
        }
        _ => {
            let element = Element::from_symbol(column(line, 76, 78))
                .or_else(|| Element::guess_from_name(name, two_letter_hint));
            (element, None, 0.0, parse_formal_charge(column(line, 78, 80)))
        }
    };
    let element = element.ok_or_else(|| Error::parse(flavor, ln, format!("unable to infer element for atom '{name}'")))?;

    let residue_number = column(line, 22, 26).parse::<isize>().unwrap_or(0);
    let chain = line.chars().nth(21).unwrap_or(' ');
    let mut residue = ResidueInfo::new(column(line, 17, 20), residue_number, chain);
    residue.hetero = line.starts_with("HETATM");

    let mut atom = Atom::new(element, name, position).with_residue(residue);
    atom.atom_type = atom_type;
    atom.partial_charge = partial_charge;
    atom.formal_charge = formal_charge;
    Ok(Some((serial, atom)))
}

fn parse_conect(line: &str) -> Vec<(i64, i64)> {
    let fields: Vec<i64> = if line.trim_end().len() <= 31 {
        [(6, 11), (11, 16), (16, 21), (21, 26), (26, 31)]
            .iter()
            .filter_map(|&(s, e)| column(line, s, e).parse::<i64>().ok())
            .collect()
    } else {
        line.split_whitespace()
            .skip(1)
            .filter_map(|t| t.parse::<i64>().ok())
            .collect()
    };
    match fields.split_first() {
        Some((&origin, partners)) => partners.iter().map(|&p| (origin, p)).collect(),
        None => Vec::new(),
    }
}

/// Bonds from `CONECT` records (repeated entries raise the bond order) merged
/// with distance-perceived bonds for pairs without an explicit record.
fn merge_bonds(atoms: &[Atom], serials: &HashMap<i64, usize>, conect: &[(i64, i64)]) -> Vec<Bond> {
    let mut directed: HashMap<(usize, usize), u8> = HashMap::new();
    for (from, to) in conect {
        if let (Some(&i), Some(&j)) = (serials.get(from), serials.get(to)) {
            if i != j {
                *directed.entry((i, j)).or_default() += 1;
            }
        }
    }
    let mut pairs: BTreeMap<(usize, usize), BondOrder> = BTreeMap::new();
    for (&(i, j), &count) in &directed {
        let order = match count {
            1 => BondOrder::Single,
            2 => BondOrder::Double,
            _ => BondOrder::Triple,
        };
        let key = (i.min(j), i.max(j));
        let entry = pairs.entry(key).or_insert(order);
        if order.valence() > entry.valence() {
            *entry = order;
        }
    }
    for bond in perceive_bonds(atoms) {
        pairs.entry((bond.atom1, bond.atom2)).or_insert(bond.order);
    }
    pairs
        .into_iter()
        .map(|((a, b), order)| Bond::new(a, b, order))
        .collect()
}

/// Pads an atom name into the 4-column PDB name field.
pub(crate) fn format_atom_name(name: &str, element: Element) -> String {
    if name.len() >= 4 || element.symbol().len() == 2 {
        format!("{name:<4.4}")
    } else {
        format!(" {name:<3}")
    }
}

pub(crate) fn atom_name(molecule: &Molecule, index: usize) -> String {
    let atom = molecule.atom(index);
    if atom.name.is_empty() {
        format!("{}{}", atom.element.symbol(), index + 1)
    } else {
        atom.name.clone()
    }
}

impl MolecularFile for PdbFile {
    const FORMAT: Format = Format::Pdb;
    type Records<R: BufRead> = PdbRecords<R>;

    fn records<R: BufRead>(reader: R) -> Self::Records<R> {
        PdbRecords::new(reader, Format::Pdb)
    }

    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Error> {
        if !molecule.title.is_empty() {
            writeln!(writer, "COMPND    {}", molecule.title)?;
        }
        for (i, atom) in molecule.atoms().iter().enumerate() {
            let (record, res_name, chain, res_seq) = match &atom.residue {
                Some(r) => (if r.hetero { "HETATM" } else { "ATOM" }, r.name.as_str(), r.chain, r.number),
                None => ("HETATM", "UNL", ' ', 1),
            };
            let charge = match atom.formal_charge {
                0 => String::new(),
                c if c > 0 => format!("{c}+"),
                c => format!("{}-", -c),
            };
            let p = atom.position;
            writeln!(
                writer,
                "{:<6}{:>5} {} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}{:<2}",
                record,
                (i + 1) % 100_000,
                format_atom_name(&atom_name(molecule, i), atom.element),
                res_name,
                chain,
                res_seq,
                p.x,
                p.y,
                p.z,
                1.0,
                0.0,
                atom.element.symbol().to_ascii_uppercase(),
                charge
            )?;
        }
        if !molecule.protein {
            for i in 0..molecule.atom_count() {
                let partners: Vec<usize> = molecule
                    .bonded(i)
                    .flat_map(|(n, b)| {
                        let repeats = match b.order {
                            BondOrder::Double => 2,
                            BondOrder::Triple => 3,
                            _ => 1,
                        };
                        std::iter::repeat_n(n, repeats)
                    })
                    .collect();
                for chunk in partners.chunks(4) {
                    write!(writer, "CONECT{:>5}", i + 1)?;
                    for p in chunk {
                        write!(writer, "{:>5}", p + 1)?;
                    }
                    writeln!(writer)?;
                }
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const RECEPTOR: &str = "\
HEADER    TEST RECEPTOR
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.458   0.000   0.000  1.00  0.00           C
ATOM      3  C   ALA A   1       2.009   1.420   0.000  1.00  0.00           C
ATOM      4  O   ALA A   1       1.246   2.390   0.000  1.00  0.00           O
ATOM      5  CB BALA A   1       1.988  -0.773  -1.199  1.00  0.00           C
HETATM    6 ZN    ZN A 101      10.000  10.000  10.000  1.00  0.00          ZN2+
END
";

    #[test]
    fn reads_atoms_residues_and_perceived_bonds() {
        let mols: Vec<Molecule> = PdbFile::records(Cursor::new(RECEPTOR))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(mols.len(), 1);
        let mol = &mols[0];
        assert_eq!(mol.atom_count(), 5, "alternate location B must be skipped");
        assert_eq!(mol.atom(1).residue_name(), Some("ALA"));
        assert_eq!(mol.atom(1).residue.as_ref().unwrap().chain, 'A');
        let zinc = mol.atom(4);
        assert!(zinc.element.is_metal());
        assert_eq!(zinc.formal_charge, 2);
        assert!(zinc.residue.as_ref().unwrap().hetero);
        assert_eq!(mol.bonds().len(), 3);
    }

    #[test]
    fn models_are_separate_molecules_and_conect_sets_orders() {
        let text = "\
MODEL        1
HETATM    1  C1  LIG     1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  O1  LIG     1       1.200   0.000   0.000  1.00  0.00           O
CONECT    1    2    2
CONECT    2    1    1
ENDMDL
MODEL        2
HETATM    1  C1  LIG     1       5.000   0.000   0.000  1.00  0.00           C
HETATM    2  O1  LIG     1       6.200   0.000   0.000  1.00  0.00           O
ENDMDL
END
";
        let mols: Vec<Molecule> = PdbFile::records(Cursor::new(text))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(mols.len(), 2);
        assert_eq!(mols[0].bonds()[0].order, BondOrder::Double);
        assert_eq!(mols[1].bonds()[0].order, BondOrder::Single);
        assert_eq!(mols[1].atom(0).position.x, 5.0);
    }

    #[test]
    fn writer_output_reads_back() {
        let mols: Vec<Molecule> = PdbFile::records(Cursor::new(RECEPTOR))
            .collect::<Result<_, _>>()
            .unwrap();
        let mut out = Vec::new();
        PdbFile::write_to(&mols[0], &mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.lines().next().unwrap().starts_with("ATOM      1  N   ALA A   1"));
        let again = PdbFile::records(Cursor::new(out)).next().unwrap().unwrap();
        assert_eq!(again.atom_count(), 5);
        assert_eq!(again.atom(4).formal_charge, 2);
        assert!((again.atom(2).position.y - 1.42).abs() < 1e-3);
    }

    #[test]
    fn formal_charge_field_variants() {
        assert_eq!(parse_formal_charge("1+"), 1);
        assert_eq!(parse_formal_charge("2-"), -2);
        assert_eq!(parse_formal_charge(""), 0);
    }
}
