use super::Format;
use super::error::Error;
use super::lines::{Lines, column};
use super::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::io::{BufRead, Write};

/// MDL SD files (V2000 connection tables with data items).
pub struct SdfFile;

pub struct SdfRecords<R> {
    lines: Lines<R>,
    done: bool,
}

impl<R: BufRead> Iterator for SdfRecords<R> {
    type Item = Result<Molecule, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut block: Vec<(usize, String)> = Vec::new();
        loop {
            match self.lines.next_line() {
                Ok(Some(line)) => {
                    if line.trim() == "$$$$" {
                        break;
                    }
                    block.push((self.lines.line_no(), line));
                }
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        if block.iter().all(|(_, l)| l.trim().is_empty()) {
            return if self.done { None } else { self.next() };
        }
        Some(parse_record(&block))
    }
}

fn charge_from_code(code: &str) -> i8 {
    match code.parse::<u8>().unwrap_or(0) {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        _ => 0,
    }
}

fn charge_to_code(charge: i8) -> u8 {
    match charge {
        3 => 1,
        2 => 2,
        1 => 3,
        -1 => 5,
        -2 => 6,
        -3 => 7,
        _ => 0,
    }
}

fn parse_count(field: &str, line_no: usize, what: &str) -> Result<usize, Error> {
    field
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::parse(Format::Sdf, line_no, format!("invalid {what} count")))
}

fn parse_record(block: &[(usize, String)]) -> Result<Molecule, Error> {
    let first_line = block.first().map(|(ln, _)| *ln).unwrap_or(1);
    if block.len() < 4 {
        return Err(Error::parse(
            Format::Sdf,
            first_line,
            "record must contain a header block and a counts line",
        ));
    }
    let title = block[0].1.trim().to_string();
    let (counts_no, counts) = (&block[3].0, block[3].1.as_str());
    if counts.contains("V3000") {
        return Err(Error::parse(Format::Sdf, *counts_no, "V3000 is not supported"));
    }
    let (atom_count, bond_count) = if counts.len() >= 6 {
        (
            parse_count(column(counts, 0, 3), *counts_no, "atom")?,
            parse_count(column(counts, 3, 6), *counts_no, "bond")?,
        )
    } else {
        let mut tokens = counts.split_whitespace();
        (
            parse_count(tokens.next().unwrap_or(""), *counts_no, "atom")?,
            parse_count(tokens.next().unwrap_or(""), *counts_no, "bond")?,
        )
    };

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    if block.len() < bond_start + bond_count {
        return Err(Error::parse(
            Format::Sdf,
            block.last().map(|(ln, _)| *ln).unwrap_or(first_line),
            "record ended before atoms/bonds were fully specified",
        ));
    }

    let mut atoms = Vec::with_capacity(atom_count);
    for (ln, raw) in &block[atom_start..bond_start] {
        let coord = |start, end, axis| {
            column(raw, start, end)
                .parse::<f64>()
                .map_err(|_| Error::parse(Format::Sdf, *ln, format!("invalid {axis} coordinate")))
        };
        let position = Point3::new(coord(0, 10, "x")?, coord(10, 20, "y")?, coord(20, 30, "z")?);
        let symbol = column(raw, 31, 34);
        let element = Element::from_symbol(symbol)
            .ok_or_else(|| Error::parse(Format::Sdf, *ln, format!("unknown element '{symbol}'")))?;
        let mut atom = Atom::new(element, "", position);
        atom.formal_charge = charge_from_code(column(raw, 36, 39));
        atoms.push(atom);
    }

    let mut bonds = Vec::with_capacity(bond_count);
    for (ln, raw) in &block[bond_start..bond_start + bond_count] {
        let fields: Vec<&str> = if raw.len() >= 9 {
            vec![column(raw, 0, 3), column(raw, 3, 6), column(raw, 6, 9)]
        } else {
            raw.split_whitespace().collect()
        };
        if fields.len() < 3 {
            return Err(Error::parse(Format::Sdf, *ln, "invalid bond line"));
        }
        let index = |field: &str| {
            field
                .parse::<usize>()
                .ok()
                .filter(|&i| i >= 1 && i <= atom_count)
                .ok_or_else(|| Error::parse(Format::Sdf, *ln, "bond references a missing atom"))
        };
        let (a1, a2) = (index(fields[0])?, index(fields[1])?);
        let code = fields[2]
            .parse::<u8>()
            .map_err(|_| Error::parse(Format::Sdf, *ln, "invalid bond type"))?;
        let order = BondOrder::from_ctfile(code).unwrap_or(BondOrder::Single);
        bonds.push(Bond::new(a1 - 1, a2 - 1, order));
    }

    let mut cursor = bond_start + bond_count;
    let mut charges_from_block = false;
    while cursor < block.len() {
        let (ln, line) = (&block[cursor].0, block[cursor].1.as_str());
        cursor += 1;
        if line.starts_with("M  END") {
            break;
        }
        if line.starts_with("M  CHG") {
            if !charges_from_block {
                atoms.iter_mut().for_each(|a| a.formal_charge = 0);
                charges_from_block = true;
            }
            let tokens: Vec<&str> = line.split_whitespace().skip(3).collect();
            for pair in tokens.chunks(2) {
                let [index, value] = pair else {
                    return Err(Error::parse(Format::Sdf, *ln, "unpaired M  CHG entry"));
                };
                let index = index.parse::<usize>().ok().filter(|&i| i >= 1 && i <= atom_count);
                let value = value.parse::<i8>().ok();
                match (index, value) {
                    (Some(i), Some(v)) => atoms[i - 1].formal_charge = v,
                    _ => return Err(Error::parse(Format::Sdf, *ln, "invalid M  CHG entry")),
                }
            }
        }
    }

    let mut molecule = Molecule::new(title, atoms, bonds);
    while cursor < block.len() {
        let line = block[cursor].1.as_str();
        cursor += 1;
        if !line.starts_with('>') {
            continue;
        }
        let Some(name) = line
            .split_once('<')
            .and_then(|(_, rest)| rest.split_once('>'))
            .map(|(name, _)| name.to_string())
        else {
            continue;
        };
        let mut value_lines = Vec::new();
        while cursor < block.len() && !block[cursor].1.trim().is_empty() {
            value_lines.push(block[cursor].1.as_str());
            cursor += 1;
        }
        molecule.data.set(name, value_lines.join("\n"));
    }
    Ok(molecule)
}

impl MolecularFile for SdfFile {
    const FORMAT: Format = Format::Sdf;
    type Records<R: BufRead> = SdfRecords<R>;

    fn records<R: BufRead>(reader: R) -> Self::Records<R> {
        SdfRecords {
            lines: Lines::new(reader),
            done: false,
        }
    }

    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Error> {
        writeln!(writer, "{}", molecule.title)?;
        writeln!(writer, "  vscreen          3D")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
            molecule.atom_count(),
            molecule.bonds().len()
        )?;
        for atom in molecule.atoms() {
            let p = atom.position;
            writeln!(
                writer,
                "{:>10.4}{:>10.4}{:>10.4} {:<3} 0{:>3}  0  0  0  0  0  0  0  0  0  0",
                p.x,
                p.y,
                p.z,
                atom.element.symbol(),
                charge_to_code(atom.formal_charge)
            )?;
        }
        for bond in molecule.bonds() {
            writeln!(
                writer,
                "{:>3}{:>3}{:>3}  0  0  0  0",
                bond.atom1 + 1,
                bond.atom2 + 1,
                bond.order.ctfile_code()
            )?;
        }
        let charged: Vec<(usize, i8)> = molecule
            .atoms()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.formal_charge != 0)
            .map(|(i, a)| (i + 1, a.formal_charge))
            .collect();
        for chunk in charged.chunks(8) {
            write!(writer, "M  CHG{:>3}", chunk.len())?;
            for (index, charge) in chunk {
                write!(writer, " {index:>3} {charge:>3}")?;
            }
            writeln!(writer)?;
        }
        writeln!(writer, "M  END")?;
        for (key, value) in molecule.data.iter() {
            writeln!(writer, ">  <{key}>")?;
            writeln!(writer, "{value}")?;
            writeln!(writer)?;
        }
        writeln!(writer, "$$$$")?;
        Ok(())
    }
}
