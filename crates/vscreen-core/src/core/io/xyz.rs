use super::Format;
use super::error::Error;
use super::lines::Lines;
use super::traits::MolecularFile;
use crate::core::chem::perception::perceive_bonds;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use nalgebra::Point3;
use std::io::{BufRead, Write};

/// XMol XYZ files: atom count, comment line, then `symbol x y z` rows.
pub struct XyzFile;

pub struct XyzRecords<R> {
    lines: Lines<R>,
    done: bool,
}

impl<R: BufRead> XyzRecords<R> {
    fn read_record(&mut self) -> Result<Option<Molecule>, Error> {
        let count_line = loop {
            match self.lines.next_line()? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
                None => return Ok(None),
            }
        };
        let count_no = self.lines.line_no();
        let count = count_line
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::parse(Format::Xyz, count_no, "invalid atom count"))?;
        let title = self
            .lines
            .next_line()?
            .ok_or_else(|| Error::parse(Format::Xyz, count_no + 1, "missing comment line"))?;

        let mut atoms = Vec::with_capacity(count);
        for _ in 0..count {
            let line = self
                .lines
                .next_line()?
                .ok_or_else(|| Error::parse(Format::Xyz, self.lines.line_no() + 1, "record ended before all atoms were read"))?;
            let ln = self.lines.line_no();
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(Error::parse(Format::Xyz, ln, "atom line needs a symbol and three coordinates"));
            }
            let element = Element::from_symbol(parts[0])
                .or_else(|| Element::guess_from_name(parts[0], false))
                .ok_or_else(|| Error::parse(Format::Xyz, ln, format!("unknown element '{}'", parts[0])))?;
            let coord = |i: usize| {
                parts[i]
                    .parse::<f64>()
                    .map_err(|_| Error::parse(Format::Xyz, ln, "invalid coordinate"))
            };
            let position = Point3::new(coord(1)?, coord(2)?, coord(3)?);
            atoms.push(Atom::new(element, "", position));
        }
        let bonds = perceive_bonds(&atoms);
        Ok(Some(Molecule::new(title.trim(), atoms, bonds)))
    }
}

impl<R: BufRead> Iterator for XyzRecords<R> {
    type Item = Result<Molecule, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(m)) => Some(Ok(m)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                // Record boundaries are unknown after a bad count line.
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl MolecularFile for XyzFile {
    const FORMAT: Format = Format::Xyz;
    type Records<R: BufRead> = XyzRecords<R>;

    fn records<R: BufRead>(reader: R) -> Self::Records<R> {
        XyzRecords {
            lines: Lines::new(reader),
            done: false,
        }
    }

    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Error> {
        writeln!(writer, "{}", molecule.atom_count())?;
        writeln!(writer, "{}", molecule.title)?;
        for atom in molecule.atoms() {
            let p = atom.position;
            writeln!(
                writer,
                "{:<2} {:>12.5} {:>12.5} {:>12.5}",
                atom.element.symbol(),
                p.x,
                p.y,
                p.z
            )?;
        }
        Ok(())
    }
}
