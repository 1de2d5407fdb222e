use phf::phf_map;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Static properties of a chemical element.
///
/// Radii are in Angstroms. `xs_radius` is the X-Score van der Waals radius used
/// by the empirical Vina terms; `default_valence` drives implicit hydrogen
/// assignment and `max_valence` the strict sanitization check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub number: u8,
    pub symbol: &'static str,
    pub mass: f64,
    pub covalent_radius: f64,
    pub xs_radius: f64,
    pub default_valence: u8,
    pub max_valence: u8,
}

const fn data(
    number: u8,
    symbol: &'static str,
    mass: f64,
    covalent_radius: f64,
    xs_radius: f64,
    default_valence: u8,
    max_valence: u8,
) -> ElementData {
    ElementData {
        number,
        symbol,
        mass,
        covalent_radius,
        xs_radius,
        default_valence,
        max_valence,
    }
}

// Sorted by atomic number.
static ELEMENTS: &[ElementData] = &[
    data(0, "*", 0.0, 0.0, 0.0, 0, 8),
    data(1, "H", 1.008, 0.31, 1.1, 1, 1),
    data(5, "B", 10.81, 0.84, 1.92, 3, 4),
    data(6, "C", 12.011, 0.76, 1.9, 4, 4),
    data(7, "N", 14.007, 0.71, 1.8, 3, 4),
    data(8, "O", 15.999, 0.66, 1.7, 2, 2),
    data(9, "F", 18.998, 0.57, 1.5, 1, 1),
    data(11, "Na", 22.990, 1.66, 1.2, 1, 1),
    data(12, "Mg", 24.305, 1.41, 1.2, 2, 2),
    data(14, "Si", 28.085, 1.11, 2.2, 4, 4),
    data(15, "P", 30.974, 1.07, 2.1, 3, 5),
    data(16, "S", 32.06, 1.05, 2.0, 2, 6),
    data(17, "Cl", 35.45, 1.02, 1.8, 1, 1),
    data(19, "K", 39.098, 2.03, 1.2, 1, 1),
    data(20, "Ca", 40.078, 1.76, 1.2, 2, 2),
    data(25, "Mn", 54.938, 1.39, 1.2, 2, 7),
    data(26, "Fe", 55.845, 1.32, 1.2, 2, 6),
    data(27, "Co", 58.933, 1.26, 1.2, 2, 6),
    data(28, "Ni", 58.693, 1.24, 1.2, 2, 6),
    data(29, "Cu", 63.546, 1.32, 1.2, 2, 4),
    data(30, "Zn", 65.38, 1.22, 1.2, 2, 4),
    data(34, "Se", 78.971, 1.20, 2.1, 2, 6),
    data(35, "Br", 79.904, 1.20, 2.0, 1, 1),
    data(53, "I", 126.904, 1.39, 2.2, 1, 1),
];

static SYMBOLS: phf::Map<&'static str, u8> = phf_map! {
    "*" => 0,
    "DU" => 0,
    "LP" => 0,
    "H" => 1,
    "D" => 1,
    "B" => 5,
    "C" => 6,
    "N" => 7,
    "O" => 8,
    "F" => 9,
    "NA" => 11,
    "MG" => 12,
    "SI" => 14,
    "P" => 15,
    "S" => 16,
    "CL" => 17,
    "K" => 19,
    "CA" => 20,
    "MN" => 25,
    "FE" => 26,
    "CO" => 27,
    "NI" => 28,
    "CU" => 29,
    "ZN" => 30,
    "SE" => 34,
    "BR" => 35,
    "I" => 53,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown element symbol: '{0}'")]
pub struct UnknownElementError(pub String);

/// A chemical element identified by its atomic number.
///
/// Only elements present in the internal property table can be constructed, so
/// [`Element::data`] is infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const DUMMY: Element = Element(0);
    pub const H: Element = Element(1);
    pub const B: Element = Element(5);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const F: Element = Element(9);
    pub const P: Element = Element(15);
    pub const S: Element = Element(16);
    pub const CL: Element = Element(17);
    pub const BR: Element = Element(35);
    pub const I: Element = Element(53);

    pub fn from_atomic_number(number: u8) -> Option<Self> {
        ELEMENTS
            .binary_search_by_key(&number, |e| e.number)
            .ok()
            .map(|_| Element(number))
    }

    /// Looks up an element by symbol, ignoring case (`"CL"`, `"Cl"` and `"cl"` agree).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let key = symbol.trim().to_ascii_uppercase();
        SYMBOLS.get(key.as_str()).map(|&n| Element(n))
    }

    /// Guesses the element from a PDB/MOL2 style atom name such as `"CA"`, `"1HB2"` or `"Cl3"`.
    ///
    /// Two-letter symbols are only accepted when the second letter is lowercase or when
    /// `two_letter_hint` is set (PDB names whose first column is occupied).
    pub fn guess_from_name(name: &str, two_letter_hint: bool) -> Option<Self> {
        let letters: String = name
            .trim()
            .chars()
            .skip_while(|c| c.is_ascii_digit())
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        let mut chars = letters.chars();
        let first = chars.next()?;
        if let Some(second) = chars.next() {
            if second.is_ascii_lowercase() || two_letter_hint {
                let pair: String = [first, second].iter().collect();
                if let Some(element) = Self::from_symbol(&pair) {
                    return Some(element);
                }
            }
        }
        Self::from_symbol(&first.to_string())
    }

    pub fn atomic_number(self) -> u8 {
        self.0
    }

    pub fn data(self) -> &'static ElementData {
        let index = ELEMENTS
            .binary_search_by_key(&self.0, |e| e.number)
            .unwrap_or(0);
        &ELEMENTS[index]
    }

    pub fn symbol(self) -> &'static str {
        self.data().symbol
    }

    pub fn mass(self) -> f64 {
        self.data().mass
    }

    pub fn is_hydrogen(self) -> bool {
        self.0 == 1
    }

    pub fn is_metal(self) -> bool {
        matches!(self.0, 11 | 12 | 19 | 20 | 25..=30)
    }

    pub fn is_halogen(self) -> bool {
        matches!(self.0, 9 | 17 | 35 | 53)
    }
}

impl Default for Element {
    fn default() -> Self {
        Element::DUMMY
    }
}

impl FromStr for Element {
    type Err = UnknownElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s).ok_or_else(|| UnknownElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_lookup_is_case_insensitive() {
        assert_eq!(Element::from_symbol("Cl"), Some(Element::CL));
        assert_eq!(Element::from_symbol("CL"), Some(Element::CL));
        assert_eq!(Element::from_symbol(" br "), Some(Element::BR));
        assert_eq!(Element::from_symbol("Xx"), None);
    }

    #[test]
    fn guess_from_name_prefers_single_letter_for_uppercase_names() {
        assert_eq!(Element::guess_from_name("CA", false), Some(Element::C));
        assert_eq!(
            Element::guess_from_name("CA", true),
            Element::from_symbol("Ca")
        );
        assert_eq!(Element::guess_from_name("Cl3", false), Some(Element::CL));
        assert_eq!(Element::guess_from_name("1HB2", false), Some(Element::H));
    }

    #[test]
    fn data_table_is_sorted_and_consistent() {
        assert!(ELEMENTS.windows(2).all(|w| w[0].number < w[1].number));
        for (symbol, &number) in SYMBOLS.entries() {
            let element = Element::from_atomic_number(number)
                .unwrap_or_else(|| panic!("symbol {symbol} maps to missing element"));
            assert_eq!(element.atomic_number(), number);
        }
        assert_eq!(Element::C.symbol(), "C");
        assert!((Element::O.mass() - 15.999).abs() < 1e-9);
    }

    #[test]
    fn classifies_metals_and_halogens() {
        assert!(Element::from_symbol("Zn").unwrap().is_metal());
        assert!(!Element::C.is_metal());
        assert!(Element::CL.is_halogen());
        assert!(!Element::N.is_halogen());
    }
}
