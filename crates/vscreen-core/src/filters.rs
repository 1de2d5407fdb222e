//! Drug-likeness filters.
//!
//! A [`Filter`] counts how many criteria of its rule a molecule violates and
//! lets it through while that count stays within the allowed soft failures.

use crate::core::chem::descriptors;
use crate::core::models::molecule::Molecule;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown filter '{0}' (expected 'ro5' or 'ro3', optionally suffixed ':N')")]
    UnknownRule(String),
    #[error("Invalid soft-fail count '{value}' in filter '{filter}'")]
    InvalidSoftFail { filter: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterRule {
    /// Lipinski's rule of five.
    Ro5,
    /// Rule of three for fragment libraries.
    Ro3,
}

struct Limits {
    max_weight: f64,
    max_acceptors: usize,
    max_donors: usize,
    max_logp: f64,
}

impl FilterRule {
    fn limits(self) -> Limits {
        match self {
            Self::Ro5 => Limits {
                max_weight: 500.0,
                max_acceptors: 10,
                max_donors: 5,
                max_logp: 5.0,
            },
            Self::Ro3 => Limits {
                max_weight: 300.0,
                max_acceptors: 3,
                max_donors: 3,
                max_logp: 3.0,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ro5 => "ro5",
            Self::Ro3 => "ro3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Filter {
    pub rule: FilterRule,
    pub soft_fail: usize,
}

impl Filter {
    pub fn new(rule: FilterRule) -> Self {
        Self { rule, soft_fail: 0 }
    }

    pub fn with_soft_fail(mut self, soft_fail: usize) -> Self {
        self.soft_fail = soft_fail;
        self
    }

    /// Number of rule criteria the molecule violates (0 to 4).
    pub fn violations(&self, molecule: &Molecule) -> usize {
        let limits = self.rule.limits();
        [
            descriptors::molecular_weight(molecule) >= limits.max_weight,
            descriptors::hydrogen_bond_acceptors(molecule) > limits.max_acceptors,
            descriptors::hydrogen_bond_donors(molecule) > limits.max_donors,
            descriptors::logp(molecule) > limits.max_logp,
        ]
        .into_iter()
        .filter(|&violated| violated)
        .count()
    }

    pub fn passes(&self, molecule: &Molecule) -> bool {
        self.violations(molecule) <= self.soft_fail
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, soft_fail) = match s.split_once(':') {
            Some((name, n)) => {
                let n = n.trim().parse::<usize>().map_err(|_| FilterError::InvalidSoftFail {
                    filter: s.to_string(),
                    value: n.to_string(),
                })?;
                (name, n)
            }
            None => (s, 0),
        };
        let rule = match name.trim().to_ascii_lowercase().as_str() {
            "ro5" => FilterRule::Ro5,
            "ro3" => FilterRule::Ro3,
            _ => return Err(FilterError::UnknownRule(s.to_string())),
        };
        Ok(Filter { rule, soft_fail })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.soft_fail == 0 {
            f.write_str(self.rule.as_str())
        } else {
            write!(f, "{}:{}", self.rule.as_str(), self.soft_fail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::perception::{perceive, tests::benzene};
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use crate::core::models::topology::{Bond, BondOrder};
    use nalgebra::Point3;

    fn chain(n: usize, element: Element) -> Molecule {
        let atoms = (0..n)
            .map(|i| Atom::new(element, "", Point3::new(i as f64 * 1.5, 0.0, 0.0)))
            .collect();
        let bonds = (1..n).map(|i| Bond::new(i - 1, i, BondOrder::Single)).collect();
        let mut mol = Molecule::new("chain", atoms, bonds);
        perceive(&mut mol);
        mol
    }

    #[test]
    fn parses_rule_and_soft_fail() {
        assert_eq!("ro5".parse::<Filter>().unwrap(), Filter::new(FilterRule::Ro5));
        assert_eq!(
            "RO3:2".parse::<Filter>().unwrap(),
            Filter::new(FilterRule::Ro3).with_soft_fail(2)
        );
        assert!(matches!("pains".parse::<Filter>(), Err(FilterError::UnknownRule(_))));
        assert!(matches!("ro5:x".parse::<Filter>(), Err(FilterError::InvalidSoftFail { .. })));
        assert_eq!(Filter::new(FilterRule::Ro3).with_soft_fail(1).to_string(), "ro3:1");
    }

    #[test]
    fn benzene_passes_both_rules() {
        let mol = benzene(true);
        assert!(Filter::new(FilterRule::Ro5).passes(&mol));
        assert!(Filter::new(FilterRule::Ro3).passes(&mol));
    }

    #[test]
    fn long_alkane_violates_weight_and_logp() {
        let mol = chain(40, Element::C);
        let ro5 = Filter::new(FilterRule::Ro5);
        assert_eq!(ro5.violations(&mol), 2);
        assert!(!ro5.passes(&mol));
        assert!(ro5.with_soft_fail(2).passes(&mol));
    }

    #[test]
    fn polyol_violates_fragment_donor_limit() {
        let mut atoms: Vec<Atom> = (0..4)
            .map(|i| Atom::new(Element::C, "", Point3::new(i as f64 * 1.5, 0.0, 0.0)))
            .collect();
        let mut bonds: Vec<Bond> = (1..4).map(|i| Bond::new(i - 1, i, BondOrder::Single)).collect();
        for i in 0..4 {
            atoms.push(Atom::new(Element::O, "", Point3::new(i as f64 * 1.5, 1.4, 0.0)));
            bonds.push(Bond::new(i, 4 + i, BondOrder::Single));
        }
        let mut mol = Molecule::new("erythritol", atoms, bonds);
        perceive(&mut mol);
        let ro3 = Filter::new(FilterRule::Ro3);
        // Four acceptors and four donors.
        assert_eq!(ro3.violations(&mol), 2);
        assert!(Filter::new(FilterRule::Ro5).passes(&mol));
    }
}
