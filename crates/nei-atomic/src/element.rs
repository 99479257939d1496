//! Chemical element definitions.
//!
//! Only elements up to zinc are catalogued; that is the range covered by
//! the collisional ionization/recombination databases the engine consumes.

use crate::error::{AtomicError, AtomicResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// (symbol, name) indexed by atomic number - 1.
const ELEMENTS: [(&str, &str); 30] = [
    ("H", "hydrogen"),
    ("He", "helium"),
    ("Li", "lithium"),
    ("Be", "beryllium"),
    ("B", "boron"),
    ("C", "carbon"),
    ("N", "nitrogen"),
    ("O", "oxygen"),
    ("F", "fluorine"),
    ("Ne", "neon"),
    ("Na", "sodium"),
    ("Mg", "magnesium"),
    ("Al", "aluminium"),
    ("Si", "silicon"),
    ("P", "phosphorus"),
    ("S", "sulfur"),
    ("Cl", "chlorine"),
    ("Ar", "argon"),
    ("K", "potassium"),
    ("Ca", "calcium"),
    ("Sc", "scandium"),
    ("Ti", "titanium"),
    ("V", "vanadium"),
    ("Cr", "chromium"),
    ("Mn", "manganese"),
    ("Fe", "iron"),
    ("Co", "cobalt"),
    ("Ni", "nickel"),
    ("Cu", "copper"),
    ("Zn", "zinc"),
];

/// A chemical element, identified by atomic number.
///
/// The number of charge states tracked for an element is `Z + 1`
/// (neutral through fully stripped).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Element {
    atomic_number: u8,
}

impl Element {
    /// Largest atomic number in the catalog.
    pub const MAX_ATOMIC_NUMBER: u8 = ELEMENTS.len() as u8;

    pub const HYDROGEN: Element = Element { atomic_number: 1 };
    pub const HELIUM: Element = Element { atomic_number: 2 };

    pub fn from_atomic_number(z: u8) -> AtomicResult<Self> {
        if (1..=Self::MAX_ATOMIC_NUMBER).contains(&z) {
            Ok(Self { atomic_number: z })
        } else {
            Err(AtomicError::UnknownElement {
                query: format!("Z={z}"),
            })
        }
    }

    /// Resolve a symbol (`"He"`) or name (`"helium"`), case-insensitively.
    pub fn from_symbol(query: &str) -> AtomicResult<Self> {
        let trimmed = query.trim();
        ELEMENTS
            .iter()
            .position(|(symbol, name)| {
                symbol.eq_ignore_ascii_case(trimmed) || name.eq_ignore_ascii_case(trimmed)
            })
            .map(|idx| Self {
                atomic_number: idx as u8 + 1,
            })
            .ok_or_else(|| AtomicError::UnknownElement {
                query: query.to_string(),
            })
    }

    pub fn atomic_number(&self) -> u8 {
        self.atomic_number
    }

    pub fn symbol(&self) -> &'static str {
        ELEMENTS[self.atomic_number as usize - 1].0
    }

    pub fn name(&self) -> &'static str {
        ELEMENTS[self.atomic_number as usize - 1].1
    }

    /// Number of charge states, neutral through fully stripped.
    pub fn nstates(&self) -> usize {
        self.atomic_number as usize + 1
    }

    /// Spectroscopic-style label for a charge state, e.g. `He 1+`.
    pub fn ion_label(&self, charge: usize) -> String {
        format!("{} {charge}+", self.symbol())
    }

    /// Iterate over every catalogued element in order of atomic number.
    pub fn all() -> impl Iterator<Item = Element> {
        (1..=Self::MAX_ATOMIC_NUMBER).map(|atomic_number| Element { atomic_number })
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.symbol())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Element {
    type Err = AtomicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u8>() {
            Ok(z) => Element::from_atomic_number(z),
            Err(_) => Element::from_symbol(s),
        }
    }
}

impl TryFrom<String> for Element {
    type Error = AtomicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Element> for String {
    fn from(element: Element) -> Self {
        element.symbol().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for element in Element::all() {
            assert!(seen.insert(element.symbol()), "duplicate {}", element);
        }
        assert_eq!(seen.len(), 30);
    }

    #[test]
    fn resolve_by_symbol_name_and_number() {
        let he = Element::from_symbol("He").unwrap();
        assert_eq!(he, Element::HELIUM);
        assert_eq!(Element::from_symbol("helium").unwrap(), he);
        assert_eq!(Element::from_symbol(" he ").unwrap(), he);
        assert_eq!("2".parse::<Element>().unwrap(), he);
        assert_eq!(he.nstates(), 3);

        let fe: Element = "Fe".parse().unwrap();
        assert_eq!(fe.atomic_number(), 26);
        assert_eq!(fe.name(), "iron");
    }

    #[test]
    fn unknown_elements_are_rejected() {
        assert!(Element::from_symbol("Xx").is_err());
        assert!(Element::from_atomic_number(0).is_err());
        assert!(Element::from_atomic_number(31).is_err());
    }

    #[test]
    fn serde_uses_symbol() {
        let json = serde_json::to_string(&Element::HYDROGEN).unwrap();
        assert_eq!(json, "\"H\"");
        let back: Element = serde_json::from_str("\"O\"").unwrap();
        assert_eq!(back.atomic_number(), 8);
        assert!(serde_json::from_str::<Element>("\"Qq\"").is_err());
    }

    #[test]
    fn ion_labels() {
        assert_eq!(Element::HYDROGEN.ion_label(0), "H 0+");
        assert_eq!(Element::HELIUM.ion_label(2), "He 2+");
    }
}
