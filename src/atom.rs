use ultraviolet::DVec2;

/// An atom in a molecular graph.
///
/// `Atom` carries what the parser knows — element symbol, charge, isotope,
/// aromaticity — plus the 2D coordinate that layout writes back. It does not
/// carry layout working state (placed/visited/ring membership); that lives in a
/// per-run record owned by the coordinate generator, so repeated layout runs
/// cannot contaminate each other.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol as written, e.g. `"C"`, `"Cl"`.
    pub symbol: String,
    /// 2D position in model units. Meaningless until layout has run.
    pub coord: DVec2,
    /// Formal charge in elementary charge units.
    pub charge: i8,
    /// Mass number. `0` means natural abundance.
    pub isotope: u16,
    /// Whether the parser flagged this atom as part of an aromatic system.
    pub is_aromatic: bool,
}

impl Atom {
    pub fn new(symbol: impl Into<String>) -> Self {
        Atom {
            symbol: symbol.into(),
            ..Atom::default()
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.symbol == "H"
    }
}

impl Default for Atom {
    fn default() -> Self {
        Atom {
            symbol: "C".to_string(),
            coord: DVec2::zero(),
            charge: 0,
            isotope: 0,
            is_aromatic: false,
        }
    }
}
