//! SMILES parsing.
//!
//! A single pass over the string builds the molecular graph directly: no
//! coordinates, no aromaticity perception — aromatic flags are taken from the
//! lowercase notation as written. Supported grammar: organic-subset bare atoms,
//! aromatic lowercase forms, bracket atoms (isotope, symbol, chirality,
//! hydrogen count, charge), bond symbols `- = # $ :` plus directional `/` and
//! `\`, ring closures as digits or `%nn` (with the bond order specifiable on
//! either side), branches, and dot disconnection.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::element;
use crate::mol::Mol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    /// The input string was empty or contained only whitespace.
    EmptyInput,
    /// An unexpected character was encountered at the given position.
    UnexpectedChar { pos: usize, ch: char },
    /// An unrecognized element symbol was found.
    UnknownElement { pos: usize, text: String },
    /// A bracket atom `[` was opened but never closed with `]`.
    UnclosedBracket { pos: usize },
    /// A ring-opening digit was never matched by a ring-closing digit.
    UnclosedRing { digit: u16 },
    /// A parenthesis was closed without a matching open, or left open.
    UnmatchedParen { pos: usize },
    /// Two ring-closure bonds on the same digit specify conflicting orders.
    RingBondConflict { digit: u16 },
    /// A ring closure would bond an atom to itself.
    InvalidRingClosure { digit: u16 },
    /// A bond symbol with nothing to attach it to.
    DanglingBond { pos: usize },
    /// A charge specifier inside a bracket atom could not be parsed.
    InvalidCharge { pos: usize },
}

impl fmt::Display for SmilesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty SMILES string"),
            Self::UnexpectedChar { pos, ch } => {
                write!(f, "unexpected character '{}' at position {}", ch, pos)
            }
            Self::UnknownElement { pos, text } => {
                write!(f, "unknown element '{}' at position {}", text, pos)
            }
            Self::UnclosedBracket { pos } => {
                write!(f, "unclosed bracket atom starting at position {}", pos)
            }
            Self::UnclosedRing { digit } => write!(f, "unclosed ring {}", digit),
            Self::UnmatchedParen { pos } => {
                write!(f, "unmatched parenthesis at position {}", pos)
            }
            Self::RingBondConflict { digit } => {
                write!(f, "conflicting bond orders on ring closure {}", digit)
            }
            Self::InvalidRingClosure { digit } => {
                write!(f, "ring closure {} bonds an atom to itself", digit)
            }
            Self::DanglingBond { pos } => {
                write!(f, "bond symbol with no preceding atom at position {}", pos)
            }
            Self::InvalidCharge { pos } => {
                write!(f, "invalid charge at position {}", pos)
            }
        }
    }
}

impl std::error::Error for SmilesError {}

/// Parses a SMILES string into a molecular graph.
pub fn from_smiles(input: &str) -> Result<Mol, SmilesError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    Parser::new(trimmed).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PendingBond {
    #[default]
    None,
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chiral {
    Cw,
    Ccw,
}

struct RingOpen {
    atom: NodeIndex,
    order: PendingBond,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    mol: Mol,
    prev: Option<NodeIndex>,
    pending: PendingBond,
    branch_stack: Vec<Option<NodeIndex>>,
    ring_open: HashMap<u16, RingOpen>,
    chiral_centers: Vec<(NodeIndex, Chiral)>,
}

impl Parser {
    fn new(input: &str) -> Self {
        Parser {
            chars: input.chars().collect(),
            pos: 0,
            mol: Mol::new(),
            prev: None,
            pending: PendingBond::None,
            branch_stack: Vec::new(),
            ring_open: HashMap::new(),
            chiral_centers: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Mol, SmilesError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            match ch {
                ' ' | '\t' | '\r' | '\n' => self.pos += 1,
                '.' => {
                    if self.pending != PendingBond::None {
                        return Err(SmilesError::DanglingBond { pos: self.pos });
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '(' => {
                    self.branch_stack.push(self.prev);
                    self.pos += 1;
                }
                ')' => {
                    self.prev = self
                        .branch_stack
                        .pop()
                        .ok_or(SmilesError::UnmatchedParen { pos: self.pos })?;
                    self.pos += 1;
                }
                '-' => self.set_pending(PendingBond::Single)?,
                '=' => self.set_pending(PendingBond::Double)?,
                '#' => self.set_pending(PendingBond::Triple)?,
                '$' => self.set_pending(PendingBond::Quadruple)?,
                ':' => self.set_pending(PendingBond::Aromatic)?,
                '/' => self.set_pending(PendingBond::Up)?,
                '\\' => self.set_pending(PendingBond::Down)?,
                '%' => {
                    let digit = self.read_two_digit_closure()?;
                    self.ring_closure(digit)?;
                }
                '0'..='9' => {
                    let digit = ch as u16 - '0' as u16;
                    self.pos += 1;
                    self.ring_closure(digit)?;
                }
                '[' => {
                    let atom = self.parse_bracket_atom()?;
                    self.add_parsed_atom(atom)?;
                }
                _ => {
                    let atom = self.parse_bare_atom()?;
                    self.add_parsed_atom(atom)?;
                }
            }
        }
        self.finish()
    }

    fn finish(mut self) -> Result<Mol, SmilesError> {
        if !self.branch_stack.is_empty() {
            return Err(SmilesError::UnmatchedParen {
                pos: self.chars.len(),
            });
        }
        if let Some(&digit) = self.ring_open.keys().next() {
            return Err(SmilesError::UnclosedRing { digit });
        }
        if self.pending != PendingBond::None {
            return Err(SmilesError::DanglingBond {
                pos: self.chars.len(),
            });
        }
        let centers = std::mem::take(&mut self.chiral_centers);
        assign_chiral_wedges(&mut self.mol, &centers);
        Ok(self.mol)
    }

    fn set_pending(&mut self, bond: PendingBond) -> Result<(), SmilesError> {
        if self.prev.is_none() {
            return Err(SmilesError::DanglingBond { pos: self.pos });
        }
        self.pending = bond;
        self.pos += 1;
        Ok(())
    }

    fn read_two_digit_closure(&mut self) -> Result<u16, SmilesError> {
        let start = self.pos;
        self.pos += 1; // skip '%'
        let mut digit = 0u16;
        let mut count = 0;
        while count < 2 {
            match self.chars.get(self.pos) {
                Some(&c) if c.is_ascii_digit() => {
                    digit = digit * 10 + (c as u16 - '0' as u16);
                    self.pos += 1;
                    count += 1;
                }
                _ => return Err(SmilesError::UnexpectedChar { pos: start, ch: '%' }),
            }
        }
        Ok(digit)
    }

    fn ring_closure(&mut self, digit: u16) -> Result<(), SmilesError> {
        let prev = self.prev.ok_or(SmilesError::DanglingBond { pos: self.pos })?;
        let pending = std::mem::take(&mut self.pending);
        match self.ring_open.remove(&digit) {
            None => {
                self.ring_open.insert(
                    digit,
                    RingOpen {
                        atom: prev,
                        order: pending,
                    },
                );
            }
            Some(open) => {
                let order = match (open.order, pending) {
                    (PendingBond::None, p) => p,
                    (o, PendingBond::None) => o,
                    (o, p) if o == p => o,
                    _ => return Err(SmilesError::RingBondConflict { digit }),
                };
                let bond = self.make_bond(order, open.atom, prev);
                self.mol
                    .add_bond(open.atom, prev, bond)
                    .map_err(|_| SmilesError::InvalidRingClosure { digit })?;
            }
        }
        Ok(())
    }

    fn make_bond(&self, pending: PendingBond, a: NodeIndex, b: NodeIndex) -> Bond {
        match pending {
            PendingBond::None => {
                if self.mol.atom(a).is_aromatic && self.mol.atom(b).is_aromatic {
                    Bond::aromatic()
                } else {
                    Bond::single()
                }
            }
            PendingBond::Single => Bond::single(),
            PendingBond::Double => Bond::with_order(BondOrder::Double),
            PendingBond::Triple => Bond::with_order(BondOrder::Triple),
            PendingBond::Quadruple => Bond::with_order(BondOrder::Quadruple),
            PendingBond::Aromatic => Bond::aromatic(),
            PendingBond::Up => Bond {
                stereo: BondStereo::Up,
                ..Bond::default()
            },
            PendingBond::Down => Bond {
                stereo: BondStereo::Down,
                ..Bond::default()
            },
        }
    }

    fn add_parsed_atom(&mut self, atom: Atom) -> Result<(), SmilesError> {
        let idx = self.mol.add_atom(atom);
        if let Some(prev) = self.prev {
            let pending = std::mem::take(&mut self.pending);
            let bond = self.make_bond(pending, prev, idx);
            // endpoints are a fresh node and an existing one; this cannot fail
            self.mol
                .add_bond(prev, idx, bond)
                .expect("bond endpoints exist and differ");
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn parse_bare_atom(&mut self) -> Result<Atom, SmilesError> {
        let pos = self.pos;
        let ch = self.chars[pos];
        let next = self.chars.get(pos + 1).copied();

        let (symbol, aromatic, width) = match ch {
            'B' if next == Some('r') => ("Br", false, 2),
            'B' => ("B", false, 1),
            'C' if next == Some('l') => ("Cl", false, 2),
            'C' => ("C", false, 1),
            'N' => ("N", false, 1),
            'O' => ("O", false, 1),
            'P' => ("P", false, 1),
            'S' => ("S", false, 1),
            'F' => ("F", false, 1),
            'I' => ("I", false, 1),
            'b' => ("B", true, 1),
            'c' => ("C", true, 1),
            'n' => ("N", true, 1),
            'o' => ("O", true, 1),
            'p' => ("P", true, 1),
            's' => ("S", true, 1),
            _ => return Err(SmilesError::UnexpectedChar { pos, ch }),
        };
        self.pos += width;
        Ok(Atom {
            symbol: symbol.to_string(),
            is_aromatic: aromatic,
            ..Atom::default()
        })
    }

    fn parse_bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        self.pos += 1; // skip '['

        let isotope = self.read_number().min(u16::MAX as u32) as u16;

        let (symbol, aromatic) = self.read_bracket_symbol(start)?;
        if !element::is_valid_symbol(&symbol) {
            return Err(SmilesError::UnknownElement {
                pos: start,
                text: symbol,
            });
        }

        let chirality = self.read_chirality();

        // explicit hydrogen counts are parsed but not modeled; implicit counts
        // are derived from covalence at depiction time
        if self.peek() == Some('H') {
            self.pos += 1;
            self.read_number();
        }

        let charge = self.read_charge()?;

        // atom class, accepted and ignored
        if self.peek() == Some(':') {
            self.pos += 1;
            self.read_number();
        }

        if self.peek() != Some(']') {
            return Err(SmilesError::UnclosedBracket { pos: start });
        }
        self.pos += 1;

        let atom = Atom {
            symbol,
            charge,
            isotope,
            is_aromatic: aromatic,
            ..Atom::default()
        };
        if let Some(direction) = chirality {
            // the node index this atom will get is the current atom count
            let idx = NodeIndex::new(self.mol.atom_count());
            self.chiral_centers.push((idx, direction));
        }
        Ok(atom)
    }

    fn read_bracket_symbol(&mut self, start: usize) -> Result<(String, bool), SmilesError> {
        let ch = self
            .peek()
            .ok_or(SmilesError::UnclosedBracket { pos: start })?;

        if ch.is_ascii_uppercase() {
            self.pos += 1;
            let mut symbol = ch.to_string();
            if let Some(low) = self.peek() {
                if low.is_ascii_lowercase() {
                    let two = format!("{}{}", ch, low);
                    if element::is_valid_symbol(&two) {
                        self.pos += 1;
                        symbol = two;
                    }
                }
            }
            return Ok((symbol, false));
        }

        // aromatic lowercase inside brackets: c n o s p b, plus se and as
        if ch.is_ascii_lowercase() {
            let next = self.chars.get(self.pos + 1).copied();
            let (symbol, width) = match (ch, next) {
                ('s', Some('e')) => ("Se", 2),
                ('a', Some('s')) => ("As", 2),
                ('b', _) => ("B", 1),
                ('c', _) => ("C", 1),
                ('n', _) => ("N", 1),
                ('o', _) => ("O", 1),
                ('p', _) => ("P", 1),
                ('s', _) => ("S", 1),
                _ => {
                    return Err(SmilesError::UnknownElement {
                        pos: self.pos,
                        text: ch.to_string(),
                    })
                }
            };
            self.pos += width;
            return Ok((symbol.to_string(), true));
        }

        Err(SmilesError::UnexpectedChar { pos: self.pos, ch })
    }

    fn read_chirality(&mut self) -> Option<Chiral> {
        if self.peek() != Some('@') {
            return None;
        }
        self.pos += 1;
        if self.peek() == Some('@') {
            self.pos += 1;
            Some(Chiral::Cw)
        } else {
            Some(Chiral::Ccw)
        }
    }

    fn read_charge(&mut self) -> Result<i8, SmilesError> {
        let sign = match self.peek() {
            Some('+') => 1i8,
            Some('-') => -1i8,
            _ => return Ok(0),
        };
        let pos = self.pos;
        self.pos += 1;

        // either repeated signs (++) or an explicit count (+2)
        let mut magnitude = 1i8;
        while self.peek() == Some(if sign > 0 { '+' } else { '-' }) {
            self.pos += 1;
            magnitude = magnitude.checked_add(1).ok_or(SmilesError::InvalidCharge { pos })?;
        }
        if magnitude == 1 {
            let digits = self.read_number();
            if digits > 0 {
                if digits > i8::MAX as u32 {
                    return Err(SmilesError::InvalidCharge { pos });
                }
                magnitude = digits as i8;
            }
        }
        Ok(sign * magnitude)
    }

    fn read_number(&mut self) -> u32 {
        let mut value = 0u32;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            value = value.saturating_mul(10).saturating_add(c as u32 - '0' as u32);
            self.pos += 1;
        }
        value
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }
}

/// Maps chiral marks onto wedge tags of bonds at the center, preferring
/// non-ring bonds. Chirality does not influence the 2D layout; the wedges only
/// inform depiction.
fn assign_chiral_wedges(mol: &mut Mol, centers: &[(NodeIndex, Chiral)]) {
    for &(center, direction) in centers {
        if center.index() >= mol.atom_count() {
            continue;
        }
        let bonds: Vec<EdgeIndex> = mol.bonds_of(center).collect();
        let neighbor_count = bonds.len();
        let available: Vec<EdgeIndex> = bonds
            .iter()
            .copied()
            .filter(|&b| !mol.is_bond_in_ring(b))
            .collect();

        if (neighbor_count == 3 || neighbor_count == 4) && !available.is_empty() {
            let mut idx = 0;
            if (neighbor_count == 3 && available.len() > 1)
                || (neighbor_count == 4 && available.len() > 2)
            {
                idx = 1;
            }
            let stereo = match direction {
                Chiral::Cw => BondStereo::Up,
                Chiral::Ccw => BondStereo::Down,
            };
            set_wedge(mol, available[idx], center, stereo);

            if neighbor_count == 4 && available.len() > 1 {
                let idx = if available.len() == 4 { 3 } else { 1 };
                let opposite = match direction {
                    Chiral::Cw => BondStereo::Down,
                    Chiral::Ccw => BondStereo::Up,
                };
                set_wedge(mol, available[idx], center, opposite);
            }
        }
    }
}

// Wedges point from their source atom; when the stored edge runs the other
// way the annotation flips instead.
fn set_wedge(mol: &mut Mol, bond: EdgeIndex, center: NodeIndex, stereo: BondStereo) {
    let (src, _) = mol
        .bond_endpoints(bond)
        .expect("bond belongs to this molecule");
    let effective = if src == center {
        stereo
    } else {
        match stereo {
            BondStereo::Up => BondStereo::Down,
            BondStereo::Down => BondStereo::Up,
            BondStereo::None => BondStereo::None,
        }
    };
    mol.bond_mut(bond).stereo = effective;
}
