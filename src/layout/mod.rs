//! 2D structure diagram generation.
//!
//! Given only connectivity, [`generate_coordinates`] produces conventional 2D
//! depiction coordinates: ring systems as fused/bridged/spiro polygon
//! assemblies, chains as 120° zig-zags, substituents spread through whatever
//! angle is left. The algorithm is greedy with bounded iteration everywhere;
//! when a budget runs out the best layout reached so far is kept. The only
//! input it refuses is a disconnected molecule.

mod atom_placer;
mod overlap;
mod ring_placer;

use std::fmt;

use log::{debug, warn};
use petgraph::graph::NodeIndex;
use ultraviolet::DVec2;

use crate::mol::{Mol, DEFAULT_BOND_LENGTH};
use crate::rings::{partition_rings, Ring};

pub use overlap::resolve_overlaps;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Layout requires a connected molecule; split fragments first.
    NotConnected { fragments: usize },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected { fragments } => {
                write!(f, "molecule is not connected ({} fragments)", fragments)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Target bond length in model units.
    pub bond_length: f64,
    /// Seed for the overlap-resolution RNG.
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            bond_length: DEFAULT_BOND_LENGTH,
            seed: 42,
        }
    }
}

/// Per-run working state, one slot per atom. Allocating this fresh for every
/// generation run keeps layout state out of the atoms themselves.
pub(crate) struct AtomFlags {
    pub placed: Vec<bool>,
    pub visited: Vec<bool>,
    pub in_ring: Vec<bool>,
    pub aliphatic: Vec<bool>,
}

impl AtomFlags {
    pub(crate) fn new(n: usize) -> Self {
        AtomFlags {
            placed: vec![false; n],
            visited: vec![false; n],
            in_ring: vec![false; n],
            aliphatic: vec![false; n],
        }
    }
}

/// Generates 2D coordinates for every atom of `mol` with the default config.
pub fn generate_coordinates(mol: &mut Mol) -> Result<(), LayoutError> {
    generate_coordinates_with(mol, &LayoutConfig::default())
}

/// Generates 2D coordinates for every atom of `mol`.
pub fn generate_coordinates_with(mol: &mut Mol, config: &LayoutConfig) -> Result<(), LayoutError> {
    let atom_count = mol.atom_count();
    if atom_count == 0 {
        return Ok(());
    }
    if atom_count == 1 {
        let only = mol.atoms().next().expect("one atom");
        mol.atom_mut(only).coord = DVec2::zero();
        return Ok(());
    }
    if mol.fragment_count() > 1 {
        return Err(LayoutError::NotConnected {
            fragments: mol.fragment_count(),
        });
    }

    let bond_length = config.bond_length;
    let first_bond_vector = DVec2::new(0.0, 1.0);
    let mut flags = AtomFlags::new(atom_count);

    let rings: Vec<Ring> = mol.rings().to_vec();
    let ringsets = partition_rings(&rings);
    let mut ring_placed = vec![false; rings.len()];
    let mut ring_committed = vec![false; rings.len()];

    if !rings.is_empty() {
        debug!(
            "ring layout: {} rings in {} systems",
            rings.len(),
            ringsets.len()
        );
        for ring in &rings {
            for &a in &ring.atoms {
                flags.in_ring[a.index()] = true;
            }
        }
        let largest = ringsets
            .iter()
            .max_by_key(|set| set.len())
            .expect("at least one ring system");
        ring_placer::place_ring_set(
            mol,
            &mut flags,
            &rings,
            &mut ring_placed,
            largest,
            first_bond_vector,
            bond_length,
        );
        ring_placer::place_ring_substituents(mol, &mut flags, &rings, largest, bond_length);
        for &r in largest.iter() {
            ring_committed[r] = true;
        }
    } else {
        debug!("chain layout");
        let chain = atom_placer::initial_longest_chain(mol, &mut flags);
        if let Some(&head) = chain.first() {
            mol.atom_mut(head).coord = DVec2::zero();
            flags.placed[head.index()] = true;
        }
        atom_placer::place_linear_chain(mol, &mut flags, &chain, first_bond_vector, bond_length);
    }

    // alternate aliphatic growth and ring-system attachment until everything
    // is placed or the safety budget runs out; an exhausted budget just stops
    // further growth
    let mut safety = 0;
    loop {
        safety += 1;
        handle_aliphatics(mol, &mut flags, bond_length);
        ring_placer::layout_next_ring_system(
            mol,
            &mut flags,
            &rings,
            &mut ring_placed,
            &mut ring_committed,
            &ringsets,
            first_bond_vector,
            bond_length,
        );
        if atom_placer::all_placed(&flags) || safety > atom_count {
            break;
        }
    }
    if !atom_placer::all_placed(&flags) {
        let left = flags.placed.iter().filter(|&&p| !p).count();
        warn!("layout stopped with {} atoms unplaced after {} passes", left, safety);
    }
    debug!(
        "{} atoms placed as aliphatic chain members",
        flags.aliphatic.iter().filter(|&&f| f).count()
    );

    let residual = overlap::resolve_overlaps(mol, bond_length, config.seed);
    if residual > 0.0 {
        debug!("residual overlap score {:.3}", residual);
    }
    Ok(())
}

/// Grows every aliphatic branch reachable from already-placed atoms.
fn handle_aliphatics(mol: &mut Mol, flags: &mut AtomFlags, bond_length: f64) {
    let mut counter = 0;
    loop {
        counter += 1;
        let Some(atom) = next_atom_with_unplaced_neighbors(mol, flags) else {
            break;
        };
        let (placed_partners, unplaced_partners) = atom_placer::partition_partners(mol, flags, atom);
        let chain = atom_placer::longest_unplaced_chain(mol, flags, atom);
        if chain.len() <= 1 {
            break;
        }

        let direction = if placed_partners.len() > 1 {
            let partner_center = atom_placer::placed_center_of(mol, flags, &placed_partners);
            atom_placer::distribute_partners(
                mol,
                flags,
                atom,
                &placed_partners,
                partner_center,
                &unplaced_partners,
                bond_length,
            );
            // the chain's first step was just positioned by the distribution
            mol.atom(chain[1]).coord - mol.atom(atom).coord
        } else if let Some(&only) = placed_partners.first() {
            atom_placer::next_bond_vector(
                mol,
                atom,
                only,
                atom_placer::center_of_placed(mol, flags),
                true,
            )
        } else {
            break;
        };

        for &a in &chain[1..] {
            flags.placed[a.index()] = false;
        }
        atom_placer::place_linear_chain(mol, flags, &chain, direction, bond_length);

        if counter > mol.atom_count() {
            break;
        }
    }
}

/// The placed endpoint of the first bond with exactly one placed end.
fn next_atom_with_unplaced_neighbors(mol: &Mol, flags: &AtomFlags) -> Option<NodeIndex> {
    for edge in mol.bonds() {
        let (s, t) = mol.bond_endpoints(edge)?;
        if flags.placed[s.index()] && !flags.placed[t.index()] {
            return Some(s);
        }
        if !flags.placed[s.index()] && flags.placed[t.index()] {
            return Some(t);
        }
    }
    None
}
