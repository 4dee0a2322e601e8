//! Ring system placement.
//!
//! Every attachment case reduces to the same move: derive the new ring's
//! center from the geometry already on the canvas, work out the angular span
//! still available, and spread the remaining ring atoms over it.

use std::f64::consts::PI;

use log::warn;
use petgraph::graph::{EdgeIndex, NodeIndex};
use ultraviolet::DVec2;

use super::atom_placer::{
    center_of, direction_angle, distribute_partners, mark_not_placed, mark_placed,
    normalized_or_fallback, partition_partners, placed_center_of, populate_polygon_corners,
};
use super::AtomFlags;
use crate::mol::Mol;
use crate::rings::{direct_connected_rings, Ring};

/// How a ring shares atoms with already-placed structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attachment {
    /// Shares exactly one bond (two atoms).
    Fused,
    /// Shares a chain of more than two atoms.
    Bridged,
    /// Shares exactly one atom.
    Spiro,
}

/// The atoms and bonds a ring has in common with already-placed structure.
pub(crate) struct SharedFragment {
    pub atoms: Vec<NodeIndex>,
    pub bonds: Vec<EdgeIndex>,
}

/// Radius of the regular polygon with `size` corners and `bond_length` sides.
pub(crate) fn native_ring_radius(size: usize, bond_length: f64) -> f64 {
    bond_length / (2.0 * (PI / size as f64).sin())
}

/// Puts the first bond of the first ring on the canvas: source at the origin,
/// target one bond length along `bond_vector`.
fn place_first_bond(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    bond: EdgeIndex,
    bond_vector: DVec2,
    bond_length: f64,
) -> (NodeIndex, NodeIndex) {
    let step = normalized_or_fallback(bond_vector) * bond_length;
    let (src, dst) = mol
        .bond_endpoints(bond)
        .expect("ring bond belongs to the molecule");
    mol.atom_mut(src).coord = DVec2::zero();
    flags.placed[src.index()] = true;
    mol.atom_mut(dst).coord = step;
    flags.placed[dst.index()] = true;
    (src, dst)
}

/// Center of the first ring, on the perpendicular bisector of its first bond.
fn first_ring_center(ring_size: usize, bond_vector: DVec2, bond_length: f64) -> DVec2 {
    let radius = native_ring_radius(ring_size, bond_length);
    let perpendicular = (radius * radius - bond_length * bond_length / 4.0)
        .max(0.0)
        .sqrt();
    let rot_angle = direction_angle(bond_vector.x, bond_vector.y) + PI / 2.0;
    DVec2::new(rot_angle.cos(), rot_angle.sin()) * perpendicular
}

/// Places one ring relative to its shared fragment, dispatching on how many
/// atoms are shared.
pub(crate) fn place_ring(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    ring: &Ring,
    shared: &SharedFragment,
    shared_center: DVec2,
    ring_center_vector: DVec2,
    bond_length: f64,
) {
    match shared.atoms.len() {
        0 => {}
        1 => place_spiro_ring(mol, flags, ring, shared, shared_center, ring_center_vector, bond_length),
        2 => place_fused_ring(mol, flags, ring, shared, shared_center, ring_center_vector, bond_length),
        _ => place_bridged_ring(mol, flags, ring, shared, shared_center, ring_center_vector, bond_length),
    }
}

fn place_spiro_ring(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    ring: &Ring,
    shared: &SharedFragment,
    shared_center: DVec2,
    ring_center_vector: DVec2,
    bond_length: f64,
) {
    let radius = native_ring_radius(ring.len(), bond_length);
    let ring_center = shared_center + normalized_or_fallback(ring_center_vector) * radius;
    let add_angle = 2.0 * PI / ring.len() as f64;

    let start = shared.atoms[0];
    let start_pos = mol.atom(start).coord;
    let start_angle =
        direction_angle(start_pos.x - ring_center.x, start_pos.y - ring_center.y);

    // walking the full cycle re-derives the shared atom's own position last
    let atoms_to_place = ring_walk(mol, ring, start, &[]);
    populate_polygon_corners(
        mol,
        flags,
        &atoms_to_place,
        ring_center,
        start_angle,
        add_angle,
        radius,
    );
}

fn place_fused_ring(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    ring: &Ring,
    shared: &SharedFragment,
    shared_center: DVec2,
    ring_center_vector: DVec2,
    bond_length: f64,
) {
    let radius = native_ring_radius(ring.len(), bond_length);
    let perpendicular = (radius * radius - bond_length * bond_length / 4.0)
        .max(0.0)
        .sqrt();
    let ring_center = shared_center + normalized_or_fallback(ring_center_vector) * perpendicular;

    let atom1 = shared.atoms[0];
    let atom2 = shared.atoms[1];
    let p1 = mol.atom(atom1).coord;
    let p2 = mol.atom(atom2).coord;

    let occupied = super::atom_placer::angle_between(p1 - ring_center, p2 - ring_center);
    let mut add_angle = (2.0 * PI - occupied) / (ring.len() - 1) as f64;

    let x_diff = p1.x - p2.x;
    let y_diff = p1.y - p2.y;
    let (start_atom, direction) = if x_diff == 0.0 {
        // vertical shared bond: start at the upper atom, close the ring on
        // whichever side the center is not
        let start = if p1.y > p2.y { atom1 } else { atom2 };
        let dir = if ring_center.x < p1.x { 1.0 } else { -1.0 };
        (start, dir)
    } else {
        let start = if p1.x > p2.x { atom1 } else { atom2 };
        let dir = if ring_center.y - p1.y > (ring_center.x - p1.x) * y_diff / x_diff {
            1.0
        } else {
            -1.0
        };
        (start, dir)
    };
    add_angle *= direction;

    let start_pos = mol.atom(start_atom).coord;
    let start_angle =
        direction_angle(start_pos.x - ring_center.x, start_pos.y - ring_center.y);

    // everything but the two shared atoms, walking away from the shared bond
    let walk = ring_walk(mol, ring, start_atom, &shared.bonds);
    let atoms_to_draw: Vec<NodeIndex> = walk.into_iter().take(ring.len() - 2).collect();

    populate_polygon_corners(
        mol,
        flags,
        &atoms_to_draw,
        ring_center,
        start_angle,
        add_angle,
        radius,
    );
}

fn place_bridged_ring(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    ring: &Ring,
    shared: &SharedFragment,
    shared_center: DVec2,
    ring_center_vector: DVec2,
    bond_length: f64,
) {
    let radius = native_ring_radius(ring.len(), bond_length);
    let ring_center = shared_center + normalized_or_fallback(ring_center_vector) * radius;

    let Some((bridge1, bridge2)) = bridge_atoms(mol, shared) else {
        return;
    };
    let p1 = mol.atom(bridge1).coord;
    let p2 = mol.atom(bridge2).coord;

    let occupied = super::atom_placer::angle_between(p1 - ring_center, p2 - ring_center);
    let free_positions = ring.len() - shared.atoms.len();
    let mut add_angle = (2.0 * PI - occupied) / (free_positions + 1) as f64;
    add_angle *= find_direction(ring_center, p1, p2);

    let start_atom = find_start_atom(bridge1, p1, bridge2, p2);
    let start_pos = mol.atom(start_atom).coord;
    let start_angle =
        direction_angle(start_pos.x - ring_center.x, start_pos.y - ring_center.y);

    // walk away from the shared chain; the chain atoms themselves stay put
    let walk = ring_walk(mol, ring, start_atom, &shared.bonds);
    let atoms_to_draw: Vec<NodeIndex> = walk
        .into_iter()
        .filter(|a| !shared.atoms.contains(a))
        .take(free_positions)
        .collect();

    populate_polygon_corners(
        mol,
        flags,
        &atoms_to_draw,
        ring_center,
        start_angle,
        add_angle,
        radius,
    );
}

/// The two outermost atoms of the shared chain: each touches exactly one
/// shared bond, which is what leaves it a free bond into the unshared part.
fn bridge_atoms(mol: &Mol, shared: &SharedFragment) -> Option<(NodeIndex, NodeIndex)> {
    let mut ends = shared.atoms.iter().copied().filter(|&atom| {
        shared
            .bonds
            .iter()
            .filter(|&&b| mol.bond_touches(b, atom))
            .count()
            == 1
    });
    let first = ends.next()?;
    let second = ends.next()?;
    Some((first, second))
}

fn find_start_atom(atom1: NodeIndex, p1: DVec2, atom2: NodeIndex, p2: DVec2) -> NodeIndex {
    let diff = p1 - p2;
    if diff.x == 0.0 {
        if p1.y > p2.y {
            return atom1;
        }
    } else if p1.x > p2.x {
        return atom1;
    }
    atom2
}

fn find_direction(ring_center: DVec2, p1: DVec2, p2: DVec2) -> f64 {
    let diff = p1 - p2;
    if diff.x == 0.0 {
        if ring_center.x > p1.x {
            return -1.0;
        }
    } else if ring_center.y - p1.y < (ring_center.x - p1.x) * diff.y / diff.x {
        return -1.0;
    }
    1.0
}

/// Walks the ring's bond list from `start`, one bond at a time, returning the
/// atoms in traversal order. The first step avoids `avoid_first` so the walk
/// leaves shared geometry behind it.
fn ring_walk(
    mol: &Mol,
    ring: &Ring,
    start: NodeIndex,
    avoid_first: &[EdgeIndex],
) -> Vec<NodeIndex> {
    let mut remaining = ring.bonds.clone();
    let mut order = Vec::with_capacity(ring.len());
    let mut current = start;
    let mut first = true;
    loop {
        let next = remaining
            .iter()
            .position(|&b| {
                mol.bond_touches(b, current) && (!first || !avoid_first.contains(&b))
            })
            .or_else(|| {
                if first {
                    remaining.iter().position(|&b| mol.bond_touches(b, current))
                } else {
                    None
                }
            });
        let Some(pos) = next else { break };
        let bond = remaining.remove(pos);
        current = mol.other_atom(bond, current);
        order.push(current);
        first = false;
    }
    order
}

/// Atoms and bonds `other` shares with `base`.
fn intersecting_fragment(base: &Ring, other: &Ring) -> SharedFragment {
    let atoms = other
        .atoms
        .iter()
        .copied()
        .filter(|a| base.atoms.contains(a))
        .collect();
    let bonds = other
        .bonds
        .iter()
        .copied()
        .filter(|b| base.bonds.contains(b))
        .collect();
    SharedFragment { atoms, bonds }
}

/// Lays out one connected ring system from scratch: most connected ring first,
/// then repeated fused/bridged/spiro propagation until every ring is placed.
pub(crate) fn place_ring_set(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    rings: &[Ring],
    placed: &mut [bool],
    ringset: &[usize],
    first_bond_vector: DVec2,
    bond_length: f64,
) {
    let most_complex = most_complex_ring(rings, ringset);
    if !placed[most_complex] {
        let ring = &rings[most_complex];
        let first_bond = ring.bonds[0];
        let (src, dst) = place_first_bond(mol, flags, first_bond, first_bond_vector, bond_length);
        let shared = SharedFragment {
            atoms: vec![src, dst],
            bonds: vec![first_bond],
        };
        let shared_center = (mol.atom(src).coord + mol.atom(dst).coord) * 0.5;
        let center_vector = first_ring_center(ring.len(), first_bond_vector, bond_length);
        place_ring(mol, flags, ring, &shared, shared_center, center_vector, bond_length);
        placed[most_complex] = true;
    }

    let mut cursor = ringset
        .iter()
        .position(|&r| r == most_complex)
        .unwrap_or(0);
    let mut guard = 0;
    let limit = ringset.len() * ringset.len() + 1;
    while !ringset.iter().all(|&r| placed[r]) {
        guard += 1;
        if guard > limit {
            let left = ringset.iter().filter(|&&r| !placed[r]).count();
            warn!("ring system placement stalled with {} rings unplaced", left);
            break;
        }
        let current = ringset[cursor];
        if placed[current] {
            place_connected_rings(mol, flags, rings, placed, ringset, current, Attachment::Fused, bond_length);
            place_connected_rings(mol, flags, rings, placed, ringset, current, Attachment::Bridged, bond_length);
            place_connected_rings(mol, flags, rings, placed, ringset, current, Attachment::Spiro, bond_length);
        }
        cursor = (cursor + 1) % ringset.len();
    }
}

/// The ring sharing the most atoms with the rest of its system; ties go to the
/// earliest.
fn most_complex_ring(rings: &[Ring], ringset: &[usize]) -> usize {
    let mut shared_counts = vec![0usize; ringset.len()];
    for i in 0..ringset.len() {
        for k in i + 1..ringset.len() {
            for atom in &rings[ringset[i]].atoms {
                if rings[ringset[k]].contains_atom(*atom) {
                    shared_counts[i] += 1;
                    shared_counts[k] += 1;
                }
            }
        }
    }
    let mut best = 0;
    for (pos, &count) in shared_counts.iter().enumerate() {
        if count > shared_counts[best] {
            best = pos;
        }
    }
    ringset[best]
}

/// Propagates placement from `start` to every transitively connected ring
/// whose shared-atom count matches `mode`. Explicit stack, so deep fused
/// cascades cannot overflow.
pub(crate) fn place_connected_rings(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    rings: &[Ring],
    placed: &mut [bool],
    ringset: &[usize],
    start: usize,
    mode: Attachment,
    bond_length: f64,
) {
    let mut stack = vec![start];
    while let Some(ring_idx) = stack.pop() {
        for conn in direct_connected_rings(rings, ring_idx, ringset) {
            if placed[conn] {
                continue;
            }
            let shared = intersecting_fragment(&rings[ring_idx], &rings[conn]);
            let matches = match mode {
                Attachment::Fused => shared.atoms.len() == 2,
                Attachment::Spiro => shared.atoms.len() == 1,
                Attachment::Bridged => shared.atoms.len() > 2,
            };
            if !matches {
                continue;
            }
            let shared_center = placed_center_of(mol, flags, &shared.atoms);
            let old_ring_center = placed_center_of(mol, flags, &rings[ring_idx].atoms);
            let center_vector = shared_center - old_ring_center;
            place_ring(mol, flags, &rings[conn], &shared, shared_center, center_vector, bond_length);
            placed[conn] = true;
            stack.push(conn);
        }
    }
}

/// Distributes the non-ring neighbors of every ring atom around the centroid
/// of the rings containing that atom. Returns the atoms it positioned.
pub(crate) fn place_ring_substituents(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    rings: &[Ring],
    ringset: &[usize],
    bond_length: f64,
) -> Vec<NodeIndex> {
    let mut treated = Vec::new();
    for &ri in ringset {
        for ai in 0..rings[ri].atoms.len() {
            let atom = rings[ri].atoms[ai];
            let (placed_partners, unplaced_partners) = partition_partners(mol, flags, atom);

            let mut gravity_atoms: Vec<NodeIndex> = Vec::new();
            for &rj in ringset {
                if rings[rj].contains_atom(atom) {
                    gravity_atoms.extend(rings[rj].atoms.iter().copied());
                }
            }
            let gravity_center = center_of(mol, &gravity_atoms);

            mark_not_placed(flags, &unplaced_partners);
            treated.extend(unplaced_partners.iter().copied());
            if !unplaced_partners.is_empty() {
                distribute_partners(
                    mol,
                    flags,
                    atom,
                    &placed_partners,
                    gravity_center,
                    &unplaced_partners,
                    bond_length,
                );
            }
        }
    }
    treated.sort();
    treated.dedup();
    treated
}

/// Finds the next unplaced ring system hanging off already-placed structure,
/// lays it out in isolation, then rigidly translates and rotates it so the
/// attachment bond keeps its original length and direction.
#[allow(clippy::too_many_arguments)]
pub(crate) fn layout_next_ring_system(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    rings: &[Ring],
    placed: &mut [bool],
    committed: &mut [bool],
    ringsets: &[Vec<usize>],
    first_bond_vector: DVec2,
    bond_length: f64,
) {
    // atoms of uncommitted rings revert to unplaced before the search
    for (ri, ring) in rings.iter().enumerate() {
        if !committed[ri] {
            for &a in &ring.atoms {
                flags.placed[a.index()] = false;
            }
        }
    }
    let previously_placed: Vec<NodeIndex> =
        mol.atoms().filter(|&a| flags.placed[a.index()]).collect();

    let mut found = None;
    for edge in mol.bonds() {
        let (s, t) = mol
            .bond_endpoints(edge)
            .expect("edge index is valid");
        for (ring_atom, chain_atom) in [(s, t), (t, s)] {
            if flags.in_ring[ring_atom.index()]
                && !flags.placed[ring_atom.index()]
                && flags.placed[chain_atom.index()]
            {
                found = Some((ring_atom, chain_atom));
                break;
            }
        }
        if found.is_some() {
            break;
        }
    }
    let Some((ring_atom, chain_atom)) = found else {
        return;
    };

    let Some(ringset) = ringsets
        .iter()
        .find(|set| set.iter().any(|&r| rings[r].contains_atom(ring_atom)))
    else {
        return;
    };

    let old_ring_coord = mol.atom(ring_atom).coord;
    let old_chain_coord = mol.atom(chain_atom).coord;

    place_ring_set(mol, flags, rings, placed, ringset, first_bond_vector, bond_length);

    // substituent distribution must not treat the rest of the molecule as
    // placed geometry; it will be re-aligned as a rigid body below
    mark_not_placed(flags, &previously_placed);
    let substituents = place_ring_substituents(mol, flags, rings, ringset, bond_length);
    mark_placed(flags, &previously_placed);

    let mut moved = substituents;
    for &r in ringset {
        moved.extend(rings[r].atoms.iter().copied());
    }
    moved.sort();
    moved.dedup();

    let new_ring_coord = mol.atom(ring_atom).coord;
    let new_chain_coord = mol.atom(chain_atom).coord;

    let old_angle = direction_angle(
        old_ring_coord.x - old_chain_coord.x,
        old_ring_coord.y - old_chain_coord.y,
    );
    let new_angle = direction_angle(
        new_ring_coord.x - new_chain_coord.x,
        new_ring_coord.y - new_chain_coord.y,
    );
    let angle_diff = old_angle - new_angle;

    let translation = old_chain_coord - new_chain_coord;
    for &a in &moved {
        mol.atom_mut(a).coord += translation;
    }

    let (sin_theta, cos_theta) = angle_diff.sin_cos();
    for &a in &moved {
        let rel = mol.atom(a).coord - old_chain_coord;
        mol.atom_mut(a).coord = DVec2::new(
            rel.x * cos_theta - rel.y * sin_theta + old_chain_coord.x,
            rel.x * sin_theta + rel.y * cos_theta + old_chain_coord.y,
        );
    }

    for &r in ringset.iter() {
        committed[r] = true;
    }
}
