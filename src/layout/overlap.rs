//! Post-layout overlap resolution.
//!
//! A best-effort local search: atoms closer than a fifth of a bond length are
//! scored as overlapping, and up to 25 random displacements try to pull the
//! offending pairs apart. Stopping at the step budget with a nonzero score is
//! expected on crowded layouts, not a failure.

use petgraph::graph::NodeIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ultraviolet::DVec2;

use crate::mol::Mol;

const MAX_STEPS: usize = 25;

/// Resolves atom overlaps in place and returns the final overlap score.
/// The RNG is seeded explicitly so callers can force a deterministic run.
pub fn resolve_overlaps(mol: &mut Mol, bond_length: f64, seed: u64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pairs = Vec::new();
    let score = overlap_score(mol, bond_length, &mut pairs);
    if score > 0.0 {
        displace(mol, bond_length, &mut rng, &mut pairs)
    } else {
        score
    }
}

/// Sums a fixed penalty for every atom pair closer than `bond_length / 5`,
/// collecting the offending pairs.
pub(crate) fn overlap_score(
    mol: &Mol,
    bond_length: f64,
    pairs: &mut Vec<(NodeIndex, NodeIndex)>,
) -> f64 {
    pairs.clear();
    let cutoff = bond_length / 5.0;
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    let mut score = 0.0;
    for (i, &a) in atoms.iter().enumerate() {
        let pa = mol.atom(a).coord;
        for &b in &atoms[i + 1..] {
            let pb = mol.atom(b).coord;
            if (pa - pb).mag() < cutoff {
                score += cutoff;
                pairs.push((a, b));
            }
        }
    }
    score
}

fn displace(
    mol: &mut Mol,
    bond_length: f64,
    rng: &mut StdRng,
    pairs: &mut Vec<(NodeIndex, NodeIndex)>,
) -> f64 {
    let mut steps = 0;
    let mut score;
    loop {
        if pairs.is_empty() {
            return 0.0;
        }
        let (atom1, atom2) = pairs[rng.gen_range(0..pairs.len())];

        let mut separation = mol.atom(atom2).coord - mol.atom(atom1).coord;
        separation.normalize();
        // coincident atoms normalize to NaN; substitute a small nudge
        if !separation.x.is_finite() {
            separation.x = 0.01;
        }
        if !separation.y.is_finite() {
            separation.y = 0.01;
        }
        let shift = separation * (-bond_length / 3.0);

        if rng.gen::<f64>() > 0.5 {
            let coord = &mut mol.atom_mut(atom2).coord;
            *coord += shift;
        } else {
            let coord = &mut mol.atom_mut(atom1).coord;
            *coord -= shift;
        }

        score = overlap_score(mol, bond_length, pairs);
        steps += 1;
        if score <= 0.0 || steps > MAX_STEPS {
            return score;
        }
    }
}
