//! SSSR ring perception.
//!
//! For every connected molecule the perceived ring count equals the cyclomatic
//! number `bonds - atoms + fragments`. Rings are searched per connected ring
//! system: the bounded Hanser path-graph search runs first, and whenever it
//! cannot produce (or verify) enough rings the exact path-included-distance
//! search takes over. The fallback is silent; callers always get a full basis.

mod path_graph;
pub mod partition;
mod sssr;

use std::collections::VecDeque;

use log::debug;
use petgraph::graph::{EdgeIndex, NodeIndex};
use ultraviolet::DVec2;

use crate::mol::Mol;

pub use partition::{direct_connected_rings, partition_rings};

/// Largest ring size the fast path searches for.
const MAX_FAST_RING: usize = 6;

/// One perceived ring: `bonds[i]` connects `atoms[i]` and `atoms[(i+1) % n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub atoms: Vec<NodeIndex>,
    pub bonds: Vec<EdgeIndex>,
}

impl Ring {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn contains_atom(&self, atom: NodeIndex) -> bool {
        self.atoms.contains(&atom)
    }

    pub fn shares_atom(&self, other: &Ring) -> bool {
        self.atoms.iter().any(|a| other.atoms.contains(a))
    }

    /// Geometric center of the member atoms' current coordinates.
    pub fn center(&self, mol: &Mol) -> DVec2 {
        let mut sum = DVec2::zero();
        for &a in &self.atoms {
            sum += mol.atom(a).coord;
        }
        sum / self.atoms.len() as f64
    }

    fn from_cycle(atoms: Vec<NodeIndex>, mol: &Mol) -> Ring {
        let n = atoms.len();
        let bonds = (0..n)
            .map(|i| {
                mol.bond_between(atoms[i], atoms[(i + 1) % n])
                    .expect("consecutive ring atoms are bonded")
            })
            .collect();
        Ring { atoms, bonds }
    }
}

/// A connected ring system reduced to local indices, the working structure for
/// both ring searches.
pub(crate) struct SystemGraph {
    /// Local atom id -> molecule atom.
    pub atoms: Vec<NodeIndex>,
    /// Local bond id -> local endpoint pair.
    pub bonds: Vec<(usize, usize)>,
    /// Local atom id -> (neighbor, local bond id).
    pub adj: Vec<Vec<(usize, usize)>>,
}

impl SystemGraph {
    pub(crate) fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adj[a]
            .iter()
            .find(|&&(nb, _)| nb == b)
            .map(|&(_, bond)| bond)
    }

    #[cfg(test)]
    pub(crate) fn from_local_bonds(atom_count: usize, bonds: &[(usize, usize)]) -> SystemGraph {
        let atoms = (0..atom_count).map(NodeIndex::new).collect();
        let mut adj = vec![Vec::new(); atom_count];
        for (idx, &(a, b)) in bonds.iter().enumerate() {
            adj[a].push((b, idx));
            adj[b].push((a, idx));
        }
        SystemGraph {
            atoms,
            bonds: bonds.to_vec(),
            adj,
        }
    }
}

/// Perceives the SSSR of `mol`.
///
/// Produces exactly `bonds - atoms + fragments` rings. Callers normally go
/// through [`Mol::rings`], which caches the result.
pub fn find_rings(mol: &Mol) -> Vec<Ring> {
    let n = mol.atom_count();
    let nsssr = (mol.bond_count() + mol.fragment_count()).saturating_sub(n);
    if n == 0 || nsssr == 0 {
        return Vec::new();
    }

    let in_cycle = cycle_members(mol);
    let mut assigned = vec![false; n];
    let mut rings = Vec::new();

    for start in mol.atoms() {
        if !in_cycle[start.index()] || assigned[start.index()] {
            continue;
        }
        let sys = collect_ring_system(mol, start, &in_cycle, &mut assigned);
        let local_nsssr = (sys.bonds.len() + 1).saturating_sub(sys.atoms.len());
        if local_nsssr == 0 {
            continue;
        }

        let fast = path_graph::rings(&sys, MAX_FAST_RING);
        let cycles = if fast.len() >= local_nsssr {
            let verified = verify_sssr(&sys, &fast, local_nsssr);
            if verified.len() < local_nsssr {
                debug!(
                    "fast ring search verified {}/{} rings, running exact search",
                    verified.len(),
                    local_nsssr
                );
                sssr::rings(&sys)
            } else {
                verified
            }
        } else {
            debug!(
                "fast ring search found {}/{} candidates, running exact search",
                fast.len(),
                local_nsssr
            );
            sssr::rings(&sys)
        };

        for cycle in cycles {
            let atoms: Vec<NodeIndex> = cycle.iter().map(|&l| sys.atoms[l]).collect();
            rings.push(Ring::from_cycle(atoms, mol));
        }
    }
    rings
}

/// Atoms that can be part of a cycle, found by iteratively pruning terminal
/// atoms until only degree >= 2 cores remain.
fn cycle_members(mol: &Mol) -> Vec<bool> {
    let n = mol.atom_count();
    let mut degree: Vec<usize> = mol.atoms().map(|a| mol.degree(a)).collect();
    let mut removed = vec![false; n];
    let mut queue: VecDeque<NodeIndex> = mol.atoms().filter(|&a| degree[a.index()] <= 1).collect();

    while let Some(atom) = queue.pop_front() {
        if removed[atom.index()] {
            continue;
        }
        removed[atom.index()] = true;
        for nb in mol.neighbors(atom) {
            if removed[nb.index()] {
                continue;
            }
            degree[nb.index()] -= 1;
            if degree[nb.index()] <= 1 {
                queue.push_back(nb);
            }
        }
    }

    (0..n).map(|i| !removed[i]).collect()
}

/// Pulls one connected component of cycle atoms (and every bond among them)
/// out into local indices.
fn collect_ring_system(
    mol: &Mol,
    start: NodeIndex,
    in_cycle: &[bool],
    assigned: &mut [bool],
) -> SystemGraph {
    let mut local = vec![usize::MAX; mol.atom_count()];
    let mut atoms = vec![start];
    local[start.index()] = 0;
    assigned[start.index()] = true;

    let mut queue = VecDeque::from([start]);
    while let Some(atom) = queue.pop_front() {
        for nb in mol.neighbors(atom) {
            if !in_cycle[nb.index()] || assigned[nb.index()] {
                continue;
            }
            assigned[nb.index()] = true;
            local[nb.index()] = atoms.len();
            atoms.push(nb);
            queue.push_back(nb);
        }
    }

    let mut bonds = Vec::new();
    let mut adj = vec![Vec::new(); atoms.len()];
    for (li, &atom) in atoms.iter().enumerate() {
        for edge in mol.bonds_of(atom) {
            let other = mol.other_atom(edge, atom);
            let lj = local[other.index()];
            if lj == usize::MAX || lj <= li {
                continue;
            }
            let bond_idx = bonds.len();
            bonds.push((li, lj));
            adj[li].push((lj, bond_idx));
            adj[lj].push((li, bond_idx));
        }
    }

    SystemGraph { atoms, bonds, adj }
}

/// Runs the fast-path candidates through the SSSR acceptance rule.
fn verify_sssr(sys: &SystemGraph, candidates: &[Vec<usize>], nsssr: usize) -> Vec<Vec<usize>> {
    let n = sys.atoms.len();
    let valences: Vec<usize> = (0..n).map(|a| sys.adj[a].len()).collect();
    let mut ring_count = vec![0usize; n];
    let mut accepted: Vec<Vec<usize>> = Vec::new();

    for cand in candidates {
        if !sssr::candidate_in_set(cand, &accepted, &valences, &mut ring_count) {
            accepted.push(cand.clone());
            if accepted.len() == nsssr {
                break;
            }
        }
    }
    accepted
}
