//! Bounded-size exhaustive ring search on a path graph.
//!
//! Th. Hanser, Ph. Jauffret, G. Kaufmann, "A New Algorithm for Exhaustive Ring
//! Perception in a Molecular Graph", J. Chem. Inf. Comput. Sci. 1996, 36,
//! 1146-1152. Atoms are collapsed one by one; the paths running through a
//! collapsed atom are spliced pairwise, and any path that closes on itself is
//! emitted as a ring.

use super::SystemGraph;

/// A simple path through the shrinking graph, stored as local atom ids. A path
/// whose two ends coincide is a cycle.
#[derive(Debug, Clone)]
pub(crate) struct PathEdge {
    pub atoms: Vec<usize>,
}

impl PathEdge {
    fn is_cycle(&self) -> bool {
        self.atoms.len() > 2 && self.atoms.first() == self.atoms.last()
    }

    fn touches(&self, atom: usize) -> bool {
        if self.is_cycle() {
            self.atoms.contains(&atom)
        } else {
            self.atoms[0] == atom || *self.atoms.last().unwrap() == atom
        }
    }

    /// The endpoint this path shares with `other`, if any.
    fn intersection(&self, other: &PathEdge) -> Option<usize> {
        let first = self.atoms[0];
        let last = *self.atoms.last().unwrap();
        let other_first = other.atoms[0];
        let other_last = *other.atoms.last().unwrap();
        if last == other_first || last == other_last {
            Some(last)
        } else if first == other_first || first == other_last {
            Some(first)
        } else {
            None
        }
    }

    /// Concatenates two paths through their shared endpoint, reversing as
    /// needed so the shared atom sits at the seam. Returns `None` when the
    /// result revisits an interior atom (it would not be a simple path).
    fn splice(&self, other: &PathEdge) -> Option<PathEdge> {
        let shared = self.intersection(other)?;
        let mut atoms = self.atoms.clone();
        if atoms[0] == shared {
            atoms.reverse();
        }
        if other.atoms[0] == shared {
            atoms.extend(other.atoms[1..].iter().copied());
        } else {
            atoms.extend(other.atoms[..other.atoms.len() - 1].iter().rev().copied());
        }
        if !interior_is_unique(&atoms) {
            return None;
        }
        Some(PathEdge { atoms })
    }
}

// Endpoints may coincide (that is a cycle); everything between them must not.
fn interior_is_unique(atoms: &[usize]) -> bool {
    for i in 1..atoms.len() - 1 {
        for j in i + 1..atoms.len() - 1 {
            if atoms[i] == atoms[j] {
                return false;
            }
        }
    }
    true
}

/// All rings of size `3..=max_len`, as ordered local atom cycles.
///
/// Exhaustive up to `max_len`, but a ring system can hold SSSR rings larger
/// than that; the caller is responsible for falling back to the exact search
/// when the count comes up short.
pub(crate) fn rings(sys: &SystemGraph, max_len: usize) -> Vec<Vec<usize>> {
    let mut edges: Vec<PathEdge> = sys
        .bonds
        .iter()
        .map(|&(a, b)| PathEdge { atoms: vec![a, b] })
        .collect();
    let mut found: Vec<Vec<usize>> = Vec::new();

    for atom in 0..sys.atoms.len() {
        let (incident, kept): (Vec<_>, Vec<_>) =
            edges.into_iter().partition(|e| e.touches(atom));
        edges = kept;

        let (cycles, open): (Vec<_>, Vec<_>) =
            incident.into_iter().partition(|e| e.is_cycle());
        for cycle in cycles {
            let mut ring = cycle.atoms;
            ring.pop(); // closing atom repeats the first
            found.push(ring);
        }

        for i in 0..open.len() {
            for j in i + 1..open.len() {
                if let Some(spliced) = open[j].splice(&open[i]) {
                    if spliced.atoms.len() <= max_len + 1 {
                        edges.push(spliced);
                    }
                }
            }
        }
    }

    found.sort_by_key(|r| r.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_with_tail() -> SystemGraph {
        // 0-1-2-0 plus pendant 3 on atom 0 (pendants normally pruned upstream,
        // but the path graph must cope)
        SystemGraph::from_local_bonds(4, &[(0, 1), (1, 2), (2, 0), (0, 3)])
    }

    #[test]
    fn finds_triangle() {
        let sys = triangle_with_tail();
        let rings = rings(&sys, 6);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 3);
    }

    #[test]
    fn hexagon() {
        let sys = SystemGraph::from_local_bonds(
            6,
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)],
        );
        let rings = rings(&sys, 6);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 6);
    }

    #[test]
    fn hexagon_beyond_max_len_is_missed() {
        let sys = SystemGraph::from_local_bonds(
            6,
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)],
        );
        assert!(rings(&sys, 4).is_empty());
    }

    #[test]
    fn fused_pair_yields_three_cycles() {
        // two triangles sharing edge 0-1: rings 012, 013, and the 4-cycle 2013
        let sys =
            SystemGraph::from_local_bonds(4, &[(0, 1), (1, 2), (2, 0), (1, 3), (3, 0)]);
        let found = rings(&sys, 6);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].len(), 3);
        assert_eq!(found[1].len(), 3);
        assert_eq!(found[2].len(), 4);
    }

    #[test]
    fn splice_rejects_revisiting_path() {
        let a = PathEdge {
            atoms: vec![1, 2, 3],
        };
        let b = PathEdge {
            atoms: vec![3, 2, 4],
        };
        // joining through 3 would put atom 2 in the interior twice
        assert!(a.splice(&b).is_none());
    }
}
