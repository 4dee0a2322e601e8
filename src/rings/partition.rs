//! Grouping of SSSR rings into connected ring systems.

use super::Ring;

/// Partitions rings into maximal sets that transitively share at least one
/// atom. Returns index lists into `rings`; every ring lands in exactly one
/// partition.
pub fn partition_rings(rings: &[Ring]) -> Vec<Vec<usize>> {
    let mut done = vec![false; rings.len()];
    let mut partitions = Vec::new();

    for i in 0..rings.len() {
        if done[i] {
            continue;
        }
        let mut partition = vec![i];
        done[i] = true;
        // keep pulling in rings connected to anything already in the partition
        let mut grew = true;
        while grew {
            grew = false;
            for k in 0..rings.len() {
                if done[k] {
                    continue;
                }
                if partition.iter().any(|&p| rings[p].shares_atom(&rings[k])) {
                    partition.push(k);
                    done[k] = true;
                    grew = true;
                }
            }
        }
        partitions.push(partition);
    }
    partitions
}

/// Rings from `candidates` sharing at least one atom with `ring` directly.
/// Does not include `ring` itself.
pub fn direct_connected_rings(rings: &[Ring], ring: usize, candidates: &[usize]) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&k| k != ring && rings[ring].shares_atom(&rings[k]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    #[test]
    fn single_ring_single_partition() {
        let mut mol = from_smiles("C1CCCCC1").unwrap();
        let rings = mol.rings().to_vec();
        let parts = partition_rings(&rings);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], vec![0]);
    }

    #[test]
    fn fused_rings_share_partition() {
        let mut mol = from_smiles("c1ccc2ccccc2c1").unwrap();
        let rings = mol.rings().to_vec();
        assert_eq!(rings.len(), 2);
        let parts = partition_rings(&rings);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].len(), 2);
    }

    #[test]
    fn biphenyl_rings_are_separate_systems() {
        let mut mol = from_smiles("c1ccccc1c1ccccc1").unwrap();
        let rings = mol.rings().to_vec();
        assert_eq!(rings.len(), 2);
        let parts = partition_rings(&rings);
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn spiro_rings_share_partition() {
        let mut mol = from_smiles("C1CCC2(CC1)CCC2").unwrap();
        let rings = mol.rings().to_vec();
        assert_eq!(rings.len(), 2);
        let parts = partition_rings(&rings);
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn every_ring_in_exactly_one_partition() {
        let mut mol = from_smiles("c1ccc2cc3ccccc3cc2c1").unwrap();
        let rings = mol.rings().to_vec();
        let parts = partition_rings(&rings);
        let mut seen = vec![0usize; rings.len()];
        for part in &parts {
            for &r in part {
                seen[r] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn direct_connections_exclude_self() {
        let mut mol = from_smiles("c1ccc2ccccc2c1").unwrap();
        let rings = mol.rings().to_vec();
        let all: Vec<usize> = (0..rings.len()).collect();
        let connected = direct_connected_rings(&rings, 0, &all);
        assert_eq!(connected, vec![1]);
    }
}
