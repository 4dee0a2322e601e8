//! Chain discovery and angular placement primitives.

use std::f64::consts::PI;

use petgraph::graph::NodeIndex;
use ultraviolet::DVec2;

use super::AtomFlags;
use crate::mol::Mol;

const NO_EDGE: usize = 999_999;

/// Direction of `(x_diff, y_diff)` as an angle in `[0, 2π)`.
pub(crate) fn direction_angle(x_diff: f64, y_diff: f64) -> f64 {
    if x_diff >= 0.0 && y_diff >= 0.0 {
        (y_diff / x_diff).atan()
    } else if x_diff < 0.0 {
        PI + (y_diff / x_diff).atan()
    } else {
        2.0 * PI + (y_diff / x_diff).atan()
    }
}

/// Angle between two vectors, in `[0, π]`.
pub(crate) fn angle_between(a: DVec2, b: DVec2) -> f64 {
    let denom = a.mag() * b.mag();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Unit vector along `v`, substituting a fixed diagonal when `v` is too short
/// to normalize.
pub(crate) fn normalized_or_fallback(v: DVec2) -> DVec2 {
    let mag = v.mag();
    if mag > 1e-12 {
        v / mag
    } else {
        DVec2::new(0.01, 0.01).normalized()
    }
}

pub(crate) fn connection_matrix(mol: &Mol) -> Vec<Vec<bool>> {
    let n = mol.atom_count();
    let mut matrix = vec![vec![false; n]; n];
    for edge in mol.bonds() {
        if let Some((a, b)) = mol.bond_endpoints(edge) {
            matrix[a.index()][b.index()] = true;
            matrix[b.index()][a.index()] = true;
        }
    }
    matrix
}

/// All-pairs shortest path lengths over a 0/1 connection matrix.
pub(crate) fn floyd_apsp(matrix: &[Vec<bool>]) -> Vec<Vec<usize>> {
    let n = matrix.len();
    let mut dist = vec![vec![NO_EDGE; n]; n];
    for (i, row) in matrix.iter().enumerate() {
        for (j, &connected) in row.iter().enumerate() {
            if connected {
                dist[i][j] = 1;
            }
        }
        dist[i][i] = 0;
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                let through = dist[i][k] + dist[k][j];
                if through < dist[i][j] {
                    dist[i][j] = through;
                }
            }
        }
    }
    dist
}

/// Seeds the first chain of an acyclic molecule: the longest path between two
/// terminal atoms.
pub(crate) fn initial_longest_chain(mol: &Mol, flags: &mut AtomFlags) -> Vec<NodeIndex> {
    let apsp = floyd_apsp(&connection_matrix(mol));
    let n = apsp.len();

    let mut max_path = 0;
    let mut best_start = None;
    for f in 0..n {
        if mol.degree(NodeIndex::new(f)) != 1 {
            continue;
        }
        for g in 0..n {
            if apsp[f][g] < NO_EDGE && apsp[f][g] > max_path {
                max_path = apsp[f][g];
                best_start = Some(f);
            }
        }
    }

    let start = best_start
        .map(NodeIndex::new)
        .or_else(|| mol.atoms().next())
        .expect("molecule has atoms");
    longest_unplaced_chain(mol, flags, start)
}

/// Longest not-yet-placed chain from `start`, by breadth-first sphere
/// expansion. A ring atom terminates its branch but is still appended, so the
/// bond into the ring system can be laid out later. Ties on length go to the
/// chain with the larger total atom degree.
pub(crate) fn longest_unplaced_chain(
    mol: &Mol,
    flags: &mut AtomFlags,
    start: NodeIndex,
) -> Vec<NodeIndex> {
    let n = mol.atom_count();
    for v in flags.visited.iter_mut() {
        *v = false;
    }
    let mut paths: Vec<Vec<NodeIndex>> = vec![vec![start]; n];
    flags.visited[start.index()] = true;

    let mut sphere = vec![start];
    while !sphere.is_empty() {
        let mut next_sphere = Vec::new();
        for &atom in &sphere {
            if flags.in_ring[atom.index()] {
                continue;
            }
            for edge in mol.bonds_of(atom) {
                let next = mol.other_atom(edge, atom);
                if flags.visited[next.index()] || flags.placed[next.index()] {
                    continue;
                }
                let mut path = paths[atom.index()].clone();
                path.push(next);
                paths[next.index()] = path;
                if mol.degree(next) > 1 {
                    next_sphere.push(next);
                }
            }
        }
        for &atom in &next_sphere {
            flags.visited[atom.index()] = true;
        }
        sphere = next_sphere;
    }

    let mut longest = 0;
    let mut longest_len = 0;
    let mut max_degree_sum = 0;
    for (idx, path) in paths.iter().enumerate() {
        if path.len() >= longest_len {
            let ds = degree_sum(mol, path);
            if ds > max_degree_sum {
                max_degree_sum = ds;
                longest = idx;
                longest_len = path.len();
            }
        }
    }
    paths[longest].clone()
}

fn degree_sum(mol: &Mol, atoms: &[NodeIndex]) -> usize {
    atoms.iter().map(|&a| mol.degree(a)).sum()
}

/// Places `chain[1..]` one bond at a time from the already-placed `chain[0]`,
/// zig-zagging so each new atom sits on whichever side is farther from the
/// center of the atoms placed so far.
pub(crate) fn place_linear_chain(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    chain: &[NodeIndex],
    initial_bond_vector: DVec2,
    bond_length: f64,
) {
    if chain.len() < 2 {
        return;
    }
    let mut bond_vector = initial_bond_vector;
    for f in 0..chain.len() - 1 {
        let atom = chain[f];
        let next = chain[f + 1];
        let step = normalized_or_fallback(bond_vector) * bond_length;
        let pos = mol.atom(atom).coord + step;
        mol.atom_mut(next).coord = pos;
        flags.placed[next.index()] = true;
        flags.aliphatic[next.index()] = true;
        let trans = !chain_fully_coordinated(mol, chain);
        bond_vector = next_bond_vector(
            mol,
            next,
            atom,
            placed_center_of(mol, flags, chain),
            trans,
        );
    }
}

// every chain atom already carries a coordinate away from the origin
fn chain_fully_coordinated(mol: &Mol, chain: &[NodeIndex]) -> bool {
    chain.iter().all(|&a| {
        let c = mol.atom(a).coord;
        c.x != 0.0 || c.y != 0.0
    })
}

/// The next bond direction out of `atom`: turn by 120° (trans) or 60° (cis)
/// from the incoming bond, picking whichever of the two symmetric candidates
/// lies farther from `distance_measure`.
pub(crate) fn next_bond_vector(
    mol: &Mol,
    atom: NodeIndex,
    previous: NodeIndex,
    distance_measure: DVec2,
    trans: bool,
) -> DVec2 {
    let pos = mol.atom(atom).coord;
    let prev = mol.atom(previous).coord;
    let mut angle = direction_angle(prev.x - pos.x, prev.y - pos.y);
    let add_angle = if trans { PI * 2.0 / 3.0 } else { PI / 3.0 };

    angle += add_angle;
    let v1 = DVec2::new(angle.cos(), angle.sin());
    let d1 = (pos + v1 - distance_measure).mag();

    angle += add_angle;
    let v2 = DVec2::new(angle.cos(), angle.sin());
    let d2 = (pos + v2 - distance_measure).mag();

    if d2 > d1 {
        v2
    } else {
        v1
    }
}

/// Places `atoms` at successive angles around `center`. Terminal hydrogens sit
/// at 60 % of the radius to reflect their shorter bonds.
pub(crate) fn populate_polygon_corners(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    atoms: &[NodeIndex],
    center: DVec2,
    start_angle: f64,
    add_angle: f64,
    radius: f64,
) {
    let mut angle = start_angle;
    let mut points = Vec::with_capacity(atoms.len());
    for &atom in atoms {
        angle += add_angle;
        if angle >= 2.0 * PI {
            angle -= 2.0 * PI;
        }
        let r = if mol.atom(atom).is_hydrogen() && mol.degree(atom) <= 1 {
            radius * 0.6
        } else {
            radius
        };
        points.push(center + DVec2::new(angle.cos() * r, angle.sin() * r));
    }
    for (&atom, &point) in atoms.iter().zip(points.iter()) {
        mol.atom_mut(atom).coord = point;
        flags.placed[atom.index()] = true;
    }
}

/// Spreads the unplaced neighbors of `atom` through the angle left free by its
/// already-placed neighbors.
pub(crate) fn distribute_partners(
    mol: &mut Mol,
    flags: &mut AtomFlags,
    atom: NodeIndex,
    placed_partners: &[NodeIndex],
    shared_center: DVec2,
    unplaced_partners: &[NodeIndex],
    bond_length: f64,
) {
    if unplaced_partners.is_empty() {
        return;
    }
    let atom_pos = mol.atom(atom).coord;

    if placed_partners.len() == 1 {
        let add_angle = 2.0 * PI / (unplaced_partners.len() + 1) as f64;
        let placed_pos = mol.atom(placed_partners[0]).coord;
        let start_angle =
            direction_angle(placed_pos.x - atom_pos.x, placed_pos.y - atom_pos.y);
        populate_polygon_corners(
            mol,
            flags,
            unplaced_partners,
            atom_pos,
            start_angle,
            add_angle,
            bond_length,
        );
        return;
    }
    if placed_partners.is_empty() {
        let add_angle = 2.0 * PI / unplaced_partners.len() as f64;
        populate_polygon_corners(
            mol,
            flags,
            unplaced_partners,
            atom_pos,
            0.0,
            add_angle,
            bond_length,
        );
        return;
    }

    // the wedge already taken, measured from the direction of the placement
    // center; new partners go on the far side
    let occupied_direction = shared_center - atom_pos;
    let away = -(normalized_or_fallback(occupied_direction) * bond_length);
    let distance_measure = atom_pos + away;

    let mut sorted = placed_partners.to_vec();
    sorted.sort_by(|&a, &b| {
        let da = (mol.atom(a).coord - distance_measure).mag();
        let db = (mol.atom(b).coord - distance_measure).mag();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });

    let closest1 = mol.atom(sorted[0]).coord - atom_pos;
    let closest2 = mol.atom(sorted[1]).coord - atom_pos;
    let occupied_angle =
        angle_between(closest1, occupied_direction) + angle_between(closest2, occupied_direction);

    let p0 = mol.atom(sorted[0]).coord;
    let angle1 = direction_angle(p0.x - atom_pos.x, p0.y - atom_pos.y);
    let angle3 = direction_angle(
        distance_measure.x - atom_pos.x,
        distance_measure.y - atom_pos.y,
    );

    let start_atom = if angle1 > angle3 {
        if angle1 - angle3 < PI {
            sorted[1]
        } else {
            sorted[0]
        }
    } else if angle3 - angle1 < PI {
        sorted[0]
    } else {
        sorted[1]
    };

    let remaining_angle = 2.0 * PI - occupied_angle;
    let add_angle = remaining_angle / (unplaced_partners.len() + 1) as f64;
    let start_pos = mol.atom(start_atom).coord;
    let start_angle = direction_angle(start_pos.x - atom_pos.x, start_pos.y - atom_pos.y);

    populate_polygon_corners(
        mol,
        flags,
        unplaced_partners,
        atom_pos,
        start_angle,
        add_angle,
        bond_length,
    );
}

/// Splits the bonded neighbors of `atom` into already-placed and unplaced.
pub(crate) fn partition_partners(
    mol: &Mol,
    flags: &AtomFlags,
    atom: NodeIndex,
) -> (Vec<NodeIndex>, Vec<NodeIndex>) {
    let mut placed = Vec::new();
    let mut unplaced = Vec::new();
    for edge in mol.bonds_of(atom) {
        let other = mol.other_atom(edge, atom);
        if flags.placed[other.index()] {
            placed.push(other);
        } else {
            unplaced.push(other);
        }
    }
    (placed, unplaced)
}

/// Center of the placed atoms of the whole molecule.
pub(crate) fn center_of_placed(mol: &Mol, flags: &AtomFlags) -> DVec2 {
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    placed_center_of(mol, flags, &atoms)
}

/// Center of the placed atoms among `atoms`.
pub(crate) fn placed_center_of(mol: &Mol, flags: &AtomFlags, atoms: &[NodeIndex]) -> DVec2 {
    let mut sum = DVec2::zero();
    let mut count = 0;
    for &a in atoms {
        if flags.placed[a.index()] {
            sum += mol.atom(a).coord;
            count += 1;
        }
    }
    if count == 0 {
        return DVec2::zero();
    }
    sum / count as f64
}

/// Center of `atoms` regardless of placement state.
pub(crate) fn center_of(mol: &Mol, atoms: &[NodeIndex]) -> DVec2 {
    if atoms.is_empty() {
        return DVec2::zero();
    }
    let mut sum = DVec2::zero();
    for &a in atoms {
        sum += mol.atom(a).coord;
    }
    sum / atoms.len() as f64
}

pub(crate) fn mark_placed(flags: &mut AtomFlags, atoms: &[NodeIndex]) {
    for &a in atoms {
        flags.placed[a.index()] = true;
    }
}

pub(crate) fn mark_not_placed(flags: &mut AtomFlags, atoms: &[NodeIndex]) {
    for &a in atoms {
        flags.placed[a.index()] = false;
    }
}

pub(crate) fn all_placed(flags: &AtomFlags) -> bool {
    flags.placed.iter().all(|&p| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn direction_angle_quadrants() {
        assert!((direction_angle(1.0, 0.0) - 0.0).abs() < 1e-12);
        assert!((direction_angle(0.0, 1.0) - PI / 2.0).abs() < 1e-12);
        assert!((direction_angle(-1.0, 0.0) - PI).abs() < 1e-12);
        assert!((direction_angle(0.0, -1.0) - 3.0 * PI / 2.0).abs() < 1e-12);
        assert!((direction_angle(1.0, 1.0) - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn angle_between_orthogonal() {
        let a = DVec2::new(1.0, 0.0);
        let b = DVec2::new(0.0, 5.0);
        assert!((angle_between(a, b) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn fallback_normalization_is_finite() {
        let v = normalized_or_fallback(DVec2::zero());
        assert!(v.x.is_finite() && v.y.is_finite());
        assert!((v.mag() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn floyd_on_linear_chain() {
        let mol = from_smiles("CCCC").unwrap();
        let dist = floyd_apsp(&connection_matrix(&mol));
        assert_eq!(dist[0][3], 3);
        assert_eq!(dist[0][1], 1);
        assert_eq!(dist[2][2], 0);
    }

    #[test]
    fn longest_chain_spans_propane() {
        let mol = from_smiles("CCC").unwrap();
        let mut flags = AtomFlags::new(mol.atom_count());
        let chain = initial_longest_chain(&mol, &mut flags);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn longest_chain_picks_backbone_of_branched_alkane() {
        // 2-methylpentane: backbone is five atoms long
        let mol = from_smiles("CC(C)CCC").unwrap();
        let mut flags = AtomFlags::new(mol.atom_count());
        let chain = initial_longest_chain(&mol, &mut flags);
        assert_eq!(chain.len(), 5);
    }

    #[test]
    fn chain_stops_at_ring_atom_but_includes_it() {
        let mol = from_smiles("CCCc1ccccc1").unwrap();
        let mut flags = AtomFlags::new(mol.atom_count());
        for i in 3..9 {
            flags.in_ring[i] = true;
        }
        let chain = longest_unplaced_chain(&mol, &mut flags, n(0));
        // three chain carbons plus the first ring atom
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[3], n(3));
    }

    #[test]
    fn linear_chain_keeps_bond_lengths() {
        let mut mol = from_smiles("CCCCC").unwrap();
        let mut flags = AtomFlags::new(mol.atom_count());
        let chain: Vec<NodeIndex> = (0..5).map(n).collect();
        flags.placed[0] = true;
        place_linear_chain(&mut mol, &mut flags, &chain, DVec2::new(0.0, 1.0), 1.5);
        for i in 0..4 {
            let d = (mol.atom(n(i)).coord - mol.atom(n(i + 1)).coord).mag();
            assert!((d - 1.5).abs() < 1e-9, "bond {} has length {}", i, d);
        }
        assert!(all_placed(&flags));
    }

    #[test]
    fn linear_chain_is_deterministic() {
        let coords = |_: ()| {
            let mut mol = from_smiles("CCCCCC").unwrap();
            let mut flags = AtomFlags::new(mol.atom_count());
            let chain: Vec<NodeIndex> = (0..6).map(n).collect();
            flags.placed[0] = true;
            place_linear_chain(&mut mol, &mut flags, &chain, DVec2::new(0.0, 1.0), 1.5);
            (0..6).map(|i| mol.atom(n(i)).coord).collect::<Vec<_>>()
        };
        assert_eq!(coords(()), coords(()));
    }

    #[test]
    fn polygon_corners_form_regular_hexagon() {
        let mut mol = from_smiles("C1CCCCC1").unwrap();
        let mut flags = AtomFlags::new(mol.atom_count());
        let atoms: Vec<NodeIndex> = (0..6).map(n).collect();
        let center = DVec2::new(2.0, -1.0);
        populate_polygon_corners(&mut mol, &mut flags, &atoms, center, 0.0, PI / 3.0, 1.5);
        for &a in &atoms {
            let r = (mol.atom(a).coord - center).mag();
            assert!((r - 1.5).abs() < 1e-9);
            assert!(flags.placed[a.index()]);
        }
    }

    #[test]
    fn hydrogen_radius_is_shortened() {
        let mut mol = crate::mol::Mol::new();
        use crate::atom::Atom;
        let h = mol.add_atom(Atom::new("H"));
        let c = mol.add_atom(Atom::new("C"));
        let mut flags = AtomFlags::new(2);
        populate_polygon_corners(
            &mut mol,
            &mut flags,
            &[h, c],
            DVec2::zero(),
            0.0,
            PI,
            1.0,
        );
        assert!(((mol.atom(h).coord).mag() - 0.6).abs() < 1e-9);
        assert!(((mol.atom(c).coord).mag() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn distribute_with_no_placed_neighbors_spreads_full_circle() {
        let mut mol = from_smiles("C(C)(C)(C)C").unwrap();
        let mut flags = AtomFlags::new(mol.atom_count());
        flags.placed[0] = true;
        let unplaced: Vec<NodeIndex> = (1..5).map(n).collect();
        distribute_partners(
            &mut mol,
            &mut flags,
            n(0),
            &[],
            DVec2::zero(),
            &unplaced,
            1.5,
        );
        for &a in &unplaced {
            let d = (mol.atom(a).coord - mol.atom(n(0)).coord).mag();
            assert!((d - 1.5).abs() < 1e-9);
        }
    }

    #[test]
    fn partition_partners_splits_by_flag() {
        let mol = from_smiles("CC(C)C").unwrap();
        let mut flags = AtomFlags::new(mol.atom_count());
        flags.placed[0] = true;
        let (placed, unplaced) = partition_partners(&mol, &flags, n(1));
        assert_eq!(placed, vec![n(0)]);
        assert_eq!(unplaced.len(), 2);
    }
}
