use std::f64::consts::PI;

use mol2d::{
    from_smiles, generate_coordinates, generate_coordinates_with, partition_rings,
    resolve_overlaps, LayoutConfig, LayoutError, Mol,
};
use ultraviolet::DVec2;

fn laid_out(smiles: &str) -> Mol {
    let mut mol = from_smiles(smiles).unwrap();
    generate_coordinates(&mut mol).unwrap();
    mol
}

fn coords(mol: &Mol) -> Vec<DVec2> {
    mol.atoms().map(|a| mol.atom(a).coord).collect()
}

fn assert_all_finite(mol: &Mol) {
    for a in mol.atoms() {
        let c = mol.atom(a).coord;
        assert!(c.x.is_finite() && c.y.is_finite(), "atom {:?} at {:?}", a, c);
    }
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

#[test]
fn single_atom_lands_at_origin() {
    let mol = laid_out("C");
    assert_eq!(coords(&mol), vec![DVec2::zero()]);
}

#[test]
fn disconnected_input_is_a_fatal_error() {
    let mut mol = from_smiles("[Na+].[Cl-]").unwrap();
    assert_eq!(
        generate_coordinates(&mut mol),
        Err(LayoutError::NotConnected { fragments: 2 })
    );
}

// ---------------------------------------------------------------------------
// Ring perception
// ---------------------------------------------------------------------------

#[test]
fn ring_count_matches_cyclomatic_number() {
    for smiles in [
        "C1CCCCC1",
        "c1ccccc1",
        "c1ccc2ccccc2c1",
        "C1CC2CC1CC2",
        "C1CCC2(CC1)CCC2",
        "C12C3C4C1C5C3C4C25",
        "CC1CCCCC1CC",
    ] {
        let mut mol = from_smiles(smiles).unwrap();
        let expected = mol.bond_count() + mol.fragment_count() - mol.atom_count();
        assert_eq!(mol.rings().len(), expected, "ring count for {}", smiles);
    }
}

#[test]
fn ring_queries_are_idempotent() {
    let mut mol = from_smiles("c1ccc2ccccc2c1").unwrap();
    let first = mol.rings().to_vec();
    let second = mol.rings().to_vec();
    assert_eq!(first, second);
}

#[test]
fn ring_bond_lists_close_the_cycle() {
    let mut mol = from_smiles("C1CC2CC1CC2").unwrap();
    for ring in mol.rings().to_vec() {
        assert_eq!(ring.atoms.len(), ring.bonds.len());
        for i in 0..ring.len() {
            let a = ring.atoms[i];
            let b = ring.atoms[(i + 1) % ring.len()];
            assert_eq!(mol.bond_between(a, b), Some(ring.bonds[i]));
        }
    }
}

// ---------------------------------------------------------------------------
// Chains
// ---------------------------------------------------------------------------

#[test]
fn propane_chain_is_found_and_spaced() {
    let mol = laid_out("CCC");
    let bl = LayoutConfig::default().bond_length;
    let c = coords(&mol);
    assert!(((c[0] - c[1]).mag() - bl).abs() < 1e-9);
    assert!(((c[1] - c[2]).mag() - bl).abs() < 1e-9);
}

#[test]
fn chain_layout_is_deterministic() {
    let a = coords(&laid_out("CCCCCCCCCC"));
    let b = coords(&laid_out("CCCCCCCCCC"));
    assert_eq!(a, b);
}

#[test]
fn long_chain_zig_zags_rather_than_folding() {
    let mol = laid_out("CCCCCCCC");
    let bl = LayoutConfig::default().bond_length;
    let bb = mol.bounding_box().unwrap();
    // a 7-bond zig-zag spans most of 7 * bl * sin(60°) in one direction
    assert!(bb.width().max(bb.height()) > 4.0 * bl);
}

// ---------------------------------------------------------------------------
// Rings on canvas
// ---------------------------------------------------------------------------

#[test]
fn benzene_is_a_regular_hexagon() {
    let mut mol = laid_out("C1=CC=CC=C1");
    let bl = LayoutConfig::default().bond_length;
    let expected_radius = bl / (2.0 * (PI / 6.0).sin());
    let rings = mol.rings().to_vec();
    assert_eq!(rings.len(), 1);
    let center = rings[0].center(&mol);
    for &a in &rings[0].atoms {
        let r = (mol.atom(a).coord - center).mag();
        assert!((r - expected_radius).abs() < 1e-6, "radius {}", r);
    }
    // all ring bonds at the configured length
    for &b in &rings[0].bonds {
        let (s, t) = mol.bond_endpoints(b).unwrap();
        let d = (mol.atom(s).coord - mol.atom(t).coord).mag();
        assert!((d - bl).abs() < 1e-6);
    }
}

#[test]
fn naphthalene_fused_pair_shares_one_partition() {
    let mut mol = laid_out("c1ccc2ccccc2c1");
    let rings = mol.rings().to_vec();
    assert_eq!(rings.len(), 2);
    let partitions = partition_rings(&rings);
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0].len(), 2);
}

#[test]
fn naphthalene_fusion_bond_keeps_its_length() {
    let mut mol = laid_out("c1ccc2ccccc2c1");
    let bl = LayoutConfig::default().bond_length;
    let rings = mol.rings().to_vec();
    let shared: Vec<_> = rings[0]
        .atoms
        .iter()
        .copied()
        .filter(|&a| rings[1].contains_atom(a))
        .collect();
    assert_eq!(shared.len(), 2);
    let d = (mol.atom(shared[0]).coord - mol.atom(shared[1]).coord).mag();
    assert!((d - bl).abs() < 1e-6);

    // both hexagons stay regular
    for ring in &rings {
        for &b in &ring.bonds {
            let (s, t) = mol.bond_endpoints(b).unwrap();
            let d = (mol.atom(s).coord - mol.atom(t).coord).mag();
            assert!((d - bl).abs() < 1e-6);
        }
    }
}

#[test]
fn naphthalene_rings_do_not_overlay() {
    let mut mol = laid_out("c1ccc2ccccc2c1");
    let rings = mol.rings().to_vec();
    let c0 = rings[0].center(&mol);
    let c1 = rings[1].center(&mol);
    assert!((c0 - c1).mag() > 1.0, "ring centers {:?} {:?}", c0, c1);
    // no two distinct atoms may coincide
    let cs = coords(&mol);
    for i in 0..cs.len() {
        for j in i + 1..cs.len() {
            assert!((cs[i] - cs[j]).mag() > 0.1, "atoms {} and {} coincide", i, j);
        }
    }
}

#[test]
fn substituted_ring_places_everything() {
    let mol = laid_out("Cc1ccccc1O");
    assert_all_finite(&mol);
    let cs = coords(&mol);
    for i in 0..cs.len() {
        for j in i + 1..cs.len() {
            assert!((cs[i] - cs[j]).mag() > 1e-3);
        }
    }
}

#[test]
fn spiro_and_bridged_systems_lay_out() {
    for smiles in ["C1CCC2(CC1)CCC2", "C1CC2CC1CC2", "C1CC2CCC1CC2"] {
        let mol = laid_out(smiles);
        assert_all_finite(&mol);
    }
}

#[test]
fn chain_connecting_two_ring_systems() {
    let mol = laid_out("c1ccccc1CCc1ccccc1");
    assert_all_finite(&mol);
    let bl = LayoutConfig::default().bond_length;
    for e in mol.bonds().collect::<Vec<_>>() {
        let (a, b) = mol.bond_endpoints(e).unwrap();
        let d = (mol.atom(a).coord - mol.atom(b).coord).mag();
        assert!(d > 0.2 * bl && d < 3.0 * bl, "bond length {}", d);
    }
}

#[test]
fn caffeine_full_pipeline() {
    let mol = laid_out("Cn1cnc2c1c(=O)n(C)c(=O)n2C");
    assert_all_finite(&mol);
    let bb = mol.bounding_box().unwrap();
    assert!(bb.width() > 0.0 && bb.height() > 0.0);
}

// ---------------------------------------------------------------------------
// Overlap resolution
// ---------------------------------------------------------------------------

#[test]
fn coincident_atoms_are_pushed_apart() {
    use mol2d::{Atom, Bond};
    for seed in 0..20 {
        let mut mol = Mol::new();
        let a = mol.add_atom(Atom::new("C"));
        let b = mol.add_atom(Atom::new("C"));
        let c = mol.add_atom(Atom::new("C"));
        mol.add_bond(a, b, Bond::single()).unwrap();
        mol.add_bond(b, c, Bond::single()).unwrap();
        mol.atom_mut(a).coord = DVec2::new(0.0, 0.0);
        mol.atom_mut(b).coord = DVec2::new(1.5, 0.0);
        // c sits exactly on a
        mol.atom_mut(c).coord = DVec2::new(0.0, 0.0);

        let score = resolve_overlaps(&mut mol, 1.5, seed);
        assert_eq!(score, 0.0, "seed {} failed to separate the pair", seed);
        let d = (mol.atom(a).coord - mol.atom(c).coord).mag();
        assert!(d >= 1.5 / 5.0, "distance {} still below cutoff", d);
    }
}

#[test]
fn layout_respects_injected_seed() {
    let with_seed = |seed| {
        let mut mol = from_smiles("c1ccccc1").unwrap();
        let config = LayoutConfig {
            seed,
            ..LayoutConfig::default()
        };
        generate_coordinates_with(&mut mol, &config).unwrap();
        coords(&mol)
    };
    // benzene has no overlaps, so the seed does not matter; identical runs
    // must be bit-identical either way
    assert_eq!(with_seed(1), with_seed(1));
    assert_eq!(with_seed(1), with_seed(2));
}

// ---------------------------------------------------------------------------
// Serialization after layout
// ---------------------------------------------------------------------------

#[test]
fn svg_and_json_read_final_coordinates() {
    let mol = laid_out("CC(=O)Oc1ccccc1C(=O)O");
    let svg = mol2d::depict::svg::write_svg(&mol);
    assert!(svg.starts_with("<svg") && svg.contains("<line"));

    let doc: serde_json::Value = serde_json::from_str(&mol2d::depict::json::write_json(&mol)).unwrap();
    assert_eq!(
        doc["m"][0]["a"].as_array().unwrap().len(),
        mol.atom_count()
    );
    assert_eq!(
        doc["m"][0]["b"].as_array().unwrap().len(),
        mol.bond_count()
    );
}
