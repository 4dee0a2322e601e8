//! ChemDoodle-interchange-shaped JSON writer.

use serde::Serialize;

use crate::bond::BondStereo;
use crate::mol::Mol;

#[derive(Serialize)]
struct JsonAtom {
    l: String,
    x: f64,
    y: f64,
    c: i8,
}

#[derive(Serialize)]
struct JsonBond {
    b: usize,
    e: usize,
    o: u8,
    s: &'static str,
}

#[derive(Serialize)]
struct JsonMol {
    a: Vec<JsonAtom>,
    b: Vec<JsonBond>,
}

#[derive(Serialize)]
struct JsonDoc {
    m: Vec<JsonMol>,
    s: Vec<serde_json::Value>,
}

/// Serializes `mol` to a single-molecule document: atoms as `{l, x, y, c}`,
/// bonds as `{b, e, o, s}` with endpoint indices into the atom list.
pub fn write_json(mol: &Mol) -> String {
    let atoms = mol
        .atoms()
        .map(|idx| {
            let atom = mol.atom(idx);
            JsonAtom {
                l: atom.symbol.clone(),
                x: atom.coord.x,
                y: atom.coord.y,
                c: atom.charge,
            }
        })
        .collect();

    let bonds = mol
        .bonds()
        .filter_map(|edge| {
            let (a, b) = mol.bond_endpoints(edge)?;
            let bond = mol.bond(edge);
            Some(JsonBond {
                b: a.index(),
                e: b.index(),
                o: bond.order.value(),
                s: match bond.stereo {
                    BondStereo::None => "none",
                    BondStereo::Up => "protruding",
                    BondStereo::Down => "recessed",
                },
            })
        })
        .collect();

    let doc = JsonDoc {
        m: vec![JsonMol { a: atoms, b: bonds }],
        s: Vec::new(),
    };
    serde_json::to_string(&doc).expect("plain structs serialize without error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::generate_coordinates;
    use crate::smiles::from_smiles;
    use serde_json::Value;

    #[test]
    fn document_shape() {
        let mut mol = from_smiles("C=CO").unwrap();
        generate_coordinates(&mut mol).unwrap();
        let doc: Value = serde_json::from_str(&write_json(&mol)).unwrap();

        let atoms = doc["m"][0]["a"].as_array().unwrap();
        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[2]["l"], "O");
        assert!(atoms[0]["x"].is_number());

        let bonds = doc["m"][0]["b"].as_array().unwrap();
        assert_eq!(bonds.len(), 2);
        assert_eq!(bonds[0]["o"], 2);
        assert_eq!(bonds[0]["s"], "none");
    }

    #[test]
    fn charges_survive() {
        let mol = from_smiles("[NH4+]").unwrap();
        let doc: Value = serde_json::from_str(&write_json(&mol)).unwrap();
        assert_eq!(doc["m"][0]["a"][0]["c"], 1);
    }

    #[test]
    fn wedge_tags_map_to_names() {
        let mol = from_smiles("[C@@](F)(Cl)(Br)I").unwrap();
        let doc: Value = serde_json::from_str(&write_json(&mol)).unwrap();
        let bonds = doc["m"][0]["b"].as_array().unwrap();
        assert!(bonds
            .iter()
            .any(|b| b["s"] == "protruding" || b["s"] == "recessed"));
    }
}
