//! 2D structure diagrams for small molecules.
//!
//! Parse a SMILES string into a molecular graph, generate depiction
//! coordinates from connectivity alone, and render the result:
//!
//! ```
//! let mut mol = mol2d::from_smiles("c1ccccc1O").unwrap();
//! mol2d::generate_coordinates(&mut mol).unwrap();
//! let svg = mol2d::depict::svg::write_svg(&mol);
//! assert!(svg.starts_with("<svg"));
//! ```

pub mod atom;
pub mod bond;
pub mod depict;
pub mod element;
pub mod layout;
pub mod mol;
pub mod rings;
pub mod smiles;

pub use atom::Atom;
pub use bond::{Bond, BondOrder, BondStereo};
pub use layout::{
    generate_coordinates, generate_coordinates_with, resolve_overlaps, LayoutConfig, LayoutError,
};
pub use mol::{BoundingBox, Mol, MolError, DEFAULT_BOND_LENGTH};
pub use rings::{find_rings, partition_rings, Ring};
pub use smiles::{from_smiles, SmilesError};
