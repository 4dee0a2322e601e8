use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use ultraviolet::DVec2;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::element;
use crate::rings::{self, Ring};

/// Bond length assumed when a molecule has no bonds to average over.
pub const DEFAULT_BOND_LENGTH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MolError {
    /// A bond endpoint does not name an atom of this molecule.
    UnknownAtom { index: usize },
    /// Both bond endpoints are the same atom.
    SelfBond { index: usize },
}

impl fmt::Display for MolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAtom { index } => write!(f, "no atom at index {}", index),
            Self::SelfBond { index } => {
                write!(f, "bond endpoints are both atom {}", index)
            }
        }
    }
}

impl std::error::Error for MolError {}

/// A molecular graph.
///
/// Atoms and bonds live in a petgraph arena; `NodeIndex`/`EdgeIndex` are the
/// only handles handed out, so rings and layout state can refer to atoms
/// without holding pointers into the molecule. Fragment membership is tracked
/// incrementally as bonds are added, and the SSSR is cached until the graph is
/// structurally mutated.
pub struct Mol {
    graph: UnGraph<Atom, Bond>,
    fragments: Vec<usize>,
    fragment_count: usize,
    sssr: Vec<Ring>,
    sssr_stale: bool,
}

impl Mol {
    pub fn new() -> Self {
        Mol {
            graph: UnGraph::default(),
            fragments: Vec::new(),
            fragment_count: 0,
            sssr: Vec::new(),
            sssr_stale: true,
        }
    }

    pub fn graph(&self) -> &UnGraph<Atom, Bond> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &Atom {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut Atom {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &Bond {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut Bond {
        &mut self.graph[idx]
    }

    /// Every new atom starts its own fragment.
    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        let idx = self.graph.add_node(atom);
        self.fragment_count += 1;
        self.fragments.push(self.fragment_count);
        self.sssr_stale = true;
        idx
    }

    /// Adds a bond between two existing atoms, merging their fragments if the
    /// bond connects two previously disconnected parts.
    pub fn add_bond(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        bond: Bond,
    ) -> Result<EdgeIndex, MolError> {
        let n = self.graph.node_count();
        for idx in [a, b] {
            if idx.index() >= n {
                return Err(MolError::UnknownAtom { index: idx.index() });
            }
        }
        if a == b {
            return Err(MolError::SelfBond { index: a.index() });
        }

        let frag_a = self.fragments[a.index()];
        let frag_b = self.fragments[b.index()];
        if frag_a != frag_b {
            // renumber the smaller fragment id into the larger one
            let (before, after) = if frag_a < frag_b {
                (frag_a, frag_b)
            } else {
                (frag_b, frag_a)
            };
            for frag in self.fragments.iter_mut() {
                if *frag == before {
                    *frag = after;
                }
            }
            self.fragment_count -= 1;
        }

        self.sssr_stale = true;
        Ok(self.graph.add_edge(a, b, bond))
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    /// Fragment id of an atom. Ids are arbitrary but equal within a fragment.
    pub fn fragment_of(&self, idx: NodeIndex) -> usize {
        self.fragments[idx.index()]
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// The atom on the far side of `bond` from `atom`.
    pub fn other_atom(&self, bond: EdgeIndex, atom: NodeIndex) -> NodeIndex {
        let (src, dst) = self
            .graph
            .edge_endpoints(bond)
            .expect("bond index belongs to this molecule");
        if src == atom {
            dst
        } else {
            src
        }
    }

    pub fn bond_touches(&self, bond: EdgeIndex, atom: NodeIndex) -> bool {
        self.graph
            .edge_endpoints(bond)
            .map(|(src, dst)| src == atom || dst == atom)
            .unwrap_or(false)
    }

    /// Arithmetic mean of the Euclidean bond lengths, or [`DEFAULT_BOND_LENGTH`]
    /// when there are no bonds yet.
    pub fn average_bond_length(&self) -> f64 {
        if self.graph.edge_count() == 0 {
            return DEFAULT_BOND_LENGTH;
        }
        let sum: f64 = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].coord - self.graph[b].coord).mag())
            .sum();
        sum / self.graph.edge_count() as f64
    }

    /// Axis-aligned box over all atom coordinates; `None` for an empty molecule.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut atoms = self.graph.node_indices();
        let first = self.graph[atoms.next()?].coord;
        let mut bb = BoundingBox {
            min: first,
            max: first,
        };
        for idx in atoms {
            let c = self.graph[idx].coord;
            bb.min.x = bb.min.x.min(c.x);
            bb.min.y = bb.min.y.min(c.y);
            bb.max.x = bb.max.x.max(c.x);
            bb.max.y = bb.max.y.max(c.y);
        }
        Some(bb)
    }

    /// Hydrogens implied by the atom's covalence and its explicit bonds.
    ///
    /// Aromatic atoms count one bond higher than their explicit order sum, so a
    /// benzene carbon gets one hydrogen and a pyridine nitrogen none.
    pub fn implicit_hydrogen_count(&self, idx: NodeIndex) -> u8 {
        let atom = &self.graph[idx];
        let Some(cov) = element::covalence(&atom.symbol) else {
            return 0;
        };
        let mut order_sum: i16 = self
            .graph
            .edges(idx)
            .map(|e| e.weight().order.value() as i16)
            .sum();
        if atom.is_aromatic {
            order_sum += 1;
        }
        (cov as i16 - order_sum + atom.charge as i16).max(0) as u8
    }

    /// The SSSR of this molecule, recomputed only after structural mutation.
    pub fn rings(&mut self) -> &[Ring] {
        if self.sssr_stale {
            self.sssr = rings::find_rings(self);
            self.sssr_stale = false;
        }
        &self.sssr
    }

    pub fn is_atom_in_ring(&mut self, atom: NodeIndex) -> bool {
        self.rings().iter().any(|ring| ring.contains_atom(atom))
    }

    pub fn is_bond_in_ring(&mut self, bond: EdgeIndex) -> bool {
        self.rings().iter().any(|ring| ring.bonds.contains(&bond))
    }

    /// Shift every atom by `offset`.
    pub fn translate(&mut self, offset: DVec2) {
        for idx in self.graph.node_indices() {
            self.graph[idx].coord += offset;
        }
    }
}

impl Default for Mol {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Mol {
    fn clone(&self) -> Self {
        Mol {
            graph: self.graph.clone(),
            fragments: self.fragments.clone(),
            fragment_count: self.fragment_count,
            sssr: self.sssr.clone(),
            sssr_stale: self.sssr_stale,
        }
    }
}

impl fmt::Debug for Mol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .field("fragment_count", &self.fragment_count)
            .finish()
    }
}
