#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
}

impl BondOrder {
    pub fn value(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

/// Wedge annotation for depiction, narrow end at the bond's source atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    /// Solid wedge, bond coming out of the plane.
    Up,
    /// Hashed wedge, bond going behind the plane.
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    pub stereo: BondStereo,
    pub is_aromatic: bool,
}

impl Bond {
    pub fn single() -> Self {
        Bond::default()
    }

    pub fn with_order(order: BondOrder) -> Self {
        Bond {
            order,
            ..Bond::default()
        }
    }

    pub fn aromatic() -> Self {
        Bond {
            is_aromatic: true,
            ..Bond::default()
        }
    }
}

impl Default for Bond {
    fn default() -> Self {
        Bond {
            order: BondOrder::Single,
            stereo: BondStereo::None,
            is_aromatic: false,
        }
    }
}
