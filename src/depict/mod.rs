//! Depiction output for laid-out molecules.
//!
//! The defaults follow the ACS 1996 drawing settings: 14.4 pt bonds (18 px at
//! 1.25 px/pt), double-bond spacing at 18 % of the bond length, 10 pt atom
//! labels. Writers read final coordinates only; run layout first.

pub mod json;
pub mod svg;

const PT_TO_PX: f64 = 1.25;

/// Which carbon atoms get a textual label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarbonLabels {
    All,
    None,
    /// Only terminal carbons, alongside all heteroatoms.
    #[default]
    Terminal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepictConfig {
    pub bg_color: String,
    pub font_size: f64,
    /// Rendered bond length in pixels; model coordinates are scaled to it.
    pub bond_length: f64,
    /// Gap between the lines of a multiple bond, in pixels.
    pub bond_spacing: f64,
    pub carbon_labels: CarbonLabels,
    pub line_width: f64,
    pub margin_width: f64,
}

impl Default for DepictConfig {
    fn default() -> Self {
        let bond_length = 14.4 * PT_TO_PX;
        DepictConfig {
            bg_color: "white".to_string(),
            font_size: 10.0,
            bond_length,
            bond_spacing: 0.18 * bond_length,
            carbon_labels: CarbonLabels::default(),
            line_width: 0.6,
            margin_width: 1.6 * PT_TO_PX,
        }
    }
}
