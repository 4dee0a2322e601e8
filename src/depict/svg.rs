//! SVG writer.

use std::fmt::Write;

use ultraviolet::DVec2;

use super::{CarbonLabels, DepictConfig};
use crate::mol::Mol;

/// Renders `mol` as an SVG document with the default configuration.
pub fn write_svg(mol: &Mol) -> String {
    write_svg_with(mol, &DepictConfig::default())
}

/// Renders `mol` as an SVG document.
pub fn write_svg_with(mol: &Mol, config: &DepictConfig) -> String {
    let depictor = Depictor::new(mol, config);
    depictor.render()
}

struct Depictor<'a> {
    mol: &'a Mol,
    config: &'a DepictConfig,
    scale: f64,
    offset: DVec2,
    width: f64,
    height: f64,
}

impl<'a> Depictor<'a> {
    fn new(mol: &'a Mol, config: &'a DepictConfig) -> Self {
        let scale = config.bond_length / mol.average_bond_length();
        let margin = config.margin_width;
        let (offset, width, height) = match mol.bounding_box() {
            Some(bb) => (
                DVec2::new(scale * bb.min.x - margin, scale * bb.min.y - margin),
                2.0 * margin + scale * bb.width(),
                2.0 * margin + scale * bb.height(),
            ),
            None => (DVec2::zero(), 2.0 * margin, 2.0 * margin),
        };
        Depictor {
            mol,
            config,
            scale,
            offset,
            width,
            height,
        }
    }

    fn project(&self, coord: DVec2) -> DVec2 {
        coord * self.scale - self.offset
    }

    fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "<svg version=\"1.2\" baseProfile=\"full\" width=\"{:.2}\" height=\"{:.2}\" xmlns=\"http://www.w3.org/2000/svg\">",
            self.width, self.height
        );
        let _ = writeln!(
            out,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            self.config.bg_color
        );
        self.draw_bonds(&mut out);
        self.draw_atoms(&mut out);
        out.push_str("</svg>\n");
        out
    }

    fn draw_bonds(&self, out: &mut String) {
        for edge in self.mol.bonds() {
            let Some((a, b)) = self.mol.bond_endpoints(edge) else {
                continue;
            };
            let p1 = self.project(self.mol.atom(a).coord);
            let p2 = self.project(self.mol.atom(b).coord);

            let along = p2 - p1;
            let mag = along.mag();
            let perp = if mag > 1e-9 {
                DVec2::new(-along.y, along.x) / mag
            } else {
                DVec2::zero()
            };

            let spacing = self.config.bond_spacing;
            let offsets: &[f64] = match self.mol.bond(edge).order.value() {
                1 => &[0.0],
                2 => &[-0.5, 0.5],
                3 => &[-1.0, 0.0, 1.0],
                _ => &[-1.5, -0.5, 0.5, 1.5],
            };
            for &o in offsets {
                let shift = perp * (o * spacing);
                let s = p1 + shift;
                let e = p2 + shift;
                let _ = writeln!(
                    out,
                    "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"black\" stroke-width=\"{}\"/>",
                    s.x, s.y, e.x, e.y, self.config.line_width
                );
            }
        }
    }

    fn draw_atoms(&self, out: &mut String) {
        for idx in self.mol.atoms() {
            let atom = self.mol.atom(idx);
            let labeled = if atom.symbol == "C" {
                match self.config.carbon_labels {
                    CarbonLabels::All => true,
                    CarbonLabels::None => false,
                    CarbonLabels::Terminal => self.mol.degree(idx) <= 1,
                }
            } else {
                true
            };
            if !labeled {
                continue;
            }

            let font = self.config.font_size;
            let mut text = atom.symbol.clone();
            let hydrogens = self.mol.implicit_hydrogen_count(idx);
            if hydrogens == 1 {
                text.push_str("<tspan>H</tspan>");
            } else if hydrogens > 1 {
                let _ = write!(
                    text,
                    "<tspan>H<tspan dy=\"{:.1}\">{}</tspan></tspan>",
                    font / 2.0,
                    hydrogens
                );
            }

            let p = self.project(atom.coord);
            let x = p.x - font / 2.0;
            let y = p.y + 3.0 * font / 8.0;
            let _ = writeln!(
                out,
                "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"Arial\" font-size=\"{}\" fill=\"black\">{}</text>",
                x, y, font, text
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::generate_coordinates;
    use crate::smiles::from_smiles;

    #[test]
    fn svg_has_header_and_bonds() {
        let mut mol = from_smiles("CCO").unwrap();
        generate_coordinates(&mut mol).unwrap();
        let svg = write_svg(&mol);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
        assert_eq!(svg.matches("<line").count(), 2);
    }

    #[test]
    fn heteroatoms_are_labeled() {
        let mut mol = from_smiles("CCO").unwrap();
        generate_coordinates(&mut mol).unwrap();
        let svg = write_svg(&mol);
        assert!(svg.contains(">O<tspan>H</tspan></text>"));
    }

    #[test]
    fn carbon_label_policy() {
        let mut mol = from_smiles("CCC").unwrap();
        generate_coordinates(&mut mol).unwrap();

        let none = DepictConfig {
            carbon_labels: CarbonLabels::None,
            ..DepictConfig::default()
        };
        assert_eq!(write_svg_with(&mol, &none).matches("<text").count(), 0);

        let all = DepictConfig {
            carbon_labels: CarbonLabels::All,
            ..DepictConfig::default()
        };
        assert_eq!(write_svg_with(&mol, &all).matches("<text").count(), 3);

        // terminal policy labels the two chain ends
        assert_eq!(write_svg(&mol).matches("<text").count(), 2);
    }

    #[test]
    fn double_bond_draws_two_lines() {
        let mut mol = from_smiles("C=C").unwrap();
        generate_coordinates(&mut mol).unwrap();
        let svg = write_svg_with(
            &mol,
            &DepictConfig {
                carbon_labels: CarbonLabels::None,
                ..DepictConfig::default()
            },
        );
        assert_eq!(svg.matches("<line").count(), 2);
    }
}
