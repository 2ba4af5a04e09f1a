//! Deterministic generation of the 81-level gravity frame.
//!
//! Units are kgf and cm throughout. Node tags grow along a level first, so the
//! node on column line `i` (1-based) at level `n` (0-based) is `i + lines * n`.
//! Every storey contributes one column per line and one beam per bay; with nine
//! lines that is 17 elements per storey, tagged 1..=17 plus `17 * n`.

use crate::models::{
    AnalysisOptions, BeamColumn, BeamIntegration, FiberSection, Fixity, FrameModel, GeomTransf,
    IntegrationKind, LoadPattern, NodalLoad, Node, Patch, ResultQuery, TimeSeries, TransfKind,
    UniaxialMaterial,
};

pub const CORE_CONCRETE: u32 = 1;
pub const REBAR_STEEL: u32 = 2;
pub const SM570M_STEEL: u32 = 3;

pub const SRC_200: u32 = 1;
pub const SRC_150: u32 = 2;
pub const H_COLUMN: u32 = 3;
pub const H_BEAM: u32 = 4;

pub const PDELTA_TRANSF: u32 = 1;

/// Grid constants for the frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    /// Centre-to-centre column spacing (cm)
    pub bay_width: f64,
    /// Storey height (cm)
    pub story_height: f64,
    /// Number of node levels, base included
    pub levels: u32,
    /// Number of column lines
    pub column_lines: u32,
    /// Integration points per element
    pub integration_points: u32,
    /// Gravity load on each loaded node (kgf)
    pub gravity_load: f64,
    pub loaded_nodes: Vec<u32>,
    /// Column section for each line, left to right
    pub column_sections: Vec<u32>,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            bay_width: 500.0,
            story_height: 420.0,
            levels: 81,
            column_lines: 9,
            integration_points: 5,
            gravity_load: 25108.0,
            loaded_nodes: vec![3, 4],
            column_sections: vec![
                SRC_150, H_COLUMN, SRC_200, H_COLUMN, SRC_150, H_COLUMN, SRC_200, H_COLUMN,
                SRC_150,
            ],
        }
    }
}

impl FrameLayout {
    pub fn stories(&self) -> u32 {
        self.levels.saturating_sub(1)
    }

    pub fn node_count(&self) -> u32 {
        self.levels * self.column_lines
    }

    pub fn elements_per_story(&self) -> u32 {
        (2 * self.column_lines).saturating_sub(1)
    }

    pub fn element_count(&self) -> u32 {
        self.elements_per_story() * self.stories()
    }

    /// Rejects layouts the tag arithmetic cannot number.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.column_lines == 0 {
            return Err(LayoutError::NoColumnLines);
        }
        if self.levels < 2 {
            return Err(LayoutError::TooFewLevels(self.levels));
        }
        if self.column_sections.len() != self.column_lines as usize {
            return Err(LayoutError::SectionCountMismatch {
                lines: self.column_lines,
                sections: self.column_sections.len(),
            });
        }
        if self.integration_points == 0 {
            return Err(LayoutError::NoIntegrationPoints);
        }
        Ok(())
    }

    /// Tag of the node on `line` (1-based) at `level` (0-based)
    pub fn node_tag(&self, level: u32, line: u32) -> u32 {
        line + self.column_lines * level
    }

    /// Tag of the column on `line` (1-based) in storey `story` (0-based)
    pub fn column_tag(&self, story: u32, line: u32) -> u32 {
        let local = if line == 1 { 1 } else { 2 * (line - 1) };
        local + self.elements_per_story() * story
    }

    /// Tag of the beam spanning `bay` (1-based) on top of storey `story`
    pub fn beam_tag(&self, story: u32, bay: u32) -> u32 {
        2 * bay + 1 + self.elements_per_story() * story
    }
}

/// Builds the complete model for a layout
pub struct FrameBuilder {
    layout: FrameLayout,
}

impl FrameBuilder {
    pub fn new(layout: FrameLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn build(&self) -> Result<FrameModel, LayoutError> {
        self.layout.validate()?;

        let model = FrameModel {
            nodes: self.nodes(),
            fixities: self.fixities(),
            materials: materials(),
            sections: sections(),
            transforms: vec![GeomTransf {
                kind: TransfKind::PDelta,
                tag: PDELTA_TRANSF,
            }],
            integrations: vec![BeamIntegration {
                kind: IntegrationKind::Lobatto,
                tag: 1,
                section: SRC_200,
                points: 10,
            }],
            elements: self.elements(),
            time_series: vec![TimeSeries::Linear { tag: 1 }],
            patterns: vec![self.gravity_pattern()],
            analysis: AnalysisOptions::default(),
            query: ResultQuery {
                nodes: self.layout.loaded_nodes.clone(),
                elements: vec![1, 2, 3],
                section_stiffness: vec![(1, 5)],
            },
        };

        tracing::debug!(
            "Built frame: {} nodes, {} elements, {} fixities",
            model.nodes.len(),
            model.elements.len(),
            model.fixities.len()
        );

        Ok(model)
    }

    fn nodes(&self) -> Vec<Node> {
        let layout = &self.layout;
        let mut nodes = Vec::with_capacity(layout.node_count() as usize);
        for level in 0..layout.levels {
            for line in 1..=layout.column_lines {
                nodes.push(Node {
                    tag: layout.node_tag(level, line),
                    x: f64::from(line - 1) * layout.bay_width,
                    y: f64::from(level) * layout.story_height,
                });
            }
        }
        nodes
    }

    /// The base sits on a pile group, so every base node is a fixed end
    fn fixities(&self) -> Vec<Fixity> {
        (1..=self.layout.column_lines)
            .map(|line| Fixity::fixed(self.layout.node_tag(0, line)))
            .collect()
    }

    fn elements(&self) -> Vec<BeamColumn> {
        let layout = &self.layout;
        let mut elements = Vec::with_capacity(layout.element_count() as usize);

        for story in 0..layout.stories() {
            for line in 1..=layout.column_lines {
                let section = layout.column_sections[(line - 1) as usize];
                elements.push(BeamColumn {
                    tag: layout.column_tag(story, line),
                    node_i: layout.node_tag(story, line),
                    node_j: layout.node_tag(story + 1, line),
                    integration_points: layout.integration_points,
                    section,
                    transf: PDELTA_TRANSF,
                });
            }

            for bay in 1..layout.column_lines {
                elements.push(BeamColumn {
                    tag: layout.beam_tag(story, bay),
                    node_i: layout.node_tag(story + 1, bay),
                    node_j: layout.node_tag(story + 1, bay + 1),
                    integration_points: layout.integration_points,
                    section: H_BEAM,
                    transf: PDELTA_TRANSF,
                });
            }
        }

        elements.sort_by_key(|e| e.tag);
        elements
    }

    fn gravity_pattern(&self) -> LoadPattern {
        LoadPattern {
            tag: 1,
            series: 1,
            loads: self
                .layout
                .loaded_nodes
                .iter()
                .map(|&node| NodalLoad {
                    node,
                    fx: 0.0,
                    fy: -self.layout.gravity_load,
                    mz: 0.0,
                })
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LayoutError {
    #[error("Layout has no column lines")]
    NoColumnLines,
    #[error("Layout needs at least two levels, got {0}")]
    TooFewLevels(u32),
    #[error("Layout has {lines} column lines but {sections} column sections")]
    SectionCountMismatch { lines: u32, sections: usize },
    #[error("Elements need at least one integration point")]
    NoIntegrationPoints,
}

/// Material catalog (kgf/cm² for the RC materials, MPa as entered for SM570M)
pub fn materials() -> Vec<UniaxialMaterial> {
    vec![
        // Confined core concrete, Ec from the New RC confinement model with 10% silica fume
        UniaxialMaterial::Concrete01 {
            tag: CORE_CONCRETE,
            fpc: -700.0,
            epsc0: -1284672.4,
            fpcu: -595.0,
            epscu: -0.003,
        },
        UniaxialMaterial::Steel01 {
            tag: REBAR_STEEL,
            fy: 4200.0,
            e0: 2040000.0,
            b: 0.01,
        },
        UniaxialMaterial::Steel02 {
            tag: SM570M_STEEL,
            fy: 500.0,
            e0: 210000.0,
            b: 0.02,
            r0: 18.0,
            cr1: 0.925,
            cr2: 0.15,
        },
    ]
}

pub fn sections() -> Vec<FiberSection> {
    vec![
        src_section(SRC_200, "SRC 200x200", 200.0, 7.0, REBAR_STEEL),
        src_section(SRC_150, "SRC 150x150", 150.0, 7.0, SM570M_STEEL),
        h_section(H_COLUMN, "H 510x306", 30.6, 2.9, 51.0, 1.7),
        h_section(H_BEAM, "H 440x300", 30.0, 1.8, 44.0, 1.1),
    ]
}

/// Square steel tube filled with core concrete. The steel patch spans the full
/// outline and the concrete patch is inset by the wall thickness.
fn src_section(tag: u32, name: &str, width: f64, wall: f64, steel: u32) -> FiberSection {
    let half = width / 2.0;
    let core = half - wall;
    FiberSection {
        tag,
        name: name.to_string(),
        patches: vec![
            square_patch(steel, half),
            square_patch(CORE_CONCRETE, core),
        ],
    }
}

fn square_patch(material: u32, half: f64) -> Patch {
    Patch::Quad {
        material,
        div_ij: 10,
        div_jk: 10,
        vertices: [(-half, -half), (half, -half), (half, half), (-half, half)],
    }
}

fn h_section(
    tag: u32,
    name: &str,
    flange: f64,
    flange_t: f64,
    depth: f64,
    web_t: f64,
) -> FiberSection {
    let half_flange = flange / 2.0;
    let half_depth = depth / 2.0;
    let half_web = web_t / 2.0;
    FiberSection {
        tag,
        name: name.to_string(),
        patches: vec![
            // top flange
            Patch::Rect {
                material: SM570M_STEEL,
                div_y: 10,
                div_z: 1,
                corner_i: (-half_flange, half_depth - flange_t),
                corner_j: (half_flange, half_depth),
            },
            // bottom flange
            Patch::Rect {
                material: SM570M_STEEL,
                div_y: 10,
                div_z: 1,
                corner_i: (-half_flange, -half_depth),
                corner_j: (half_flange, -half_depth + flange_t),
            },
            // web
            Patch::Rect {
                material: SM570M_STEEL,
                div_y: 1,
                div_z: 10,
                corner_i: (-half_web, -half_depth + flange_t),
                corner_j: (half_web, half_depth - flange_t),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn frame() -> FrameModel {
        FrameBuilder::new(FrameLayout::default()).build().unwrap()
    }

    #[test]
    fn test_node_count_and_coordinates() {
        let model = frame();
        assert_eq!(model.nodes.len(), 729);

        let top_right = model.node(729).unwrap();
        assert!((top_right.x - 4000.0).abs() < 1e-10);
        assert!((top_right.y - 33600.0).abs() < 1e-10);

        let n12 = model.node(12).unwrap();
        assert!((n12.x - 1000.0).abs() < 1e-10);
        assert!((n12.y - 420.0).abs() < 1e-10);
    }

    #[test]
    fn test_base_nodes_fixed() {
        let model = frame();
        assert_eq!(model.fixities.len(), 9);
        for tag in 1..=9 {
            assert!(model.is_fixed(tag), "node {} should be fixed", tag);
        }
        for tag in 10..=729 {
            assert!(!model.is_fixed(tag));
        }
    }

    #[test]
    fn test_elements_per_story() {
        let layout = FrameLayout::default();
        assert_eq!(layout.elements_per_story(), 17);
        assert_eq!(layout.element_count(), 1360);

        let model = frame();
        assert_eq!(model.elements.len(), 1360);

        let tags: HashSet<u32> = model.elements.iter().map(|e| e.tag).collect();
        assert_eq!(tags.len(), 1360);
        assert_eq!(tags, (1..=1360).collect::<HashSet<u32>>());
    }

    #[test]
    fn test_first_story_connectivity() {
        let model = frame();

        // columns
        assert_eq!(model.element_nodes(1), Some((1, 10)));
        assert_eq!(model.element_nodes(2), Some((2, 11)));
        assert_eq!(model.element_nodes(4), Some((3, 12)));
        assert_eq!(model.element_nodes(16), Some((9, 18)));

        // beams sit on level 1
        assert_eq!(model.element_nodes(3), Some((10, 11)));
        assert_eq!(model.element_nodes(17), Some((17, 18)));
    }

    #[test]
    fn test_last_element() {
        let model = frame();
        assert_eq!(model.element_nodes(1360), Some((728, 729)));
    }

    #[test]
    fn test_section_assignment() {
        let model = frame();
        let section_of = |tag| model.element(tag).unwrap().section;

        assert_eq!(section_of(4), SRC_200);
        assert_eq!(section_of(12), SRC_200);
        assert_eq!(section_of(1), SRC_150);
        assert_eq!(section_of(8), SRC_150);
        assert_eq!(section_of(16), SRC_150);
        assert_eq!(section_of(2 + 17 * 40), H_COLUMN);
        assert_eq!(section_of(14), H_COLUMN);
        assert_eq!(section_of(3), H_BEAM);
        assert_eq!(section_of(17 + 17 * 79), H_BEAM);

        assert!(model.elements.iter().all(|e| e.integration_points == 5));
        assert!(model.elements.iter().all(|e| e.transf == PDELTA_TRANSF));
    }

    #[test]
    fn test_gravity_loads() {
        let model = frame();
        assert_eq!(model.patterns.len(), 1);
        let loads = &model.patterns[0].loads;
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].node, 3);
        assert_eq!(loads[1].node, 4);
        assert!(loads.iter().all(|l| (l.fy + 25108.0).abs() < 1e-10 && l.fx == 0.0));
    }

    #[test]
    fn test_h_section_geometry() {
        let sections = sections();
        let beam = sections.iter().find(|s| s.tag == H_BEAM).unwrap();
        assert_eq!(beam.patches.len(), 3);
        match beam.patches[0] {
            Patch::Rect { corner_i, corner_j, .. } => {
                assert!((corner_i.1 - 20.2).abs() < 1e-10);
                assert!((corner_j.1 - 22.0).abs() < 1e-10);
            }
            _ => panic!("expected rect flange"),
        }
    }

    #[test]
    fn test_smaller_layout() {
        let layout = FrameLayout {
            levels: 3,
            column_lines: 4,
            column_sections: vec![SRC_150, H_COLUMN, H_COLUMN, SRC_150],
            ..FrameLayout::default()
        };
        let model = FrameBuilder::new(layout).build().unwrap();
        assert_eq!(model.nodes.len(), 12);
        assert_eq!(model.elements.len(), 14);
        assert_eq!(model.element_nodes(3), Some((5, 6)));
        assert_eq!(model.element_nodes(1 + 7), Some((5, 9)));
    }

    #[test]
    fn test_empty_layout_rejected() {
        let layout = FrameLayout {
            column_lines: 0,
            column_sections: Vec::new(),
            ..FrameLayout::default()
        };
        assert_eq!(layout.elements_per_story(), 0);
        assert_eq!(
            FrameBuilder::new(layout).build().unwrap_err(),
            LayoutError::NoColumnLines
        );

        let layout = FrameLayout { levels: 1, ..FrameLayout::default() };
        assert_eq!(
            FrameBuilder::new(layout).build().unwrap_err(),
            LayoutError::TooFewLevels(1)
        );
    }

    #[test]
    fn test_column_section_count_must_match_lines() {
        let layout = FrameLayout {
            column_lines: 10,
            ..FrameLayout::default()
        };
        assert_eq!(
            FrameBuilder::new(layout).build().unwrap_err(),
            LayoutError::SectionCountMismatch { lines: 10, sections: 9 }
        );
    }
}
