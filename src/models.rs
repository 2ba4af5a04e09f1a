use serde::{Deserialize, Serialize};

/// Complete input for one OpenSees run: geometry, materials, sections,
/// elements, loads and the analysis options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameModel {
    pub nodes: Vec<Node>,
    pub fixities: Vec<Fixity>,
    pub materials: Vec<UniaxialMaterial>,
    pub sections: Vec<FiberSection>,
    pub transforms: Vec<GeomTransf>,
    pub integrations: Vec<BeamIntegration>,
    pub elements: Vec<BeamColumn>,
    pub time_series: Vec<TimeSeries>,
    pub patterns: Vec<LoadPattern>,
    pub analysis: AnalysisOptions,
    pub query: ResultQuery,
}

impl FrameModel {
    pub fn node(&self, tag: u32) -> Option<&Node> {
        self.nodes.iter().find(|n| n.tag == tag)
    }

    pub fn element(&self, tag: u32) -> Option<&BeamColumn> {
        self.elements.iter().find(|e| e.tag == tag)
    }

    pub fn node_tags(&self) -> Vec<u32> {
        self.nodes.iter().map(|n| n.tag).collect()
    }

    /// End nodes `(i, j)` of an element, the equivalent of `eleNodes`.
    pub fn element_nodes(&self, tag: u32) -> Option<(u32, u32)> {
        self.element(tag).map(|e| (e.node_i, e.node_j))
    }

    pub fn is_fixed(&self, node: u32) -> bool {
        self.fixities.iter().any(|f| f.node == node && f.is_fully_fixed())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub tag: u32,
    pub x: f64,
    pub y: f64,
}

/// Nodal restraint. `true` means the DOF is constrained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Fixity {
    pub node: u32,
    pub ux: bool,
    pub uy: bool,
    pub rz: bool,
}

impl Fixity {
    pub fn fixed(node: u32) -> Self {
        Self { node, ux: true, uy: true, rz: true }
    }

    pub fn is_fully_fixed(&self) -> bool {
        self.ux && self.uy && self.rz
    }

    /// OpenSees flag triple (1 = fixed, 0 = free)
    pub fn flags(&self) -> [u8; 3] {
        [self.ux as u8, self.uy as u8, self.rz as u8]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum UniaxialMaterial {
    /// Kent-Scott-Park concrete, no tensile strength
    Concrete01 {
        tag: u32,
        fpc: f64,
        epsc0: f64,
        fpcu: f64,
        epscu: f64,
    },
    /// Bilinear steel with kinematic hardening
    Steel01 { tag: u32, fy: f64, e0: f64, b: f64 },
    /// Giuffre-Menegotto-Pinto steel
    Steel02 {
        tag: u32,
        fy: f64,
        e0: f64,
        b: f64,
        r0: f64,
        cr1: f64,
        cr2: f64,
    },
}

impl UniaxialMaterial {
    pub fn tag(&self) -> u32 {
        match self {
            UniaxialMaterial::Concrete01 { tag, .. }
            | UniaxialMaterial::Steel01 { tag, .. }
            | UniaxialMaterial::Steel02 { tag, .. } => *tag,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FiberSection {
    pub tag: u32,
    pub name: String,
    pub patches: Vec<Patch>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Patch {
    /// Quadrilateral patch, vertices listed counter-clockwise (y, z)
    Quad {
        material: u32,
        div_ij: u32,
        div_jk: u32,
        vertices: [(f64, f64); 4],
    },
    /// Rectangular patch given by its bottom-left and top-right corners (y, z)
    Rect {
        material: u32,
        div_y: u32,
        div_z: u32,
        corner_i: (f64, f64),
        corner_j: (f64, f64),
    },
}

impl Patch {
    pub fn material(&self) -> u32 {
        match self {
            Patch::Quad { material, .. } | Patch::Rect { material, .. } => *material,
        }
    }

    /// Number of fibers the engine will create for this patch
    pub fn fiber_count(&self) -> u32 {
        match self {
            Patch::Quad { div_ij, div_jk, .. } => div_ij * div_jk,
            Patch::Rect { div_y, div_z, .. } => div_y * div_z,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransfKind {
    Linear,
    PDelta,
    Corotational,
}

impl TransfKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransfKind::Linear => "Linear",
            TransfKind::PDelta => "PDelta",
            TransfKind::Corotational => "Corotational",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeomTransf {
    pub kind: TransfKind,
    pub tag: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntegrationKind {
    Lobatto,
    Legendre,
}

impl IntegrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationKind::Lobatto => "Lobatto",
            IntegrationKind::Legendre => "Legendre",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BeamIntegration {
    pub kind: IntegrationKind,
    pub tag: u32,
    pub section: u32,
    pub points: u32,
}

/// Force-based nonlinear beam-column (`nonlinearBeamColumn` form)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BeamColumn {
    pub tag: u32,
    pub node_i: u32,
    pub node_j: u32,
    pub integration_points: u32,
    pub section: u32,
    pub transf: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeSeries {
    Linear { tag: u32 },
}

impl TimeSeries {
    pub fn tag(&self) -> u32 {
        match self {
            TimeSeries::Linear { tag } => *tag,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NodalLoad {
    pub node: u32,
    pub fx: f64,
    pub fy: f64,
    pub mz: f64,
}

/// `Plain` load pattern bound to one time series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadPattern {
    pub tag: u32,
    pub series: u32,
    pub loads: Vec<NodalLoad>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SystemKind {
    BandGeneral,
    ProfileSPD,
    SparseGeneral,
    UmfPack,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConstraintHandler {
    Plain,
    Transformation,
    Lagrange,
    Penalty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Numberer {
    Plain,
    RCM,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ConvergenceTest {
    NormDispIncr { tol: f64, max_iter: u32, print_flag: u32 },
    NormUnbalance { tol: f64, max_iter: u32, print_flag: u32 },
    EnergyIncr { tol: f64, max_iter: u32, print_flag: u32 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Algorithm {
    Linear,
    Newton,
    ModifiedNewton,
    KrylovNewton,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Integrator {
    LoadControl { increment: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnalysisKind {
    Static,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOptions {
    pub system: SystemKind,
    pub constraints: ConstraintHandler,
    pub numberer: Numberer,
    pub test: ConvergenceTest,
    pub algorithm: Algorithm,
    /// `None` leaves the engine's default static integrator in place
    pub integrator: Option<Integrator>,
    pub analysis: AnalysisKind,
    pub steps: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            system: SystemKind::BandGeneral,
            constraints: ConstraintHandler::Transformation,
            numberer: Numberer::RCM,
            test: ConvergenceTest::NormDispIncr {
                tol: 1.0e-12,
                max_iter: 10,
                print_flag: 3,
            },
            algorithm: Algorithm::Newton,
            integrator: None,
            analysis: AnalysisKind::Static,
            steps: 10,
        }
    }
}

/// Values the deck reports back once `analyze` returns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultQuery {
    pub nodes: Vec<u32>,
    pub elements: Vec<u32>,
    /// `(element, section number)` pairs
    pub section_stiffness: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NodeDisplacement {
    pub node: u32,
    pub ux: f64,
    pub uy: f64,
    pub rz: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementForce {
    pub element: u32,
    /// Global end forces as returned by `eleResponse <tag> force`
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionStiffness {
    pub element: u32,
    pub section: u32,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResults {
    /// Return value of `analyze`; zero on success
    pub status: i32,
    pub node_count: usize,
    pub displacements: Vec<NodeDisplacement>,
    pub element_forces: Vec<ElementForce>,
    pub section_stiffness: Vec<SectionStiffness>,
}

impl AnalysisResults {
    pub fn displacement(&self, node: u32) -> Option<&NodeDisplacement> {
        self.displacements.iter().find(|d| d.node == node)
    }

    pub fn element_force(&self, element: u32) -> Option<&ElementForce> {
        self.element_forces.iter().find(|f| f.element == element)
    }
}
