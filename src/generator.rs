use crate::models::{
    Algorithm, AnalysisKind, ConstraintHandler, ConvergenceTest, FrameModel, Integrator, Numberer,
    Patch, SystemKind, TimeSeries, UniaxialMaterial,
};

/// Renders a `FrameModel` as an OpenSees Tcl deck.
pub struct OpenSeesGenerator;

impl OpenSeesGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Full deck: model definition, analysis, and a capture block that writes
    /// the queried results to `result_file` (relative to the engine's working
    /// directory).
    pub fn generate_script(
        &self,
        model: &FrameModel,
        result_file: &str,
    ) -> Result<String, GeneratorError> {
        if model.nodes.is_empty() {
            return Err(GeneratorError::GenerationError("Model has no nodes".to_string()));
        }
        if model.elements.is_empty() {
            return Err(GeneratorError::GenerationError("Model has no elements".to_string()));
        }
        if result_file.is_empty() || result_file.contains(['{', '}']) {
            return Err(GeneratorError::GenerationError(format!(
                "Unusable result file name {:?}",
                result_file
            )));
        }

        let mut tcl = String::new();

        // 1. Header
        tcl.push_str("# RC frame gravity analysis\n");
        tcl.push_str("wipe\n");
        tcl.push_str("model basic -ndm 2 -ndf 3\n");

        // 2. Nodes and fixities
        tcl.push_str("\n# nodes\n");
        for node in &model.nodes {
            tcl.push_str(&format!("node {} {} {}\n", node.tag, node.x, node.y));
        }
        for fixity in &model.fixities {
            let [ux, uy, rz] = fixity.flags();
            tcl.push_str(&format!("fix {} {} {} {}\n", fixity.node, ux, uy, rz));
        }

        // 3. Materials
        tcl.push_str("\n# materials\n");
        for material in &model.materials {
            tcl.push_str(&Self::material_line(material));
        }

        // 4. Fiber sections
        tcl.push_str("\n# sections\n");
        for section in &model.sections {
            tcl.push_str(&format!("# {}\n", section.name));
            tcl.push_str(&format!("section Fiber {} {{\n", section.tag));
            for patch in &section.patches {
                tcl.push_str("    ");
                tcl.push_str(&Self::patch_line(patch));
            }
            tcl.push_str("}\n");
        }

        // 5. Transformations, integration, elements
        tcl.push_str("\n# elements\n");
        for transf in &model.transforms {
            tcl.push_str(&format!("geomTransf {} {}\n", transf.kind.as_str(), transf.tag));
        }
        for integration in &model.integrations {
            tcl.push_str(&format!(
                "beamIntegration {} {} {} {}\n",
                integration.kind.as_str(),
                integration.tag,
                integration.section,
                integration.points
            ));
        }
        for element in &model.elements {
            tcl.push_str(&format!(
                "element nonlinearBeamColumn {} {} {} {} {} {}\n",
                element.tag,
                element.node_i,
                element.node_j,
                element.integration_points,
                element.section,
                element.transf
            ));
        }

        // Initial tangent, before any load is applied
        for (element, section) in &model.query.section_stiffness {
            tcl.push_str(&format!(
                "set stiffness_{0}_{1} [sectionStiffness {0} {1}]\n",
                element, section
            ));
        }

        // 6. Loads
        tcl.push_str("\n# loads\n");
        for series in &model.time_series {
            match series {
                TimeSeries::Linear { tag } => tcl.push_str(&format!("timeSeries Linear {}\n", tag)),
            }
        }
        for pattern in &model.patterns {
            tcl.push_str(&format!("pattern Plain {} {} {{\n", pattern.tag, pattern.series));
            for load in &pattern.loads {
                tcl.push_str(&format!(
                    "    load {} {} {} {}\n",
                    load.node, load.fx, load.fy, load.mz
                ));
            }
            tcl.push_str("}\n");
        }

        // 7. Analysis
        tcl.push_str("\n# analysis\n");
        tcl.push_str(&Self::analysis_lines(model));

        // 8. Result capture
        tcl.push_str("\n# results\n");
        tcl.push_str(&Self::capture_lines(model, result_file));

        tracing::debug!("Generated deck: {} lines", tcl.lines().count());

        Ok(tcl)
    }

    fn material_line(material: &UniaxialMaterial) -> String {
        match *material {
            UniaxialMaterial::Concrete01 { tag, fpc, epsc0, fpcu, epscu } => format!(
                "uniaxialMaterial Concrete01 {} {} {} {} {}\n",
                tag, fpc, epsc0, fpcu, epscu
            ),
            UniaxialMaterial::Steel01 { tag, fy, e0, b } => {
                format!("uniaxialMaterial Steel01 {} {} {} {}\n", tag, fy, e0, b)
            }
            UniaxialMaterial::Steel02 { tag, fy, e0, b, r0, cr1, cr2 } => format!(
                "uniaxialMaterial Steel02 {} {} {} {} {} {} {}\n",
                tag, fy, e0, b, r0, cr1, cr2
            ),
        }
    }

    fn patch_line(patch: &Patch) -> String {
        match *patch {
            Patch::Quad { material, div_ij, div_jk, vertices } => {
                let coords: Vec<String> = vertices
                    .iter()
                    .map(|(y, z)| format!("{} {}", y, z))
                    .collect();
                format!(
                    "patch quad {} {} {} {}\n",
                    material,
                    div_ij,
                    div_jk,
                    coords.join(" ")
                )
            }
            Patch::Rect { material, div_y, div_z, corner_i, corner_j } => format!(
                "patch rect {} {} {} {} {} {} {}\n",
                material, div_y, div_z, corner_i.0, corner_i.1, corner_j.0, corner_j.1
            ),
        }
    }

    fn analysis_lines(model: &FrameModel) -> String {
        let options = &model.analysis;
        let mut tcl = String::new();

        let system = match options.system {
            SystemKind::BandGeneral => "BandGeneral",
            SystemKind::ProfileSPD => "ProfileSPD",
            SystemKind::SparseGeneral => "SparseGeneral",
            SystemKind::UmfPack => "UmfPack",
        };
        tcl.push_str(&format!("system {}\n", system));

        let constraints = match options.constraints {
            ConstraintHandler::Plain => "Plain",
            ConstraintHandler::Transformation => "Transformation",
            ConstraintHandler::Lagrange => "Lagrange",
            ConstraintHandler::Penalty => "Penalty 1.0e12 1.0e12",
        };
        tcl.push_str(&format!("constraints {}\n", constraints));

        let numberer = match options.numberer {
            Numberer::Plain => "Plain",
            Numberer::RCM => "RCM",
        };
        tcl.push_str(&format!("numberer {}\n", numberer));

        let (name, tol, max_iter, print_flag) = match options.test {
            ConvergenceTest::NormDispIncr { tol, max_iter, print_flag } => {
                ("NormDispIncr", tol, max_iter, print_flag)
            }
            ConvergenceTest::NormUnbalance { tol, max_iter, print_flag } => {
                ("NormUnbalance", tol, max_iter, print_flag)
            }
            ConvergenceTest::EnergyIncr { tol, max_iter, print_flag } => {
                ("EnergyIncr", tol, max_iter, print_flag)
            }
        };
        tcl.push_str(&format!("test {} {:e} {} {}\n", name, tol, max_iter, print_flag));

        let algorithm = match options.algorithm {
            Algorithm::Linear => "Linear",
            Algorithm::Newton => "Newton",
            Algorithm::ModifiedNewton => "ModifiedNewton",
            Algorithm::KrylovNewton => "KrylovNewton",
        };
        tcl.push_str(&format!("algorithm {}\n", algorithm));

        if let Some(Integrator::LoadControl { increment }) = options.integrator {
            tcl.push_str(&format!("integrator LoadControl {}\n", increment));
        }

        match options.analysis {
            AnalysisKind::Static => tcl.push_str("analysis Static\n"),
        }

        tcl.push_str(&format!("set ok [analyze {}]\n", options.steps));
        tcl
    }

    /// One record per line: `status`, `nodes`, `disp`, `force`, `stiffness`.
    /// The executor's parser reads exactly these keywords.
    fn capture_lines(model: &FrameModel, result_file: &str) -> String {
        let mut tcl = String::new();
        tcl.push_str(&format!("set results [open {{{}}} w]\n", result_file));
        tcl.push_str("puts $results \"status $ok\"\n");
        tcl.push_str("puts $results \"nodes [llength [getNodeTags]]\"\n");

        for node in &model.query.nodes {
            tcl.push_str(&format!(
                "puts $results \"disp {0} [nodeDisp {0} 1] [nodeDisp {0} 2] [nodeDisp {0} 3]\"\n",
                node
            ));
        }
        for element in &model.query.elements {
            tcl.push_str(&format!(
                "puts $results \"force {0} [eleResponse {0} force]\"\n",
                element
            ));
        }
        for (element, section) in &model.query.section_stiffness {
            tcl.push_str(&format!(
                "puts $results \"stiffness {0} {1} $stiffness_{0}_{1}\"\n",
                element, section
            ));
        }

        tcl.push_str("close $results\n");
        tcl
    }
}

impl Default for OpenSeesGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Generation error: {0}")]
    GenerationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameBuilder, FrameLayout};
    use crate::models::Integrator;

    fn deck() -> String {
        let model = FrameBuilder::new(FrameLayout::default()).build().unwrap();
        OpenSeesGenerator::new()
            .generate_script(&model, "results.txt")
            .unwrap()
    }

    fn count_prefix(tcl: &str, prefix: &str) -> usize {
        tcl.lines().filter(|l| l.starts_with(prefix)).count()
    }

    #[test]
    fn test_model_header() {
        let tcl = deck();
        assert!(tcl.contains("wipe\nmodel basic -ndm 2 -ndf 3\n"));
    }

    #[test]
    fn test_nodes_and_fixities() {
        let tcl = deck();
        assert_eq!(count_prefix(&tcl, "node "), 729);
        assert_eq!(count_prefix(&tcl, "fix "), 9);
        assert!(tcl.contains("node 1 0 0\n"));
        assert!(tcl.contains("node 729 4000 33600\n"));
        assert!(tcl.contains("fix 9 1 1 1\n"));
        assert!(!tcl.contains("fix 10 "));
    }

    #[test]
    fn test_materials() {
        let tcl = deck();
        assert!(tcl.contains("uniaxialMaterial Concrete01 1 -700 -1284672.4 -595 -0.003\n"));
        assert!(tcl.contains("uniaxialMaterial Steel01 2 4200 2040000 0.01\n"));
        assert!(tcl.contains("uniaxialMaterial Steel02 3 500 210000 0.02 18 0.925 0.15\n"));
    }

    #[test]
    fn test_sections() {
        let tcl = deck();
        assert_eq!(count_prefix(&tcl, "section Fiber "), 4);
        assert!(tcl.contains(
            "section Fiber 1 {\n    patch quad 2 10 10 -100 -100 100 -100 100 100 -100 100\n    patch quad 1 10 10 -93 -93 93 -93 93 93 -93 93\n}\n"
        ));
        assert!(tcl.contains("    patch quad 3 10 10 -75 -75 75 -75 75 75 -75 75\n"));
        assert!(tcl.contains("    patch rect 3 10 1 -15 -22 15 -20.2\n"));
    }

    #[test]
    fn test_elements() {
        let tcl = deck();
        assert_eq!(count_prefix(&tcl, "element nonlinearBeamColumn "), 1360);
        assert!(tcl.contains("geomTransf PDelta 1\n"));
        assert!(tcl.contains("beamIntegration Lobatto 1 1 10\n"));
        assert!(tcl.contains("element nonlinearBeamColumn 1 1 10 5 2 1\n"));
        assert!(tcl.contains("element nonlinearBeamColumn 3 10 11 5 4 1\n"));
        assert!(tcl.contains("element nonlinearBeamColumn 4 3 12 5 1 1\n"));
    }

    #[test]
    fn test_loads() {
        let tcl = deck();
        assert!(tcl.contains(
            "timeSeries Linear 1\npattern Plain 1 1 {\n    load 3 0 -25108 0\n    load 4 0 -25108 0\n}\n"
        ));
    }

    #[test]
    fn test_analysis_sequence() {
        let tcl = deck();
        assert!(tcl.contains(
            "system BandGeneral\nconstraints Transformation\nnumberer RCM\ntest NormDispIncr 1e-12 10 3\nalgorithm Newton\nanalysis Static\nset ok [analyze 10]\n"
        ));
        assert!(!tcl.contains("integrator"));
    }

    #[test]
    fn test_explicit_integrator() {
        let mut model = FrameBuilder::new(FrameLayout::default()).build().unwrap();
        model.analysis.integrator = Some(Integrator::LoadControl { increment: 0.1 });
        let tcl = OpenSeesGenerator::new()
            .generate_script(&model, "results.txt")
            .unwrap();
        assert!(tcl.contains("algorithm Newton\nintegrator LoadControl 0.1\nanalysis Static\n"));
    }

    #[test]
    fn test_result_capture() {
        let tcl = deck();
        assert!(tcl.contains("set results [open {results.txt} w]\n"));
        assert!(tcl.contains(
            "puts $results \"disp 3 [nodeDisp 3 1] [nodeDisp 3 2] [nodeDisp 3 3]\"\n"
        ));
        assert!(tcl.contains("puts $results \"force 2 [eleResponse 2 force]\"\n"));
        assert!(tcl.contains("puts $results \"stiffness 1 5 $stiffness_1_5\"\n"));
        assert!(tcl.trim_end().ends_with("close $results"));
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut model = FrameBuilder::new(FrameLayout::default()).build().unwrap();
        model.nodes.clear();
        assert!(OpenSeesGenerator::new()
            .generate_script(&model, "results.txt")
            .is_err());
    }

    #[test]
    fn test_bad_result_file_rejected() {
        let model = FrameBuilder::new(FrameLayout::default()).build().unwrap();
        assert!(OpenSeesGenerator::new()
            .generate_script(&model, "res}ults")
            .is_err());
    }

    #[test]
    fn test_section_stiffness_taken_before_loading() {
        let tcl = deck();
        let query = tcl.find("set stiffness_1_5 [sectionStiffness 1 5]\n").unwrap();
        let last_element = tcl.rfind("element nonlinearBeamColumn ").unwrap();
        let pattern = tcl.find("pattern Plain ").unwrap();
        let analyze = tcl.find("[analyze ").unwrap();
        assert!(last_element < query);
        assert!(query < tcl.find("timeSeries Linear ").unwrap());
        assert!(query < pattern);
        assert!(query < analyze);
        assert_eq!(tcl.matches("sectionStiffness").count(), 1);
    }
}
