use std::collections::HashSet;

use crate::models::FrameModel;

/// Checks a model for dangling references and duplicate tags before a deck is
/// rendered. The engine would otherwise fail halfway through reading the
/// script with a much less helpful message.
pub fn validate_model(model: &FrameModel) -> Result<(), ValidationError> {
    if model.nodes.is_empty() {
        return Err(ValidationError::Empty("nodes"));
    }
    if model.elements.is_empty() {
        return Err(ValidationError::Empty("elements"));
    }
    if model.fixities.is_empty() {
        return Err(ValidationError::Empty("fixities"));
    }
    if model.analysis.steps == 0 {
        return Err(ValidationError::InvalidOption("analysis steps must be positive".to_string()));
    }

    let nodes = unique_tags("node", model.nodes.iter().map(|n| n.tag))?;
    let materials = unique_tags("material", model.materials.iter().map(|m| m.tag()))?;
    let sections = unique_tags("section", model.sections.iter().map(|s| s.tag))?;
    let transforms = unique_tags("geomTransf", model.transforms.iter().map(|t| t.tag))?;
    let elements = unique_tags("element", model.elements.iter().map(|e| e.tag))?;
    let series = unique_tags("timeSeries", model.time_series.iter().map(|t| t.tag()))?;
    unique_tags("pattern", model.patterns.iter().map(|p| p.tag))?;

    for section in &model.sections {
        for patch in &section.patches {
            require("material", patch.material(), &materials, "section", section.tag)?;
        }
    }

    for integration in &model.integrations {
        require("section", integration.section, &sections, "beamIntegration", integration.tag)?;
    }

    for element in &model.elements {
        require("node", element.node_i, &nodes, "element", element.tag)?;
        require("node", element.node_j, &nodes, "element", element.tag)?;
        require("section", element.section, &sections, "element", element.tag)?;
        require("geomTransf", element.transf, &transforms, "element", element.tag)?;
        if element.node_i == element.node_j {
            return Err(ValidationError::ZeroLength(element.tag));
        }
        if element.integration_points == 0 {
            return Err(ValidationError::InvalidOption(format!(
                "element {} has no integration points",
                element.tag
            )));
        }
    }

    for fixity in &model.fixities {
        require("node", fixity.node, &nodes, "fix", fixity.node)?;
    }

    for pattern in &model.patterns {
        require("timeSeries", pattern.series, &series, "pattern", pattern.tag)?;
        for load in &pattern.loads {
            require("node", load.node, &nodes, "pattern", pattern.tag)?;
        }
    }

    for &node in &model.query.nodes {
        require("node", node, &nodes, "result query", node)?;
    }
    for &element in &model.query.elements {
        require("element", element, &elements, "result query", element)?;
    }
    for &(element, section) in &model.query.section_stiffness {
        require("element", element, &elements, "result query", element)?;
        let points = model
            .element(element)
            .map(|e| e.integration_points)
            .unwrap_or(0);
        if section == 0 || section > points {
            return Err(ValidationError::InvalidOption(format!(
                "element {} has no section number {}",
                element, section
            )));
        }
    }

    Ok(())
}

fn unique_tags(
    kind: &'static str,
    tags: impl Iterator<Item = u32>,
) -> Result<HashSet<u32>, ValidationError> {
    let mut seen = HashSet::new();
    for tag in tags {
        if !seen.insert(tag) {
            return Err(ValidationError::DuplicateTag { kind, tag });
        }
    }
    Ok(seen)
}

fn require(
    kind: &'static str,
    tag: u32,
    known: &HashSet<u32>,
    owner: &'static str,
    owner_tag: u32,
) -> Result<(), ValidationError> {
    if known.contains(&tag) {
        Ok(())
    } else {
        Err(ValidationError::MissingReference {
            kind,
            tag,
            owner,
            owner_tag,
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Model must have at least one entry in {0}")]
    Empty(&'static str),
    #[error("Duplicate {kind} tag {tag}")]
    DuplicateTag { kind: &'static str, tag: u32 },
    #[error("{owner} {owner_tag} references unknown {kind} {tag}")]
    MissingReference {
        kind: &'static str,
        tag: u32,
        owner: &'static str,
        owner_tag: u32,
    },
    #[error("Element {0} connects a node to itself")]
    ZeroLength(u32),
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameBuilder, FrameLayout};
    use crate::models::NodalLoad;

    fn frame() -> FrameModel {
        FrameBuilder::new(FrameLayout {
            levels: 3,
            ..FrameLayout::default()
        })
        .build()
        .unwrap()
    }

    #[test]
    fn test_generated_frame_is_valid() {
        assert_eq!(validate_model(&frame()), Ok(()));
        assert_eq!(
            validate_model(&FrameBuilder::new(FrameLayout::default()).build().unwrap()),
            Ok(())
        );
    }

    #[test]
    fn test_duplicate_node() {
        let mut model = frame();
        let copy = model.nodes[0];
        model.nodes.push(copy);
        assert_eq!(
            validate_model(&model),
            Err(ValidationError::DuplicateTag { kind: "node", tag: 1 })
        );
    }

    #[test]
    fn test_unknown_section() {
        let mut model = frame();
        model.elements[0].section = 42;
        assert!(matches!(
            validate_model(&model),
            Err(ValidationError::MissingReference { kind: "section", tag: 42, .. })
        ));
    }

    #[test]
    fn test_load_on_missing_node() {
        let mut model = frame();
        model.patterns[0].loads.push(NodalLoad {
            node: 9999,
            fx: 0.0,
            fy: -1.0,
            mz: 0.0,
        });
        assert!(matches!(
            validate_model(&model),
            Err(ValidationError::MissingReference { kind: "node", tag: 9999, owner: "pattern", .. })
        ));
    }

    #[test]
    fn test_zero_steps() {
        let mut model = frame();
        model.analysis.steps = 0;
        assert!(matches!(validate_model(&model), Err(ValidationError::InvalidOption(_))));
    }

    #[test]
    fn test_stiffness_query_beyond_integration_points() {
        let mut model = frame();
        model.query.section_stiffness = vec![(1, 6)];
        assert!(matches!(validate_model(&model), Err(ValidationError::InvalidOption(_))));
    }

    #[test]
    fn test_empty_model() {
        let mut model = frame();
        model.elements.clear();
        assert_eq!(validate_model(&model), Err(ValidationError::Empty("elements")));
    }
}
