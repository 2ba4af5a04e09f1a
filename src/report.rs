//! Regression check and the appended text report.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{AnalysisResults, FrameModel};

/// Regression baseline for the gravity run. The value's derivation is not
/// documented; it is the vertical displacement the reference run produced at
/// both loaded nodes.
pub const EXPECTED_UY: f64 = -0.0183736;
pub const TOLERANCE: f64 = 1e-6;
pub const RUN_LABEL: &str = "RCFrameGravity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed => "FAILED",
        }
    }
}

/// Vertical displacement comparison against a fixed expected value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplacementCheck {
    pub nodes: Vec<u32>,
    pub expected_uy: f64,
    pub tolerance: f64,
    pub label: String,
}

impl Default for DisplacementCheck {
    fn default() -> Self {
        Self {
            nodes: vec![3, 4],
            expected_uy: EXPECTED_UY,
            tolerance: TOLERANCE,
            label: RUN_LABEL.to_string(),
        }
    }
}

impl DisplacementCheck {
    /// Passes only if every checked node is present and within tolerance.
    pub fn evaluate(&self, results: &AnalysisResults) -> Outcome {
        let within = self.nodes.iter().all(|&node| match results.displacement(node) {
            Some(d) => (d.uy - self.expected_uy).abs() < self.tolerance,
            None => {
                tracing::warn!("No displacement reported for node {}", node);
                false
            }
        });

        if within {
            Outcome::Passed
        } else {
            Outcome::Failed
        }
    }

    pub fn outcome_line(&self, outcome: Outcome) -> String {
        format!("{} : {}", outcome.as_str(), self.label)
    }
}

/// Fixed-format report: node displacements, element forces, outcome line.
pub fn render_report(
    model: &FrameModel,
    results: &AnalysisResults,
    check: &DisplacementCheck,
    outcome: Outcome,
) -> String {
    let mut report = String::new();

    for d in &results.displacements {
        report.push_str(&format!(
            "Node {} displacement: X={}, Y={}, rotation={}\n",
            d.node, d.ux, d.uy, d.rz
        ));
    }

    for force in &results.element_forces {
        report.push_str(&format!(
            "{} {} force: {:?}\n",
            element_role(model, force.element),
            force.element,
            force.values
        ));
    }

    report.push_str(&check.outcome_line(outcome));
    report.push('\n');

    report
}

/// Horizontal members are beams, everything else is a column.
fn element_role(model: &FrameModel, element: u32) -> &'static str {
    let ends = model
        .element_nodes(element)
        .and_then(|(i, j)| Some((model.node(i)?, model.node(j)?)));
    match ends {
        Some((i, j)) if (i.y - j.y).abs() < 1e-9 => "Beam",
        Some(_) => "Column",
        None => "Element",
    }
}

/// Appends `report` to `path`, creating the file on first use.
pub fn append_report(path: &Path, report: &str) -> Result<(), ReportError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ReportError::Open {
            path: path.display().to_string(),
            source,
        })?;
    file.write_all(report.as_bytes())?;
    file.flush()?;
    tracing::info!("Appended {} bytes to {}", report.len(), path.display());
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Cannot open report file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
