use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use regex::Regex;
use tempfile::TempDir;
use tokio::process::Command;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{
    AnalysisResults, ElementForce, FrameModel, NodeDisplacement, SectionStiffness,
};

/// Deck file name inside the scratch directory
pub const SCRIPT_FILE: &str = "analysis.tcl";
/// Result file the deck writes, relative to the scratch directory
pub const RESULT_FILE: &str = "results.txt";

/// Runs the OpenSees interpreter on a rendered deck and collects the values
/// the deck's capture block wrote.
pub struct OpenSeesExecutor {
    config: Config,
}

impl OpenSeesExecutor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn execute(
        &self,
        model: &FrameModel,
        script: &str,
    ) -> Result<AnalysisResults, ExecutorError> {
        // Create a unique temporary directory for this analysis
        let analysis_id = Uuid::new_v4();
        let temp_dir = TempDir::new().map_err(|e| ExecutorError::IoError(e.to_string()))?;
        let work_path = temp_dir.path();

        tracing::info!("Starting analysis {} in {:?}", analysis_id, work_path);

        let script_path = work_path.join(SCRIPT_FILE);
        fs::write(&script_path, script)
            .map_err(|e| ExecutorError::IoError(format!("Failed to write deck: {}", e)))?;

        self.maybe_export_debug_file(&script_path, &analysis_id, "tcl");

        let opensees = &self.config.opensees_path;
        tracing::info!("Running command: {} {}", opensees, SCRIPT_FILE);

        let mut command = Command::new(opensees);
        command
            .arg(SCRIPT_FILE)
            .current_dir(work_path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| ExecutorError::Timeout(self.config.timeout.as_secs()))?
            .map_err(|e| {
                ExecutorError::ExecutionError(format!("Failed to execute {}: {}", opensees, e))
            })?;

        // OpenSees writes its banner and all diagnostics to stderr
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let engine_log = format!("{}{}", stdout, stderr);

        if !output.status.success() {
            tracing::error!("OpenSees failed. Stderr: {}\nStdout: {}", stderr, stdout);
            return Err(ExecutorError::AnalysisFailed(format!(
                "OpenSees exited with status {}. Check logs.",
                output.status
            )));
        }

        let result_path = work_path.join(RESULT_FILE);
        if !result_path.exists() {
            tracing::error!("No result file. Engine output:\n{}", engine_log);
            return Err(ExecutorError::AnalysisFailed(format!(
                "No {} generated",
                RESULT_FILE
            )));
        }
        self.maybe_export_debug_file(&result_path, &analysis_id, "txt");

        let content = fs::read_to_string(&result_path)
            .map_err(|e| ExecutorError::IoError(format!("Failed to read results: {}", e)))?;
        let results = parse_results(&content)?;

        if results.node_count != model.nodes.len() {
            tracing::warn!(
                "Engine reports {} nodes, model defines {}",
                results.node_count,
                model.nodes.len()
            );
        }

        if results.status != 0 {
            let diagnostics = diagnose(&engine_log);
            tracing::error!(
                "analyze returned {} ({} engine warnings)",
                results.status,
                diagnostics.warnings
            );
            return Err(ExecutorError::ConvergenceFailed {
                status: results.status,
                step: diagnostics.failed_step,
                load_factor: diagnostics.load_factor,
            });
        }

        tracing::info!(
            "Analysis {} finished: {} displacements, {} element forces",
            analysis_id,
            results.displacements.len(),
            results.element_forces.len()
        );

        Ok(results)
    }

    fn maybe_export_debug_file(&self, path: &Path, analysis_id: &Uuid, extension: &str) {
        if let Some(dest_path) = &self.config.debug_export {
            if let Err(err) = fs::create_dir_all(dest_path) {
                tracing::warn!("Failed to create debug export directory {:?}: {}", dest_path, err);
                return;
            }

            let file_name = format!("analysis_{}.{}", analysis_id, extension);
            let dest_file: PathBuf = dest_path.join(file_name);
            if let Err(err) = fs::copy(path, &dest_file) {
                tracing::warn!("Failed to export debug file {:?}: {}", dest_file, err);
            } else {
                tracing::info!("Exported debug file to {:?}", dest_file);
            }
        }
    }
}

/// Parses the capture block output.
///
/// ```text
/// status 0
/// nodes 729
/// disp 3 1.2e-06 -0.0183736 3.1e-07
/// force 1 0 25108 0 0 -25108 0
/// stiffness 1 5 3.1e7 0 0 9.8e12
/// ```
pub fn parse_results(content: &str) -> Result<AnalysisResults, ExecutorError> {
    let mut results = AnalysisResults::default();
    let mut status = None;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&keyword, rest)) = parts.split_first() else {
            continue;
        };

        match keyword {
            "status" => {
                status = Some(parse_field::<i32>(rest, 0, line_no)?);
            }
            "nodes" => {
                results.node_count = parse_field::<usize>(rest, 0, line_no)?;
            }
            "disp" => {
                let values = parse_floats(&rest[1.min(rest.len())..], line_no)?;
                if values.len() != 3 {
                    return Err(ExecutorError::ParsingError(format!(
                        "line {}: expected 3 displacement components, found {}",
                        line_no,
                        values.len()
                    )));
                }
                results.displacements.push(NodeDisplacement {
                    node: parse_field(rest, 0, line_no)?,
                    ux: values[0],
                    uy: values[1],
                    rz: values[2],
                });
            }
            "force" => {
                results.element_forces.push(ElementForce {
                    element: parse_field(rest, 0, line_no)?,
                    values: parse_floats(&rest[1.min(rest.len())..], line_no)?,
                });
            }
            "stiffness" => {
                results.section_stiffness.push(SectionStiffness {
                    element: parse_field(rest, 0, line_no)?,
                    section: parse_field(rest, 1, line_no)?,
                    values: parse_floats(&rest[2.min(rest.len())..], line_no)?,
                });
            }
            other => {
                tracing::debug!("Skipping unknown record {:?} on line {}", other, line_no);
            }
        }
    }

    results.status = status.ok_or_else(|| {
        ExecutorError::ParsingError("result file has no status record".to_string())
    })?;

    Ok(results)
}

fn parse_field<T: std::str::FromStr>(
    parts: &[&str],
    index: usize,
    line_no: usize,
) -> Result<T, ExecutorError> {
    let raw = parts.get(index).ok_or_else(|| {
        ExecutorError::ParsingError(format!("line {}: missing field {}", line_no, index + 1))
    })?;
    raw.parse::<T>().map_err(|_| {
        ExecutorError::ParsingError(format!("line {}: cannot parse {:?}", line_no, raw))
    })
}

fn parse_floats(parts: &[&str], line_no: usize) -> Result<Vec<f64>, ExecutorError> {
    parts
        .iter()
        .map(|raw| {
            raw.parse::<f64>().map_err(|_| {
                ExecutorError::ParsingError(format!("line {}: cannot parse {:?}", line_no, raw))
            })
        })
        .collect()
}

/// What the engine said about a failed `analyze`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineDiagnostics {
    pub failed_step: Option<u32>,
    pub load_factor: Option<f64>,
    pub warnings: usize,
}

pub fn diagnose(engine_log: &str) -> EngineDiagnostics {
    static FAILED_AT: OnceLock<Regex> = OnceLock::new();
    static LOAD_FACTOR: OnceLock<Regex> = OnceLock::new();
    static WARNING: OnceLock<Regex> = OnceLock::new();

    let failed_at = FAILED_AT.get_or_init(|| {
        Regex::new(r"(?i)failed at (?:step|iteration):?\s*(\d+)").expect("valid regex")
    });
    let load_factor = LOAD_FACTOR.get_or_init(|| {
        Regex::new(r"(?i)load factor:?\s*([-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)")
            .expect("valid regex")
    });
    let warning = WARNING.get_or_init(|| Regex::new(r"(?m)^\s*WARNING").expect("valid regex"));

    EngineDiagnostics {
        failed_step: failed_at
            .captures_iter(engine_log)
            .last()
            .and_then(|c| c[1].parse().ok()),
        load_factor: load_factor
            .captures_iter(engine_log)
            .last()
            .and_then(|c| c[1].parse().ok()),
        warnings: warning.find_iter(engine_log).count(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Execution error: {0}")]
    ExecutionError(String),
    #[error("OpenSees did not finish within {0}s")]
    Timeout(u64),
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
    #[error("analyze returned {status} (failed step: {step:?}, load factor: {load_factor:?})")]
    ConvergenceFailed {
        status: i32,
        step: Option<u32>,
        load_factor: Option<f64>,
    },
    #[error("Parsing error: {0}")]
    ParsingError(String),
}
