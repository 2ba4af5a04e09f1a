//! Gravity analysis of an 81-level SRC/steel frame, solved by OpenSees.
//!
//! The crate builds the frame model (nodes, fiber sections, force-based
//! beam-columns, gravity loads, analysis options), renders it as an OpenSees
//! Tcl deck, runs the `OpenSees` interpreter on it and checks the vertical
//! displacement of the two loaded nodes against a regression baseline.
//!
//! ## Example
//! ```rust,no_run
//! use rcframe_gravity::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let model = FrameBuilder::new(FrameLayout::default()).build()?;
//! validate_model(&model)?;
//!
//! let deck = OpenSeesGenerator::new().generate_script(&model, RESULT_FILE)?;
//! let results = OpenSeesExecutor::new(Config::from_env())
//!     .execute(&model, &deck)
//!     .await?;
//!
//! let check = DisplacementCheck::default();
//! println!("{}", check.outcome_line(check.evaluate(&results)));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod frame;
pub mod generator;
pub mod models;
pub mod report;
pub mod validate;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::executor::{ExecutorError, OpenSeesExecutor, RESULT_FILE};
    pub use crate::frame::{FrameBuilder, FrameLayout, LayoutError};
    pub use crate::generator::{GeneratorError, OpenSeesGenerator};
    pub use crate::models::{AnalysisResults, FrameModel};
    pub use crate::report::{append_report, render_report, DisplacementCheck, Outcome};
    pub use crate::validate::{validate_model, ValidationError};
}
