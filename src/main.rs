use rcframe_gravity::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rcframe_gravity=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RC frame gravity analysis");

    let config = Config::from_env();
    tracing::info!("Using OpenSees command: {}", config.opensees_path);

    // OpenSees has no version flag; spawning it with stdin closed is enough to
    // know the binary exists.
    match std::process::Command::new(&config.opensees_path)
        .stdin(std::process::Stdio::null())
        .output()
    {
        Ok(_) => tracing::info!("OpenSees found and accessible"),
        Err(e) => {
            tracing::warn!("OpenSees not found or not accessible: {}", e);
            tracing::warn!("Set OPENSEES_PATH environment variable to the correct path");
        }
    }

    // 1. Model
    let builder = FrameBuilder::new(FrameLayout::default());
    let model = builder.build()?;
    let layout = builder.layout();
    tracing::info!(
        "Nodes: {} ({} levels x {} lines), Elements: {} ({} per storey)",
        model.nodes.len(),
        layout.levels,
        layout.column_lines,
        model.elements.len(),
        layout.elements_per_story()
    );
    if let Some(last) = model.elements.last() {
        tracing::info!(
            "Element {} nodes: {:?}",
            last.tag,
            model.element_nodes(last.tag)
        );
    }

    validate_model(&model)?;
    tracing::info!("Model validation passed");

    // 2. Deck
    let deck = OpenSeesGenerator::new().generate_script(&model, RESULT_FILE)?;
    tracing::info!("Deck generated ({} bytes)", deck.len());

    // 3. Analysis
    let results = OpenSeesExecutor::new(config.clone())
        .execute(&model, &deck)
        .await?;

    for d in &results.displacements {
        tracing::info!("Node {}: ux={}, uy={}, rz={}", d.node, d.ux, d.uy, d.rz);
    }
    for f in &results.element_forces {
        tracing::info!("Element {} force: {:?}", f.element, f.values);
    }
    for s in &results.section_stiffness {
        tracing::debug!("Element {} section {} stiffness: {:?}", s.element, s.section, s.values);
    }

    // 4. Check and report
    let check = DisplacementCheck::default();
    let outcome = check.evaluate(&results);
    let report = render_report(&model, &results, &check, outcome);
    append_report(&config.results_file, &report)?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    match outcome {
        Outcome::Passed => println!("Passed!"),
        Outcome::Failed => println!("Failed!"),
    }

    Ok(())
}
