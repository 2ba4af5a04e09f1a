use rcframe_gravity::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let deck_path = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("rc_frame_gravity.tcl");

    let model = FrameBuilder::new(FrameLayout::default()).build()?;
    validate_model(&model)?;

    let deck = OpenSeesGenerator::new().generate_script(&model, RESULT_FILE)?;
    std::fs::write(deck_path, &deck)?;

    println!("Deck written to {}", deck_path);
    println!(
        "Run `OpenSees {}`; results land in {}",
        deck_path, RESULT_FILE
    );

    Ok(())
}
