//! Full run against a real OpenSees interpreter (`OPENSEES_PATH` or `OpenSees`
//! on `PATH`). Ignored by default: `cargo test -- --ignored`.

use rcframe_gravity::prelude::*;

#[tokio::test]
#[ignore]
async fn test_loaded_nodes_match_baseline() {
    let model = FrameBuilder::new(FrameLayout::default()).build().unwrap();
    validate_model(&model).unwrap();
    let deck = OpenSeesGenerator::new()
        .generate_script(&model, RESULT_FILE)
        .unwrap();

    let results = OpenSeesExecutor::new(Config::from_env())
        .execute(&model, &deck)
        .await
        .unwrap();

    assert_eq!(results.node_count, 729);
    for node in [3, 4] {
        let uy = results.displacement(node).unwrap().uy;
        assert!((uy + 0.0183736).abs() < 1e-6, "node {} uy = {}", node, uy);
    }
    assert_eq!(DisplacementCheck::default().evaluate(&results), Outcome::Passed);
}
