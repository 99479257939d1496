use nei_atomic::Element;
use nei_sim::Nei;
use std::path::Path;

fn runs_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../runs")
}

#[test]
fn bundled_runs_load_and_convert() {
    let runs = [
        "01_hydrogen_helium.yaml",
        "02_heated_oxygen.yaml",
        "03_neutral_start.json",
    ];
    for name in runs {
        let path = runs_dir().join(name);
        let run = nei_project::load(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        nei_project::to_config(&run).unwrap_or_else(|e| panic!("Failed to convert {}: {}", name, e));
    }
}

#[test]
fn hydrogen_helium_run_simulates() {
    let path = runs_dir().join("01_hydrogen_helium.yaml");
    let run = nei_project::load(&path).unwrap();
    let config = nei_project::to_config(&run).unwrap();
    let source = nei_project::rate_source(&run, &runs_dir()).unwrap();
    let mut nei = Nei::build(config, source.as_ref()).unwrap();
    let record = nei.simulate().unwrap();
    assert_eq!(record.len(), 9);
    assert_eq!(record.time().last(), Some(&800.0));

    let final_state = nei.final_state().unwrap();
    let he: &nei_states::IonizationStateVector = final_state.get(Element::HELIUM).unwrap();
    assert!((he.fractions().iter().sum::<f64>() - 1.0).abs() < 1e-6);
}

#[test]
fn explicit_initial_fractions_reach_the_record() {
    let path = runs_dir().join("03_neutral_start.json");
    let run = nei_project::load(&path).unwrap();
    let config = nei_project::to_config(&run).unwrap();
    let source = nei_project::rate_source(&run, &runs_dir()).unwrap();
    let mut nei = Nei::build(config, source.as_ref()).unwrap();
    let record = nei.simulate().unwrap();
    assert_eq!(record.fractions_at(Element::HYDROGEN, 0).unwrap(), vec![1.0, 0.0]);
    let last = record.last_step().unwrap();
    assert!(record.fractions_at(Element::HYDROGEN, last).unwrap()[1] > 0.5);
}
