use nei_atomic::Element;
use nei_states::IonizationStateVector;

#[test]
fn snapshot_serializes_with_symbol() {
    let v = IonizationStateVector::new(Element::HELIUM, vec![0.0, 0.25, 0.75], 1e-6)
        .unwrap()
        .with_density_scale(1e8)
        .unwrap();
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["element"], "He");
    assert_eq!(json["fractions"][2], 0.75);
    assert_eq!(json["density_scale"], 1e8);
}

#[test]
fn snapshot_without_density_omits_it() {
    let v = IonizationStateVector::neutral(Element::HYDROGEN, 1e-6).unwrap();
    let json = serde_json::to_value(&v).unwrap();
    assert!(json.get("density_scale").is_none());
}
